//! Serve the sandbox world over the JSON-lines protocol.
//!
//! The real simulation lives outside this repository; this binary hosts
//! the built-in grid sandbox so agents can be developed against it.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use tether_engine::HostConfig;
use tether_surface::{ControlSurface, Server, ServerConfig};
use tether_test_utils::fixtures;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve a sandbox world to external agents")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:10783")]
    bind: SocketAddr,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Largest observation radius a caller may request
    #[arg(long, default_value_t = 64)]
    max_radius: u32,

    /// Sandbox width in tiles
    #[arg(long, default_value_t = 16)]
    width: u32,

    /// Sandbox height in tiles
    #[arg(long, default_value_t = 16)]
    height: u32,

    /// Longest accepted request line in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    max_line_bytes: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let host_config = HostConfig {
        tick_rate_hz: args.tick_rate,
        max_radius: args.max_radius,
        ..HostConfig::default()
    };
    let world = fixtures::starter(args.width, args.height);
    let surface = ControlSurface::start(world, host_config)
        .context("failed to start the simulation host")?;

    let server_config = ServerConfig {
        bind: args.bind,
        max_line_bytes: args.max_line_bytes,
    };
    let server = Server::bind(Arc::new(surface), server_config)
        .with_context(|| format!("failed to listen on {}", args.bind))?;

    info!(
        target: "tether::server",
        "sandbox {}x{} at {} Hz",
        args.width,
        args.height,
        args.tick_rate
    );
    server.serve().context("server exited with error")?;
    Ok(())
}
