//! TCP server speaking the JSON-lines protocol.
//!
//! One acceptor thread polls a non-blocking listener; each accepted
//! connection gets its own thread that reads request lines and writes
//! one response line per request, in order. A line longer than
//! [`ServerConfig::max_line_bytes`] is answered with an error and
//! skipped. A connection is closed when the peer hangs up or on an I/O
//! error.

use std::error::Error;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::protocol::{self, WireResponse};
use crate::surface::ControlSurface;

const ACCEPT_POLL: Duration = Duration::from_millis(25);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(200);

// ── ServerConfig ─────────────────────────────────────────────────

/// Listener configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on. Default: `127.0.0.1:10783`.
    pub bind: SocketAddr,
    /// Longest accepted request line in bytes, excluding the newline.
    /// Default: 64 KiB.
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 10783)),
            max_line_bytes: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.max_line_bytes == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "max_line_bytes must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ── ServerError ──────────────────────────────────────────────────

/// Errors from starting or running the server.
#[derive(Debug, PartialEq, Eq)]
pub enum ServerError {
    /// The configuration failed validation.
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
    /// The listener could not be bound.
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// OS error text.
        reason: String,
    },
    /// A listener or thread operation failed.
    Io {
        /// What was being attempted and the OS error text.
        reason: String,
    },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid server config: {reason}"),
            Self::Bind { addr, reason } => write!(f, "cannot bind {addr}: {reason}"),
            Self::Io { reason } => write!(f, "server i/o error: {reason}"),
        }
    }
}

impl Error for ServerError {}

fn io_error(what: &str) -> impl FnOnce(io::Error) -> ServerError + '_ {
    move |e| ServerError::Io {
        reason: format!("{what}: {e}"),
    }
}

// ── Server ───────────────────────────────────────────────────────

/// A bound listener, ready to serve.
pub struct Server {
    listener: TcpListener,
    surface: Arc<ControlSurface>,
    config: ServerConfig,
}

impl Server {
    /// Validate `config` and bind the listener.
    pub fn bind(surface: Arc<ControlSurface>, config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = TcpListener::bind(config.bind).map_err(|e| ServerError::Bind {
            addr: config.bind,
            reason: e.to_string(),
        })?;
        listener
            .set_nonblocking(true)
            .map_err(io_error("set_nonblocking"))?;
        Ok(Self {
            listener,
            surface,
            config,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(io_error("local_addr"))
    }

    /// Serve on the calling thread until the process exits.
    pub fn serve(self) -> Result<(), ServerError> {
        let stop = AtomicBool::new(false);
        self.accept_loop(&stop);
        Ok(())
    }

    /// Serve on a background thread until the handle is stopped.
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("tether-accept".into())
            .spawn(move || self.accept_loop(&thread_stop))
            .map_err(io_error("spawn acceptor"))?;
        Ok(ServerHandle {
            local_addr,
            stop,
            thread: Some(thread),
        })
    }

    fn accept_loop(&self, stop: &AtomicBool) {
        info!(
            target: "tether::server",
            "listening on {}",
            self.listener.local_addr().unwrap_or(self.config.bind)
        );
        let connections = AtomicU64::new(0);
        while !stop.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let n = connections.fetch_add(1, Ordering::Relaxed);
                    self.spawn_connection(n, stream, peer);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    warn!(target: "tether::server", "accept failed: {e}");
                    thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }
        info!(target: "tether::server", "acceptor stopped");
    }

    fn spawn_connection(&self, n: u64, stream: TcpStream, peer: SocketAddr) {
        let surface = Arc::clone(&self.surface);
        let max_line_bytes = self.config.max_line_bytes;
        let spawned = thread::Builder::new()
            .name(format!("tether-conn-{n}"))
            .spawn(move || {
                info!(target: "tether::server", "{peer} connected");
                if let Err(e) = serve_connection(&surface, stream, max_line_bytes) {
                    debug!(target: "tether::server", "{peer}: {e}");
                }
                info!(target: "tether::server", "{peer} disconnected");
            });
        if let Err(e) = spawned {
            warn!(target: "tether::server", "cannot serve {peer}: {e}");
        }
    }
}

/// Read request lines from `stream` until EOF, answering each in turn.
///
/// Lines are read as raw bytes, so an oversized line or one that is not
/// UTF-8 gets an error response and the connection stays open.
fn serve_connection(
    surface: &ControlSurface,
    stream: TcpStream,
    max_line_bytes: usize,
) -> io::Result<()> {
    // Accepted sockets may inherit the listener's non-blocking mode.
    stream.set_nonblocking(false)?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let limit = u64::try_from(max_line_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
        if n == 0 {
            return Ok(());
        }
        let complete = line.last() == Some(&b'\n');
        let body = trim_newline(&line);
        let response = if body.len() > max_line_bytes {
            if !complete {
                skip_line(&mut reader)?;
            }
            WireResponse::malformed(format!("request line exceeds {max_line_bytes} bytes"))
        } else {
            match std::str::from_utf8(body) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => protocol::handle_line(surface, text),
                Err(e) => WireResponse::malformed(format!("request line is not UTF-8: {e}")),
            }
        };
        writeln!(writer, "{}", response.to_line())?;
        writer.flush()?;
    }
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Discard input up to and including the next newline.
fn skip_line(reader: &mut impl BufRead) -> io::Result<()> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}

// ── ServerHandle ─────────────────────────────────────────────────

/// Handle to a server started with [`Server::spawn`].
///
/// Dropping the handle stops accepting new connections. Connections
/// already open are served until their peers hang up.
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and join the acceptor thread.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: "tether::server", "acceptor thread panicked");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
