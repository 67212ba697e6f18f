//! Simulation host for the Tether control bridge.
//!
//! Owns the facade and the simulation clock, dispatches typed actions,
//! manages the one asynchronous movement, and captures observations
//! between ticks. Supports both a threaded mode ([`SimulationHost`]) and
//! a lockstep mode ([`LockstepBridge`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod host;
pub mod lockstep;
mod sim_thread;

pub use config::{ConfigError, HostConfig};
pub use dispatch::Dispatcher;
pub use host::{ShutdownReport, SimulationHost};
pub use lockstep::LockstepBridge;
pub use sim_thread::SimStats;
