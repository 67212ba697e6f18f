//! Control surface and remote access for the Tether control bridge.
//!
//! [`ControlSurface`] turns string-typed remote calls into typed
//! requests against a running [`SimulationHost`](tether_engine::SimulationHost).
//! [`protocol`] frames those calls as JSON lines and [`server`] serves
//! them over TCP. Failures carry a stable [`ErrorKind`](tether_core::ErrorKind)
//! name and a [`BridgeStatus`] code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod protocol;
pub mod server;
pub mod status;
pub mod surface;

pub use protocol::{WireError, WireRequest, WireResponse};
pub use server::{Server, ServerConfig, ServerError, ServerHandle};
pub use status::BridgeStatus;
pub use surface::{ControlSurface, Reply};
