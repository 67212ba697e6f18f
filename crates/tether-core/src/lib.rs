//! Core types and traits for the Tether control bridge.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! argument codec, typed commands, the simulation clock, observation
//! value types, error types, and the [`SimulationFacade`] trait that the
//! rest of the workspace drives.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod args;
pub mod command;
pub mod error;
pub mod facade;
pub mod id;
pub mod observation;

pub use args::{ArgCursor, ArgKind, TypedArgument};
pub use command::{
    Action, ActionResult, ClockState, Command, Fixture, Query, Request, SimulationClock,
};
pub use error::{ArgError, BridgeError, CodecError, ErrorKind};
pub use facade::{MoveStatus, Rejection, SimulationFacade};
pub use id::{Direction, ItemIndex, TickId, TilePos};
pub use observation::{
    ActorState, GameTime, InventoryItem, InventorySlot, Observation, TileInfo, WorldView,
};
