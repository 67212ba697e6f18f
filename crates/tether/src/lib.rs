//! Tether: a control bridge between external agents and a live simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tether sub-crates. An agent sends named actions with string
//! arguments; Tether validates them, runs them against the simulation
//! through a [`SimulationFacade`](prelude::SimulationFacade), and hands back
//! observations in a compact binary or a JSON encoding.
//!
//! # Quick start
//!
//! ```rust
//! use tether::prelude::*;
//!
//! // A one-row corridor the actor can walk along.
//! struct Corridor {
//!     x: i32,
//!     walking: Option<i32>,
//!     tick: u64,
//! }
//!
//! impl SimulationFacade for Corridor {
//!     fn tick(&mut self) {
//!         self.tick += 1;
//!     }
//!     fn start_move(&mut self, _: &SimulationClock, d: Direction) -> Result<(), Rejection> {
//!         match d {
//!             Direction::Left | Direction::Right => {
//!                 self.walking = Some(self.x + d.offset().0);
//!                 Ok(())
//!             }
//!             _ => Err(Rejection::new("walls")),
//!         }
//!     }
//!     fn poll_move(&mut self) -> MoveStatus {
//!         match self.walking.take() {
//!             Some(x) => {
//!                 self.x = x;
//!                 MoveStatus::Completed
//!             }
//!             None => MoveStatus::Obstructed { reason: "not walking".into() },
//!         }
//!     }
//!     fn inventory_item(&self, _: ItemIndex) -> Option<InventoryItem> {
//!         None
//!     }
//!     fn perform(&mut self, _: &SimulationClock, a: &Action) -> Result<Option<String>, Rejection> {
//!         Err(Rejection::new(format!("{a} is not supported here")))
//!     }
//!     fn snapshot(&self, _: &SimulationClock, _radius: u32) -> Result<WorldView, Rejection> {
//!         Ok(WorldView {
//!             tick: TickId(self.tick),
//!             actor: ActorState {
//!                 location: "Corridor".into(),
//!                 position: TilePos::new(self.x, 0),
//!                 facing: Direction::Right,
//!                 health: 100,
//!                 max_health: 100,
//!                 energy: 100,
//!                 max_energy: 100,
//!                 money: 0,
//!                 selected_slot: ItemIndex(0),
//!                 inventory: Vec::new(),
//!             },
//!             tiles: Vec::new(),
//!             game_time: None,
//!         })
//!     }
//! }
//!
//! let world = Corridor { x: 0, walking: None, tick: 0 };
//! let mut bridge = LockstepBridge::new(world, HostConfig::default()).unwrap();
//!
//! // Remote calls arrive as strings and are decoded once.
//! let request = Request::parse(&Command::new("move", ["right"])).unwrap();
//! let Request::Action(action) = request else { unreachable!() };
//! assert!(bridge.act(&action).unwrap().succeeded);
//!
//! let obs = bridge.observe(0).unwrap();
//! assert_eq!(obs.actor.position, TilePos::new(1, 0));
//! assert_eq!(obs.tick, TickId(1));
//!
//! // Both encodings carry the same observation.
//! let bytes = tether::obs::binary::encode(&obs).unwrap();
//! let text = tether::obs::text::encode(&obs).unwrap();
//! assert_eq!(
//!     tether::obs::binary::decode(&bytes).unwrap(),
//!     tether::obs::text::decode(&text).unwrap(),
//! );
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | IDs, argument codec, commands, errors, facade trait |
//! | [`obs`] | `tether-obs` | Observation capture, binary and JSON encodings |
//! | [`engine`] | `tether-engine` | Threaded host and lockstep bridge |
//! | [`surface`] | `tether-surface` | Control surface, status codes, JSON-lines server |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, the argument codec, and the facade trait (`tether-core`).
pub use tether_core as types;

/// Observation capture and encoding (`tether-obs`).
///
/// [`obs::binary`] is the compact "TOBS" format; [`obs::text`] is JSON.
pub use tether_obs as obs;

/// Simulation hosting (`tether-engine`).
///
/// [`engine::SimulationHost`] runs the facade on its own thread;
/// [`engine::LockstepBridge`] drives it on the caller's.
pub use tether_engine as engine;

/// Remote access (`tether-surface`).
pub use tether_surface as surface;

/// Common imports for typical Tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Commands and requests
    pub use tether_core::{Action, ActionResult, Command, Query, Request};

    // Identifiers
    pub use tether_core::{Direction, ItemIndex, TickId, TilePos};

    // Facade
    pub use tether_core::{MoveStatus, Rejection, SimulationClock, SimulationFacade};

    // Observation values
    pub use tether_core::{
        ActorState, ClockState, GameTime, InventoryItem, InventorySlot, Observation, TileInfo,
        WorldView,
    };

    // Errors
    pub use tether_core::{BridgeError, ErrorKind};

    // Engine
    pub use tether_engine::{HostConfig, LockstepBridge, SimulationHost};

    // Surface
    pub use tether_surface::{BridgeStatus, ControlSurface, Reply};
}
