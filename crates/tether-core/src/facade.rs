//! The simulation facade: the seam between Tether and the simulated world.
//!
//! Tether never implements gameplay. A [`SimulationFacade`] wraps the
//! external engine and is owned exclusively by the simulation thread, so
//! every method runs between ticks with no concurrent Tether activity.

use std::error::Error;
use std::fmt;

use crate::command::{Action, SimulationClock};
use crate::id::{Direction, ItemIndex};
use crate::observation::{InventoryItem, WorldView};

/// The facade declined a request.
///
/// For actions this becomes an unsuccessful
/// [`ActionResult`](crate::ActionResult); for snapshot reads it becomes
/// [`BridgeError::FacadeRejected`](crate::BridgeError::FacadeRejected).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Human-readable reason.
    pub reason: String,
}

impl Rejection {
    /// Build a rejection from any string-like reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl Error for Rejection {}

/// Progress of the outstanding movement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveStatus {
    /// Still walking.
    InProgress,
    /// Arrived at the target tile.
    Completed,
    /// Stopped before arriving.
    Obstructed {
        /// What blocked the movement.
        reason: String,
    },
}

impl MoveStatus {
    /// Whether the movement has finished, either way.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// The external simulation engine as Tether sees it.
///
/// # Threading
///
/// The host moves the facade onto its simulation thread and calls it from
/// there only. Methods take `&mut self` for anything that may change the
/// world and `&self` for reads.
///
/// # Snapshot consistency
///
/// [`snapshot`](SimulationFacade::snapshot) is called exactly once per
/// observation request, between two calls to
/// [`tick`](SimulationFacade::tick), with no Tether-issued mutation in
/// progress. If the engine behind the facade mutates its state from
/// threads of its own, those writes can interleave with the read; such a
/// facade must copy its state under its own lock to present a consistent
/// snapshot. Tether cannot close that window from outside.
pub trait SimulationFacade: Send {
    /// Advance the world by one step. Called only while the clock runs.
    fn tick(&mut self);

    /// Mirror the clock state into the engine.
    ///
    /// Called once per pause/resume transition.
    fn set_paused(&mut self, _paused: bool) {}

    /// Begin walking one tile in `direction`.
    ///
    /// An `Err` means the movement never started; the host reports it as
    /// an unsuccessful result without polling.
    fn start_move(&mut self, clock: &SimulationClock, direction: Direction)
        -> Result<(), Rejection>;

    /// Poll the movement started by the last successful
    /// [`start_move`](SimulationFacade::start_move). Called once after
    /// every tick while a movement is outstanding.
    fn poll_move(&mut self) -> MoveStatus;

    /// Look up the item in an inventory slot.
    ///
    /// `None` if the index is out of range or the slot is empty.
    fn inventory_item(&self, index: ItemIndex) -> Option<InventoryItem>;

    /// Perform a synchronous action.
    ///
    /// Never called with [`Action::Move`]. `Ok` carries optional detail
    /// for the caller; `Err` means the simulation refused the action.
    fn perform(&mut self, clock: &SimulationClock, action: &Action)
        -> Result<Option<String>, Rejection>;

    /// Read a snapshot of the actor and the tiles within `radius`.
    ///
    /// May return extra tiles and in any order; the observation encoder
    /// filters and orders them.
    fn snapshot(&self, clock: &SimulationClock, radius: u32) -> Result<WorldView, Rejection>;
}

impl<F: SimulationFacade + ?Sized> SimulationFacade for Box<F> {
    fn tick(&mut self) {
        (**self).tick();
    }

    fn set_paused(&mut self, paused: bool) {
        (**self).set_paused(paused);
    }

    fn start_move(
        &mut self,
        clock: &SimulationClock,
        direction: Direction,
    ) -> Result<(), Rejection> {
        (**self).start_move(clock, direction)
    }

    fn poll_move(&mut self) -> MoveStatus {
        (**self).poll_move()
    }

    fn inventory_item(&self, index: ItemIndex) -> Option<InventoryItem> {
        (**self).inventory_item(index)
    }

    fn perform(
        &mut self,
        clock: &SimulationClock,
        action: &Action,
    ) -> Result<Option<String>, Rejection> {
        (**self).perform(clock, action)
    }

    fn snapshot(&self, clock: &SimulationClock, radius: u32) -> Result<WorldView, Rejection> {
        (**self).snapshot(clock, radius)
    }
}
