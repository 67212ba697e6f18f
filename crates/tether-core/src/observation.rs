//! Observation value types.
//!
//! [`WorldView`] is what a facade hands back from one snapshot read. The
//! observation encoder turns it into an [`Observation`]: filtered to the
//! requested radius and put into canonical tile order. Both the binary and
//! the text encodings are derived from that single value.

use serde::{Deserialize, Serialize};

use crate::command::ClockState;
use crate::id::{Direction, ItemIndex, TickId, TilePos};

/// An item held in an inventory slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Display name.
    pub name: String,
    /// Category label (e.g. "Seed", "Tool").
    pub category: String,
    /// Stack size.
    pub stack: u32,
    /// Whether the item can be attached to a tool.
    pub attachable: bool,
}

/// One inventory slot; `item` is `None` when the slot is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    /// Slot index.
    pub index: ItemIndex,
    /// Slot content.
    pub item: Option<InventoryItem>,
}

/// The controlled actor's state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    /// Name of the location the actor is in.
    pub location: String,
    /// Tile the actor stands on.
    pub position: TilePos,
    /// Direction the actor faces.
    pub facing: Direction,
    /// Current health.
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Current energy.
    pub energy: i32,
    /// Maximum energy.
    pub max_energy: i32,
    /// Money held.
    pub money: i64,
    /// Currently selected inventory slot.
    pub selected_slot: ItemIndex,
    /// Inventory slots in index order.
    pub inventory: Vec<InventorySlot>,
}

/// A tile within the observation neighborhood.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInfo {
    /// Tile coordinate.
    pub position: TilePos,
    /// Terrain label.
    pub terrain: String,
    /// Object occupying the tile, if any.
    pub object: Option<String>,
    /// Character standing on the tile, if any.
    pub npc: Option<String>,
    /// Whether the actor can walk onto the tile.
    pub passable: bool,
}

/// In-game calendar time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTime {
    /// Day counter.
    pub day: u32,
    /// Clock time of day (e.g. 630 for 6:30).
    pub time_of_day: u32,
}

/// A point-in-time snapshot as the facade reports it.
///
/// `tiles` may contain tiles outside the requested radius and in any
/// order; the order in which they appear is their discovery order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldView {
    /// Tick at which the snapshot was taken.
    pub tick: TickId,
    /// Actor state.
    pub actor: ActorState,
    /// Nearby tiles in discovery order.
    pub tiles: Vec<TileInfo>,
    /// Calendar time, if the facade tracks one.
    pub game_time: Option<GameTime>,
}

/// An immutable observation at a fixed radius.
///
/// Invariants upheld by construction through the capture step:
/// every tile lies within `radius` (Chebyshev distance) of the actor,
/// and tiles are ordered row-major with ties in discovery order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Tick at which the snapshot was taken.
    pub tick: TickId,
    /// Radius the neighborhood was captured at.
    pub radius: u32,
    /// Clock state at capture.
    pub clock: ClockState,
    /// Actor state.
    pub actor: ActorState,
    /// Neighborhood tiles in canonical order.
    pub surroundings: Vec<TileInfo>,
    /// Calendar time; absent from payloads written without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<GameTime>,
}
