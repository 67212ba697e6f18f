//! Reusable items, worlds and observations.

use tether_core::{
    ActorState, ClockState, Direction, GameTime, InventoryItem, InventorySlot, ItemIndex,
    Observation, TickId, TileInfo, TilePos,
};

use crate::GridWorld;

pub fn hoe() -> InventoryItem {
    InventoryItem {
        name: "Hoe".into(),
        category: "Tool".into(),
        stack: 1,
        attachable: false,
    }
}

pub fn parsnip_seeds(stack: u32) -> InventoryItem {
    InventoryItem {
        name: "Parsnip Seeds".into(),
        category: "Seed".into(),
        stack,
        attachable: false,
    }
}

pub fn bait(stack: u32) -> InventoryItem {
    InventoryItem {
        name: "Bait".into(),
        category: "Bait".into(),
        stack,
        attachable: true,
    }
}

pub fn salad(stack: u32) -> InventoryItem {
    InventoryItem {
        name: "Salad".into(),
        category: "Food".into(),
        stack,
        attachable: false,
    }
}

/// A `width` × `height` field with a starter kit.
///
/// Slots 0..=3 hold a hoe, 15 parsnip seeds, 10 bait and 2 salads. The
/// "Chest" recipe is known, one seed listing is stocked at 20, and the
/// calendar starts on day 1 at 6:00.
pub fn starter(width: u32, height: u32) -> GridWorld {
    GridWorld::new(width, height)
        .with_item(0, hoe())
        .with_item(1, parsnip_seeds(15))
        .with_item(2, bait(10))
        .with_item(3, salad(2))
        .with_recipe("Chest")
        .with_stock(parsnip_seeds(1), 20)
        .with_game_time(GameTime {
            day: 1,
            time_of_day: 600,
        })
}

/// A 16 × 16 starter farm with a little of everything.
///
/// The actor stands at (8, 8) facing down, holding a hoe. There is a
/// furnace below the actor, a chest to the right, a character to the
/// left, debris above, and a patch of dirt further out.
pub fn farm() -> GridWorld {
    starter(16, 16)
        .with_actor_at(TilePos::new(8, 8))
        .with_facing(Direction::Down)
        .with_object(TilePos::new(8, 9), "Furnace")
        .with_object(TilePos::new(9, 8), "Chest")
        .with_npc(TilePos::new(7, 8), "Robin")
        .with_object(TilePos::new(8, 7), "Weeds")
        .with_terrain(TilePos::new(10, 10), "Dirt")
}

/// A hand-built observation exercising every optional field.
pub fn sample_observation() -> Observation {
    Observation {
        tick: TickId(42),
        radius: 1,
        clock: ClockState::Running,
        actor: ActorState {
            location: "Farm".into(),
            position: TilePos::new(3, 3),
            facing: Direction::Right,
            health: 95,
            max_health: 100,
            energy: 180,
            max_energy: 270,
            money: 625,
            selected_slot: ItemIndex(0),
            inventory: vec![
                InventorySlot {
                    index: ItemIndex(0),
                    item: Some(hoe()),
                },
                InventorySlot {
                    index: ItemIndex(1),
                    item: None,
                },
            ],
        },
        surroundings: vec![
            TileInfo {
                position: TilePos::new(3, 2),
                terrain: "Grass".into(),
                object: Some("Weeds".into()),
                npc: None,
                passable: false,
            },
            TileInfo {
                position: TilePos::new(4, 3),
                terrain: "Grass".into(),
                object: None,
                npc: Some("Robin".into()),
                passable: false,
            },
        ],
        game_time: Some(GameTime {
            day: 2,
            time_of_day: 1310,
        }),
    }
}
