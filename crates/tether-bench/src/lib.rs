//! Benchmark profiles for the Tether control bridge.
//!
//! - [`busy_world`]: a square sandbox with scattered objects and characters
//! - [`observation_profile`]: a captured observation at a given radius
//! - [`command_mix`]: a representative set of remote calls

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tether_core::{Command, Observation, Rejection, SimulationClock, TilePos};
use tether_test_utils::{fixtures, GridWorld};

const OBJECTS: [&str; 4] = ["Stone", "Weeds", "Twig", "Chest"];

/// A `side` × `side` starter sandbox with an object on every seventh
/// tile and a character on every thirteenth.
pub fn busy_world(side: u32) -> GridWorld {
    let side_i = i32::try_from(side).unwrap_or(i32::MAX);
    let mut world = fixtures::starter(side, side);
    for y in 0..side_i {
        for x in 0..side_i {
            let n = y.wrapping_mul(side_i).wrapping_add(x);
            let pos = TilePos::new(x, y);
            if pos == world.actor().position {
                continue;
            }
            if n % 13 == 0 {
                world = world.with_npc(pos, "Villager");
            } else if n % 7 == 0 {
                world = world.with_object(pos, OBJECTS[(n as usize / 7) % OBJECTS.len()]);
            }
        }
    }
    world
}

/// Capture an observation of a 64 × 64 busy world at `radius`.
pub fn observation_profile(radius: u32) -> Result<Observation, Rejection> {
    tether_obs::capture(&busy_world(64), &SimulationClock::new(), radius)
}

/// One command of each argument shape, plus two queries.
pub fn command_mix() -> Vec<Command> {
    vec![
        Command::new("move", ["up"]),
        Command::new("turn", ["Left"]),
        Command::new("use_tool", ["12", "-4"]),
        Command::new("drop_in", ["3"]),
        Command::new("craft", ["Chest"]),
        Command::new("buy_from_shop", ["0", "5"]),
        Command::new("buy_from_animals_shop", ["1", "2", "Daisy"]),
        Command::new("answer_question", ["Yes", "Shall we?", "Are you sure?"]),
        Command::new("observe", ["8"]),
        Command::new("pause", Vec::<String>::new()),
    ]
}
