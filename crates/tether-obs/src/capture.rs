//! Snapshot capture: one facade read, shaped into an [`Observation`].

use tether_core::{
    ClockState, Observation, Rejection, SimulationClock, SimulationFacade, TileInfo, WorldView,
};

/// Read the facade exactly once and shape the result.
///
/// Must be called on the thread that owns the facade, between ticks.
pub fn capture<F>(
    facade: &F,
    clock: &SimulationClock,
    radius: u32,
) -> Result<Observation, Rejection>
where
    F: SimulationFacade + ?Sized,
{
    let view = facade.snapshot(clock, radius)?;
    Ok(shape(view, radius, clock.state()))
}

/// Turn a raw facade view into a canonical observation.
///
/// Drops tiles farther than `radius` (Chebyshev) from the actor, drops
/// every tile at radius 0, and orders the rest row-major. The sort is
/// stable, so tiles sharing a position keep their discovery order.
pub fn shape(view: WorldView, radius: u32, clock: ClockState) -> Observation {
    let WorldView {
        tick,
        actor,
        tiles,
        game_time,
    } = view;

    let surroundings = if radius == 0 {
        Vec::new()
    } else {
        let centre = actor.position;
        let mut kept: Vec<TileInfo> = tiles
            .into_iter()
            .filter(|t| t.position.chebyshev(centre) <= radius)
            .collect();
        kept.sort_by_key(|t| t.position.row_major());
        kept
    };

    Observation {
        tick,
        radius,
        clock,
        actor,
        surroundings,
        game_time,
    }
}
