//! String-typed entry points of the control surface.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use tether_core::{ClockState, Command, ErrorKind, TilePos};
use tether_engine::HostConfig;
use tether_surface::{ControlSurface, Reply};
use tether_test_utils::{fixtures, CallLog, GridWorld};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start(world: GridWorld) -> (ControlSurface, CallLog) {
    init_logging();
    let log = world.call_log();
    let config = HostConfig {
        tick_rate_hz: 200.0,
        ..HostConfig::default()
    };
    (ControlSurface::start(world, config).unwrap(), log)
}

fn call(surface: &ControlSurface, name: &str, args: &[&str]) -> Result<Reply, ErrorKind> {
    surface
        .call(&Command::new(name, args.iter().copied()))
        .map_err(|e| e.kind())
}

// ── Observation ──────────────────────────────────────────────────

#[test]
fn both_encodings_decode_to_the_same_observation() {
    let (surface, _) = start(fixtures::farm());
    surface.pause().unwrap();
    for radius in ["0", "1", "3", "20"] {
        let bytes = surface.observe(radius).unwrap();
        let text = surface.observe_v2(radius).unwrap();
        let from_bytes = tether_obs::binary::decode(&bytes).unwrap();
        let from_text = tether_obs::text::decode(&text).unwrap();
        assert_eq!(from_bytes, from_text, "radius {radius}");
    }
}

#[test]
fn bad_radius_never_reaches_the_facade() {
    let (surface, log) = start(fixtures::farm());
    for bad in ["-1", "abc", "", "2.0", "99999999999"] {
        assert_eq!(
            surface.observe(bad).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            surface.observe_v2(bad).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            surface.get_surroundings(bad).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }
    assert_eq!(log.count("snapshot"), 0);
}

#[test]
fn surroundings_at_zero_are_empty() {
    let (surface, _) = start(fixtures::farm());
    assert!(surface.get_surroundings("0").unwrap().is_empty());
    let tiles = surface.get_surroundings("1").unwrap();
    assert_eq!(tiles.len(), 9);
    assert_eq!(tiles[0].position, TilePos::new(7, 7));
    assert_eq!(tiles[8].position, TilePos::new(9, 9));
}

// ── Actions ──────────────────────────────────────────────────────

#[test]
fn unknown_recipe_is_an_unsuccessful_result() {
    let (surface, _) = start(fixtures::farm());
    let Ok(Reply::Action(result)) = call(&surface, "craft", &["unknown_item"]) else {
        panic!("craft did not return an action result");
    };
    assert!(!result.succeeded);
}

#[test]
fn out_of_range_item_is_item_not_found() {
    let (surface, log) = start(fixtures::farm());
    assert_eq!(call(&surface, "drop_in", &["99"]), Err(ErrorKind::ItemNotFound));
    assert_eq!(call(&surface, "attach", &["11"]), Err(ErrorKind::ItemNotFound));
    assert!(log.mutations().is_empty(), "{:?}", log.entries());
}

#[test]
fn malformed_calls_are_classified() {
    let (surface, log) = start(fixtures::farm());
    assert_eq!(call(&surface, "fly", &[]), Err(ErrorKind::UnknownCommand));
    assert_eq!(call(&surface, "move", &[]), Err(ErrorKind::InvalidArgument));
    assert_eq!(
        call(&surface, "move", &["north"]),
        Err(ErrorKind::InvalidArgument)
    );
    assert_eq!(
        call(&surface, "turn", &["up", "down"]),
        Err(ErrorKind::InvalidArgument)
    );
    assert_eq!(
        call(&surface, "leftClick", &["3"]),
        Err(ErrorKind::InvalidArgument)
    );
    assert_eq!(
        call(&surface, "drop_in", &["-1"]),
        Err(ErrorKind::InvalidArgument)
    );
    assert!(log.entries().is_empty(), "{:?}", log.entries());
}

#[test]
fn blocked_moves_leave_the_actor_in_place() {
    let (surface, _) = start(fixtures::farm().with_ticks_per_step(5));
    // Weeds above, a chest to the right.
    let Ok(Reply::Action(blocked)) = call(&surface, "move", &["UP"]) else {
        panic!("move did not return an action result");
    };
    assert!(!blocked.succeeded);

    assert!(matches!(call(&surface, "move", &["Right"]), Ok(Reply::Action(r)) if !r.succeeded));
    let obs = tether_obs::text::decode(&surface.observe_v2("0").unwrap()).unwrap();
    assert_eq!(obs.actor.position, TilePos::new(8, 8));
    assert_eq!(obs.actor.facing, tether_core::Direction::Right);
}

#[test]
fn move_returns_after_the_step_completes() {
    let (surface, _) = start(GridWorld::new(5, 5).with_ticks_per_step(8));
    let Ok(Reply::Action(result)) = call(&surface, "move", &["down"]) else {
        panic!("move did not return an action result");
    };
    assert!(result.succeeded);
    let text = surface.observe_v2("0").unwrap();
    let obs = tether_obs::text::decode(&text).unwrap();
    assert_eq!(obs.actor.position, TilePos::new(2, 3));
    assert!(obs.tick.0 >= 8);
}

#[test]
fn second_move_is_action_in_progress() {
    let (surface, log) = start(GridWorld::new(9, 9));
    let surface = Arc::new(surface);
    surface.pause().unwrap();

    let mover = {
        let surface = Arc::clone(&surface);
        thread::spawn(move || call(&surface, "move", &["left"]))
    };
    let deadline = Instant::now() + Duration::from_secs(2);
    while log.count("start_move") == 0 {
        assert!(Instant::now() < deadline, "move never started");
        thread::sleep(Duration::from_millis(1));
    }
    for direction in ["up", "down", "left", "right"] {
        assert_eq!(
            call(&surface, "move", &[direction]),
            Err(ErrorKind::ActionInProgress)
        );
    }
    surface.resume().unwrap();
    assert!(matches!(mover.join().unwrap(), Ok(Reply::Action(r)) if r.succeeded));
}

// ── Clock ────────────────────────────────────────────────────────

#[test]
fn pause_and_resume_are_idempotent() {
    let (surface, _) = start(GridWorld::new(3, 3));
    surface.resume().unwrap();
    assert_eq!(surface.clock_state().unwrap(), ClockState::Running);
    surface.pause().unwrap();
    surface.pause().unwrap();
    assert_eq!(surface.clock_state().unwrap(), ClockState::Paused);
    assert_eq!(call(&surface, "resume", &[]), Ok(Reply::Unit));
    assert_eq!(surface.clock_state().unwrap(), ClockState::Running);
}

#[test]
fn paused_world_does_not_advance() {
    let (surface, _) = start(GridWorld::new(3, 3));
    surface.pause().unwrap();
    let tick = |s: &ControlSurface| {
        tether_obs::binary::decode(&s.observe("0").unwrap())
            .unwrap()
            .tick
    };
    let before = tick(&surface);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(tick(&surface), before);
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_non_negative_radius_encodes_consistently(radius in 0u32..12) {
        let (surface, _) = start(fixtures::farm());
        surface.pause().unwrap();
        let token = radius.to_string();
        let bytes = surface.observe(&token).unwrap();
        let text = surface.observe_v2(&token).unwrap();
        prop_assert_eq!(
            tether_obs::binary::decode(&bytes).unwrap(),
            tether_obs::text::decode(&text).unwrap()
        );
    }

    #[test]
    fn any_negative_radius_is_invalid(radius in i32::MIN..0) {
        let (surface, log) = start(GridWorld::new(3, 3));
        let token = radius.to_string();
        prop_assert_eq!(
            surface.get_surroundings(&token).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        prop_assert_eq!(log.count("snapshot"), 0);
    }
}
