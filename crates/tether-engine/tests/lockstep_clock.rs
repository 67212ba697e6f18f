//! Lockstep bridge: clock transitions against a model, and action flows.

use proptest::prelude::*;

use tether_core::{Action, ClockState, Direction, ErrorKind, ItemIndex, TickId, TilePos};
use tether_engine::{HostConfig, LockstepBridge};
use tether_test_utils::{fixtures, GridWorld};

#[derive(Clone, Copy, Debug)]
enum Op {
    Pause,
    Resume,
    Step,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Pause), Just(Op::Resume), Just(Op::Step)]
}

proptest! {
    #[test]
    fn clock_matches_model(ops in prop::collection::vec(op(), 0..40)) {
        let world = GridWorld::new(3, 3);
        let log = world.call_log();
        let mut bridge = LockstepBridge::new(world, HostConfig::default()).unwrap();

        let mut paused = false;
        let mut ticks = 0u64;
        let mut transitions = 0usize;
        for op in ops {
            match op {
                Op::Pause => {
                    transitions += usize::from(!paused);
                    paused = true;
                    prop_assert_eq!(bridge.pause(), ClockState::Paused);
                }
                Op::Resume => {
                    transitions += usize::from(paused);
                    paused = false;
                    prop_assert_eq!(bridge.resume(), ClockState::Running);
                }
                Op::Step => {
                    prop_assert_eq!(bridge.step(), !paused);
                    ticks += u64::from(!paused);
                }
            }
        }
        prop_assert_eq!(bridge.facade().current_tick(), TickId(ticks));
        prop_assert_eq!(bridge.facade().is_paused(), paused);
        prop_assert_eq!(log.count("set_paused"), transitions);
    }
}

#[test]
fn walk_a_square_returns_home() {
    let mut bridge =
        LockstepBridge::new(GridWorld::new(5, 5).with_ticks_per_step(2), HostConfig::default())
            .unwrap();
    for direction in [Direction::Up, Direction::Right, Direction::Down, Direction::Left] {
        assert!(bridge.act(&Action::Move(direction)).unwrap().succeeded);
    }
    assert_eq!(bridge.facade().actor().position, TilePos::new(2, 2));
    assert_eq!(bridge.facade().current_tick(), TickId(8));
}

#[test]
fn shop_flow_through_the_bridge() {
    let mut bridge = LockstepBridge::new(fixtures::farm(), HostConfig::default()).unwrap();
    let buy = Action::BuyFromShop {
        listing: 0,
        count: 5,
    };
    assert!(!bridge.act(&buy).unwrap().succeeded);

    let open = Action::OpenShop {
        shop: "SeedShop".into(),
        owner: "Pierre".into(),
    };
    assert!(bridge.act(&open).unwrap().succeeded);
    assert!(bridge.act(&buy).unwrap().succeeded);
    let actor = bridge.facade().actor();
    assert_eq!(actor.money, 400);
    assert_eq!(
        actor.inventory[1].item.as_ref().map(|i| i.stack),
        Some(20)
    );
}

#[test]
fn drop_in_consumes_from_the_slot() {
    let mut bridge = LockstepBridge::new(fixtures::farm(), HostConfig::default()).unwrap();
    let result = bridge.act(&Action::DropIn(ItemIndex(3))).unwrap();
    assert_eq!(result.detail.as_deref(), Some("dropped Salad into Furnace"));
    assert_eq!(
        bridge.facade().actor().inventory[3].item.as_ref().map(|i| i.stack),
        Some(1)
    );
    let err = bridge.act(&Action::DropIn(ItemIndex(5))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ItemNotFound);
}

#[test]
fn observation_follows_the_actor() {
    let mut bridge = LockstepBridge::new(fixtures::farm(), HostConfig::default()).unwrap();
    let before = bridge.observe(1).unwrap();
    assert!(before
        .surroundings
        .iter()
        .any(|t| t.npc.as_deref() == Some("Robin")));

    bridge.act(&Action::Move(Direction::Right)).unwrap();
    // The chest blocks the way, so nothing moved.
    assert_eq!(bridge.observe(0).unwrap().actor.position, TilePos::new(8, 8));
    assert_eq!(bridge.observe(0).unwrap().actor.facing, Direction::Right);
}
