//! Action dispatch against an owned facade.
//!
//! [`Dispatcher`] owns the facade and the simulation clock. It is the
//! only code that calls into the facade; both the threaded
//! [`SimulationHost`](crate::SimulationHost) and the synchronous
//! [`LockstepBridge`](crate::LockstepBridge) drive one.
//!
//! Synchronous actions resolve any referenced inventory slot first and
//! fail with [`BridgeError::ItemNotFound`] before the facade is asked to
//! do anything. A facade refusal is an unsuccessful [`ActionResult`],
//! never an error.

use log::{debug, trace};

use tether_core::{
    Action, ActionResult, BridgeError, ClockState, Direction, MoveStatus, Observation,
    SimulationClock, SimulationFacade,
};

/// Owns the facade, the clock, and the state of the one movement.
pub struct Dispatcher<F> {
    facade: F,
    clock: SimulationClock,
    moving: Option<Direction>,
}

impl<F: SimulationFacade> Dispatcher<F> {
    /// Take ownership of a facade. The clock starts running.
    pub fn new(facade: F) -> Self {
        Self {
            facade,
            clock: SimulationClock::new(),
            moving: None,
        }
    }

    /// The simulation clock.
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Read access to the facade.
    pub fn facade(&self) -> &F {
        &self.facade
    }

    /// Give the facade back.
    pub fn into_facade(self) -> F {
        self.facade
    }

    /// Whether a movement is outstanding.
    pub fn is_moving(&self) -> bool {
        self.moving.is_some()
    }

    /// Perform a synchronous action.
    ///
    /// [`Action::Move`] is rejected here with
    /// [`BridgeError::Internal`]; movement goes through
    /// [`begin_move`](Dispatcher::begin_move).
    pub fn perform(&mut self, action: &Action) -> Result<ActionResult, BridgeError> {
        if action.is_move() {
            return Err(BridgeError::Internal {
                reason: "move dispatched as a synchronous action".into(),
            });
        }
        if let Some(index) = action.item_ref() {
            if self.facade.inventory_item(index).is_none() {
                debug!(target: "tether::engine", "{action}: no item in slot {index}");
                return Err(BridgeError::ItemNotFound { index });
            }
        }
        let result = match self.facade.perform(&self.clock, action) {
            Ok(detail) => ActionResult::ok_with(detail),
            Err(rejection) => {
                debug!(target: "tether::engine", "{action} rejected: {rejection}");
                ActionResult::rejected(rejection.reason)
            }
        };
        Ok(result)
    }

    /// Start the movement.
    ///
    /// `Ok(None)` means the movement is now outstanding and will finish in
    /// a later [`poll_move`](Dispatcher::poll_move). `Ok(Some(_))` means it
    /// finished immediately because the facade refused to start it.
    pub fn begin_move(&mut self, direction: Direction) -> Result<Option<ActionResult>, BridgeError> {
        if self.moving.is_some() {
            return Err(BridgeError::ActionInProgress);
        }
        match self.facade.start_move(&self.clock, direction) {
            Ok(()) => {
                debug!(target: "tether::engine", "move {direction} started");
                self.moving = Some(direction);
                Ok(None)
            }
            Err(rejection) => {
                debug!(target: "tether::engine", "move {direction} refused: {rejection}");
                Ok(Some(ActionResult::rejected(rejection.reason)))
            }
        }
    }

    /// Check the outstanding movement, if any.
    ///
    /// Returns the final result once the facade reports completion or
    /// obstruction; `None` while walking or when nothing is outstanding.
    pub fn poll_move(&mut self) -> Option<ActionResult> {
        let direction = self.moving?;
        let result = match self.facade.poll_move() {
            MoveStatus::InProgress => return None,
            MoveStatus::Completed => ActionResult::ok(),
            MoveStatus::Obstructed { reason } => ActionResult::rejected(reason),
        };
        debug!(
            target: "tether::engine",
            "move {direction} finished, succeeded={}", result.succeeded
        );
        self.moving = None;
        Some(result)
    }

    /// Advance the world one tick if the clock runs.
    ///
    /// Returns whether a tick happened.
    pub fn tick(&mut self) -> bool {
        if !self.clock.is_running() {
            return false;
        }
        self.facade.tick();
        true
    }

    /// Capture an observation between ticks.
    pub fn observe(&self, radius: u32) -> Result<Observation, BridgeError> {
        trace!(target: "tether::engine", "capture radius={radius}");
        tether_obs::capture(&self.facade, &self.clock, radius).map_err(|r| {
            BridgeError::FacadeRejected {
                reason: r.reason,
            }
        })
    }

    /// Running → Paused. Idempotent.
    pub fn pause(&mut self) -> ClockState {
        if self.clock.pause() {
            debug!(target: "tether::engine", "clock paused");
            self.facade.set_paused(true);
        }
        self.clock.state()
    }

    /// Paused → Running. Idempotent.
    pub fn resume(&mut self) -> ClockState {
        if self.clock.resume() {
            debug!(target: "tether::engine", "clock resumed");
            self.facade.set_paused(false);
        }
        self.clock.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ErrorKind, ItemIndex, TilePos};
    use tether_test_utils::{fixtures, GridWorld};

    #[test]
    fn missing_item_fails_before_any_mutation() {
        let world = fixtures::farm();
        let log = world.call_log();
        let mut d = Dispatcher::new(world);
        for action in [Action::DropIn(ItemIndex(40)), Action::Attach(ItemIndex(11))] {
            let err = d.perform(&action).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ItemNotFound);
        }
        assert!(log.mutations().is_empty(), "{:?}", log.entries());
        assert_eq!(log.count("inventory_item"), 2);
    }

    #[test]
    fn facade_refusal_is_unsuccessful_result() {
        let mut d = Dispatcher::new(fixtures::farm());
        let result = d
            .perform(&Action::Craft {
                item: "unknown_item".into(),
            })
            .unwrap();
        assert!(!result.succeeded);
        assert!(result.detail.unwrap().contains("unknown_item"));
    }

    #[test]
    fn drop_in_reaches_facade_with_valid_item() {
        let mut d = Dispatcher::new(fixtures::farm());
        let result = d.perform(&Action::DropIn(ItemIndex(1))).unwrap();
        assert!(result.succeeded, "{result:?}");
        assert_eq!(
            result.detail.as_deref(),
            Some("dropped Parsnip Seeds into Furnace")
        );
    }

    #[test]
    fn move_is_not_a_synchronous_action() {
        let mut d = Dispatcher::new(GridWorld::new(3, 3));
        let err = d.perform(&Action::Move(Direction::Up)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn movement_completes_through_polling() {
        let mut d = Dispatcher::new(GridWorld::new(5, 5).with_ticks_per_step(2));
        assert_eq!(d.begin_move(Direction::Right), Ok(None));
        assert_eq!(
            d.begin_move(Direction::Left),
            Err(BridgeError::ActionInProgress)
        );
        assert!(d.tick());
        assert_eq!(d.poll_move(), None);
        assert!(d.tick());
        assert_eq!(d.poll_move(), Some(ActionResult::ok()));
        assert!(!d.is_moving());
        assert_eq!(d.facade().actor().position, TilePos::new(3, 2));
    }

    #[test]
    fn paused_clock_does_not_tick() {
        let world = GridWorld::new(3, 3);
        let log = world.call_log();
        let mut d = Dispatcher::new(world);
        assert_eq!(d.pause(), ClockState::Paused);
        assert_eq!(d.pause(), ClockState::Paused);
        assert!(!d.tick());
        assert_eq!(d.resume(), ClockState::Running);
        assert_eq!(d.resume(), ClockState::Running);
        assert!(d.tick());
        assert_eq!(log.entries(), ["set_paused:true", "set_paused:false"]);
    }

    #[test]
    fn snapshot_failure_is_facade_rejected() {
        let d = Dispatcher::new(GridWorld::new(3, 3).with_snapshot_failure("loading"));
        assert_eq!(d.observe(1).unwrap_err().kind(), ErrorKind::FacadeRejected);
    }
}
