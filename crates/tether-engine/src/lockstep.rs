//! Lockstep (synchronous) bridge.
//!
//! [`LockstepBridge`] drives a facade on the caller's own thread. Time
//! only advances through [`step`](LockstepBridge::step) or while a
//! movement is being walked to completion inside
//! [`act`](LockstepBridge::act). Useful for deterministic tests and for
//! embedding where the caller already owns the simulation loop.
//!
//! # Ownership model
//!
//! `LockstepBridge` is [`Send`] but all operations take `&mut self` or
//! `&self`, so there is never more than one request in flight and the
//! movement exclusivity rule holds by construction.

use tether_core::{
    Action, ActionResult, BridgeError, ClockState, Observation, SimulationFacade,
};

use crate::config::{ConfigError, HostConfig};
use crate::dispatch::Dispatcher;

/// Single-threaded bridge for lockstep execution.
pub struct LockstepBridge<F> {
    dispatcher: Dispatcher<F>,
    config: HostConfig,
}

impl<F: SimulationFacade> LockstepBridge<F> {
    /// Validate `config` and take ownership of `facade`.
    ///
    /// Only `max_radius` is used; the tick rate and channel capacity
    /// apply to the threaded host.
    pub fn new(facade: F, config: HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            dispatcher: Dispatcher::new(facade),
            config,
        })
    }

    /// Advance one tick if the clock runs. Returns whether it did.
    pub fn step(&mut self) -> bool {
        self.dispatcher.tick()
    }

    /// Dispatch an action.
    ///
    /// [`Action::Move`] ticks the world until the facade reports
    /// completion or obstruction. With the clock paused nothing could
    /// ever complete it, so the move is refused with an unsuccessful
    /// result instead.
    pub fn act(&mut self, action: &Action) -> Result<ActionResult, BridgeError> {
        let Action::Move(direction) = action else {
            return self.dispatcher.perform(action);
        };
        if !self.dispatcher.clock().is_running() {
            return Ok(ActionResult::rejected("simulation clock is paused"));
        }
        if let Some(result) = self.dispatcher.begin_move(*direction)? {
            return Ok(result);
        }
        loop {
            self.dispatcher.tick();
            if let Some(result) = self.dispatcher.poll_move() {
                return Ok(result);
            }
        }
    }

    /// Capture an observation at `radius`.
    pub fn observe(&self, radius: u32) -> Result<Observation, BridgeError> {
        let radius = self.config.check_radius(radius)?;
        self.dispatcher.observe(radius)
    }

    /// Pause the clock. Idempotent.
    pub fn pause(&mut self) -> ClockState {
        self.dispatcher.pause()
    }

    /// Resume the clock. Idempotent.
    pub fn resume(&mut self) -> ClockState {
        self.dispatcher.resume()
    }

    /// Current clock state.
    pub fn clock_state(&self) -> ClockState {
        self.dispatcher.clock().state()
    }

    /// Read access to the facade.
    pub fn facade(&self) -> &F {
        self.dispatcher.facade()
    }

    /// Give the facade back.
    pub fn into_facade(self) -> F {
        self.dispatcher.into_facade()
    }
}
