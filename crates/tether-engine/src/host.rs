//! User-facing `SimulationHost` API and shutdown sequence.
//!
//! The host runs the facade on a dedicated simulation thread at a
//! configurable rate (default 60 Hz). Every call is marshaled onto that
//! thread and the caller blocks for the reply.
//!
//! # Architecture
//!
//! ```text
//! Caller Thread(s)                      Simulation Thread
//!     |                                       |
//!     |--dispatch()/observe()/pause()-------->| cmd_rx.recv_timeout(budget)
//!     |   [cmd_tx: bounded(command_capacity)] | dispatcher.perform()/observe()
//!     |<--result via reply_tx-----------------|
//!     |                                       | facade.tick()  (if Running)
//!     |--dispatch(Move)---------------------->| facade.start_move()
//!     |   holds MoveToken                     |   ... ticks ...
//!     |   blocks on reply_rx                  | facade.poll_move() == done
//!     |<--result via reply_tx-----------------|
//! ```
//!
//! Only the movement blocks a caller for longer than one loop turnaround.
//! The in-flight flag is checked in the caller's context before the
//! request is enqueued, so a second concurrent move is rejected without
//! touching the simulation thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Sender;
use log::{debug, info};

use tether_core::{Action, ActionResult, BridgeError, ClockState, Observation, SimulationFacade};

use crate::config::{ConfigError, HostConfig};
use crate::sim_thread::{HostRequest, Reply, SimStats, SimThreadState};

// ── MovementGuard ────────────────────────────────────────────────

/// Mutex-guarded in-flight flag for the one movement.
#[derive(Debug, Default)]
struct MovementGuard {
    in_flight: Mutex<bool>,
}

impl MovementGuard {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the flag, or fail if a movement is already outstanding.
    fn try_acquire(&self) -> Result<MoveToken<'_>, BridgeError> {
        let mut in_flight = self.lock();
        if *in_flight {
            return Err(BridgeError::ActionInProgress);
        }
        *in_flight = true;
        Ok(MoveToken { guard: self })
    }

    fn is_held(&self) -> bool {
        *self.lock()
    }
}

/// Releases the in-flight flag when dropped.
struct MoveToken<'a> {
    guard: &'a MovementGuard,
}

impl Drop for MoveToken<'_> {
    fn drop(&mut self) {
        *self.guard.lock() = false;
    }
}

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`SimulationHost::shutdown`].
#[derive(Debug)]
pub struct ShutdownReport {
    /// Total time spent in the shutdown sequence.
    pub total_ms: u64,
    /// Whether the simulation thread was joined successfully.
    pub sim_joined: bool,
    /// Counters from the simulation thread, if it was joined.
    pub stats: Option<SimStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Stopped,
}

// ── SimulationHost ───────────────────────────────────────────────

/// Owns the simulation thread and marshals requests onto it.
///
/// `SimulationHost` is `Send + Sync`; share it behind an `Arc` to call it
/// from several threads.
pub struct SimulationHost {
    cmd_tx: Option<Sender<HostRequest>>,
    shutdown_flag: Arc<AtomicBool>,
    sim_stopped: Arc<AtomicBool>,
    sim_thread: Option<JoinHandle<SimStats>>,
    movement: MovementGuard,
    config: HostConfig,
    state: ShutdownState,
}

impl SimulationHost {
    /// Validate `config`, move `facade` onto a new simulation thread, and
    /// start ticking. The clock starts running.
    pub fn new<F>(facade: F, config: HostConfig) -> Result<Self, ConfigError>
    where
        F: SimulationFacade + 'static,
    {
        config.validate()?;

        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(config.command_capacity);
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let sim_stopped = Arc::new(AtomicBool::new(false));

        let thread_shutdown = Arc::clone(&shutdown_flag);
        let thread_stopped = Arc::clone(&sim_stopped);
        let tick_rate_hz = config.tick_rate_hz;
        let sim_thread = thread::Builder::new()
            .name("tether-sim".into())
            .spawn(move || {
                let state = SimThreadState::new(
                    facade,
                    cmd_rx,
                    thread_shutdown,
                    thread_stopped,
                    tick_rate_hz,
                );
                state.run()
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("simulation thread: {e}"),
            })?;

        info!(
            target: "tether::engine",
            "simulation host started at {tick_rate_hz} Hz (max radius {})",
            config.max_radius
        );

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            shutdown_flag,
            sim_stopped,
            sim_thread: Some(sim_thread),
            movement: MovementGuard::default(),
            config,
            state: ShutdownState::Running,
        })
    }

    /// The configuration the host was started with.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Send a request and wait for its reply.
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> HostRequest) -> Result<T, BridgeError> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or(BridgeError::ShuttingDown)?;
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        cmd_tx
            .send(make(reply_tx))
            .map_err(|_| BridgeError::ShuttingDown)?;
        reply_rx.recv().map_err(|_| BridgeError::ShuttingDown)?
    }

    /// Dispatch an action.
    ///
    /// Synchronous actions return within one loop turnaround.
    /// [`Action::Move`] blocks until the facade reports completion or
    /// obstruction; while it is outstanding any other `Move` fails with
    /// [`BridgeError::ActionInProgress`]. A move issued while the clock is
    /// paused stays outstanding until the clock resumes.
    pub fn dispatch(&self, action: Action) -> Result<ActionResult, BridgeError> {
        match action {
            Action::Move(direction) => {
                let _token = self.movement.try_acquire()?;
                debug!(target: "tether::engine", "move {direction} submitted");
                self.call(|reply| HostRequest::Move { direction, reply })
            }
            action => self.call(|reply| HostRequest::Act { action, reply }),
        }
    }

    /// Whether a movement is outstanding.
    pub fn is_moving(&self) -> bool {
        self.movement.is_held()
    }

    /// Whether the simulation thread has exited its loop.
    pub fn is_stopped(&self) -> bool {
        self.sim_stopped.load(Ordering::Acquire)
    }

    /// Capture an observation at `radius`.
    ///
    /// A radius above the configured maximum fails with
    /// [`BridgeError::InvalidArgument`] before the simulation thread is
    /// involved.
    pub fn observe(&self, radius: u32) -> Result<Observation, BridgeError> {
        let radius = self.config.check_radius(radius)?;
        self.call(|reply| HostRequest::Observe { radius, reply })
    }

    /// Pause the clock. Idempotent.
    pub fn pause(&self) -> Result<ClockState, BridgeError> {
        self.call(|reply| HostRequest::Pause { reply })
    }

    /// Resume the clock. Idempotent.
    pub fn resume(&self) -> Result<ClockState, BridgeError> {
        self.call(|reply| HostRequest::Resume { reply })
    }

    /// Current clock state.
    pub fn clock_state(&self) -> Result<ClockState, BridgeError> {
        self.call(|reply| HostRequest::Clock { reply })
    }

    /// Stop the simulation thread and join it.
    ///
    /// Requests made afterwards fail with [`BridgeError::ShuttingDown`].
    /// Calling this twice is harmless.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Stopped {
            return ShutdownReport {
                total_ms: 0,
                sim_joined: true,
                stats: None,
            };
        }

        let start = Instant::now();
        self.state = ShutdownState::Stopped;
        self.shutdown_flag.store(true, Ordering::Release);

        // Dropping the only sender wakes the thread out of recv_timeout.
        self.cmd_tx.take();

        let (sim_joined, stats) = match self.sim_thread.take() {
            Some(handle) => match handle.join() {
                Ok(stats) => (true, Some(stats)),
                Err(_) => (false, None),
            },
            None => (true, None),
        };

        let total_ms = start.elapsed().as_millis() as u64;
        info!(target: "tether::engine", "simulation host stopped in {total_ms} ms");
        ShutdownReport {
            total_ms,
            sim_joined,
            stats,
        }
    }
}

impl Drop for SimulationHost {
    fn drop(&mut self) {
        if self.state != ShutdownState::Stopped {
            self.shutdown();
        }
    }
}
