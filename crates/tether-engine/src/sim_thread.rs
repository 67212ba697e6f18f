//! The simulation thread: request draining, ticking, and move completion.
//!
//! The simulation thread owns the [`Dispatcher`] (and so the facade and
//! the clock) exclusively, moved in via `thread::spawn`. Requests arrive
//! over a bounded crossbeam channel and each carries its own reply
//! sender. Between ticks the thread blocks on the channel with a timeout
//! equal to the remaining tick budget, so requests are served as soon as
//! they arrive rather than at the next tick boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, trace, warn};

use tether_core::{
    Action, ActionResult, BridgeError, ClockState, Direction, Observation, SimulationFacade,
};

use crate::dispatch::Dispatcher;

/// Reply channel for one request.
pub(crate) type Reply<T> = Sender<Result<T, BridgeError>>;

/// A request marshaled onto the simulation thread.
pub(crate) enum HostRequest {
    /// A synchronous action.
    Act {
        action: Action,
        reply: Reply<ActionResult>,
    },
    /// The movement. The reply is held until the movement finishes.
    Move {
        direction: Direction,
        reply: Reply<ActionResult>,
    },
    /// Capture an observation.
    Observe {
        radius: u32,
        reply: Reply<Observation>,
    },
    /// Pause the clock.
    Pause { reply: Reply<ClockState> },
    /// Resume the clock.
    Resume { reply: Reply<ClockState> },
    /// Read the clock.
    Clock { reply: Reply<ClockState> },
}

/// Counters reported at shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Requests served.
    pub requests: u64,
}

/// State held by the simulation thread's main loop.
pub(crate) struct SimThreadState<F> {
    dispatcher: Dispatcher<F>,
    cmd_rx: Receiver<HostRequest>,
    shutdown_flag: Arc<AtomicBool>,
    sim_stopped: Arc<AtomicBool>,
    tick_budget: Duration,
    pending_move: Option<Reply<ActionResult>>,
    stats: SimStats,
}

impl<F: SimulationFacade> SimThreadState<F> {
    pub fn new(
        facade: F,
        cmd_rx: Receiver<HostRequest>,
        shutdown_flag: Arc<AtomicBool>,
        sim_stopped: Arc<AtomicBool>,
        tick_rate_hz: f64,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(facade),
            cmd_rx,
            shutdown_flag,
            sim_stopped,
            tick_budget: Duration::from_secs_f64(1.0 / tick_rate_hz),
            pending_move: None,
            stats: SimStats::default(),
        }
    }

    /// Main loop. Runs until the shutdown flag is set or every sender
    /// has been dropped.
    pub fn run(mut self) -> SimStats {
        let mut next_tick = Instant::now() + self.tick_budget;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }

            // 1. Tick when the budget has elapsed.
            let now = Instant::now();
            if now >= next_tick {
                if self.dispatcher.tick() {
                    self.stats.ticks += 1;
                    // 2. Complete the movement if it finished this tick.
                    self.poll_move();
                }
                next_tick += self.tick_budget;
                if next_tick < now {
                    // Fell behind; skip missed ticks rather than bursting.
                    next_tick = now + self.tick_budget;
                }
            }

            // 3. Serve requests until the next tick is due.
            let wait = next_tick.saturating_duration_since(Instant::now());
            match self.cmd_rx.recv_timeout(wait) {
                Ok(request) => {
                    self.handle(request);
                    // Serve anything else already queued in the same turn.
                    while let Ok(request) = self.cmd_rx.try_recv() {
                        self.handle(request);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.pending_move.take().is_some() {
            warn!(target: "tether::engine", "shutting down with a movement outstanding");
        }
        self.sim_stopped.store(true, Ordering::Release);
        debug!(
            target: "tether::engine",
            "simulation thread stopped after {} ticks, {} requests",
            self.stats.ticks, self.stats.requests
        );
        self.stats
    }

    fn handle(&mut self, request: HostRequest) {
        self.stats.requests += 1;
        // Replies are best-effort: the caller may have gone away.
        match request {
            HostRequest::Act { action, reply } => {
                trace!(target: "tether::engine", "act {action}");
                let _ = reply.send(self.dispatcher.perform(&action));
            }
            HostRequest::Move { direction, reply } => {
                if self.pending_move.is_some() {
                    let _ = reply.send(Err(BridgeError::ActionInProgress));
                    return;
                }
                match self.dispatcher.begin_move(direction) {
                    Ok(None) => self.pending_move = Some(reply),
                    Ok(Some(result)) => {
                        let _ = reply.send(Ok(result));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            HostRequest::Observe { radius, reply } => {
                let _ = reply.send(self.dispatcher.observe(radius));
            }
            HostRequest::Pause { reply } => {
                let _ = reply.send(Ok(self.dispatcher.pause()));
            }
            HostRequest::Resume { reply } => {
                let _ = reply.send(Ok(self.dispatcher.resume()));
            }
            HostRequest::Clock { reply } => {
                let _ = reply.send(Ok(self.dispatcher.clock().state()));
            }
        }
    }

    fn poll_move(&mut self) {
        if self.pending_move.is_none() {
            return;
        }
        if let Some(result) = self.dispatcher.poll_move() {
            if let Some(reply) = self.pending_move.take() {
                let _ = reply.send(Ok(result));
            }
        }
    }
}
