//! The remote-callable control surface.
//!
//! [`ControlSurface`] is where string-typed remote calls become typed
//! requests. Every entry point decodes its tokens first, so a malformed
//! argument fails with [`BridgeError::InvalidArgument`] before anything
//! reaches the simulation thread.

use log::{debug, info, warn};
use serde::Serialize;

use tether_core::{
    Action, ActionResult, ArgCursor, BridgeError, ClockState, Command, ErrorKind, Query, Request,
    SimulationFacade, TileInfo,
};
use tether_engine::{ConfigError, HostConfig, ShutdownReport, SimulationHost};

/// Successful outcome of [`ControlSurface::call`].
///
/// Serializes to the `result` field of a wire response: `null` for
/// control calls, an object for actions, a number array for the binary
/// observation, a string for the text observation, and a tile array for
/// the surroundings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// No payload.
    Unit,
    /// Outcome of an action.
    Action(ActionResult),
    /// Binary observation.
    Bytes(Vec<u8>),
    /// Text observation.
    Text(String),
    /// Neighborhood tiles.
    Tiles(Vec<TileInfo>),
}

/// Decode a single radius token.
fn radius_arg(token: &str) -> Result<u32, BridgeError> {
    let tokens = [token];
    let mut cursor = ArgCursor::new(&tokens[..]);
    let radius = cursor.integer_at_least(0)?;
    cursor.finish()?;
    Ok(radius.unsigned_abs())
}

/// String-in, typed-out entry points over a [`SimulationHost`].
///
/// `ControlSurface` is `Send + Sync`; every method takes `&self`, so one
/// surface can serve many connections behind an `Arc`.
pub struct ControlSurface {
    host: SimulationHost,
}

impl ControlSurface {
    /// Wrap a running host.
    pub fn new(host: SimulationHost) -> Self {
        Self { host }
    }

    /// Start a host for `facade` and wrap it.
    pub fn start<F>(facade: F, config: HostConfig) -> Result<Self, ConfigError>
    where
        F: SimulationFacade + 'static,
    {
        SimulationHost::new(facade, config).map(Self::new)
    }

    /// The underlying host.
    pub fn host(&self) -> &SimulationHost {
        &self.host
    }

    /// Resolve, decode and execute one remote call.
    pub fn call(&self, command: &Command) -> Result<Reply, BridgeError> {
        debug!(target: "tether::surface", "{} {:?}", command.name, command.args);
        let result = Request::parse(command).and_then(|request| self.execute(request));
        if let Err(e) = &result {
            match e.kind() {
                ErrorKind::Internal => warn!(target: "tether::surface", "{}: {e}", command.name),
                _ => debug!(target: "tether::surface", "{}: {e}", command.name),
            }
        }
        result
    }

    /// Execute an already decoded request.
    pub fn execute(&self, request: Request) -> Result<Reply, BridgeError> {
        match request {
            Request::Action(action) => self.act(action).map(Reply::Action),
            Request::Query(query) => match query {
                Query::Observe { radius } => self.observe_binary(radius).map(Reply::Bytes),
                Query::ObserveText { radius } => self.observe_text(radius).map(Reply::Text),
                Query::Surroundings { radius } => self.surroundings(radius).map(Reply::Tiles),
                Query::Pause => self.host.pause().map(|_| Reply::Unit),
                Query::Resume => self.host.resume().map(|_| Reply::Unit),
                Query::LoadGameRecord { path } => {
                    Ok(self.record(&path).map_or(Reply::Unit, Reply::Text))
                }
            },
        }
    }

    /// Dispatch a typed action. Blocks until a movement completes.
    pub fn act(&self, action: Action) -> Result<ActionResult, BridgeError> {
        self.host.dispatch(action)
    }

    // ── Observation ──────────────────────────────────────────────

    /// Binary observation at the decoded `radius`.
    pub fn observe(&self, radius: &str) -> Result<Vec<u8>, BridgeError> {
        self.observe_binary(radius_arg(radius)?)
    }

    /// Text (JSON) observation at the decoded `radius`.
    pub fn observe_v2(&self, radius: &str) -> Result<String, BridgeError> {
        self.observe_text(radius_arg(radius)?)
    }

    /// Neighborhood tiles at the decoded `radius`, row-major.
    pub fn get_surroundings(&self, radius: &str) -> Result<Vec<TileInfo>, BridgeError> {
        self.surroundings(radius_arg(radius)?)
    }

    fn observe_binary(&self, radius: u32) -> Result<Vec<u8>, BridgeError> {
        let obs = self.host.observe(radius)?;
        Ok(tether_obs::binary::encode(&obs)?)
    }

    fn observe_text(&self, radius: u32) -> Result<String, BridgeError> {
        let obs = self.host.observe(radius)?;
        Ok(tether_obs::text::encode(&obs)?)
    }

    fn surroundings(&self, radius: u32) -> Result<Vec<TileInfo>, BridgeError> {
        Ok(self.host.observe(radius)?.surroundings)
    }

    // ── Clock ────────────────────────────────────────────────────

    /// Stop the simulation clock. Idempotent.
    pub fn pause(&self) -> Result<(), BridgeError> {
        self.host.pause().map(drop)
    }

    /// Restart the simulation clock. Idempotent.
    pub fn resume(&self) -> Result<(), BridgeError> {
        self.host.resume().map(drop)
    }

    /// Current clock state.
    pub fn clock_state(&self) -> Result<ClockState, BridgeError> {
        self.host.clock_state()
    }

    // ── Reserved ─────────────────────────────────────────────────

    /// Reserved extension point for replaying a recorded game.
    ///
    /// Logs the request and returns nothing.
    pub fn load_game_record(&self, path: &str) -> Result<Option<String>, BridgeError> {
        let tokens = [path];
        let mut cursor = ArgCursor::new(&tokens[..]);
        let path = cursor.text()?;
        cursor.finish()?;
        Ok(self.record(&path))
    }

    fn record(&self, path: &str) -> Option<String> {
        info!(target: "tether::surface", "load_game_record({path}) is not implemented");
        None
    }

    /// Stop the simulation thread. See [`SimulationHost::shutdown`].
    pub fn shutdown(&mut self) -> ShutdownReport {
        self.host.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_test_utils::GridWorld;

    fn surface() -> ControlSurface {
        ControlSurface::start(GridWorld::new(5, 5), HostConfig::default()).unwrap()
    }

    #[test]
    fn surface_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ControlSurface>();
    }

    #[test]
    fn radius_token_rules() {
        assert_eq!(radius_arg("0"), Ok(0));
        assert_eq!(radius_arg("12"), Ok(12));
        for bad in ["-1", "abc", "", "1.5", " 3"] {
            assert_eq!(
                radius_arg(bad).unwrap_err().kind(),
                ErrorKind::InvalidArgument,
                "{bad:?}"
            );
        }
    }

    #[test]
    fn reply_serializes_by_shape() {
        let json = |r: &Reply| serde_json::to_string(r).unwrap();
        assert_eq!(json(&Reply::Unit), "null");
        assert_eq!(json(&Reply::Bytes(vec![1, 2])), "[1,2]");
        assert_eq!(json(&Reply::Text("x".into())), "\"x\"");
        assert_eq!(json(&Reply::Action(ActionResult::ok())), "{\"succeeded\":true}");
    }

    #[test]
    fn load_game_record_returns_nothing() {
        let s = surface();
        assert_eq!(s.load_game_record("saves/day1.rec"), Ok(None));
        assert_eq!(
            s.call(&Command::new("load_game_record", ["x"])),
            Ok(Reply::Unit)
        );
        assert_eq!(
            s.load_game_record("").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn shutdown_surface_reports_shutting_down() {
        let mut s = surface();
        assert!(s.shutdown().sim_joined);
        assert_eq!(s.pause().unwrap_err().kind(), ErrorKind::ShuttingDown);
    }
}
