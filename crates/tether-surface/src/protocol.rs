//! JSON-lines wire protocol.
//!
//! One request per line:
//!
//! ```text
//! {"id": 7, "command": "move", "args": ["up"]}
//! ```
//!
//! and one response per line, in request order:
//!
//! ```text
//! {"id": 7, "ok": true, "result": {"succeeded": true}}
//! {"id": 8, "ok": false, "error": {"kind": "ActionInProgress", "code": -4, "message": "..."}}
//! ```
//!
//! A line that is not a valid request gets `"id": null` and kind
//! `InvalidArgument`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use tether_core::{BridgeError, Command, ErrorKind};

use crate::status::BridgeStatus;
use crate::surface::{ControlSurface, Reply};

/// A decoded request line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WireRequest {
    /// Caller-chosen correlation id, echoed in the response.
    pub id: u64,
    /// Action or query wire name.
    pub command: String,
    /// Positional string arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl WireRequest {
    /// The command this request names.
    pub fn to_command(&self) -> Command {
        Command::new(self.command.as_str(), self.args.iter().map(String::as_str))
    }
}

/// The error object of a failed response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WireError {
    /// Stable kind name.
    pub kind: &'static str,
    /// Stable numeric code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl WireError {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind: kind.as_str(),
            code: BridgeStatus::from(kind).code(),
            message,
        }
    }
}

impl From<&BridgeError> for WireError {
    fn from(e: &BridgeError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

/// One response line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WireResponse {
    /// The request id, or `None` when the line could not be decoded.
    pub id: Option<u64>,
    /// Whether the call succeeded.
    pub ok: bool,
    /// Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Reply>,
    /// Present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl WireResponse {
    /// A successful response.
    pub fn success(id: u64, reply: Reply) -> Self {
        Self {
            id: Some(id),
            ok: true,
            result: Some(reply),
            error: None,
        }
    }

    /// A failed response.
    pub fn failure(id: Option<u64>, error: WireError) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error),
        }
    }

    /// A response for a line that could not be decoded.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::failure(
            None,
            WireError::new(ErrorKind::InvalidArgument, reason.into()),
        )
    }

    /// Serialize to a single line, without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| encoding_failure_line(self.id, e))
    }
}

/// The `Internal` response sent when a response cannot be serialized.
fn encoding_failure_line(id: Option<u64>, reason: impl fmt::Display) -> String {
    json!({
        "id": id,
        "ok": false,
        "error": {
            "kind": ErrorKind::Internal.as_str(),
            "code": BridgeStatus::Internal.code(),
            "message": format!("response encoding failed: {reason}"),
        },
    })
    .to_string()
}

/// Decode a request line.
pub fn parse_request(line: &str) -> Result<WireRequest, String> {
    serde_json::from_str(line).map_err(|e| format!("malformed request: {e}"))
}

/// Serve one request line against `surface`.
pub fn handle_line(surface: &ControlSurface, line: &str) -> WireResponse {
    let request = match parse_request(line) {
        Ok(request) => request,
        Err(reason) => return WireResponse::malformed(reason),
    };
    match surface.call(&request.to_command()) {
        Ok(reply) => WireResponse::success(request.id, reply),
        Err(e) => WireResponse::failure(Some(request.id), WireError::from(&e)),
    }
}
