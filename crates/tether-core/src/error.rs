//! Error types for the Tether control bridge.
//!
//! Organized by subsystem: argument decoding ([`ArgError`]), the
//! caller-visible bridge error ([`BridgeError`]) with its stable
//! classification ([`ErrorKind`]), and observation encoding ([`CodecError`]).

use std::error::Error;
use std::fmt;

use crate::args::ArgKind;
use crate::id::ItemIndex;

/// A single argument token failed to decode.
///
/// Every variant carries the zero-based position of the offending token
/// within the command's argument list, so callers can fix the call
/// without retrying blindly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgError {
    /// Fewer tokens were supplied than the command requires.
    Missing {
        /// Position of the first missing token.
        position: usize,
        /// Kind the command expected at that position.
        expected: ArgKind,
    },
    /// The token does not have the shape of the expected kind.
    Malformed {
        /// Position of the token.
        position: usize,
        /// The token as received.
        token: String,
        /// Kind the command expected at that position.
        expected: ArgKind,
    },
    /// The token parsed but its value is outside the accepted range.
    OutOfRange {
        /// Position of the token.
        position: usize,
        /// The token as received.
        token: String,
        /// Description of the accepted range.
        reason: String,
    },
    /// More tokens were supplied than the command accepts.
    Unexpected {
        /// Position of the first extra token.
        position: usize,
        /// The extra token.
        token: String,
    },
}

impl ArgError {
    /// Position of the offending (or missing) token.
    pub fn position(&self) -> usize {
        match self {
            Self::Missing { position, .. }
            | Self::Malformed { position, .. }
            | Self::OutOfRange { position, .. }
            | Self::Unexpected { position, .. } => *position,
        }
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { position, expected } => {
                write!(f, "argument {position}: missing {expected}")
            }
            Self::Malformed {
                position,
                token,
                expected,
            } => write!(f, "argument {position}: '{token}' is not a valid {expected}"),
            Self::OutOfRange {
                position,
                token,
                reason,
            } => write!(f, "argument {position}: '{token}' out of range: {reason}"),
            Self::Unexpected { position, token } => {
                write!(f, "argument {position}: unexpected extra argument '{token}'")
            }
        }
    }
}

impl Error for ArgError {}

/// Stable, caller-visible classification of a [`BridgeError`].
///
/// The string forms are part of the wire contract and never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range argument token.
    InvalidArgument,
    /// Unrecognized action or query name.
    UnknownCommand,
    /// Inventory index out of range or the slot is empty.
    ItemNotFound,
    /// A movement is already outstanding.
    ActionInProgress,
    /// The simulation refused or could not complete the request.
    FacadeRejected,
    /// The simulation thread has stopped.
    ShuttingDown,
    /// An encoder failed.
    Internal,
}

impl ErrorKind {
    /// Wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::UnknownCommand => "UnknownCommand",
            Self::ItemNotFound => "ItemNotFound",
            Self::ActionInProgress => "ActionInProgress",
            Self::FacadeRejected => "FacadeRejected",
            Self::ShuttingDown => "ShuttingDown",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned to callers of the bridge.
///
/// None of these are fatal. Expected simulation outcomes (blocked
/// movement, unknown recipe, closed shop) are not errors at all: they
/// come back as an unsuccessful [`ActionResult`](crate::ActionResult).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BridgeError {
    /// An argument failed to decode; no facade call was made.
    InvalidArgument(ArgError),
    /// The command name is not in the action or query table.
    UnknownCommand {
        /// The name as received.
        name: String,
    },
    /// The referenced inventory slot is out of range or empty.
    ItemNotFound {
        /// The requested slot.
        index: ItemIndex,
    },
    /// A movement request is already in flight.
    ActionInProgress,
    /// The facade could not serve a query.
    FacadeRejected {
        /// Facade-supplied description.
        reason: String,
    },
    /// The simulation thread is no longer accepting requests.
    ShuttingDown,
    /// An observation could not be encoded.
    Internal {
        /// Description of the failure.
        reason: String,
    },
}

impl BridgeError {
    /// The stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Self::ItemNotFound { .. } => ErrorKind::ItemNotFound,
            Self::ActionInProgress => ErrorKind::ActionInProgress,
            Self::FacadeRejected { .. } => ErrorKind::FacadeRejected,
            Self::ShuttingDown => ErrorKind::ShuttingDown,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(e) => write!(f, "invalid argument: {e}"),
            Self::UnknownCommand { name } => write!(f, "unknown command '{name}'"),
            Self::ItemNotFound { index } => write!(f, "no item in inventory slot {index}"),
            Self::ActionInProgress => write!(f, "a movement is already in progress"),
            Self::FacadeRejected { reason } => write!(f, "simulation rejected request: {reason}"),
            Self::ShuttingDown => write!(f, "simulation thread has shut down"),
            Self::Internal { reason } => write!(f, "internal error: {reason}"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArgError> for BridgeError {
    fn from(e: ArgError) -> Self {
        Self::InvalidArgument(e)
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        Self::Internal {
            reason: e.to_string(),
        }
    }
}

/// Errors from encoding or decoding an observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// The payload does not start with the expected magic bytes.
    InvalidMagic,
    /// The payload was written by a newer format version.
    UnsupportedVersion {
        /// Version found in the header.
        found: u16,
    },
    /// The payload ended in the middle of a required field.
    Truncated {
        /// Which field was being read.
        field: &'static str,
    },
    /// An enum tag byte is not recognized.
    InvalidTag {
        /// Which field carried the tag.
        field: &'static str,
        /// The unrecognized tag.
        tag: u8,
    },
    /// A string field is not valid UTF-8.
    InvalidUtf8 {
        /// Which field carried the string.
        field: &'static str,
    },
    /// Bytes remain after the last known field.
    TrailingBytes {
        /// Number of unconsumed bytes.
        count: usize,
    },
    /// A length does not fit the wire-format integer width.
    TooLarge {
        /// Which field overflowed.
        field: &'static str,
    },
    /// The text encoding failed to serialize or parse.
    Text {
        /// Description from the JSON layer.
        reason: String,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"TOBS\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported observation format version {found}")
            }
            Self::Truncated { field } => write!(f, "truncated data while reading {field}"),
            Self::InvalidTag { field, tag } => write!(f, "unknown tag {tag} for {field}"),
            Self::InvalidUtf8 { field } => write!(f, "{field} is not valid UTF-8"),
            Self::TrailingBytes { count } => write!(f, "{count} trailing bytes after observation"),
            Self::TooLarge { field } => write!(f, "{field} exceeds the wire-format range"),
            Self::Text { reason } => write!(f, "text encoding: {reason}"),
        }
    }
}

impl Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_maps_to_its_kind() {
        let cases = [
            (
                BridgeError::InvalidArgument(ArgError::Missing {
                    position: 0,
                    expected: ArgKind::Integer,
                }),
                ErrorKind::InvalidArgument,
            ),
            (
                BridgeError::UnknownCommand {
                    name: "fly".into(),
                },
                ErrorKind::UnknownCommand,
            ),
            (
                BridgeError::ItemNotFound {
                    index: ItemIndex(40),
                },
                ErrorKind::ItemNotFound,
            ),
            (BridgeError::ActionInProgress, ErrorKind::ActionInProgress),
            (
                BridgeError::FacadeRejected {
                    reason: "no world".into(),
                },
                ErrorKind::FacadeRejected,
            ),
            (BridgeError::ShuttingDown, ErrorKind::ShuttingDown),
            (
                BridgeError::Internal {
                    reason: "x".into(),
                },
                ErrorKind::Internal,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn arg_error_reports_position() {
        let e = ArgError::Malformed {
            position: 1,
            token: "abc".into(),
            expected: ArgKind::Integer,
        };
        assert_eq!(e.position(), 1);
        assert_eq!(e.to_string(), "argument 1: 'abc' is not a valid integer");
    }

    #[test]
    fn codec_error_becomes_internal() {
        let e: BridgeError = CodecError::InvalidMagic.into();
        assert_eq!(e.kind(), ErrorKind::Internal);
    }
}
