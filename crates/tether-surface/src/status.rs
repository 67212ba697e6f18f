//! Stable numeric status codes for remote callers.
//!
//! [`BridgeStatus`] is a `repr(i32)` enum with one code per
//! [`ErrorKind`]. `Ok` is 0 and every error is negative. Values never
//! change once assigned; new kinds get new codes.

use tether_core::{BridgeError, ErrorKind};

/// Status code attached to every wire response.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BridgeStatus {
    /// Success.
    Ok = 0,
    /// An argument token failed to decode.
    InvalidArgument = -1,
    /// The command name is not recognized.
    UnknownCommand = -2,
    /// The referenced inventory slot is out of range or empty.
    ItemNotFound = -3,
    /// A movement is already outstanding.
    ActionInProgress = -4,
    /// The simulation refused a query.
    FacadeRejected = -5,
    /// The simulation thread has stopped.
    ShuttingDown = -6,
    /// An encoder failed.
    Internal = -7,
}

impl BridgeStatus {
    /// The numeric code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ErrorKind> for BridgeStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidArgument => BridgeStatus::InvalidArgument,
            ErrorKind::UnknownCommand => BridgeStatus::UnknownCommand,
            ErrorKind::ItemNotFound => BridgeStatus::ItemNotFound,
            ErrorKind::ActionInProgress => BridgeStatus::ActionInProgress,
            ErrorKind::FacadeRejected => BridgeStatus::FacadeRejected,
            ErrorKind::ShuttingDown => BridgeStatus::ShuttingDown,
            ErrorKind::Internal => BridgeStatus::Internal,
        }
    }
}

impl From<&BridgeError> for BridgeStatus {
    fn from(e: &BridgeError) -> Self {
        BridgeStatus::from(e.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{ArgError, ArgKind, ItemIndex};

    #[test]
    fn status_code_values_are_stable() {
        assert_eq!(BridgeStatus::Ok as i32, 0);
        assert_eq!(BridgeStatus::InvalidArgument as i32, -1);
        assert_eq!(BridgeStatus::UnknownCommand as i32, -2);
        assert_eq!(BridgeStatus::ItemNotFound as i32, -3);
        assert_eq!(BridgeStatus::ActionInProgress as i32, -4);
        assert_eq!(BridgeStatus::FacadeRejected as i32, -5);
        assert_eq!(BridgeStatus::ShuttingDown as i32, -6);
        assert_eq!(BridgeStatus::Internal as i32, -7);
    }

    #[test]
    fn bridge_error_to_status() {
        assert_eq!(
            BridgeStatus::from(&BridgeError::InvalidArgument(ArgError::Missing {
                position: 0,
                expected: ArgKind::Integer,
            })),
            BridgeStatus::InvalidArgument
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::UnknownCommand { name: "fly".into() }),
            BridgeStatus::UnknownCommand
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::ItemNotFound {
                index: ItemIndex(9)
            }),
            BridgeStatus::ItemNotFound
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::ActionInProgress),
            BridgeStatus::ActionInProgress
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::FacadeRejected {
                reason: "loading".into()
            }),
            BridgeStatus::FacadeRejected
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::ShuttingDown),
            BridgeStatus::ShuttingDown
        );
        assert_eq!(
            BridgeStatus::from(&BridgeError::Internal { reason: "x".into() }).code(),
            -7
        );
    }
}
