//! Host configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use tether_core::{ArgError, BridgeError};

// ── HostConfig ─────────────────────────────────────────────────────

/// Configuration for [`SimulationHost`](crate::SimulationHost) and
/// [`LockstepBridge`](crate::LockstepBridge).
#[derive(Clone, Debug, PartialEq)]
pub struct HostConfig {
    /// Target simulation tick rate. Default: 60.
    pub tick_rate_hz: f64,
    /// Capacity of the bounded request channel. Default: 64.
    pub command_capacity: usize,
    /// Largest observation radius a caller may request. Default: 64.
    pub max_radius: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            command_capacity: 64,
            max_radius: 64,
        }
    }
}

impl HostConfig {
    /// Validate all invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Reject NaN, infinity, zero, negative, and rates so high the
        // per-tick budget would round to zero.
        if !self.tick_rate_hz.is_finite()
            || self.tick_rate_hz <= 0.0
            || !(1.0 / self.tick_rate_hz).is_normal()
        {
            return Err(ConfigError::InvalidTickRate {
                value: self.tick_rate_hz,
            });
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::CommandCapacityZero);
        }
        Ok(())
    }

    /// Reject radii above [`max_radius`](HostConfig::max_radius).
    ///
    /// Reported as an out-of-range first argument, like any other
    /// radius validation failure.
    pub fn check_radius(&self, radius: u32) -> Result<u32, BridgeError> {
        if radius > self.max_radius {
            return Err(BridgeError::InvalidArgument(ArgError::OutOfRange {
                position: 0,
                token: radius.to_string(),
                reason: format!("must be at most {}", self.max_radius),
            }));
        }
        Ok(radius)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`HostConfig`] or starting a host.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// tick_rate_hz is NaN, infinite, zero, negative, or too large.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// The request channel would have no capacity.
    CommandCapacityZero,
    /// The simulation thread could not be spawned.
    ThreadSpawnFailed {
        /// Description from the OS.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::CommandCapacityZero => write!(f, "command_capacity must be at least 1"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}
