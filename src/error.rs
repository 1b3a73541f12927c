//! Error types for the panel driver.

use core::fmt;

/// Input rejected at the API boundary, before any bus I/O is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Rotation is not one of 0, 90, 180 or 270 degrees.
    InvalidRotation(u16),
    /// Hex color string is not of the form `#RRGGBB`.
    MalformedColor,
    /// Frame has zero width or height.
    EmptyFrame,
    /// Frame data length does not match the declared dimensions.
    FrameSize {
        /// Byte length implied by width x height.
        expected: usize,
        /// Byte length actually supplied.
        got: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRotation(deg) => {
                write!(f, "rotation must be 0, 90, 180 or 270 degrees, got {deg}")
            }
            ConfigError::MalformedColor => write!(f, "hex color must be 6 hex digits (RRGGBB)"),
            ConfigError::EmptyFrame => write!(f, "frame dimensions must be non-zero"),
            ConfigError::FrameSize { expected, got } => {
                write!(f, "frame data length {got} does not match dimensions ({expected} expected)")
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Errors surfaced by [`Panel`](crate::panel::Panel) operations.
///
/// `E` is the bus interface's error type. Steady-state transfer faults only
/// appear as [`Error::Transfer`] under [`FaultPolicy::Strict`](crate::panel::FaultPolicy);
/// the default resilient policy absorbs them after a recovery attempt.
#[derive(Debug)]
pub enum Error<E> {
    /// Invalid input, rejected without touching the hardware.
    Config(ConfigError),
    /// Reset or the initialization sequence failed; no usable panel exists.
    BringUp(E),
    /// A runtime bus transfer failed (strict fault policy only).
    Transfer(E),
    /// Operation on a panel that has already been closed.
    Closed,
}

impl<E> From<ConfigError> for Error<E> {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "{err}"),
            Error::BringUp(err) => write!(f, "panel bring-up failed: {err:?}"),
            Error::Transfer(err) => write!(f, "bus transfer failed: {err:?}"),
            Error::Closed => write!(f, "panel has been closed"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
