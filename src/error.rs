//! Error types for the lpf2 library.

use thiserror::Error;

use crate::protocol::HubPropertyType;

/// The main error type for lpf2 operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Radio link write or connect failure.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Protocol error from the hub.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// A named port has no attached device.
    #[error("port {port} has no device attached")]
    PortNotFound { port: String },

    /// The device cannot perform the requested operation.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    /// Request timed out waiting for the hub.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// A request for the same hub property is already outstanding.
    #[error("a request for {property:?} is already pending")]
    RequestPending { property: HubPropertyType },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// Channel receive error.
    #[error("channel closed")]
    ChannelClosed,
}

impl Error {
    /// Builds a [`Error::Timeout`] from a duration.
    #[must_use]
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }
}

/// Frame-specific errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Frame too short to contain the common header.
    #[error("frame too short: need at least 3 bytes, got {0}")]
    TooShort(usize),

    /// Frame does not fit the single-byte length field.
    #[error("frame too large: {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },
}

/// Result type alias for lpf2 operations.
pub type Result<T> = std::result::Result<T, Error>;
