//! Crate-level error and result-code types.

use std::error::Error as StdError;
use std::fmt;

use crate::types::{Param, ParamKind};

// =============================================================================
// Result Codes
// =============================================================================

/// Discriminated result code reported by the device for every call.
///
/// Mirrors the vendor convention of a single return code per operation,
/// with `Success` as zero. Codes the crate does not know by name are
/// preserved in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultCode {
    /// Operation completed.
    Success,
    /// Unspecified failure.
    Fail,
    /// An argument was rejected by the device.
    InvalidArgument,
    /// No connection is open.
    NotConnected,
    /// The device does not support the operation.
    NotSupported,
    /// The transport reported an error.
    CommunicationError,
    /// A caller-supplied buffer was too small for the response.
    BufferTooSmall,
    /// The device did not respond in time.
    Timeout,
    /// A vendor code with no named mapping.
    Other(i32),
}

impl ResultCode {
    /// Returns the numeric value of this code.
    pub fn code(&self) -> i32 {
        match self {
            ResultCode::Success => 0,
            ResultCode::Fail => 1,
            ResultCode::InvalidArgument => 2,
            ResultCode::NotConnected => 3,
            ResultCode::NotSupported => 4,
            ResultCode::CommunicationError => 5,
            ResultCode::BufferTooSmall => 6,
            ResultCode::Timeout => 7,
            ResultCode::Other(code) => *code,
        }
    }

    /// Maps a numeric value back to a code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ResultCode::Success,
            1 => ResultCode::Fail,
            2 => ResultCode::InvalidArgument,
            3 => ResultCode::NotConnected,
            4 => ResultCode::NotSupported,
            5 => ResultCode::CommunicationError,
            6 => ResultCode::BufferTooSmall,
            7 => ResultCode::Timeout,
            other => ResultCode::Other(other),
        }
    }

    /// Returns true if this code is `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, ResultCode::Success)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResultCode::Success => "success",
            ResultCode::Fail => "failure",
            ResultCode::InvalidArgument => "invalid argument",
            ResultCode::NotConnected => "not connected",
            ResultCode::NotSupported => "not supported",
            ResultCode::CommunicationError => "communication error",
            ResultCode::BufferTooSmall => "buffer too small",
            ResultCode::Timeout => "timeout",
            ResultCode::Other(_) => "unknown code",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

// =============================================================================
// Crate Error
// =============================================================================

/// Crate-level error type.
///
/// Device failures carry the name of the failing call and the device's
/// numeric result code, so callers can present them without extra context.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A device call returned a non-success result code.
    #[error("{op} failed: {code}")]
    Device {
        /// Name of the failing operation.
        op: &'static str,
        /// Result code reported by the device.
        code: ResultCode,
    },

    /// The device disconnected or became unreachable.
    #[error("disconnected: {0}")]
    Disconnected(String),

    /// Invalid configuration or API misuse.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A parameter read returned a value of an unexpected kind.
    #[error("{param} returned {got}, expected {expected}")]
    ParamType {
        param: Param,
        expected: ParamKind,
        got: ParamKind,
    },

    /// A parameter read returned a raw value outside its enumeration.
    #[error("{param} holds out-of-range value {value}")]
    InvalidValue { param: Param, value: u32 },

    /// A sample buffer's length does not match its frame geometry.
    #[error("frame buffer holds {actual} samples, geometry requires {expected}")]
    FrameGeometry { expected: usize, actual: usize },

    /// The polling loop was explicitly stopped.
    #[error("stopped: poller was explicitly stopped")]
    Stopped,

    /// Backend/transport error (wrapped).
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// Create a device error for a failing call.
    pub fn device(op: &'static str, code: ResultCode) -> Self {
        Error::Device { op, code }
    }

    /// Create a disconnected error with a message.
    pub fn disconnected(msg: impl Into<String>) -> Self {
        Error::Disconnected(msg.into())
    }

    /// Create an invalid config error with a message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a backend error from any error type.
    pub fn backend(err: impl StdError + Send + Sync + 'static) -> Self {
        Error::Backend(Box::new(err))
    }

    /// Returns true if this is a Device error.
    pub fn is_device(&self) -> bool {
        matches!(self, Error::Device { .. })
    }

    /// Returns true if this is a Disconnected error.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Error::Disconnected(_))
    }

    /// Returns true if this is a Stopped error.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Error::Stopped)
    }
}

/// Crate-level result type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_roundtrip() {
        for code in [
            ResultCode::Success,
            ResultCode::Fail,
            ResultCode::InvalidArgument,
            ResultCode::NotConnected,
            ResultCode::NotSupported,
            ResultCode::CommunicationError,
            ResultCode::BufferTooSmall,
            ResultCode::Timeout,
        ] {
            assert_eq!(ResultCode::from_code(code.code()), code);
        }
        // Unknown vendor codes are preserved verbatim
        assert_eq!(ResultCode::from_code(-37), ResultCode::Other(-37));
        assert_eq!(ResultCode::Other(-37).code(), -37);
    }

    #[test]
    fn test_device_error_names_call_and_code() {
        let err = Error::device("get_frame_count", ResultCode::Timeout);
        let text = err.to_string();
        assert!(text.contains("get_frame_count"), "message: {}", text);
        assert!(text.contains("7"), "message: {}", text);
    }

    #[test]
    fn test_predicates() {
        assert!(Error::device("x", ResultCode::Fail).is_device());
        assert!(Error::disconnected("gone").is_disconnected());
        assert!(Error::Stopped.is_stopped());
        assert!(!Error::Stopped.is_disconnected());
    }
}
