//! Error types for the session controller
//!
//! The controller surfaces a single user-facing category, "operation failed":
//! the notice shown to the user is just the error's message. [`ClientError`]
//! still records *which* operation failed so callers and tests can tell a
//! failed subscribe from a failed join.

use std::fmt;
use thiserror::Error;

/// Result type for session controller operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for calls into the external RTC SDK
pub type RtcResult<T> = Result<T, RtcError>;

/// Failure reported by the external RTC SDK
///
/// SDK errors carry a short machine-readable code (e.g. `INVALID_PARAMS`,
/// `PERMISSION_DENIED`) and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct RtcError {
    /// SDK error code
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl RtcError {
    /// Create an SDK error from a code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// The controller operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Acquiring local microphone/camera tracks
    AcquireTracks,
    /// Joining the channel
    Join,
    /// Publishing local tracks
    Publish,
    /// Subscribing to a remote participant's track
    Subscribe,
    /// Leaving the channel
    Leave,
    /// Applying an encoder profile to the local video track
    SetEncoderProfile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::AcquireTracks => "acquire tracks",
            Operation::Join => "join",
            Operation::Publish => "publish",
            Operation::Subscribe => "subscribe",
            Operation::Leave => "leave",
            Operation::SetEncoderProfile => "set encoder profile",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the session controller
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The external SDK rejected an operation
    #[error("{source}")]
    Sdk {
        operation: Operation,
        #[source]
        source: RtcError,
    },

    /// Join form input was rejected before reaching the SDK
    #[error("Invalid join options: {message}")]
    InvalidOptions { message: String },

    /// The operation is not valid in the current session state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// An encoder profile change was requested without a local video track
    #[error("No local video track to configure")]
    NoLocalVideoTrack,

    /// A configuration value could not be parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl ClientError {
    /// Wrap an SDK error with the operation that produced it
    pub fn sdk(operation: Operation, source: RtcError) -> Self {
        Self::Sdk { operation, source }
    }

    /// Create an invalid join options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// The SDK operation that failed, if this error came from the SDK
    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Sdk { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_error_displays_only_the_sdk_message() {
        let err = ClientError::sdk(
            Operation::Join,
            RtcError::new("INVALID_PARAMS", "invalid app id"),
        );
        assert_eq!(err.to_string(), "INVALID_PARAMS: invalid app id");
        assert_eq!(err.operation(), Some(Operation::Join));
    }

    #[test]
    fn non_sdk_errors_have_no_operation() {
        assert_eq!(ClientError::NoLocalVideoTrack.operation(), None);
        assert_eq!(
            ClientError::invalid_options("channel is required").to_string(),
            "Invalid join options: channel is required"
        );
    }
}
