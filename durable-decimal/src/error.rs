//! Error types for the orchestration glue.
//!
//! Codec failures have their own [`ParseError`](crate::decimal::ParseError);
//! by the time they reach the host they have been folded into
//! [`DurableError::SerDes`] through the record's deserialization.

use thiserror::Error;

use crate::serdes::SerDesError;

/// Result alias used throughout the host, client and orchestration code.
pub type DurableResult<T> = Result<T, DurableError>;

/// The main error type for running orchestrations and activities.
#[derive(Debug, Clone, Error)]
pub enum DurableError {
    /// A payload could not be serialized or deserialized.
    #[error("Payload error: {message}")]
    SerDes {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Invalid configuration or arguments.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation failure
        message: String,
    },

    /// No activity is registered under the requested name.
    #[error("Activity not found: {name}")]
    ActivityNotFound {
        /// The requested activity name
        name: String,
    },

    /// The activity ran and returned an error.
    #[error("Activity '{name}' failed: {message}")]
    ActivityFailed {
        /// The activity name
        name: String,
        /// The activity's error message
        message: String,
    },

    /// No orchestrator is registered under the requested name.
    #[error("Orchestrator not found: {name}")]
    OrchestratorNotFound {
        /// The requested orchestrator name
        name: String,
    },

    /// The client was asked about an instance it never scheduled.
    #[error("Instance not found: {instance_id}")]
    InstanceNotFound {
        /// The unknown instance id
        instance_id: String,
    },

    /// Waiting on an instance ran past its deadline.
    #[error("Timed out waiting for instance {instance_id}")]
    Timeout {
        /// The instance that did not finish in time
        instance_id: String,
    },

    /// Error raised by orchestrator or activity code itself.
    #[error("Execution error: {message}")]
    Execution {
        /// Error message describing what went wrong
        message: String,
    },
}

impl DurableError {
    /// Creates a new SerDes error.
    pub fn serdes(message: impl Into<String>) -> Self {
        Self::SerDes {
            message: message.into(),
        }
    }

    /// Creates a new Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new Execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Returns true if the failure came from reading or writing a payload.
    pub fn is_serdes(&self) -> bool {
        matches!(self, Self::SerDes { .. })
    }
}

impl From<SerDesError> for DurableError {
    fn from(error: SerDesError) -> Self {
        Self::serdes(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DurableError::validation("bad method").to_string(),
            "Validation error: bad method"
        );
        assert_eq!(
            DurableError::ActivityFailed {
                name: "SayHello".to_string(),
                message: "boom".to_string(),
            }
            .to_string(),
            "Activity 'SayHello' failed: boom"
        );
        assert_eq!(
            DurableError::InstanceNotFound {
                instance_id: "abc".to_string(),
            }
            .to_string(),
            "Instance not found: abc"
        );
    }

    #[test]
    fn test_from_serdes_error() {
        let error: DurableError = SerDesError::deserialization("bad literal").into();
        assert!(error.is_serdes());
        assert!(error.to_string().contains("cannot read payload: bad literal"));
    }

    #[test]
    fn test_is_serdes_only_for_serdes_variant() {
        assert!(!DurableError::execution("x").is_serdes());
        assert!(DurableError::serdes("x").is_serdes());
    }
}
