//! Error types for the session controller
//!
//! Every failure a join, leave or mute can produce is one of the
//! [`SessionError`] variants below. Errors coming out of the RTC SDK arrive
//! as [`SdkError`](crate::sdk::SdkError) and are classified into this
//! taxonomy by [`SessionError::from_sdk`].

use thiserror::Error;

use crate::sdk::SdkError;

/// Result type for session controller operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Guidance shown after a microphone permission denial
pub const MICROPHONE_GUIDANCE: &str = "Please allow microphone access to join the call";

/// Guidance shown when no capture device is present
pub const DEVICE_GUIDANCE: &str = "Please connect a microphone and try again";

/// Errors that can occur while driving a call session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Missing username or room; never reaches the SDK
    #[error("{message}")]
    Validation { message: String },

    /// Capture APIs require a secure origin
    #[error("This application requires a secure context (HTTPS or localhost)")]
    InsecureContext,

    /// The runtime lacks the required media APIs
    #[error("Media capture is not supported: {message}")]
    Capability { message: String },

    /// The user declined microphone access
    #[error("Microphone permission denied: {message}")]
    PermissionDenied { message: String },

    /// No capture device is present
    #[error("No microphone found: {message}")]
    DeviceNotFound { message: String },

    /// Required identifier or credential missing, or bootstrap timed out
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Any SDK-reported failure during join/publish/subscribe/leave
    #[error("Error during {operation}: {message}")]
    Transport { operation: String, message: String },
}

/// Coarse error categories for logging and UI styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller input problem
    Input,
    /// Platform or device problem
    Platform,
    /// Deployment configuration problem
    Configuration,
    /// SDK or network problem
    Transport,
}

impl SessionError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a capability error
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transport error for the named operation
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Error returned by a join that a concurrent cleanup tore down
    pub fn interrupted() -> Self {
        Self::transport("join", "the session was torn down while joining")
    }

    /// Classify an SDK error raised during `operation`
    ///
    /// Browser-style media errors map onto the permission and device
    /// variants; everything else is a transport failure.
    pub fn from_sdk(operation: &str, err: SdkError) -> Self {
        let SdkError { name, message } = err;
        match name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                Self::PermissionDenied { message }
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                Self::DeviceNotFound { message }
            }
            _ if message.contains("Permission denied") || message.contains("NotAllowedError") => {
                Self::PermissionDenied { message }
            }
            _ => Self::Transport {
                operation: operation.to_string(),
                message: if name.is_empty() {
                    message
                } else {
                    format!("{}: {}", name, message)
                },
            },
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Input,
            Self::InsecureContext
            | Self::Capability { .. }
            | Self::PermissionDenied { .. }
            | Self::DeviceNotFound { .. } => ErrorCategory::Platform,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Transport { .. } => ErrorCategory::Transport,
        }
    }

    /// Text for the status banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Transport { operation, message } if operation == "join" => {
                format!("Error joining call: {}", message)
            }
            Self::Transport { operation, message } if operation == "leave" => {
                format!("Error leaving call: {}", message)
            }
            other => other.to_string(),
        }
    }

    /// Follow-up hint the user can act on, if any
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => Some(MICROPHONE_GUIDANCE),
            Self::DeviceNotFound { .. } => Some(DEVICE_GUIDANCE),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_browser_permission_errors() {
        let err = SessionError::from_sdk("capture", SdkError::new("NotAllowedError", "denied by user"));
        assert_eq!(
            err,
            SessionError::PermissionDenied {
                message: "denied by user".into()
            }
        );
        assert_eq!(err.guidance(), Some(MICROPHONE_GUIDANCE));

        let err = SessionError::from_sdk("capture", SdkError::message("Permission denied by system"));
        assert!(matches!(err, SessionError::PermissionDenied { .. }));
    }

    #[test]
    fn classifies_missing_device() {
        let err = SessionError::from_sdk("capture", SdkError::new("NotFoundError", "no input"));
        assert!(matches!(err, SessionError::DeviceNotFound { .. }));
        assert_eq!(err.category(), ErrorCategory::Platform);
    }

    #[test]
    fn other_sdk_errors_are_transport() {
        let err = SessionError::from_sdk("publish", SdkError::new("NETWORK_ERROR", "socket closed"));
        assert_eq!(
            err,
            SessionError::transport("publish", "NETWORK_ERROR: socket closed")
        );
        assert!(err.guidance().is_none());
    }

    #[test]
    fn join_and_leave_messages_match_banner_wording() {
        let join = SessionError::transport("join", "timeout");
        assert_eq!(join.user_message(), "Error joining call: timeout");
        let leave = SessionError::transport("leave", "gone");
        assert_eq!(leave.user_message(), "Error leaving call: gone");
        let validation = SessionError::validation("Please enter both username and room name");
        assert_eq!(validation.user_message(), "Please enter both username and room name");
    }
}
