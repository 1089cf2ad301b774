//! Error taxonomy reported to the hosting UI.

use crate::capture::{ConfigError, SessionError};
use thiserror::Error;

/// Coarse classification of a [`CameraError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Terminal: the user refused camera access.
    PermissionDenied,
    /// Terminal: the session could not be configured.
    Configuration,
    /// Per request: the session stays usable.
    Capture,
    /// Transient runtime notification.
    RuntimeFault,
}

/// Errors delivered to the delegate's `log_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera access denied")]
    PermissionDenied,
    #[error("configuration error: {reason}")]
    Configuration { reason: String },
    #[error("capture error: {reason}")]
    Capture { reason: String },
    #[error("capture error: capture already in progress")]
    CaptureInProgress,
    #[error("runtime fault: {reason}")]
    RuntimeFault { reason: String },
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::PermissionDenied => ErrorKind::PermissionDenied,
            CameraError::Configuration { .. } => ErrorKind::Configuration,
            CameraError::Capture { .. } | CameraError::CaptureInProgress => ErrorKind::Capture,
            CameraError::RuntimeFault { .. } => ErrorKind::RuntimeFault,
        }
    }

    /// True for errors after which the controller will never capture.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PermissionDenied | ErrorKind::Configuration
        )
    }

    pub(crate) fn capture(reason: impl ToString) -> Self {
        CameraError::Capture {
            reason: reason.to_string(),
        }
    }
}

/// Why session configuration failed.
#[derive(Debug, Clone, Error)]
pub enum ConfigurationFailure {
    #[error("no back camera available")]
    NoDevice,
    #[error("could not create video device input: {0}")]
    InputCreation(SessionError),
    #[error("could not add video device input to the session")]
    InputRejected,
    #[error("could not add photo output to the session")]
    OutputRejected,
    #[error("session rejected configuration: {0}")]
    Session(#[from] SessionError),
}

impl From<ConfigurationFailure> for CameraError {
    fn from(failure: ConfigurationFailure) -> Self {
        CameraError::Configuration {
            reason: failure.to_string(),
        }
    }
}

/// Errors raised while constructing a controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid controller configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(CameraError::PermissionDenied.is_terminal());
        assert!(CameraError::from(ConfigurationFailure::NoDevice).is_terminal());
        assert!(!CameraError::CaptureInProgress.is_terminal());
        assert_eq!(CameraError::CaptureInProgress.kind(), ErrorKind::Capture);
        assert_eq!(
            CameraError::RuntimeFault {
                reason: "x".to_string()
            }
            .kind(),
            ErrorKind::RuntimeFault
        );
    }

    #[test]
    fn test_configuration_reason_preserved() {
        let error = CameraError::from(ConfigurationFailure::OutputRejected);
        assert_eq!(
            error.to_string(),
            "configuration error: could not add photo output to the session"
        );
    }
}
