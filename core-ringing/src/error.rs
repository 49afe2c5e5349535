//! # Ringing Error Types

use bridge_traits::{AlarmId, BridgeError};
use thiserror::Error;

use crate::state::Resource;

/// Errors raised by the ringing core.
#[derive(Error, Debug)]
pub enum RingError {
    // ========================================================================
    // Start rejections
    // ========================================================================
    /// Another alarm already owns the session. Callers discard the request.
    #[error("Alarm {active} is already ringing; refusing to start {requested}")]
    AlreadyRinging { active: AlarmId, requested: AlarmId },

    /// The request was malformed. No resources were touched.
    #[error("Invalid ring request: {0}")]
    InvalidRequest(String),

    /// The platform refused the foreground presence.
    #[error("Foreground presence rejected for alarm {id}: {message}")]
    ForegroundRejected { id: AlarmId, message: String },

    // ========================================================================
    // Resource errors
    // ========================================================================
    /// The audio asset could not be opened.
    #[error("Cannot open audio asset '{asset}': {message}")]
    UnresolvableAsset { asset: String, message: String },

    /// A resource could not be acquired; earlier acquisitions were unwound.
    #[error("Failed to acquire {resource}: {message}")]
    AcquisitionFailed { resource: Resource, message: String },

    /// A resource could not be released. Logged and absorbed by stop paths.
    #[error("Failed to release {resource}: {message}")]
    ResourceReleaseFailure { resource: Resource, message: String },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl RingError {
    pub(crate) fn release(resource: Resource, err: impl std::fmt::Display) -> Self {
        RingError::ResourceReleaseFailure {
            resource,
            message: err.to_string(),
        }
    }

    pub(crate) fn acquire(resource: Resource, err: impl std::fmt::Display) -> Self {
        RingError::AcquisitionFailed {
            resource,
            message: err.to_string(),
        }
    }

    /// Whether this error refused a start without touching anything.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RingError::AlreadyRinging { .. }
                | RingError::InvalidRequest(_)
                | RingError::ForegroundRejected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RingError>;
