use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Operation not allowed by the platform: {0}")]
    NotAllowed(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the platform refused the operation on policy
    /// grounds (rate limiting, background restrictions, missing permission)
    /// rather than failing mid-way.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::NotAllowed(_) | BridgeError::PermissionDenied(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
