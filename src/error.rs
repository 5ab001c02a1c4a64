use thiserror::Error;

/// Errors surfaced by the fleet core.
///
/// Cancellation is deliberately absent: a cancelled capture or a discarded
/// result is represented as an empty value, never as an error.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Persistence failure during {operation}: {reason}")]
    Persistence { operation: String, reason: String },

    #[error("Validation failed: {field} is required")]
    Validation { field: &'static str },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Rental invariant violated: {reason}")]
    InvariantViolation { reason: String },

    #[error("Invalid workflow transition: {action} while on {screen}")]
    InvalidTransition { action: &'static str, screen: String },

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Data store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FleetError {
    pub fn persistence(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        FleetError::Persistence {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        FleetError::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// True for failures the user can simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FleetError::Persistence { .. } | FleetError::Store(_) | FleetError::Io(_)
        )
    }
}

impl From<reqwest::Error> for FleetError {
    fn from(err: reqwest::Error) -> Self {
        FleetError::Store(err.to_string())
    }
}

pub type Result<T, E = FleetError> = std::result::Result<T, E>;
