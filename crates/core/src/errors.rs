use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CalError {
    /// True for errors the caller caused and can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CalError::Database(_) | CalError::Internal(_))
    }
}

pub type CalResult<T> = Result<T, CalError>;
