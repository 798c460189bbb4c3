// errors.rs
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, missing resources, validation) or downstream layers (DB, mail).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("this link has expired, please request a new one")]
    TokenExpired,

    #[error("this link has already been used")]
    TokenUsed,

    #[error("plan limit reached: {0}")]
    LimitReached(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Mail Error: {0}")]
    Mail(String),

    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ServerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ServerError::NotFound(what.into())
    }

    /// HTTP status used when this error reaches the router boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::Validation { .. } | ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::LimitReached(_) => 402,
            ServerError::Forbidden(_) => 403,
            ServerError::Conflict(_) | ServerError::TokenUsed => 409,
            ServerError::TokenExpired => 410,
            ServerError::DbError(_)
            | ServerError::Config(_)
            | ServerError::Mail(_)
            | ServerError::InternalError => 500,
        }
    }

    /// Message safe to show the user. Backend details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ServerError::DbError(_) | ServerError::Config(_) | ServerError::InternalError => {
                "Something went wrong on our side. Please try again.".to_string()
            }
            ServerError::Mail(_) => "We could not send the email. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}
