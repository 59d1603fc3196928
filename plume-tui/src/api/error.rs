use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The refresh protocol failed and the local session has been cleared
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Raw response body for errors that carry one
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Api { body, .. } => Some(body),
            ApiError::NotFound(body) | ApiError::Unauthorized(body) | ApiError::BadRequest(body) => {
                Some(body)
            }
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
