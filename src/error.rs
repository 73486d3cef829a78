use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid address token: {0}")]
    InvalidFormat(String),

    #[error("Failed to fetch {url} after {attempts} attempts")]
    FetchFailed { url: String, attempts: u32 },

    #[error("{url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP request error: {0}")]
    RequestError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Task join error: {0}")]
    TaskJoinError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

// Utility methods for error conversion
impl AppError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::RequestError(format!("request timed out: {}", err))
        } else {
            AppError::RequestError(err.to_string())
        }
    }
}

// From trait implementations for common error types
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_reqwest_error(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::JsonError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::TaskJoinError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(format!("Invalid URL: {}", err))
    }
}
