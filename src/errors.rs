use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("CONNECTION_FAILED: {0}")]
    Connection(String),
    #[error("TIMEOUT: {0}")]
    Timeout(String),
    #[error("AUTHENTICATION_FAILED: {0}")]
    Authentication(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("RATE_LIMITED: {0}")]
    RateLimited(String),
    #[error("SERVER_ERROR: {0}")]
    Server(String),
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),
    #[error("DECODE_FAILURE: {0}")]
    Decode(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("INVALID_ARGUMENTS: {0}")]
    InvalidArguments(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    /// Errors worth another attempt against the upstream API.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::RateLimited(_) | Self::Server(_)
        )
    }

    /// Maps a non-2xx upstream status onto the error taxonomy.
    pub fn from_status(status: u16, endpoint: &str) -> Self {
        match status {
            401 | 403 => Self::Authentication(format!(
                "Authentication failed (status {}). Check credentials.",
                status
            )),
            404 => Self::NotFound(format!("Resource not found: {}", endpoint)),
            429 => Self::RateLimited("API rate limit exceeded. Please retry later.".to_string()),
            500..=599 => Self::Server(format!("Oseon server error (status {})", status)),
            _ => Self::Upstream(format!("API request failed with status {}", status)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout(value.to_string())
        } else if value.is_decode() {
            Self::Decode(value.to_string())
        } else if let Some(status) = value.status() {
            Self::from_status(status.as_u16(), value.url().map(|url| url.path()).unwrap_or_default())
        } else {
            Self::Connection(value.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
