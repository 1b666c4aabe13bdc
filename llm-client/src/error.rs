use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid model preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LlmError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ServerOverloaded { .. })
    }

    /// Map a transport-level reqwest failure.
    ///
    /// Connect and timeout failures become [`LlmError::Connection`] so the retry
    /// loop picks them up; everything else is a plain API error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection {
                message: err.to_string(),
            }
        } else {
            Self::ApiError {
                message: format!("Request failed: {}", err),
                status_code: None,
            }
        }
    }

    /// Classify a non-success HTTP status with its extracted message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            503 => Self::ServerOverloaded { message },
            429 => Self::RateLimited { retry_after: None },
            _ => Self::ApiError {
                message,
                status_code: Some(status),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
