//! Error types for chorm

use thiserror::Error;

/// Result type alias for chorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for ClickHouse operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Connection error (unreachable host, bad URL)
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the statement
    #[error("Server error (HTTP {status}{}): {message}", .code.map(|c| format!(", code {c}")).unwrap_or_default())]
    Server {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    /// Row decode/mapping error
    #[error("Decode error: {0}")]
    Decode(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Local file error (temp tables, file inserts)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Check if the server rejected the statement
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// ClickHouse error code, when the server reported one.
    pub fn server_code(&self) -> Option<u32> {
        match self {
            Self::Server { code, .. } => *code,
            _ => None,
        }
    }

    /// Build a server error from an HTTP status and response body.
    ///
    /// ClickHouse bodies look like `Code: 60. DB::Exception: Table default.x does not exist...`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = body.trim().to_string();
        let code = message
            .strip_prefix("Code: ")
            .and_then(|rest| {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            });
        Self::Server {
            status,
            code,
            message,
        }
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for OrmError {
    fn from(err: url::ParseError) -> Self {
        Self::Connection(err.to_string())
    }
}
