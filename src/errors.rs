use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Non-success response from a text-generation backend.
    #[error("Provider error ({provider}, HTTP {status}): {body}")]
    Provider {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KbRagError {
    /// True when the caller sent something we refuse to process.
    ///
    /// Everything else is an infrastructure failure and maps to a 5xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

impl From<reqwest::Error> for KbRagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, KbRagError>;
