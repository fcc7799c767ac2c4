/// Shared error type used across all Navium crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Transient provider failure (rate limit, throttling, retryable 5xx).
    /// The only variant the LLM retry loop will retry.
    #[error("provider {provider} throttled: {message}")]
    Throttled { provider: String, message: String },

    #[error("accessibility tree: {0}")]
    Tree(String),

    #[error("unknown element id: {0}")]
    UnknownId(u64),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the LLM retry loop should retry this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Throttled { .. })
    }
}
