/// Core error type for the bot client.
///
/// Adapter crates map their transport failures into this type so the poller
/// and the command surface can tell retryable failures apart from platform
/// rejections and decode problems.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token: {0}")]
    Token(String),

    #[error("perform bootstrap before other operations")]
    BootstrapRequired,

    #[error("transient network error: {0}")]
    Transient(String),

    #[error("telegram responded: \"{description}\" with error code {}", code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    Query {
        code: Option<i64>,
        description: String,
    },

    #[error("unrecognized payload: {0}")]
    UnrecognizedPayload(String),

    #[error("invalid argument: {0}")]
    ArgumentType(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Timeouts and connection failures; the transport retries these forever.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Error::UnrecognizedPayload(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
