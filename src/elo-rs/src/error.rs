/// Errors returned by the Elo client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server could not be reached (DNS, connect, timeout)
    #[error("connection failed: {source}")]
    Connection {
        #[source]
        source: reqwest::Error,
    },

    /// 400
    #[error("validation error: {0}")]
    Validation(String),

    /// 401
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// 404
    #[error("not found: {0}")]
    NotFound(String),

    /// 5xx
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status
    #[error("unexpected status {status}: {message}")]
    Generic { status: u16, message: String },

    /// The caller misused the API; no request was sent
    #[error("usage error: {0}")]
    Usage(String),

    /// A 2xx body did not match the expected view
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// HTTP status that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => Some(400),
            Self::Authentication(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::Server { status, .. } | Self::Generic { status, .. } => Some(*status),
            Self::Connection { .. } | Self::Usage(_) | Self::Decode(_) => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(source: reqwest::Error) -> Self {
        Self::Connection { source }
    }
}

/// Map a non-2xx status and its response body to an error kind
pub fn classify(status: u16, message: impl Into<String>) -> ClientError {
    let message = message.into();
    match status {
        400 => ClientError::Validation(message),
        401 => ClientError::Authentication(message),
        404 => ClientError::NotFound(message),
        500.. => ClientError::Server { status, message },
        _ => ClientError::Generic { status, message },
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
