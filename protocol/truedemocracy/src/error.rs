use thiserror::Error;

/// Failure kinds surfaced by every keeper operation. Messages are short and
/// deterministic so they can be included in block results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("unknown request: {0}")]
    UnknownRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("logic error: {0}")]
    Logic(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::UnknownRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientFunds(msg.into())
    }

    pub fn logic(msg: impl Into<String>) -> Self {
        Self::Logic(msg.into())
    }

    /// Stable short code, used as the `code` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::UnknownRequest(_) => "unknown_request",
            Self::NotFound(_) => "not_found",
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::Logic(_) => "logic",
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Logic(format!("codec: {err}"))
    }
}
