use thiserror::Error;

/// Error taxonomy for provider operations, grounded on spec §7's provider
/// kind list and `ethers-providers::ProviderError`'s one-enum-per-crate
/// convention.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("unsupported network")]
    UnsupportedNetwork,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("not authorized")]
    NotAuthorized,
    #[error("throttled")]
    Throttled,
    #[error("timeout")]
    Timeout,
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("not found")]
    NotFound,
    #[error("server error: {0}")]
    ServerUnknownError(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
