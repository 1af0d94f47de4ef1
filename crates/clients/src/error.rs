//! Client error types.

use thiserror::Error;

/// Errors returned by remote service adapters.
///
/// `NotFound` is kept apart from every other failure because callers branch on it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote service reported that the requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The request never produced a response (connect error, timeout, broker down).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a status the adapter does not accept.
    #[error("Unexpected status {status} from {service}")]
    UnexpectedStatus { service: &'static str, status: u16 },

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns true for the distinguishable not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Transport(format!("invalid response body: {err}"))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Convenience type alias for client results.
pub type Result<T> = std::result::Result<T, ClientError>;
