//! Shared reqwest plumbing for the HTTP adapters.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{ClientError, Result};

/// Builds a client whose every request is bounded by `timeout`.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Maps a lookup response onto the client error taxonomy.
///
/// 404 becomes `NotFound`, any other non-success status becomes `UnexpectedStatus`.
pub(crate) fn expect_found(
    response: Response,
    service: &'static str,
    entity: &'static str,
    id: i64,
) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound { entity, id }),
        status => Err(ClientError::UnexpectedStatus {
            service,
            status: status.as_u16(),
        }),
    }
}
