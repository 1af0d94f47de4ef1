//! Latency and outcome of remote calls.

use std::future::Future;
use std::time::Instant;

use crate::error::{ClientError, Result};

/// Records duration and outcome of one remote call.
///
/// A `NotFound` answer is a normal lookup result and gets its own status so
/// it does not read as a failing dependency.
pub(crate) async fn observe<T, F>(service: &'static str, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    metrics::histogram!(
        "client_request_duration_seconds",
        "service" => service,
        "operation" => operation,
        "status" => outcome(&result)
    )
    .record(start.elapsed().as_secs_f64());
    result
}

fn outcome<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(ClientError::NotFound { .. }) => "not_found",
        Err(_) => "failed",
    }
}
