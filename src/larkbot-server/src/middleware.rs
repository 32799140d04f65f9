//! HTTP middleware components.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, warn};

/// Log every request with its outcome.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    debug!("{} {}", method, uri);

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    if status.is_server_error() {
        warn!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %format!("{:.2}", duration_ms),
            "Request failed"
        );
    } else {
        debug!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %format!("{:.2}", duration_ms),
            "Request completed"
        );
    }

    response
}
