use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::metrics::TimedOperation;
use crate::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Tag every response with a request id and its handling time in milliseconds.
pub async fn request_context(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    info!(%method, %path, %request_id, "Request received");

    let timer = TimedOperation::start();
    let mut response = next.run(request).await;
    let elapsed = timer.elapsed();
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

    let status = response.status();
    state.metrics.record_request(!status.is_client_error() && !status.is_server_error(), elapsed);

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}", elapsed_ms)) {
        headers.insert(PROCESS_TIME_HEADER, value);
    }

    info!(
        %method,
        %path,
        %request_id,
        status = status.as_u16(),
        response_time_ms = elapsed_ms,
        "Request completed"
    );
    response
}
