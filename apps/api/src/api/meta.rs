//! Liveness and readiness probes. Unauthenticated, no envelope.

use axum::http::StatusCode;

pub async fn live() -> StatusCode {
    StatusCode::OK
}

pub async fn ready() -> StatusCode {
    StatusCode::OK
}
