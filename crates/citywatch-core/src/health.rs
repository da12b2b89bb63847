use axum::http::StatusCode;

/// Liveness probe for `GET /health`.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
