//! HTTP routes for the messaging webhook, report downloads and health.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{download_report, health, receive_sms, SmsAppState};

/// Creates the router with all endpoints.
///
/// # Routes
///
/// - `POST /sms` - Inbound message webhook (form encoded)
/// - `GET /reports/:filename` - Generated report download
/// - `GET /health` - Liveness check
pub fn sms_router(state: SmsAppState) -> Router {
    Router::new()
        .route("/sms", post(receive_sms))
        .route("/reports/:filename", get(download_report))
        .route("/health", get(health))
        .with_state(state)
}
