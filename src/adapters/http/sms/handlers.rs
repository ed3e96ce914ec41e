//! HTTP handlers for the messaging webhook, report downloads and health.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::report::content_type_for;
use crate::adapters::twilio::{TwilioSignatureVerifier, SIGNATURE_HEADER};
use crate::application::{HandleInboundMessageHandler, InboundMessageCommand};
use crate::domain::foundation::ChannelAddress;
use crate::ports::{ArtifactStorage, StorageError};

use super::dto::{ErrorResponse, HealthResponse, InboundSmsForm};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Signature checking for inbound webhooks.
#[derive(Clone)]
pub struct WebhookVerification {
    pub verifier: TwilioSignatureVerifier,
    /// Public URL the provider posts to; part of the signed payload.
    pub webhook_url: String,
}

#[derive(Clone)]
pub struct SmsAppState {
    pub inbound_handler: Arc<HandleInboundMessageHandler>,
    pub artifacts: Arc<dyn ArtifactStorage>,
    pub verification: Option<WebhookVerification>,
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /sms - Inbound message webhook
///
/// Runs one conversation turn and hands the replies to the sender. Responds
/// before the replies are delivered.
pub async fn receive_sms(
    State(state): State<SmsAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, SmsApiError> {
    if let Some(verification) = &state.verification {
        let params: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
            .map_err(|e| SmsApiError::BadRequest(format!("Malformed form: {}", e)))?;
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verification
            .verifier
            .verify(&verification.webhook_url, &params, signature)
        {
            return Err(SmsApiError::Forbidden);
        }
    }

    let form: InboundSmsForm = serde_urlencoded::from_bytes(&body)
        .map_err(|e| SmsApiError::BadRequest(format!("Malformed form: {}", e)))?;

    let from = ChannelAddress::new(form.from)
        .map_err(|e| SmsApiError::BadRequest(e.to_string()))?;
    let to =
        ChannelAddress::new(form.to).map_err(|e| SmsApiError::BadRequest(e.to_string()))?;

    tracing::debug!(conversation = %from, "inbound message");

    let result = state
        .inbound_handler
        .handle(InboundMessageCommand {
            from,
            to,
            body: form.body,
        })
        .await;

    tracing::debug!(
        state = ?result.state,
        messages = result.batch.len(),
        recovered = result.recovered,
        "inbound message handled"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// GET /reports/:filename - Download a generated report
pub async fn download_report(
    State(state): State<SmsAppState>,
    Path(filename): Path<String>,
) -> Result<Response, SmsApiError> {
    let content = state.artifacts.read(&filename).await?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((StatusCode::OK, headers, content).into_response())
}

/// GET /health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════

/// API error type that converts failures to HTTP responses.
#[derive(Debug)]
pub enum SmsApiError {
    BadRequest(String),
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl From<StorageError> for SmsApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => {
                Self::BadRequest(format!("Invalid file name: {}", name))
            }
            StorageError::NotFound(name) => Self::NotFound(name),
            StorageError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for SmsApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            SmsApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            SmsApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("INVALID_SIGNATURE", "Webhook signature verification failed"),
            ),
            SmsApiError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", format!("Report not found: {}", name)),
            ),
            SmsApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
