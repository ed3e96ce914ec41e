//! Messaging webhook and report download endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, InboundSmsForm};
pub use handlers::{SmsApiError, SmsAppState, WebhookVerification};
pub use routes::sms_router;
