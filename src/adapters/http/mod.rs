//! HTTP adapters - axum endpoints.

pub mod sms;

pub use sms::{sms_router, SmsAppState, WebhookVerification};
