//! Twilio adapters - outbound SMS and inbound webhook verification.

mod signature;
mod transport;

pub use signature::{TwilioSignatureVerifier, SIGNATURE_HEADER};
pub use transport::{TwilioConfig, TwilioTransport};
