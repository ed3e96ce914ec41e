//! Messaging provider configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which transport delivers outbound messages.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessagingProvider {
    /// Twilio Programmable Messaging.
    Twilio,
    /// Log messages instead of sending them.
    #[default]
    Log,
}

/// Outbound messaging and inbound webhook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    #[serde(default)]
    pub provider: MessagingProvider,

    /// Twilio account SID (AC...)
    pub account_sid: Option<String>,

    /// Twilio auth token; also keys webhook signatures
    pub auth_token: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Reject webhooks without a valid `X-Twilio-Signature`
    #[serde(default)]
    pub validate_signatures: bool,

    /// Pause between messages to one destination, in milliseconds
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    /// Provider calls in flight across all destinations
    #[serde(default = "default_max_concurrent_sends")]
    pub max_concurrent_sends: usize,

    /// Seconds an empty destination queue keeps its worker
    #[serde(default = "default_queue_idle_secs")]
    pub queue_idle_secs: u64,

    /// Attach report links as media
    #[serde(default = "default_send_media")]
    pub send_media: bool,
}

impl MessagingConfig {
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn queue_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_idle_secs)
    }

    /// Validate messaging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_sends == 0 {
            return Err(ValidationError::MustBePositive("messaging.max_concurrent_sends"));
        }
        if self.queue_idle_secs == 0 {
            return Err(ValidationError::MustBePositive("messaging.queue_idle_secs"));
        }

        let needs_credentials =
            self.provider == MessagingProvider::Twilio || self.validate_signatures;
        if needs_credentials && self.auth_token.is_none() {
            return Err(ValidationError::MissingRequired("MESSAGING__AUTH_TOKEN"));
        }
        if self.provider == MessagingProvider::Twilio {
            match self.account_sid.as_deref() {
                None | Some("") => {
                    return Err(ValidationError::MissingRequired("MESSAGING__ACCOUNT_SID"))
                }
                Some(sid) if !sid.starts_with("AC") => {
                    return Err(ValidationError::InvalidAccountSid)
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            provider: MessagingProvider::default(),
            account_sid: None,
            auth_token: None,
            api_base_url: default_api_base_url(),
            validate_signatures: false,
            send_delay_ms: default_send_delay_ms(),
            max_concurrent_sends: default_max_concurrent_sends(),
            queue_idle_secs: default_queue_idle_secs(),
            send_media: default_send_media(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_send_delay_ms() -> u64 {
    1000
}

fn default_max_concurrent_sends() -> usize {
    8
}

fn default_queue_idle_secs() -> u64 {
    30
}

fn default_send_media() -> bool {
    true
}
