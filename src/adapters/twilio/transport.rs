//! Twilio messaging transport.
//!
//! Sends one SMS per call through the Programmable Messaging REST API:
//! `POST {base}/2010-04-01/Accounts/{sid}/Messages.json` with basic auth and
//! a form body of `From`, `To`, `Body` and optionally `MediaUrl`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::ports::{DeliveryError, DeliveryReceipt, MessageTransport, OutboundEnvelope};

/// Twilio API configuration.
#[derive(Clone)]
pub struct TwilioConfig {
    account_sid: String,
    auth_token: SecretString,
    /// Base URL for Twilio API (default: https://api.twilio.com).
    api_base_url: String,
    /// Attach `MediaUrl` when a message carries one.
    send_media: bool,
    request_timeout: Duration,
}

impl TwilioConfig {
    pub fn new(account_sid: impl Into<String>, auth_token: SecretString) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token,
            api_base_url: "https://api.twilio.com".to_string(),
            send_media: true,
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_send_media(mut self, send_media: bool) -> Self {
        self.send_media = send_media;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("send_media", &self.send_media)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    message: Option<String>,
}

/// Twilio implementation of the MessageTransport port.
pub struct TwilioTransport {
    config: TwilioConfig,
    http_client: reqwest::Client,
}

impl TwilioTransport {
    pub fn new(config: TwilioConfig) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn form_params<'a>(&self, envelope: &'a OutboundEnvelope) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("From", envelope.from.as_str()),
            ("To", envelope.to.as_str()),
            ("Body", envelope.message.body.as_str()),
        ];
        if self.config.send_media {
            if let Some(media_url) = envelope.message.media_url.as_deref() {
                params.push(("MediaUrl", media_url));
            }
        }
        params
    }
}

#[async_trait]
impl MessageTransport for TwilioTransport {
    async fn send(&self, envelope: &OutboundEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .http_client
            .post(self.config.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&self.form_params(envelope))
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResource>(&error_text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(error_text);
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| DeliveryError::InvalidResponse(e.to_string()))?;

        Ok(DeliveryReceipt {
            provider_id: resource.sid,
        })
    }
}
