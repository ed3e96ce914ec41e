//! Outbound messages and the ordered batch produced by one turn.
//!
//! A batch is a script: confirmation, then listing, then prompt. Order is
//! preserved from the state that produced each entry to the channel.

use serde::Serialize;

/// A single outbound payload: text, optionally with a media reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl OutboundMessage {
    /// Creates a text-only message.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media_url: None,
        }
    }

    /// Creates a message carrying a media reference alongside its text.
    pub fn with_media(body: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            media_url: Some(media_url.into()),
        }
    }

    /// True when there is nothing worth sending.
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty() && self.media_url.is_none()
    }
}

/// Ordered messages produced by one turn.
///
/// Blank entries are dropped on insertion, so a batch never carries
/// empty or whitespace-only text to the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MessageBatch(Vec<OutboundMessage>);

impl MessageBatch {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a batch holding a single text message.
    pub fn single(body: impl Into<String>) -> Self {
        let mut batch = Self::new();
        batch.push_text(body);
        batch
    }

    /// Appends a message unless it is blank.
    pub fn push(&mut self, message: OutboundMessage) {
        if !message.is_blank() {
            self.0.push(message);
        }
    }

    /// Appends a text message unless it is blank.
    pub fn push_text(&mut self, body: impl Into<String>) {
        self.push(OutboundMessage::text(body));
    }

    /// Appends every message of another batch, keeping its order.
    pub fn extend(&mut self, other: MessageBatch) {
        self.0.extend(other.0);
    }

    /// Builder form of [`MessageBatch::extend`].
    pub fn followed_by(mut self, other: MessageBatch) -> Self {
        self.extend(other);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutboundMessage> {
        self.0.iter()
    }

    /// Returns the text bodies in order.
    pub fn bodies(&self) -> Vec<&str> {
        self.0.iter().map(|m| m.body.as_str()).collect()
    }
}

impl IntoIterator for MessageBatch {
    type Item = OutboundMessage;
    type IntoIter = std::vec::IntoIter<OutboundMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<OutboundMessage> for MessageBatch {
    fn from_iter<I: IntoIterator<Item = OutboundMessage>>(iter: I) -> Self {
        let mut batch = MessageBatch::new();
        for message in iter {
            batch.push(message);
        }
        batch
    }
}
