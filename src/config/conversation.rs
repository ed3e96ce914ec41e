//! Conversation lifecycle configuration

use serde::Deserialize;
use std::time::Duration;

use crate::domain::conversation::ContinuationMode;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Inactivity after which a conversation is forgotten
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How often idle conversations are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub continuation_mode: ContinuationMode,
}

impl ConversationConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.idle_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive("conversation.idle_timeout_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::MustBePositive("conversation.sweep_interval_secs"));
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            continuation_mode: ContinuationMode::default(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}
