//! Application configuration
//!
//! Settings are read from environment variables (and a `.env` file when
//! present) with the `CONTRACT_DESK` prefix. Nested values use `__`:
//!
//! - `CONTRACT_DESK__SERVER__PORT=8080` -> `server.port`
//! - `CONTRACT_DESK__DATABASE__URL=...` -> `database.url`
//! - `CONTRACT_DESK__MESSAGING__PROVIDER=twilio` -> `messaging.provider`
//!
//! ```no_run
//! use contract_desk::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod conversation;
mod database;
mod error;
mod messaging;
mod reports;
mod server;

pub use conversation::ConversationConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use messaging::{MessagingConfig, MessagingProvider};
pub use reports::ReportsConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    #[serde(default)]
    pub messaging: MessagingConfig,

    pub reports: ReportsConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when required variables are missing or a value
    /// cannot be parsed into its field type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CONTRACT_DESK")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.messaging.validate()?;
        self.reports.validate(self.is_production())?;
        self.conversation.validate()?;
        self.validate_turn_budget()
    }

    /// A request timeout shorter than the slowest turn would drop the turn
    /// without a reply or an apology.
    fn validate_turn_budget(&self) -> Result<(), ValidationError> {
        let turn_secs = self.reports.pdf_timeout_secs + self.database.acquire_timeout_secs;
        if self.server.request_timeout_secs <= turn_secs {
            return Err(ValidationError::RequestTimeoutTooShort {
                request_secs: self.server.request_timeout_secs,
                turn_secs,
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
