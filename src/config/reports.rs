//! Report generation configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::ports::ReportFormat;

use super::error::ValidationError;

/// Where reports are written and how they are linked.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Externally reachable base URL of this service
    pub public_base_url: String,

    /// Directory holding generated reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub format: ReportFormat,

    /// Pandoc executable; searched on PATH when unset
    pub pandoc_path: Option<String>,

    #[serde(default = "default_pdf_timeout")]
    pub pdf_timeout_secs: u64,

    /// Age after which generated reports are deleted
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

impl ReportsConfig {
    /// Public URL of the messaging webhook, used for signature checks.
    pub fn webhook_url(&self) -> String {
        format!("{}/sms", self.public_base_url.trim_end_matches('/'))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Validate report configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.public_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("REPORTS__PUBLIC_BASE_URL"));
        }
        let https = self.public_base_url.starts_with("https://");
        if !https && !self.public_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidPublicUrl);
        }
        if production && !https {
            return Err(ValidationError::PublicUrlMustBeHttps);
        }
        if self.pdf_timeout_secs == 0 {
            return Err(ValidationError::MustBePositive("reports.pdf_timeout_secs"));
        }
        if self.retention_secs == 0 {
            return Err(ValidationError::MustBePositive("reports.retention_secs"));
        }
        Ok(())
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            output_dir: default_output_dir(),
            format: ReportFormat::default(),
            pandoc_path: None,
            pdf_timeout_secs: default_pdf_timeout(),
            retention_secs: default_retention(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("contract-desk-reports")
}

fn default_pdf_timeout() -> u64 {
    30
}

// Links stay valid for a day.
fn default_retention() -> u64 {
    24 * 60 * 60
}
