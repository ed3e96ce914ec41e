//! Report Generator Port - ticket reports as downloadable artifacts.
//!
//! The conversation hands over a contract's tickets; an adapter renders
//! them, stores the result, and returns where it can be downloaded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{contract::Ticket, foundation::ContractId};

/// Port for producing a ticket report.
///
/// # Contract
///
/// Implementations must:
/// - Return `ReportError::NoData` when the request has no tickets
/// - Give every artifact a unique file name
/// - Only return an artifact once it is fully stored
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<ReportArtifact, ReportError>;
}

/// Tickets to include in a report.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub contract_id: ContractId,
    pub tickets: Vec<Ticket>,
}

/// A stored report and its public location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub format: ReportFormat,
    pub download_url: String,
    /// SHA-256 of the stored content (hex).
    pub checksum: String,
}

/// Output formats for ticket reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// PDF document.
    #[default]
    Pdf,
    /// HTML document.
    Html,
    /// Comma-separated values, opens in spreadsheet tools.
    Csv,
}

impl ReportFormat {
    /// Get the MIME content type for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Get the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Html => "html",
            ReportFormat::Csv => "csv",
        }
    }

    /// Infers the format from a stored file's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "html" | "htm" => Ok(ReportFormat::Html),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(ReportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Errors that can occur while producing a report.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// Nothing to report on.
    #[error("No tickets to report")]
    NoData,

    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),

    /// External renderer (e.g., Pandoc) is not available.
    #[error("Report renderer unavailable: {0}")]
    Unavailable(String),

    #[error("Report rendering failed: {0}")]
    Rendering(String),

    #[error("Report rendering timed out after {0} seconds")]
    Timeout(u64),

    #[error("Report storage failed: {0}")]
    Storage(String),
}

impl ReportError {
    pub fn rendering(reason: impl Into<String>) -> Self {
        Self::Rendering(reason.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}
