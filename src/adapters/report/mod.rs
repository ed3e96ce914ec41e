//! Report adapters - rendering and storing ticket reports.

mod document_report_generator;
mod local_artifact_storage;

pub use document_report_generator::{content_type_for, DocumentReportGenerator};
pub use local_artifact_storage::LocalArtifactStorage;
