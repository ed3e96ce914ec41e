//! Ticket report generator.
//!
//! Renders a contract's tickets as a table and stores the result:
//! - CSV using the `csv` crate
//! - HTML using pulldown-cmark (pure Rust)
//! - PDF using Pandoc (requires an external Pandoc installation)
//!
//! The HTML and PDF paths share one markdown rendering of the table.

use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulldown_cmark::{html, Options, Parser};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use uuid::Uuid;

use crate::domain::contract::ReportRow;
use crate::domain::foundation::ContractId;
use crate::ports::{
    ArtifactStorage, ReportArtifact, ReportError, ReportFormat, ReportGenerator, ReportRequest,
};

/// Report generator writing into an [`ArtifactStorage`].
///
/// # Example
///
/// ```rust,ignore
/// let generator = DocumentReportGenerator::new(storage, "https://desk.example.com")
///     .with_format(ReportFormat::Csv);
/// let artifact = generator.generate(&request).await?;
/// ```
pub struct DocumentReportGenerator {
    storage: Arc<dyn ArtifactStorage>,
    public_base_url: String,
    format: ReportFormat,
    /// Path to pandoc executable. If None, will search PATH.
    pandoc_path: Option<String>,
    pdf_timeout_secs: u64,
}

impl DocumentReportGenerator {
    pub fn new(storage: Arc<dyn ArtifactStorage>, public_base_url: impl Into<String>) -> Self {
        Self {
            storage,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            format: ReportFormat::default(),
            pandoc_path: None,
            pdf_timeout_secs: 30,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Set a custom path to the Pandoc executable.
    pub fn with_pandoc_path(mut self, path: impl Into<String>) -> Self {
        self.pandoc_path = Some(path.into());
        self
    }

    /// Set the timeout for PDF conversion.
    pub fn with_pdf_timeout(mut self, timeout_secs: u64) -> Self {
        self.pdf_timeout_secs = timeout_secs;
        self
    }

    fn pandoc_command(&self) -> &str {
        self.pandoc_path.as_deref().unwrap_or("pandoc")
    }

    fn file_name(&self, contract_id: ContractId) -> String {
        format!(
            "report_{}_{}.{}",
            contract_id,
            Uuid::new_v4().simple(),
            self.format.extension()
        )
    }

    fn download_url(&self, file_name: &str) -> String {
        format!("{}/reports/{}", self.public_base_url, file_name)
    }

    async fn render(&self, contract_id: ContractId, rows: &[ReportRow]) -> Result<Vec<u8>, ReportError> {
        match self.format {
            ReportFormat::Csv => render_csv(rows),
            ReportFormat::Html => Ok(render_html(&render_markdown(contract_id, rows)).into_bytes()),
            ReportFormat::Pdf => self.render_pdf(&render_markdown(contract_id, rows)).await,
        }
    }

    async fn render_pdf(&self, markdown: &str) -> Result<Vec<u8>, ReportError> {
        let mut child = Command::new(self.pandoc_command())
            .args([
                "-f",
                "markdown",
                "-t",
                "pdf",
                "-V",
                "geometry:margin=1in",
                "-V",
                "fontsize=10pt",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ReportError::unavailable(format!(
                    "Pandoc not found at '{}'",
                    self.pandoc_command()
                )),
                _ => ReportError::rendering(format!("Failed to start Pandoc: {}", e)),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(markdown.as_bytes())
                .await
                .map_err(|e| ReportError::rendering(format!("Failed to write to Pandoc: {}", e)))?;
        }

        let output = tokio::time::timeout(
            Duration::from_secs(self.pdf_timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ReportError::Timeout(self.pdf_timeout_secs))?
        .map_err(|e| ReportError::rendering(format!("Pandoc execution failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReportError::rendering(format!(
                "Pandoc returned error: {}",
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl ReportGenerator for DocumentReportGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<ReportArtifact, ReportError> {
        if request.tickets.is_empty() {
            return Err(ReportError::NoData);
        }

        let rows: Vec<ReportRow> = request.tickets.iter().map(ReportRow::from).collect();
        let content = self.render(request.contract_id, &rows).await?;

        let file_name = self.file_name(request.contract_id);
        let checksum = self
            .storage
            .write(&file_name, &content)
            .await
            .map_err(|e| ReportError::Storage(e.to_string()))?;

        tracing::debug!(
            contract_id = %request.contract_id,
            file = %file_name,
            rows = rows.len(),
            checksum = %checksum,
            "report stored"
        );

        Ok(ReportArtifact {
            download_url: self.download_url(&file_name),
            file_name,
            format: self.format,
            checksum,
        })
    }
}

/// Renders the ticket table as a markdown document.
fn render_markdown(contract_id: ContractId, rows: &[ReportRow]) -> String {
    let mut markdown = format!("# Relatório de chamados - contrato {}\n\n", contract_id);

    markdown.push_str(&table_line(&ReportRow::HEADERS));
    markdown.push_str(&table_line(&["---"; 5]));
    for row in rows {
        markdown.push_str(&table_line(&row.columns()));
    }
    markdown
}

fn table_line(cells: &[&str]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
    format!("| {} |\n", cells.join(" | "))
}

fn escape_cell(cell: &str) -> String {
    cell.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace(['\r', '\n'], " ")
}

fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <title>Relatório de chamados</title>
    <style>
{css}
    </style>
</head>
<body>
{body}
</body>
</html>"#,
        css = REPORT_CSS,
        body = body
    )
}

fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(ReportRow::HEADERS)
        .map_err(|e| ReportError::rendering(e.to_string()))?;
    for row in rows {
        writer
            .write_record(row.columns())
            .map_err(|e| ReportError::rendering(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ReportError::rendering(e.to_string()))
}

/// Used by the download endpoint when nothing else names the content type.
pub fn content_type_for(file_name: &str) -> &'static str {
    ReportFormat::from_file_name(file_name)
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream")
}

const REPORT_CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif;
    color: #1f2937;
    margin: 2rem;
}

table {
    width: 100%;
    border-collapse: collapse;
}

th, td {
    padding: 0.5rem;
    text-align: left;
    border: 1px solid #e5e7eb;
}

th {
    background-color: #f3f4f6;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::report::LocalArtifactStorage;
    use crate::domain::contract::Ticket;
    use crate::domain::foundation::{TicketId, Timestamp};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn ticket(id: i64, description: &str) -> Ticket {
        let at = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap());
        Ticket {
            id: TicketId::new(id),
            contract_id: ContractId::new(7),
            description: description.to_string(),
            opened_at: at,
            updated_at: at,
            last_update: "Técnico a caminho".to_string(),
        }
    }

    fn request(tickets: Vec<Ticket>) -> ReportRequest {
        ReportRequest {
            contract_id: ContractId::new(7),
            tickets,
        }
    }

    fn generator(format: ReportFormat) -> (DocumentReportGenerator, Arc<LocalArtifactStorage>, TempDir) {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(LocalArtifactStorage::new(temp.path()));
        let generator = DocumentReportGenerator::new(storage.clone(), "https://desk.example.com/")
            .with_format(format);
        (generator, storage, temp)
    }

    #[tokio::test]
    async fn empty_request_is_no_data() {
        let (generator, _storage, _temp) = generator(ReportFormat::Csv);

        let result = generator.generate(&request(vec![])).await;

        assert!(matches!(result, Err(ReportError::NoData)));
    }

    #[tokio::test]
    async fn csv_report_is_stored_with_headers_and_rows() {
        let (generator, storage, _temp) = generator(ReportFormat::Csv);

        let artifact = generator
            .generate(&request(vec![ticket(12, "Impressora"), ticket(7, "Rede, cabo")]))
            .await
            .unwrap();

        let content = String::from_utf8(storage.read(&artifact.file_name).await.unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "ID Chamado,Descrição,Data Chamado,Data Atualização,Última Atualização"
        );
        assert_eq!(lines[1], "12,Impressora,2024-05-02,2024-05-02,Técnico a caminho");
        assert_eq!(lines[2], "7,\"Rede, cabo\",2024-05-02,2024-05-02,Técnico a caminho");
    }

    #[tokio::test]
    async fn artifact_carries_checksum_of_stored_content() {
        use sha2::{Digest, Sha256};
        let (generator, storage, _temp) = generator(ReportFormat::Csv);

        let artifact = generator
            .generate(&request(vec![ticket(12, "Impressora")]))
            .await
            .unwrap();

        let content = storage.read(&artifact.file_name).await.unwrap();
        assert_eq!(artifact.checksum, hex::encode(Sha256::digest(&content)));
    }

    #[tokio::test]
    async fn artifact_name_and_url_follow_convention() {
        let (generator, _storage, _temp) = generator(ReportFormat::Csv);

        let artifact = generator
            .generate(&request(vec![ticket(1, "x")]))
            .await
            .unwrap();

        assert!(artifact.file_name.starts_with("report_7_"));
        assert!(artifact.file_name.ends_with(".csv"));
        assert_eq!(
            artifact.download_url,
            format!("https://desk.example.com/reports/{}", artifact.file_name)
        );
        assert_eq!(artifact.format, ReportFormat::Csv);
    }

    #[tokio::test]
    async fn each_report_gets_a_unique_name() {
        let (generator, _storage, _temp) = generator(ReportFormat::Csv);
        let req = request(vec![ticket(1, "x")]);

        let a = generator.generate(&req).await.unwrap();
        let b = generator.generate(&req).await.unwrap();

        assert_ne!(a.file_name, b.file_name);
    }

    #[tokio::test]
    async fn html_report_contains_table() {
        let (generator, storage, _temp) = generator(ReportFormat::Html);

        let artifact = generator
            .generate(&request(vec![ticket(12, "Impressora")]))
            .await
            .unwrap();

        let html = String::from_utf8(storage.read(&artifact.file_name).await.unwrap()).unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>ID Chamado</th>"));
        assert!(html.contains("<td>Impressora</td>"));
    }

    #[tokio::test]
    async fn missing_pandoc_is_unavailable() {
        let (generator, _storage, _temp) = generator(ReportFormat::Pdf);
        let generator = generator.with_pandoc_path("/nonexistent/pandoc-binary");

        let result = generator.generate(&request(vec![ticket(1, "x")])).await;

        assert!(matches!(result, Err(ReportError::Unavailable(_))));
    }

    #[test]
    fn markdown_table_has_one_line_per_ticket() {
        let rows: Vec<ReportRow> = [ticket(1, "a"), ticket(2, "b")]
            .iter()
            .map(ReportRow::from)
            .collect();

        let markdown = render_markdown(ContractId::new(7), &rows);

        assert_eq!(markdown.lines().filter(|l| l.starts_with('|')).count(), 4);
    }

    #[test]
    fn cells_escape_pipes_and_newlines() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }

    #[test]
    fn content_type_falls_back_to_octet_stream() {
        assert_eq!(content_type_for("report_1_a.pdf"), "application/pdf");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
    }
}
