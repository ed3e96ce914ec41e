//! Text shaping for tickets: chat listings, update details and report rows.

use super::Ticket;

/// Date format used in generated reports.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Date format used in chat replies.
const CHAT_DATE_FORMAT: &str = "%d-%m-%y";

/// Formats tickets as one `"{id}: {description}"` line each.
///
/// Returns `None` when there is nothing to list so callers can send the
/// "no tickets" reply instead of an empty message.
pub fn format_ticket_list(tickets: &[Ticket]) -> Option<String> {
    if tickets.is_empty() {
        return None;
    }
    let lines: Vec<String> = tickets
        .iter()
        .map(|t| format!("{}: {}", t.id, t.description))
        .collect();
    Some(lines.join("\n"))
}

/// Formats the latest update of a single ticket.
pub fn format_ticket_update(ticket: &Ticket) -> String {
    format!(
        "Chamado {}: {} - \nÚltima atualização em {}:\n {}",
        ticket.id,
        ticket.description,
        ticket.updated_at.format(CHAT_DATE_FORMAT),
        ticket.last_update
    )
}

/// One row of a ticket report, with display-ready columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub ticket_id: String,
    pub description: String,
    pub opened_at: String,
    pub updated_at: String,
    pub last_update: String,
}

impl ReportRow {
    /// Column headers, in row order.
    pub const HEADERS: [&'static str; 5] = [
        "ID Chamado",
        "Descrição",
        "Data Chamado",
        "Data Atualização",
        "Última Atualização",
    ];

    /// Returns the columns in header order.
    pub fn columns(&self) -> [&str; 5] {
        [
            &self.ticket_id,
            &self.description,
            &self.opened_at,
            &self.updated_at,
            &self.last_update,
        ]
    }
}

impl From<&Ticket> for ReportRow {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id.to_string(),
            description: ticket.description.clone(),
            opened_at: ticket.opened_at.format(REPORT_DATE_FORMAT),
            updated_at: ticket.updated_at.format(REPORT_DATE_FORMAT),
            last_update: ticket.last_update.clone(),
        }
    }
}
