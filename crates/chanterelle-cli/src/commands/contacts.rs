//! Contacts command - prints the admin contact list.

use crate::commands::{not_signed_in, CommandHandler, Site};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chanterelle_portal::{AdminViewer, ContactRow, ViewOutcome};

const HEADERS: [&str; 6] = ["ID", "Received", "Name", "Email", "Phone", "Message"];

/// Render rows as a left-aligned text table.
pub fn render_table(rows: &[ContactRow]) -> String {
    if rows.is_empty() {
        return "No contacts yet.".into();
    }

    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.id.to_string(),
                row.received.clone(),
                row.name.clone(),
                row.email.clone(),
                row.phone.clone().unwrap_or_default(),
                // keep each row on one line
                row.message.replace(['\r', '\n'], " "),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |line: &[&str]| {
        line.iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format_line(&HEADERS)];
    out.extend(
        cells
            .iter()
            .map(|line| format_line(&line.each_ref().map(String::as_str))),
    );
    out.join("\n")
}

pub struct ContactsHandler;

#[async_trait]
impl CommandHandler for ContactsHandler {
    fn name(&self) -> &str {
        "contacts"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let viewer = AdminViewer::new(site.client.clone(), site.session.clone());

        match viewer.activate().await {
            ViewOutcome::Loaded(_) => Ok(render_table(viewer.state().rows())),
            ViewOutcome::Redirect(route) => Err(AppError::Rejected(not_signed_in(route))),
            ViewOutcome::Failed(message) => Err(AppError::Rejected(message)),
            ViewOutcome::Ignored => Err(AppError::Rejected("Already loading contacts".into())),
        }
    }
}
