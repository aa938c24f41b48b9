//! Card view model: the display strings for one server card

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::changes::ChangedField;
use crate::state::{ServerStatus, SharedState};
use crate::status::Severity;
use crate::time_since::time_since;

pub const NOT_AVAILABLE: &str = "N/A";

/// Payload details, only shown while the server answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardDetails {
    pub coin: String,
    pub block_height: String,
    pub synchronized: String,
    pub synchronized_ok: bool,
    pub last_block: String,
    pub mempool_sync: String,
    pub mempool_sync_ok: bool,
    pub last_mempool: String,
    pub version: String,
}

/// Everything the dashboard needs to draw one server card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub name: String,
    pub region: String,
    pub url: String,
    pub accent_color: String,
    pub status: Severity,
    pub status_label: String,
    pub details: Option<CardDetails>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub connection_error: Option<String>,
    /// `None` after the first observation: every field counts as changed
    pub changed_fields: Option<Vec<ChangedField>>,
    /// Changed fields still inside the highlight window
    pub highlighted_fields: Vec<ChangedField>,
    pub first_observation: bool,
    pub recently_updated: bool,
}

impl CardView {
    pub fn build(status: &ServerStatus, now: DateTime<Utc>, instant: Instant) -> Self {
        let report = &status.report;
        let details = report.status.has_details().then(|| {
            let blockbook = &report.blockbook;
            CardDetails {
                coin: or_na(blockbook.coin.as_deref()),
                block_height: report
                    .block_height()
                    .map(format_height)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                synchronized: yes_no(blockbook.in_sync).to_string(),
                synchronized_ok: blockbook.in_sync == Some(true),
                last_block: relative(blockbook.last_block_time.as_deref(), now),
                mempool_sync: yes_no(blockbook.in_sync_mempool).to_string(),
                mempool_sync_ok: blockbook.in_sync_mempool == Some(true),
                last_mempool: relative(blockbook.last_mempool_time.as_deref(), now),
                version: or_na(blockbook.version.as_deref()),
            }
        });

        Self {
            name: status.server.name.clone(),
            region: status.server.region.clone(),
            url: status.server.url.clone(),
            accent_color: status.server.accent_color.clone(),
            status: report.status,
            status_label: report.status.label().to_string(),
            details,
            warnings: report.warnings.clone(),
            errors: report.errors.clone(),
            connection_error: report
                .error
                .as_ref()
                .map(|e| format!("Connection failed: {}", e)),
            changed_fields: status.changes.clone(),
            highlighted_fields: status.highlighted_fields(instant).to_vec(),
            first_observation: status.is_first_observation(),
            recently_updated: status.is_recently_updated(instant),
        }
    }

    /// Whether the given field should be highlighted as changed
    pub fn is_changed(&self, field: ChangedField) -> bool {
        self.highlighted_fields.contains(&field)
    }

    /// Render the card as an HTML fragment
    pub fn to_html(&self) -> String {
        let highlight = |field: ChangedField| {
            if self.is_changed(field) {
                " changed"
            } else {
                ""
            }
        };
        let row = |field: ChangedField, label: &str, value: &str, class: &str| {
            format!(
                r#"<div class="row{}" data-field="{}"><span class="label">{}</span><span class="value {}">{}</span></div>"#,
                highlight(field),
                field,
                label,
                class,
                escape_html(value)
            )
        };

        let mut rows = row(
            ChangedField::Status,
            "Status",
            &self.status_label,
            &format!("status-{}", self.status),
        );
        if let Some(d) = &self.details {
            let sync_class = |ok: bool| if ok { "good" } else { "bad" };
            rows.push_str(&row(ChangedField::Coin, "Coin", &d.coin, ""));
            rows.push_str(&row(
                ChangedField::BlockHeight,
                "Block Height",
                &d.block_height,
                "",
            ));
            rows.push_str(&row(
                ChangedField::Synchronized,
                "Synchronized",
                &d.synchronized,
                sync_class(d.synchronized_ok),
            ));
            rows.push_str(&row(ChangedField::LastBlock, "Last Block", &d.last_block, ""));
            rows.push_str(&row(
                ChangedField::MempoolSync,
                "Mempool Sync",
                &d.mempool_sync,
                sync_class(d.mempool_sync_ok),
            ));
            rows.push_str(&row(
                ChangedField::LastMempool,
                "Last Mempool Update",
                &d.last_mempool,
                "",
            ));
            rows.push_str(&row(ChangedField::Version, "Version", &d.version, ""));
        }

        let mut messages = String::new();
        for warning in &self.warnings {
            messages.push_str(&format!(
                r#"<div class="warning">&#9888; {}</div>"#,
                escape_html(warning)
            ));
        }
        for error in self.errors.iter().chain(self.connection_error.iter()) {
            messages.push_str(&format!(
                r#"<div class="error">&#10060; {}</div>"#,
                escape_html(error)
            ));
        }

        format!(
            r#"<div class="card{}" style="border-top-color: {};"><div class="card-header"><div><div class="name">{}</div><div class="region">{}</div></div><span class="dot status-{}"></span></div>{}{}<a href="{}" target="_blank" rel="noopener noreferrer">Visit Server &rarr;</a></div>"#,
            if self.recently_updated { " updated" } else { "" },
            escape_html(&self.accent_color),
            escape_html(&self.name),
            escape_html(&self.region),
            self.status,
            rows,
            messages,
            escape_html(&self.url)
        )
    }
}

/// Build the cards of every server in configuration order
pub fn cards(state: &SharedState, now: DateTime<Utc>, instant: Instant) -> Vec<CardView> {
    state
        .servers
        .iter()
        .map(|s| CardView::build(s, now, instant))
        .collect()
}

/// Format a block height with thousands separators ("870,123")
pub fn format_height(height: u64) -> String {
    let digits = height.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn yes_no(flag: Option<bool>) -> &'static str {
    if flag == Some(true) {
        "\u{2713} Yes"
    } else {
        "\u{2717} No"
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn relative(timestamp: Option<&str>, now: DateTime<Utc>) -> String {
    timestamp
        .and_then(|t| time_since(t, now))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Escape text for inclusion in HTML content or attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
