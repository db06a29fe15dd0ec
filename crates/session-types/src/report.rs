//! Plain-text and HTML rendering of a change set for the notification email.

use crate::{ChangeSet, FieldEdit, SessionRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Rendered message bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub text: String,
    pub html: String,
}

/// Render `changes` into text and HTML bodies.
///
/// The banner line is always present; the Added, Removed and Edited sections
/// appear in that order and only when they have entries.
pub fn render_report(changes: &ChangeSet, generated_at: NaiveDateTime) -> ReportMessage {
    let banner = format!(
        "Session changes detected at {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let added: Vec<String> = changes.added.iter().map(session_line).collect();
    let removed: Vec<String> = changes.removed.iter().map(session_line).collect();
    let edited: Vec<String> = changes.edited.iter().map(edit_line).collect();

    let sections = [
        ("Added Sessions", added),
        ("Removed Sessions", removed),
        ("Edited Sessions", edited),
    ];

    let mut text = format!("{}\n", banner);
    let mut html = format!("<p>{}</p>\n", escape_html(&banner));

    for (title, lines) in sections.iter().filter(|(_, lines)| !lines.is_empty()) {
        let header = format!("{} ({})", title, lines.len());

        text.push_str(&format!("\n{}\n", header));
        html.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape_html(&header)));
        for line in lines {
            text.push_str(&format!("- {}\n", line));
            html.push_str(&format!("<li>{}</li>\n", escape_html(line)));
        }
        html.push_str("</ul>\n");
    }

    ReportMessage { text, html }
}

fn session_line(record: &SessionRecord) -> String {
    format!(
        "Session ID: {}|Session Name: {}|Start Date: {}|End Date: {}|Group Name: {}|Room: {}|Status: {}",
        record.session_id,
        record.session_name,
        record.session_start_date_time,
        record.session_end_date_time,
        record.group_name,
        record.room_name,
        record.session_status
    )
}

fn edit_line(edit: &FieldEdit) -> String {
    format!(
        "Session {}: field {} changed from \"{}\" to \"{}\"",
        edit.session_id, edit.field, edit.previous_value, edit.current_value
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
