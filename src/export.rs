//! Export and import formats.
//!
//! JSON is the round-trip format: a versioned bundle of all four stores.
//! CSV and Markdown are one-way reports. CSV fields are always quoted,
//! embedded quotes doubled, and leading formula characters neutralized so
//! a title like `=HYPERLINK(...)` lands inert in a spreadsheet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{CalendarEvent, Checklist, Todo, WorkLog};

/// Bundle format version. Bumped on breaking layout changes.
pub const EXPORT_VERSION: u32 = 1;

/// A full snapshot of every store.
///
/// Missing stores deserialize as empty, so a hand-trimmed bundle with only
/// todos in it still imports. Record ids in the file are never trusted;
/// the import path assigns fresh ones.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default)]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub work_logs: Vec<WorkLog>,
    #[serde(default)]
    pub calendar_events: Vec<CalendarEvent>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

/// How an import treats existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep what is there; imported records are added with fresh ids.
    Merge,
    /// Wipe every store first.
    Replace,
}

/// Serialize a bundle as pretty-printed JSON.
pub fn to_json(bundle: &ExportBundle) -> Result<String> {
    Ok(serde_json::to_string_pretty(bundle)?)
}

/// Parse a JSON bundle. Anything malformed maps to `InvalidImport`, as
/// does an object with none of the store keys and a bundle written by a
/// newer version of the format.
pub fn parse_bundle(raw: &str) -> Result<ExportBundle> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidImport(format!("not a valid export bundle: {e}")))?;
    let Some(object) = value.as_object() else {
        return Err(Error::InvalidImport(
            "export bundle must be a JSON object".to_string(),
        ));
    };
    let stores = ["work_logs", "calendar_events", "todos", "checklists"];
    if !stores.iter().any(|&key| object.contains_key(key)) {
        return Err(Error::InvalidImport(
            "export bundle has no recognized stores".to_string(),
        ));
    }
    let bundle: ExportBundle = serde_json::from_value(value)
        .map_err(|e| Error::InvalidImport(format!("not a valid export bundle: {e}")))?;
    if bundle.version > EXPORT_VERSION {
        return Err(Error::InvalidImport(format!(
            "bundle version {} is newer than supported version {EXPORT_VERSION}",
            bundle.version
        )));
    }
    Ok(bundle)
}

/// Render a bundle as sectioned CSV, one banner and header row per store.
pub fn to_csv(bundle: &ExportBundle) -> String {
    let mut csv = String::new();

    csv.push_str("=== WORK LOGS ===\n");
    csv.push_str("Date,Title,Content,Tags,Created,Updated\n");
    for log in &bundle.work_logs {
        csv.push_str(&csv_row(&[
            log.date.to_string(),
            log.title.clone(),
            log.content.clone(),
            log.tags.join("; "),
            log.created_at.to_rfc3339(),
            log.updated_at.to_rfc3339(),
        ]));
    }

    csv.push_str("\n=== CALENDAR EVENTS ===\n");
    csv.push_str("Date,Title,Location,Link,Description,Created,Updated\n");
    for event in &bundle.calendar_events {
        csv.push_str(&csv_row(&[
            event.date.to_string(),
            event.title.clone(),
            event.location.clone().unwrap_or_default(),
            event.link.clone().unwrap_or_default(),
            event.description.clone().unwrap_or_default(),
            event.created_at.to_rfc3339(),
            event.updated_at.to_rfc3339(),
        ]));
    }

    csv.push_str("\n=== TODOS ===\n");
    csv.push_str("Title,Priority,Due Date,Completed,Completed On,Recurrence,Created,Updated\n");
    for todo in &bundle.todos {
        csv.push_str(&csv_row(&[
            todo.title.clone(),
            todo.priority.to_string(),
            todo.due_date.map(|d| d.to_string()).unwrap_or_default(),
            if todo.completed { "yes" } else { "no" }.to_string(),
            todo.completed_on.map(|d| d.to_string()).unwrap_or_default(),
            todo.recurrence
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            todo.created_at.to_rfc3339(),
            todo.updated_at.to_rfc3339(),
        ]));
    }

    csv.push_str("\n=== CHECKLISTS ===\n");
    csv.push_str("Title,Assignee,Recurrence,Next Due,Last Completed,Created,Updated\n");
    for item in &bundle.checklists {
        csv.push_str(&csv_row(&[
            item.title.clone(),
            item.assignee.clone().unwrap_or_default(),
            item.policy.to_string(),
            item.next_due.map(|d| d.to_string()).unwrap_or_default(),
            item.last_completed.map(|d| d.to_string()).unwrap_or_default(),
            item.created_at.to_rfc3339(),
            item.updated_at.to_rfc3339(),
        ]));
    }

    csv
}

/// Render a bundle as a Markdown report.
pub fn to_markdown(bundle: &ExportBundle) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Workpad Export".to_string());
    lines.push(String::new());
    lines.push(format!(
        "**Export Date:** {}",
        bundle.exported_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(String::new());
    lines.push("**Statistics:**".to_string());
    lines.push(format!("- Work logs: {}", bundle.work_logs.len()));
    lines.push(format!(
        "- Calendar events: {}",
        bundle.calendar_events.len()
    ));
    lines.push(format!("- Todos: {}", bundle.todos.len()));
    lines.push(format!("- Checklists: {}", bundle.checklists.len()));
    lines.push(String::new());

    lines.push("## Work Logs".to_string());
    lines.push(String::new());
    if bundle.work_logs.is_empty() {
        lines.push("*No work logs*".to_string());
        lines.push(String::new());
    }
    for log in &bundle.work_logs {
        lines.push(format!("### {}", log.title));
        lines.push(String::new());
        lines.push(format!("**Date:** {}", log.date));
        lines.push(String::new());
        if !log.content.is_empty() {
            lines.push(log.content.clone());
            lines.push(String::new());
        }
        if !log.tags.is_empty() {
            lines.push(format!("**Tags:** {}", backtick_list(&log.tags)));
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("## Calendar Events".to_string());
    lines.push(String::new());
    if bundle.calendar_events.is_empty() {
        lines.push("*No calendar events*".to_string());
        lines.push(String::new());
    }
    for event in &bundle.calendar_events {
        lines.push(format!("### {}", event.title));
        lines.push(String::new());
        lines.push(format!("**Date:** {}", event.date));
        lines.push(String::new());
        if let Some(location) = &event.location {
            lines.push(format!("**Location:** {location}"));
            lines.push(String::new());
        }
        if let Some(link) = &event.link {
            lines.push(format!("**Link:** {link}"));
            lines.push(String::new());
        }
        if let Some(description) = &event.description {
            lines.push(format!("**Description:** {description}"));
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("## Todos".to_string());
    lines.push(String::new());
    if bundle.todos.is_empty() {
        lines.push("*No todos*".to_string());
        lines.push(String::new());
    }
    for todo in &bundle.todos {
        let marker = if todo.completed { "[x]" } else { "[ ]" };
        lines.push(format!("### {marker} {}", todo.title));
        lines.push(String::new());
        lines.push(format!("**Priority:** {}", todo.priority));
        lines.push(String::new());
        if let Some(due) = todo.due_date {
            lines.push(format!("**Due Date:** {due}"));
            lines.push(String::new());
        }
        if let Some(on) = todo.completed_on {
            lines.push(format!("**Completed On:** {on}"));
            lines.push(String::new());
        }
        if let Some(policy) = &todo.recurrence {
            lines.push(format!("**Repeats:** {policy}"));
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("## Checklists".to_string());
    lines.push(String::new());
    if bundle.checklists.is_empty() {
        lines.push("*No checklists*".to_string());
        lines.push(String::new());
    }
    for item in &bundle.checklists {
        lines.push(format!("### {}", item.title));
        lines.push(String::new());
        if let Some(assignee) = &item.assignee {
            lines.push(format!("**Assignee:** {assignee}"));
            lines.push(String::new());
        }
        lines.push(format!("**Repeats:** {}", item.policy));
        lines.push(String::new());
        if let Some(due) = item.next_due {
            lines.push(format!("**Next Due:** {due}"));
            lines.push(String::new());
        }
        if let Some(on) = item.last_completed {
            lines.push(format!("**Last Completed:** {on}"));
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

// ---------------------------------------------------------------------------
// CSV helpers
// ---------------------------------------------------------------------------

fn csv_row(fields: &[String]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

fn csv_field(value: &str) -> String {
    let safe = if starts_formula(value) {
        format!("'{value}")
    } else {
        value.to_string()
    };
    format!("\"{}\"", safe.replace('"', "\"\""))
}

fn starts_formula(value: &str) -> bool {
    let trimmed = value.trim_start();
    if trimmed.starts_with('\'') {
        return false;
    }
    matches!(trimmed.chars().next(), Some('=' | '+' | '-' | '@'))
}

fn backtick_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("`{item}`"))
        .collect::<Vec<_>>()
        .join(", ")
}
