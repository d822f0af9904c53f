//! Core data model.
//!
//! Four kinds of records cover a working day: calendar events, work logs,
//! todos, and checklists. Checklists and todos can carry a recurrence
//! policy; due dates are derived from it, never set by hand.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// Unit of recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// Every `period_value` days.
    Daily,
    /// Every `period_value` weeks.
    Weekly,
    /// Every `period_value` calendar months.
    Monthly,
    /// Does not repeat.
    None,
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PeriodType::Daily => "daily",
            PeriodType::Weekly => "weekly",
            PeriodType::Monthly => "monthly",
            PeriodType::None => "none",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PeriodType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(PeriodType::Daily),
            "weekly" => Ok(PeriodType::Weekly),
            "monthly" => Ok(PeriodType::Monthly),
            "none" => Ok(PeriodType::None),
            other => Err(Error::InvalidPolicy(format!(
                "unknown period type: {other}"
            ))),
        }
    }
}

/// How an item repeats.
///
/// `period_value` scales the unit: every 2 weeks, every 3 months. A value
/// of 1 with `PeriodType::None` is the canonical "does not repeat" policy.
/// `repeat_count` caps forward materialization; completing an item never
/// consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePolicy {
    pub period_type: PeriodType,
    pub period_value: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<u32>,
}

impl RecurrencePolicy {
    /// Repeat every `value` units.
    pub fn every(period_type: PeriodType, value: u32) -> Self {
        Self {
            period_type,
            period_value: value,
            repeat_count: None,
        }
    }

    /// The "does not repeat" policy.
    pub fn once() -> Self {
        Self {
            period_type: PeriodType::None,
            period_value: 1,
            repeat_count: None,
        }
    }

    pub fn repeat_count(mut self, n: u32) -> Self {
        self.repeat_count = Some(n);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.period_type != PeriodType::None
    }

    /// Structural validity: period and repeat counts start at 1.
    pub fn validate(&self) -> Result<()> {
        if self.period_value < 1 {
            return Err(Error::InvalidPolicy(format!(
                "period_value must be >= 1, got {}",
                self.period_value
            )));
        }
        if let Some(n) = self.repeat_count {
            if n < 1 {
                return Err(Error::InvalidPolicy(format!(
                    "repeat_count must be >= 1, got {n}"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for RecurrencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.period_type, self.period_value) {
            (PeriodType::None, _) => write!(f, "once"),
            (PeriodType::Daily, 1) => write!(f, "daily"),
            (PeriodType::Weekly, 1) => write!(f, "weekly"),
            (PeriodType::Monthly, 1) => write!(f, "monthly"),
            (PeriodType::Daily, n) => write!(f, "every {n} days"),
            (PeriodType::Weekly, n) => write!(f, "every {n} weeks"),
            (PeriodType::Monthly, n) => write!(f, "every {n} months"),
        }
    }
}

// ---------------------------------------------------------------------------
// Checklist
// ---------------------------------------------------------------------------

/// A recurring check item (e.g., "water the plants", "monthly report").
///
/// `next_due` is derived: seeded one period after creation, re-derived from
/// the completion date each time the item is checked off. For a
/// non-recurring policy it holds the optional fixed due date and never
/// advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checklist {
    pub id: i64,
    pub title: String,
    /// Who the item is assigned to, if anyone.
    pub assignee: Option<String>,
    pub policy: RecurrencePolicy,
    pub next_due: Option<NaiveDate>,
    pub last_completed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Todo
// ---------------------------------------------------------------------------

/// A one-shot (or self-renewing) task.
///
/// Completing a todo with a recurrence policy closes this record and spawns
/// the next instance with the due date advanced one period. That is the
/// difference from checklists, which roll forward in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePolicy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Todo priority. Declaration order is sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(Error::Other(format!("unknown priority: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Work Log
// ---------------------------------------------------------------------------

/// A dated journal entry describing work done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Calendar Event
// ---------------------------------------------------------------------------

/// A dated calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub location: Option<String>,
    /// Meeting or reference URL. Script-capable schemes are dropped on
    /// write.
    pub link: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Builder for a new checklist item. The engine's public API for adding one.
pub struct NewChecklist {
    pub(crate) title: String,
    pub(crate) assignee: Option<String>,
    pub(crate) policy: RecurrencePolicy,
    pub(crate) due: Option<NaiveDate>,
}

impl NewChecklist {
    pub fn new(title: impl Into<String>, policy: RecurrencePolicy) -> Self {
        Self {
            title: title.into(),
            assignee: None,
            policy,
            due: None,
        }
    }

    pub fn assignee(mut self, who: impl Into<String>) -> Self {
        self.assignee = Some(who.into());
        self
    }

    /// Fixed due date for a non-recurring item. Ignored when the policy
    /// recurs, since recurring due dates are always derived.
    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due = Some(date);
        self
    }
}

/// Builder for a new todo.
pub struct NewTodo {
    pub(crate) title: String,
    pub(crate) priority: Priority,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) recurrence: Option<RecurrencePolicy>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            priority: Priority::Medium,
            due_date: None,
            recurrence: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn recurrence(mut self, policy: RecurrencePolicy) -> Self {
        self.recurrence = Some(policy);
        self
    }
}

/// Builder for a new work log entry.
pub struct NewWorkLog {
    pub(crate) date: NaiveDate,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
}

impl NewWorkLog {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            content: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Builder for a new calendar event.
pub struct NewCalendarEvent {
    pub(crate) date: NaiveDate,
    pub(crate) title: String,
    pub(crate) location: Option<String>,
    pub(crate) link: Option<String>,
    pub(crate) description: Option<String>,
}

impl NewCalendarEvent {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Self {
            date,
            title: title.into(),
            location: None,
            link: None,
            description: None,
        }
    }

    pub fn location(mut self, place: impl Into<String>) -> Self {
        self.location = Some(place.into());
        self
    }

    pub fn link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}
