//! Core engine. The public API over the four stores.
//!
//! Every write goes through here: inputs pass the sanitization boundary
//! exactly once on the way in, recurrence policies are validated before
//! they touch storage, and schedule fields (`next_due`, spawned todo
//! instances) are derived rather than accepted from callers. No method
//! reads the clock for scheduling decisions; reference dates are passed
//! in, so completions can be back-dated and tests are deterministic.

use std::path::Path;

use chrono::{Days, Months, NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::export::{EXPORT_VERSION, ExportBundle, ImportMode};
use crate::model::*;
use crate::recur;
use crate::sanitize::{clean_tags, clean_text, clean_url};
use crate::storage::Storage;

/// The workpad engine. Owns the storage and enforces all invariants.
pub struct Engine {
    storage: Storage,
}

/// Everything attached to one calendar day.
#[derive(Debug)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub events: Vec<CalendarEvent>,
    pub logs: Vec<WorkLog>,
    pub due_todos: Vec<Todo>,
    pub due_checklists: Vec<Checklist>,
}

/// One month's records, for the calendar grid.
#[derive(Debug)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub events: Vec<CalendarEvent>,
    pub logs: Vec<WorkLog>,
    /// Open todos due inside the month.
    pub todos: Vec<Todo>,
    /// Checklist items due inside the month.
    pub checklists: Vec<Checklist>,
}

/// Everything due within a horizon, overdue items included.
#[derive(Debug)]
pub struct DueReport {
    pub todos: Vec<Todo>,
    pub checklists: Vec<Checklist>,
}

/// What happened when a todo was completed.
#[derive(Debug)]
pub struct CompletedTodo {
    pub todo: Todo,
    /// The spawned next instance, when the completed todo recurs.
    pub next: Option<Todo>,
}

/// Entity counts for the stats view.
#[derive(Debug)]
pub struct Statistics {
    pub work_logs: i64,
    pub calendar_events: i64,
    pub active_todos: i64,
    pub completed_todos: i64,
    pub checklists: i64,
    /// Checklist items due today or overdue.
    pub due_checklists: i64,
}

/// Per-store insert counts from an import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub work_logs: usize,
    pub calendar_events: usize,
    pub todos: usize,
    pub checklists: usize,
}

impl Engine {
    /// Create an engine with in-memory storage (for testing).
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            storage: Storage::in_memory()?,
        })
    }

    /// Create an engine backed by a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            storage: Storage::open(path)?,
        })
    }

    // -----------------------------------------------------------------------
    // Work logs
    // -----------------------------------------------------------------------

    /// Record a work log entry.
    pub fn add_work_log(&mut self, new: NewWorkLog) -> Result<WorkLog> {
        let now = Utc::now();
        let mut log = WorkLog {
            id: 0,
            date: new.date,
            title: required(clean_text(&new.title), "title")?,
            content: clean_text(&new.content),
            tags: clean_tags(new.tags),
            created_at: now,
            updated_at: now,
        };
        log.id = self.storage.insert_work_log(&log)?;
        info!(id = log.id, date = %log.date, "work log added");
        Ok(log)
    }

    /// Get a work log by id.
    pub fn get_work_log(&self, id: i64) -> Result<WorkLog> {
        self.storage.get_work_log(id)
    }

    /// Replace a work log's user fields. Full replacement: every field
    /// takes the new value.
    pub fn update_work_log(&mut self, id: i64, new: NewWorkLog) -> Result<WorkLog> {
        let existing = self.storage.get_work_log(id)?;
        let log = WorkLog {
            date: new.date,
            title: required(clean_text(&new.title), "title")?,
            content: clean_text(&new.content),
            tags: clean_tags(new.tags),
            ..existing
        };
        self.storage.update_work_log(&log)?;
        debug!(id, "work log updated");
        self.storage.get_work_log(id)
    }

    pub fn delete_work_log(&mut self, id: i64) -> Result<()> {
        self.storage.delete_work_log(id)?;
        info!(id, "work log deleted");
        Ok(())
    }

    /// All work logs, newest first.
    pub fn list_work_logs(&self) -> Result<Vec<WorkLog>> {
        self.storage.list_work_logs()
    }

    /// Work logs dated exactly `date`.
    pub fn work_logs_on(&self, date: NaiveDate) -> Result<Vec<WorkLog>> {
        self.storage.work_logs_on(date)
    }

    /// Work logs between `start` and `end`, both inclusive.
    pub fn work_logs_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WorkLog>> {
        if start > end {
            return Err(Error::InvalidDate(format!(
                "range start {start} is after end {end}"
            )));
        }
        self.storage.work_logs_between(start, end)
    }

    /// Case-insensitive substring search over titles, content, and tags.
    /// A blank query matches nothing.
    pub fn search_work_logs(&self, query: &str) -> Result<Vec<WorkLog>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.storage.search_work_logs(query)
    }

    /// Unique tags across all work logs, sorted.
    pub fn all_tags(&self) -> Result<Vec<String>> {
        self.storage.all_tags()
    }

    // -----------------------------------------------------------------------
    // Calendar events
    // -----------------------------------------------------------------------

    /// Put an event on the calendar.
    pub fn add_calendar_event(&mut self, new: NewCalendarEvent) -> Result<CalendarEvent> {
        let now = Utc::now();
        let mut event = CalendarEvent {
            id: 0,
            date: new.date,
            title: required(clean_text(&new.title), "title")?,
            location: opt_text(new.location),
            link: opt_url(new.link),
            description: opt_text(new.description),
            created_at: now,
            updated_at: now,
        };
        event.id = self.storage.insert_calendar_event(&event)?;
        info!(id = event.id, date = %event.date, "calendar event added");
        Ok(event)
    }

    pub fn get_calendar_event(&self, id: i64) -> Result<CalendarEvent> {
        self.storage.get_calendar_event(id)
    }

    /// Replace an event's user fields.
    pub fn update_calendar_event(
        &mut self,
        id: i64,
        new: NewCalendarEvent,
    ) -> Result<CalendarEvent> {
        let existing = self.storage.get_calendar_event(id)?;
        let event = CalendarEvent {
            date: new.date,
            title: required(clean_text(&new.title), "title")?,
            location: opt_text(new.location),
            link: opt_url(new.link),
            description: opt_text(new.description),
            ..existing
        };
        self.storage.update_calendar_event(&event)?;
        debug!(id, "calendar event updated");
        self.storage.get_calendar_event(id)
    }

    pub fn delete_calendar_event(&mut self, id: i64) -> Result<()> {
        self.storage.delete_calendar_event(id)?;
        info!(id, "calendar event deleted");
        Ok(())
    }

    /// Events dated exactly `date`.
    pub fn calendar_events_on(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>> {
        self.storage.calendar_events_on(date)
    }

    /// All events, earliest first.
    pub fn list_calendar_events(&self) -> Result<Vec<CalendarEvent>> {
        self.storage.list_calendar_events()
    }

    // -----------------------------------------------------------------------
    // Todos
    // -----------------------------------------------------------------------

    /// Add a todo.
    ///
    /// A recurrence whose period type is `none` is dropped; recurring
    /// policies are validated before anything is written.
    pub fn add_todo(&mut self, new: NewTodo) -> Result<Todo> {
        let recurrence = checked_recurrence(new.recurrence)?;
        let now = Utc::now();
        let mut todo = Todo {
            id: 0,
            title: required(clean_text(&new.title), "title")?,
            priority: new.priority,
            due_date: new.due_date,
            completed: false,
            completed_on: None,
            recurrence,
            created_at: now,
            updated_at: now,
        };
        todo.id = self.storage.insert_todo(&todo)?;
        info!(id = todo.id, priority = %todo.priority, "todo added");
        Ok(todo)
    }

    pub fn get_todo(&self, id: i64) -> Result<Todo> {
        self.storage.get_todo(id)
    }

    /// Replace a todo's user fields. Completion state is untouched; use
    /// [`Engine::complete_todo`] and [`Engine::reopen_todo`] for that.
    pub fn update_todo(&mut self, id: i64, new: NewTodo) -> Result<Todo> {
        let recurrence = checked_recurrence(new.recurrence)?;
        let existing = self.storage.get_todo(id)?;
        let todo = Todo {
            title: required(clean_text(&new.title), "title")?,
            priority: new.priority,
            due_date: new.due_date,
            recurrence,
            ..existing
        };
        self.storage.update_todo(&todo)?;
        debug!(id, "todo updated");
        self.storage.get_todo(id)
    }

    /// Complete a todo as of `on`.
    ///
    /// Completing a recurring todo spawns the next instance in the same
    /// transaction: same title, priority, and policy, due one period after
    /// the completed instance's due date (or after `on` when it had none).
    /// Completing an already-completed todo changes nothing.
    pub fn complete_todo(&mut self, id: i64, on: NaiveDate) -> Result<CompletedTodo> {
        let mut todo = self.storage.get_todo(id)?;
        if todo.completed {
            return Ok(CompletedTodo { todo, next: None });
        }
        todo.completed = true;
        todo.completed_on = Some(on);

        let next_due = match &todo.recurrence {
            Some(policy) => Some(recur::next_due_after(todo.due_date.unwrap_or(on), policy)?),
            None => None,
        };

        let next = self.storage.with_transaction(|ctx| {
            ctx.update_todo(&todo)?;
            let Some(due) = next_due else { return Ok(None) };
            let now = Utc::now();
            let mut instance = Todo {
                id: 0,
                title: todo.title.clone(),
                priority: todo.priority,
                due_date: Some(due),
                completed: false,
                completed_on: None,
                recurrence: todo.recurrence.clone(),
                created_at: now,
                updated_at: now,
            };
            instance.id = ctx.insert_todo(&instance)?;
            Ok(Some(instance))
        })?;

        info!(id, on = %on, "todo completed");
        if let (Some(instance), Some(due)) = (&next, next_due) {
            info!(id = instance.id, due = %due, "next instance spawned");
        }

        let todo = self.storage.get_todo(id)?;
        Ok(CompletedTodo { todo, next })
    }

    /// Reopen a completed todo. A next instance spawned at completion time
    /// is left alone.
    pub fn reopen_todo(&mut self, id: i64) -> Result<Todo> {
        let mut todo = self.storage.get_todo(id)?;
        if todo.completed {
            todo.completed = false;
            todo.completed_on = None;
            self.storage.update_todo(&todo)?;
            info!(id, "todo reopened");
        }
        self.storage.get_todo(id)
    }

    pub fn delete_todo(&mut self, id: i64) -> Result<()> {
        self.storage.delete_todo(id)?;
        info!(id, "todo deleted");
        Ok(())
    }

    /// Open todos, most urgent first.
    pub fn active_todos(&self) -> Result<Vec<Todo>> {
        self.storage.active_todos()
    }

    /// Completed todos, most recently completed first.
    pub fn completed_todos(&self) -> Result<Vec<Todo>> {
        self.storage.completed_todos()
    }

    // -----------------------------------------------------------------------
    // Checklists
    // -----------------------------------------------------------------------

    /// Add a checklist item.
    ///
    /// A recurring policy seeds `next_due` one period after `today`. A
    /// non-recurring item keeps the builder's fixed due date, if any.
    pub fn add_checklist(&mut self, new: NewChecklist, today: NaiveDate) -> Result<Checklist> {
        new.policy.validate()?;
        let next_due = if new.policy.is_recurring() {
            Some(recur::next_due_after(today, &new.policy)?)
        } else {
            new.due
        };
        let now = Utc::now();
        let mut item = Checklist {
            id: 0,
            title: required(clean_text(&new.title), "title")?,
            assignee: opt_text(new.assignee),
            policy: new.policy,
            next_due,
            last_completed: None,
            created_at: now,
            updated_at: now,
        };
        item.id = self.storage.insert_checklist(&item)?;
        info!(id = item.id, "checklist added");
        Ok(item)
    }

    pub fn get_checklist(&self, id: i64) -> Result<Checklist> {
        self.storage.get_checklist(id)
    }

    /// Replace a checklist item's user fields.
    ///
    /// A changed recurring policy re-derives `next_due` from the last
    /// completion, or from the item's creation day when it has never been
    /// completed. An unchanged policy keeps the current schedule, and a
    /// change to non-recurring takes the builder's fixed due date.
    pub fn update_checklist(&mut self, id: i64, new: NewChecklist) -> Result<Checklist> {
        new.policy.validate()?;
        let existing = self.storage.get_checklist(id)?;
        let next_due = if new.policy == existing.policy {
            existing.next_due
        } else if new.policy.is_recurring() {
            let anchor = existing
                .last_completed
                .unwrap_or_else(|| existing.created_at.date_naive());
            Some(recur::next_due_after(anchor, &new.policy)?)
        } else {
            new.due
        };
        let item = Checklist {
            title: required(clean_text(&new.title), "title")?,
            assignee: opt_text(new.assignee),
            policy: new.policy,
            next_due,
            ..existing
        };
        self.storage.update_checklist(&item)?;
        debug!(id, "checklist updated");
        self.storage.get_checklist(id)
    }

    /// Check off a checklist item as of `on`.
    ///
    /// The item rolls in place: `last_completed` becomes `on` and the next
    /// due date derives from `on`, not from the old due date, so a late
    /// completion pushes the whole schedule back. A non-recurring item's
    /// due date is cleared. Both fields move in one storage write.
    pub fn mark_checked(&mut self, id: i64, on: NaiveDate) -> Result<Checklist> {
        let item = self.storage.get_checklist(id)?;
        let next_due = if item.policy.is_recurring() {
            Some(recur::next_due_after(on, &item.policy)?)
        } else {
            None
        };
        self.storage.complete_checklist(id, on, next_due)?;
        info!(id, on = %on, "checklist checked");
        self.storage.get_checklist(id)
    }

    /// Future occurrences of a checklist item, projected from its current
    /// due date.
    pub fn upcoming_occurrences(&self, id: i64, count: u32) -> Result<Vec<NaiveDate>> {
        let item = self.storage.get_checklist(id)?;
        let next_due = item.next_due.ok_or_else(|| {
            Error::InvalidPolicy("checklist has no due date to project from".into())
        })?;
        recur::materialize(next_due, &item.policy, count)
    }

    pub fn delete_checklist(&mut self, id: i64) -> Result<()> {
        self.storage.delete_checklist(id)?;
        info!(id, "checklist deleted");
        Ok(())
    }

    /// All checklist items, soonest due first.
    pub fn list_checklists(&self) -> Result<Vec<Checklist>> {
        self.storage.list_checklists()
    }

    /// Checklist items due on `on` or earlier.
    pub fn due_checklists(&self, on: NaiveDate) -> Result<Vec<Checklist>> {
        self.storage.due_checklists(on)
    }

    // -----------------------------------------------------------------------
    // Dashboard
    // -----------------------------------------------------------------------

    /// Everything attached to one calendar day: events and logs dated that
    /// day, plus todos and checklist items due exactly that day.
    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        Ok(DaySummary {
            date,
            events: self.storage.calendar_events_on(date)?,
            logs: self.storage.work_logs_on(date)?,
            due_todos: self.storage.todos_due_on(date)?,
            due_checklists: self.storage.checklists_due_on(date)?,
        })
    }

    /// Everything visible on one month's calendar: events and logs dated
    /// in the month, plus open todos and checklist items due in it.
    pub fn month_summary(&self, year: i32, month: u32) -> Result<MonthSummary> {
        let (start, end) = month_bounds(year, month)?;
        let todos = self
            .storage
            .due_todos(end)?
            .into_iter()
            .filter(|t| t.due_date.is_some_and(|d| d >= start))
            .collect();
        let checklists = self
            .storage
            .due_checklists(end)?
            .into_iter()
            .filter(|c| c.next_due.is_some_and(|d| d >= start))
            .collect();
        Ok(MonthSummary {
            year,
            month,
            events: self.storage.calendar_events_between(start, end)?,
            logs: self.storage.work_logs_between(start, end)?,
            todos,
            checklists,
        })
    }

    /// Everything due within `days` days of `today`, overdue included.
    pub fn due_within(&self, today: NaiveDate, days: u32) -> Result<DueReport> {
        let horizon = today
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                Error::InvalidDate(format!("horizon {days} days past {today} is out of range"))
            })?;
        Ok(DueReport {
            todos: self.storage.due_todos(horizon)?,
            checklists: self.storage.due_checklists(horizon)?,
        })
    }

    /// Entity counts for the stats view.
    pub fn statistics(&self, today: NaiveDate) -> Result<Statistics> {
        let (active_todos, completed_todos) = self.storage.count_todos()?;
        Ok(Statistics {
            work_logs: self.storage.count_work_logs()?,
            calendar_events: self.storage.count_calendar_events()?,
            active_todos,
            completed_todos,
            checklists: self.storage.count_checklists()?,
            due_checklists: self.storage.count_due_checklists(today)?,
        })
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Snapshot every store into an export bundle.
    pub fn export_bundle(&self) -> Result<ExportBundle> {
        Ok(ExportBundle {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            work_logs: self.storage.list_work_logs()?,
            calendar_events: self.storage.list_calendar_events()?,
            todos: self.storage.list_todos()?,
            checklists: self.storage.list_checklists()?,
        })
    }

    /// Import a bundle.
    ///
    /// `Merge` adds every record alongside what is already there; `Replace`
    /// wipes the stores first. Either way records get fresh ids, text
    /// fields pass sanitization again, `created_at` is kept from the file,
    /// and `updated_at` becomes the import time. Policies are validated
    /// before anything is written, so a bad bundle imports nothing.
    pub fn import_bundle(
        &mut self,
        bundle: ExportBundle,
        mode: ImportMode,
    ) -> Result<ImportSummary> {
        for item in &bundle.checklists {
            item.policy
                .validate()
                .map_err(|e| Error::InvalidImport(format!("checklist '{}': {e}", item.title)))?;
        }
        for todo in &bundle.todos {
            if let Some(policy) = &todo.recurrence {
                policy
                    .validate()
                    .map_err(|e| Error::InvalidImport(format!("todo '{}': {e}", todo.title)))?;
            }
        }

        let now = Utc::now();
        let summary = self.storage.with_transaction(|ctx| {
            if mode == ImportMode::Replace {
                ctx.wipe_all()?;
            }
            let mut summary = ImportSummary::default();
            for log in bundle.work_logs {
                ctx.insert_work_log(&WorkLog {
                    id: 0,
                    date: log.date,
                    title: clean_text(&log.title),
                    content: clean_text(&log.content),
                    tags: clean_tags(log.tags),
                    created_at: log.created_at,
                    updated_at: now,
                })?;
                summary.work_logs += 1;
            }
            for event in bundle.calendar_events {
                ctx.insert_calendar_event(&CalendarEvent {
                    id: 0,
                    date: event.date,
                    title: clean_text(&event.title),
                    location: opt_text(event.location),
                    link: opt_url(event.link),
                    description: opt_text(event.description),
                    created_at: event.created_at,
                    updated_at: now,
                })?;
                summary.calendar_events += 1;
            }
            for todo in bundle.todos {
                ctx.insert_todo(&Todo {
                    id: 0,
                    title: clean_text(&todo.title),
                    priority: todo.priority,
                    due_date: todo.due_date,
                    completed: todo.completed,
                    completed_on: todo.completed_on,
                    recurrence: todo.recurrence.filter(|p| p.is_recurring()),
                    created_at: todo.created_at,
                    updated_at: now,
                })?;
                summary.todos += 1;
            }
            for item in bundle.checklists {
                ctx.insert_checklist(&Checklist {
                    id: 0,
                    title: clean_text(&item.title),
                    assignee: opt_text(item.assignee),
                    policy: item.policy,
                    next_due: item.next_due,
                    last_completed: item.last_completed,
                    created_at: item.created_at,
                    updated_at: now,
                })?;
                summary.checklists += 1;
            }
            Ok(summary)
        })?;

        info!(
            ?mode,
            work_logs = summary.work_logs,
            calendar_events = summary.calendar_events,
            todos = summary.todos,
            checklists = summary.checklists,
            "bundle imported"
        );
        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Input normalization helpers
// ---------------------------------------------------------------------------

fn required(value: String, field: &'static str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::Other(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn opt_text(value: Option<String>) -> Option<String> {
    value.map(|s| clean_text(&s)).filter(|s| !s.is_empty())
}

fn opt_url(value: Option<String>) -> Option<String> {
    value.map(|s| clean_url(&s)).filter(|s| !s.is_empty())
}

/// Policy attached to a todo: `none` means no recurrence at all, anything
/// else must validate.
fn checked_recurrence(policy: Option<RecurrencePolicy>) -> Result<Option<RecurrencePolicy>> {
    match policy {
        Some(policy) if policy.is_recurring() => {
            policy.validate()?;
            Ok(Some(policy))
        }
        _ => Ok(None),
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidDate(format!("no such month: {year}-{month:02}")))?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| Error::InvalidDate(format!("no such month: {year}-{month:02}")))?;
    Ok((start, end))
}
