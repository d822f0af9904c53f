//! SQLite storage layer.
//!
//! Single source of truth for all four stores: work logs, calendar events,
//! todos, and checklists. Calendar days are TEXT `YYYY-MM-DD` and audit
//! stamps are RFC 3339, so lexicographic comparison in SQL equals date
//! order. WAL mode for concurrent read access. All writes go through the
//! engine.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::model::*;

/// Storage backend. Owns the SQLite connection.
pub struct Storage {
    conn: Connection,
}

/// Handle for performing storage operations within a transaction.
///
/// All methods delegate to the same SQL logic as `Storage`, but execute
/// against the transaction's connection, so a multi-write operation either
/// commits as a whole or not at all.
pub(crate) struct TxContext<'a> {
    tx: &'a Connection,
}

impl TxContext<'_> {
    pub fn insert_work_log(&self, log: &WorkLog) -> Result<i64> {
        insert_work_log_on(self.tx, log)
    }

    pub fn insert_calendar_event(&self, event: &CalendarEvent) -> Result<i64> {
        insert_calendar_event_on(self.tx, event)
    }

    pub fn insert_todo(&self, todo: &Todo) -> Result<i64> {
        insert_todo_on(self.tx, todo)
    }

    pub fn insert_checklist(&self, item: &Checklist) -> Result<i64> {
        insert_checklist_on(self.tx, item)
    }

    pub fn update_todo(&self, todo: &Todo) -> Result<()> {
        update_todo_on(self.tx, todo)
    }

    pub fn wipe_all(&self) -> Result<()> {
        wipe_all_on(self.tx)
    }
}

impl Storage {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let mut storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut storage = Self { conn };
        storage.init()?;
        Ok(storage)
    }

    fn init(&mut self) -> Result<()> {
        // WAL mode for concurrent readers
        self.conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        self.conn.execute_batch("PRAGMA busy_timeout=5000;")?;

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS work_logs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                date        TEXT NOT NULL,
                title       TEXT NOT NULL,
                content     TEXT NOT NULL DEFAULT '',
                tags        TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_work_logs_date ON work_logs(date);

            CREATE TABLE IF NOT EXISTS calendar_events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                date        TEXT NOT NULL,
                title       TEXT NOT NULL,
                location    TEXT,
                link        TEXT,
                description TEXT,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_calendar_events_date ON calendar_events(date);

            CREATE TABLE IF NOT EXISTS todos (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                title        TEXT NOT NULL,
                priority     TEXT NOT NULL DEFAULT 'medium',
                due_date     TEXT,
                completed    INTEGER NOT NULL DEFAULT 0,
                completed_on TEXT,
                recurrence   TEXT,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed);
            CREATE INDEX IF NOT EXISTS idx_todos_due ON todos(due_date)
                WHERE due_date IS NOT NULL;

            CREATE TABLE IF NOT EXISTS checklists (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                title          TEXT NOT NULL,
                assignee       TEXT,
                period_type    TEXT NOT NULL,
                period_value   INTEGER NOT NULL DEFAULT 1,
                repeat_count   INTEGER,
                next_due       TEXT,
                last_completed TEXT,
                created_at     TEXT NOT NULL,
                updated_at     TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_checklists_due ON checklists(next_due)
                WHERE next_due IS NOT NULL;
            ",
        )?;

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Execute a closure within a SQLite transaction.
    ///
    /// The transaction commits if the closure returns Ok, rolls back on Err.
    pub(crate) fn with_transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TxContext) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let mut ctx = TxContext { tx: &tx };
        let result = f(&mut ctx)?;
        tx.commit()?;
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Work Logs
    // -----------------------------------------------------------------------

    /// Insert a work log. The record's `id` is ignored; the assigned row id
    /// is returned.
    pub fn insert_work_log(&mut self, log: &WorkLog) -> Result<i64> {
        insert_work_log_on(&self.conn, log)
    }

    /// Get a work log by id.
    pub fn get_work_log(&self, id: i64) -> Result<WorkLog> {
        self.conn
            .query_row(
                "SELECT id, date, title, content, tags, created_at, updated_at
                 FROM work_logs WHERE id = ?1",
                params![id],
                row_to_work_log,
            )
            .optional()?
            .ok_or(Error::NotFound {
                kind: "work log",
                id,
            })
    }

    /// Overwrite a work log's user fields and refresh `updated_at`.
    pub fn update_work_log(&mut self, log: &WorkLog) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE work_logs SET date = ?1, title = ?2, content = ?3, tags = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                log.date.to_string(),
                log.title,
                log.content,
                serde_json::to_string(&log.tags).unwrap_or_default(),
                now,
                log.id,
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "work log",
                id: log.id,
            });
        }
        Ok(())
    }

    pub fn delete_work_log(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM work_logs WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "work log",
                id,
            });
        }
        Ok(())
    }

    /// All work logs, newest first.
    pub fn list_work_logs(&self) -> Result<Vec<WorkLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, content, tags, created_at, updated_at
             FROM work_logs ORDER BY date DESC, id DESC",
        )?;
        let logs = stmt
            .query_map([], row_to_work_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Work logs dated exactly `date`.
    pub fn work_logs_on(&self, date: NaiveDate) -> Result<Vec<WorkLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, content, tags, created_at, updated_at
             FROM work_logs WHERE date = ?1 ORDER BY id ASC",
        )?;
        let logs = stmt
            .query_map(params![date.to_string()], row_to_work_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Work logs between `start` and `end`, both inclusive.
    pub fn work_logs_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WorkLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, content, tags, created_at, updated_at
             FROM work_logs WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, id ASC",
        )?;
        let logs = stmt
            .query_map(params![start.to_string(), end.to_string()], row_to_work_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Case-insensitive substring search over title, content, and tags.
    pub fn search_work_logs(&self, query: &str) -> Result<Vec<WorkLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, content, tags, created_at, updated_at
             FROM work_logs
             WHERE instr(lower(title), lower(?1)) > 0
                OR instr(lower(content), lower(?1)) > 0
                OR instr(lower(tags), lower(?1)) > 0
             ORDER BY date DESC, id DESC",
        )?;
        let logs = stmt
            .query_map(params![query], row_to_work_log)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Unique tags across all work logs, sorted.
    pub fn all_tags(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT tags FROM work_logs")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut set = std::collections::BTreeSet::new();
        for raw in rows {
            let tags: Vec<String> = serde_json::from_str(&raw).unwrap_or_default();
            set.extend(tags);
        }
        Ok(set.into_iter().collect())
    }

    // -----------------------------------------------------------------------
    // Calendar Events
    // -----------------------------------------------------------------------

    /// Insert a calendar event. The record's `id` is ignored; the assigned
    /// row id is returned.
    pub fn insert_calendar_event(&mut self, event: &CalendarEvent) -> Result<i64> {
        insert_calendar_event_on(&self.conn, event)
    }

    pub fn get_calendar_event(&self, id: i64) -> Result<CalendarEvent> {
        self.conn
            .query_row(
                "SELECT id, date, title, location, link, description, created_at, updated_at
                 FROM calendar_events WHERE id = ?1",
                params![id],
                row_to_calendar_event,
            )
            .optional()?
            .ok_or(Error::NotFound { kind: "event", id })
    }

    pub fn update_calendar_event(&mut self, event: &CalendarEvent) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE calendar_events
             SET date = ?1, title = ?2, location = ?3, link = ?4, description = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                event.date.to_string(),
                event.title,
                event.location,
                event.link,
                event.description,
                now,
                event.id,
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "event",
                id: event.id,
            });
        }
        Ok(())
    }

    pub fn delete_calendar_event(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM calendar_events WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound { kind: "event", id });
        }
        Ok(())
    }

    /// Events dated exactly `date`.
    pub fn calendar_events_on(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, location, link, description, created_at, updated_at
             FROM calendar_events WHERE date = ?1 ORDER BY id ASC",
        )?;
        let events = stmt
            .query_map(params![date.to_string()], row_to_calendar_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// Events between `start` and `end`, both inclusive.
    pub fn calendar_events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, location, link, description, created_at, updated_at
             FROM calendar_events WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, id ASC",
        )?;
        let events = stmt
            .query_map(
                params![start.to_string(), end.to_string()],
                row_to_calendar_event,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn list_calendar_events(&self) -> Result<Vec<CalendarEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, title, location, link, description, created_at, updated_at
             FROM calendar_events ORDER BY date ASC, id ASC",
        )?;
        let events = stmt
            .query_map([], row_to_calendar_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    // -----------------------------------------------------------------------
    // Todos
    // -----------------------------------------------------------------------

    /// Insert a todo. The record's `id` is ignored; the assigned row id is
    /// returned.
    pub fn insert_todo(&mut self, todo: &Todo) -> Result<i64> {
        insert_todo_on(&self.conn, todo)
    }

    pub fn get_todo(&self, id: i64) -> Result<Todo> {
        self.conn
            .query_row(
                "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                        created_at, updated_at
                 FROM todos WHERE id = ?1",
                params![id],
                row_to_todo,
            )
            .optional()?
            .ok_or(Error::NotFound { kind: "todo", id })
    }

    pub fn update_todo(&mut self, todo: &Todo) -> Result<()> {
        update_todo_on(&self.conn, todo)
    }

    pub fn delete_todo(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound { kind: "todo", id });
        }
        Ok(())
    }

    /// Open todos, most urgent first: by priority, then due date with
    /// undated items last.
    pub fn active_todos(&self) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                    created_at, updated_at
             FROM todos WHERE completed = 0
             ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                      due_date IS NULL, due_date ASC, id ASC",
        )?;
        let todos = stmt
            .query_map([], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    /// Completed todos, most recently completed first.
    pub fn completed_todos(&self) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                    created_at, updated_at
             FROM todos WHERE completed = 1
             ORDER BY completed_on DESC, id DESC",
        )?;
        let todos = stmt
            .query_map([], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    /// Every todo, oldest first. Used by export.
    pub fn list_todos(&self) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                    created_at, updated_at
             FROM todos ORDER BY id ASC",
        )?;
        let todos = stmt
            .query_map([], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    /// Open todos due exactly on `date`.
    pub fn todos_due_on(&self, date: NaiveDate) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                    created_at, updated_at
             FROM todos WHERE completed = 0 AND due_date = ?1
             ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, id ASC",
        )?;
        let todos = stmt
            .query_map(params![date.to_string()], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    /// Open todos due on `on` or earlier.
    pub fn due_todos(&self, on: NaiveDate) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, priority, due_date, completed, completed_on, recurrence,
                    created_at, updated_at
             FROM todos WHERE completed = 0 AND due_date IS NOT NULL AND due_date <= ?1
             ORDER BY due_date ASC, id ASC",
        )?;
        let todos = stmt
            .query_map(params![on.to_string()], row_to_todo)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    // -----------------------------------------------------------------------
    // Checklists
    // -----------------------------------------------------------------------

    /// Insert a checklist item. The record's `id` is ignored; the assigned
    /// row id is returned.
    pub fn insert_checklist(&mut self, item: &Checklist) -> Result<i64> {
        insert_checklist_on(&self.conn, item)
    }

    pub fn get_checklist(&self, id: i64) -> Result<Checklist> {
        self.conn
            .query_row(
                "SELECT id, title, assignee, period_type, period_value, repeat_count,
                        next_due, last_completed, created_at, updated_at
                 FROM checklists WHERE id = ?1",
                params![id],
                row_to_checklist,
            )
            .optional()?
            .ok_or(Error::NotFound {
                kind: "checklist",
                id,
            })
    }

    pub fn update_checklist(&mut self, item: &Checklist) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE checklists
             SET title = ?1, assignee = ?2, period_type = ?3, period_value = ?4,
                 repeat_count = ?5, next_due = ?6, last_completed = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                item.title,
                item.assignee,
                item.policy.period_type.to_string(),
                item.policy.period_value,
                item.policy.repeat_count,
                item.next_due.map(|d| d.to_string()),
                item.last_completed.map(|d| d.to_string()),
                now,
                item.id,
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "checklist",
                id: item.id,
            });
        }
        Ok(())
    }

    /// Record a completion: both schedule fields move in one statement.
    pub fn complete_checklist(
        &mut self,
        id: i64,
        last_completed: NaiveDate,
        next_due: Option<NaiveDate>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let n = self.conn.execute(
            "UPDATE checklists SET last_completed = ?1, next_due = ?2, updated_at = ?3
             WHERE id = ?4",
            params![
                last_completed.to_string(),
                next_due.map(|d| d.to_string()),
                now,
                id,
            ],
        )?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "checklist",
                id,
            });
        }
        Ok(())
    }

    pub fn delete_checklist(&mut self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM checklists WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound {
                kind: "checklist",
                id,
            });
        }
        Ok(())
    }

    /// All checklist items, soonest due first with undated items last.
    pub fn list_checklists(&self) -> Result<Vec<Checklist>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, assignee, period_type, period_value, repeat_count,
                    next_due, last_completed, created_at, updated_at
             FROM checklists ORDER BY next_due IS NULL, next_due ASC, id ASC",
        )?;
        let items = stmt
            .query_map([], row_to_checklist)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Checklist items due exactly on `date`.
    pub fn checklists_due_on(&self, date: NaiveDate) -> Result<Vec<Checklist>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, assignee, period_type, period_value, repeat_count,
                    next_due, last_completed, created_at, updated_at
             FROM checklists WHERE next_due = ?1 ORDER BY id ASC",
        )?;
        let items = stmt
            .query_map(params![date.to_string()], row_to_checklist)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Checklist items due on `on` or earlier.
    pub fn due_checklists(&self, on: NaiveDate) -> Result<Vec<Checklist>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, assignee, period_type, period_value, repeat_count,
                    next_due, last_completed, created_at, updated_at
             FROM checklists WHERE next_due IS NOT NULL AND next_due <= ?1
             ORDER BY next_due ASC, id ASC",
        )?;
        let items = stmt
            .query_map(params![on.to_string()], row_to_checklist)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Counts + maintenance
    // -----------------------------------------------------------------------

    pub fn count_work_logs(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM work_logs", [], |row| row.get(0))?)
    }

    pub fn count_calendar_events(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM calendar_events", [], |row| row.get(0))?)
    }

    pub fn count_todos(&self) -> Result<(i64, i64)> {
        let active = self.conn.query_row(
            "SELECT COUNT(*) FROM todos WHERE completed = 0",
            [],
            |row| row.get(0),
        )?;
        let completed = self.conn.query_row(
            "SELECT COUNT(*) FROM todos WHERE completed = 1",
            [],
            |row| row.get(0),
        )?;
        Ok((active, completed))
    }

    pub fn count_checklists(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM checklists", [], |row| row.get(0))?)
    }

    /// Checklist items whose due date is on or before `on`.
    pub fn count_due_checklists(&self, on: NaiveDate) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM checklists WHERE next_due IS NOT NULL AND next_due <= ?1",
            params![on.to_string()],
            |row| row.get(0),
        )?)
    }

    /// Delete everything from every store.
    pub fn wipe_all(&mut self) -> Result<()> {
        wipe_all_on(&self.conn)
    }
}

// ---------------------------------------------------------------------------
// Inner functions. They accept &Connection so they work with both
// Connection (auto-commit) and Transaction (deref to Connection).
// ---------------------------------------------------------------------------

fn insert_work_log_on(conn: &Connection, log: &WorkLog) -> Result<i64> {
    conn.execute(
        "INSERT INTO work_logs (date, title, content, tags, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            log.date.to_string(),
            log.title,
            log.content,
            serde_json::to_string(&log.tags).unwrap_or_default(),
            log.created_at.to_rfc3339(),
            log.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_calendar_event_on(conn: &Connection, event: &CalendarEvent) -> Result<i64> {
    conn.execute(
        "INSERT INTO calendar_events (date, title, location, link, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.date.to_string(),
            event.title,
            event.location,
            event.link,
            event.description,
            event.created_at.to_rfc3339(),
            event.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_todo_on(conn: &Connection, todo: &Todo) -> Result<i64> {
    conn.execute(
        "INSERT INTO todos (title, priority, due_date, completed, completed_on, recurrence,
                            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            todo.title,
            todo.priority.to_string(),
            todo.due_date.map(|d| d.to_string()),
            todo.completed,
            todo.completed_on.map(|d| d.to_string()),
            todo.recurrence
                .as_ref()
                .map(|p| serde_json::to_string(p).unwrap_or_default()),
            todo.created_at.to_rfc3339(),
            todo.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_checklist_on(conn: &Connection, item: &Checklist) -> Result<i64> {
    conn.execute(
        "INSERT INTO checklists (title, assignee, period_type, period_value, repeat_count,
                                 next_due, last_completed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.title,
            item.assignee,
            item.policy.period_type.to_string(),
            item.policy.period_value,
            item.policy.repeat_count,
            item.next_due.map(|d| d.to_string()),
            item.last_completed.map(|d| d.to_string()),
            item.created_at.to_rfc3339(),
            item.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn update_todo_on(conn: &Connection, todo: &Todo) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let n = conn.execute(
        "UPDATE todos
         SET title = ?1, priority = ?2, due_date = ?3, completed = ?4, completed_on = ?5,
             recurrence = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            todo.title,
            todo.priority.to_string(),
            todo.due_date.map(|d| d.to_string()),
            todo.completed,
            todo.completed_on.map(|d| d.to_string()),
            todo.recurrence
                .as_ref()
                .map(|p| serde_json::to_string(p).unwrap_or_default()),
            now,
            todo.id,
        ],
    )?;
    if n == 0 {
        return Err(Error::NotFound {
            kind: "todo",
            id: todo.id,
        });
    }
    Ok(())
}

fn wipe_all_on(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM work_logs;
         DELETE FROM calendar_events;
         DELETE FROM todos;
         DELETE FROM checklists;",
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row parsing helpers
// ---------------------------------------------------------------------------

fn column_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

fn parse_day(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse().map_err(|e: chrono::ParseError| column_error(idx, e))
}

fn parse_day_opt(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| parse_day(idx, &s)).transpose()
}

fn parse_stamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    s.parse().map_err(|e: chrono::ParseError| column_error(idx, e))
}

fn row_to_work_log(row: &rusqlite::Row) -> rusqlite::Result<WorkLog> {
    let date: String = row.get(1)?;
    let tags: String = row.get(4)?;
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;

    Ok(WorkLog {
        id: row.get(0)?,
        date: parse_day(1, &date)?,
        title: row.get(2)?,
        content: row.get(3)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        created_at: parse_stamp(5, &created)?,
        updated_at: parse_stamp(6, &updated)?,
    })
}

fn row_to_calendar_event(row: &rusqlite::Row) -> rusqlite::Result<CalendarEvent> {
    let date: String = row.get(1)?;
    let created: String = row.get(6)?;
    let updated: String = row.get(7)?;

    Ok(CalendarEvent {
        id: row.get(0)?,
        date: parse_day(1, &date)?,
        title: row.get(2)?,
        location: row.get(3)?,
        link: row.get(4)?,
        description: row.get(5)?,
        created_at: parse_stamp(6, &created)?,
        updated_at: parse_stamp(7, &updated)?,
    })
}

fn row_to_todo(row: &rusqlite::Row) -> rusqlite::Result<Todo> {
    let priority: String = row.get(2)?;
    let due: Option<String> = row.get(3)?;
    let completed_on: Option<String> = row.get(5)?;
    let recurrence: Option<String> = row.get(6)?;
    let created: String = row.get(7)?;
    let updated: String = row.get(8)?;

    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        priority: priority.parse().map_err(|e: Error| column_error(2, e))?,
        due_date: parse_day_opt(3, due)?,
        completed: row.get(4)?,
        completed_on: parse_day_opt(5, completed_on)?,
        recurrence: recurrence.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: parse_stamp(7, &created)?,
        updated_at: parse_stamp(8, &updated)?,
    })
}

fn row_to_checklist(row: &rusqlite::Row) -> rusqlite::Result<Checklist> {
    let period: String = row.get(3)?;
    let next_due: Option<String> = row.get(6)?;
    let last_completed: Option<String> = row.get(7)?;
    let created: String = row.get(8)?;
    let updated: String = row.get(9)?;

    Ok(Checklist {
        id: row.get(0)?,
        title: row.get(1)?,
        assignee: row.get(2)?,
        policy: RecurrencePolicy {
            period_type: period.parse().map_err(|e: Error| column_error(3, e))?,
            period_value: row.get(4)?,
            repeat_count: row.get(5)?,
        },
        next_due: parse_day_opt(6, next_due)?,
        last_completed: parse_day_opt(7, last_completed)?,
        created_at: parse_stamp(8, &created)?,
        updated_at: parse_stamp(9, &updated)?,
    })
}
