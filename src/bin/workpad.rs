//! workpad CLI: calendar, work logs, todos, and recurring checklists.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};

use workpad::config::Config;
use workpad::engine::Engine;
use workpad::export::{self, ImportMode};
use workpad::model::{
    Checklist, NewCalendarEvent, NewChecklist, NewTodo, NewWorkLog, PeriodType, Priority,
    RecurrencePolicy, Todo, WorkLog,
};
use workpad::recur;
use workpad::telemetry::init_telemetry;

#[derive(Parser)]
#[command(name = "workpad", about = "Offline-first personal work management")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work log operations
    Log {
        #[command(subcommand)]
        action: LogAction,
    },
    /// Todo operations
    Todo {
        #[command(subcommand)]
        action: TodoAction,
    },
    /// Recurring checklist operations
    Check {
        #[command(subcommand)]
        action: CheckAction,
    },
    /// Calendar event operations
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Show everything attached to one day
    Day {
        /// Date to show (defaults to today)
        date: Option<NaiveDate>,
    },
    /// Show everything due within a horizon
    Due {
        /// Horizon in days
        #[arg(long, default_value_t = 7)]
        within: u32,
    },
    /// Show entity counts
    Stats,
    /// Export all data
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a JSON bundle
    Import {
        file: PathBuf,
        /// Wipe existing data first instead of merging
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum LogAction {
    /// Record a work log entry
    Add {
        title: String,
        /// Log date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Body text
        #[arg(long)]
        content: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List entries, newest first
    List {
        /// Only entries on this date
        #[arg(long)]
        on: Option<NaiveDate>,
        /// Maximum entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Search titles, content, and tags
    Search { query: String },
    /// Delete an entry
    Rm { id: i64 },
}

#[derive(Subcommand)]
enum TodoAction {
    /// Add a todo
    Add {
        title: String,
        /// high, medium, or low
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Due date
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Repeat period: daily, weekly, or monthly
        #[arg(long)]
        repeat: Option<String>,
        /// Period multiplier (every N days/weeks/months)
        #[arg(long, default_value_t = 1)]
        every: u32,
    },
    /// List open todos, most urgent first
    List {
        /// Show completed todos instead
        #[arg(long)]
        done: bool,
    },
    /// Complete a todo
    Done {
        id: i64,
        /// Completion date (defaults to today)
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Reopen a completed todo
    Undo { id: i64 },
    /// Delete a todo
    Rm { id: i64 },
}

#[derive(Subcommand)]
enum CheckAction {
    /// Add a checklist item
    Add {
        title: String,
        /// Repeat period: daily, weekly, monthly, or none
        #[arg(long, default_value = "weekly")]
        repeat: String,
        /// Period multiplier (every N days/weeks/months)
        #[arg(long, default_value_t = 1)]
        every: u32,
        /// Cap on forward occurrences
        #[arg(long)]
        times: Option<u32>,
        /// Who the item belongs to
        #[arg(long)]
        assignee: Option<String>,
        /// Fixed due date, for non-recurring items
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List checklist items, soonest due first
    List,
    /// Check an item off
    Done {
        id: i64,
        /// Completion date (defaults to today)
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Project an item's future occurrences
    Upcoming {
        id: i64,
        /// How many occurrences to show
        #[arg(long, default_value_t = 5)]
        count: u32,
    },
    /// Delete an item
    Rm { id: i64 },
}

#[derive(Subcommand)]
enum EventAction {
    /// Put an event on the calendar
    Add {
        date: NaiveDate,
        title: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List events
    List {
        /// Restrict to one month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },
    /// Delete an event
    Rm { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    init_telemetry(&config.log_level)?;
    std::fs::create_dir_all(&config.data_dir)?;
    let mut engine = Engine::open(config.db_path())?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Log { action } => match action {
            LogAction::Add {
                title,
                date,
                content,
                tags,
            } => cmd_log_add(&mut engine, date.unwrap_or(today), title, content, tags),
            LogAction::List { on, limit } => cmd_log_list(&engine, on, limit),
            LogAction::Search { query } => cmd_log_search(&engine, query),
            LogAction::Rm { id } => {
                engine.delete_work_log(id)?;
                println!("Deleted work log {id}");
                Ok(())
            }
        },
        Command::Todo { action } => match action {
            TodoAction::Add {
                title,
                priority,
                due,
                repeat,
                every,
            } => cmd_todo_add(&mut engine, title, priority, due, repeat, every),
            TodoAction::List { done } => cmd_todo_list(&engine, done, today),
            TodoAction::Done { id, on } => cmd_todo_done(&mut engine, id, on.unwrap_or(today)),
            TodoAction::Undo { id } => {
                let todo = engine.reopen_todo(id)?;
                println!("Reopened: [{}] {}", todo.id, todo.title);
                Ok(())
            }
            TodoAction::Rm { id } => {
                engine.delete_todo(id)?;
                println!("Deleted todo {id}");
                Ok(())
            }
        },
        Command::Check { action } => match action {
            CheckAction::Add {
                title,
                repeat,
                every,
                times,
                assignee,
                due,
            } => {
                let period_type: PeriodType = repeat.parse()?;
                let mut policy = RecurrencePolicy::every(period_type, every);
                if let Some(n) = times {
                    policy = policy.repeat_count(n);
                }
                cmd_check_add(&mut engine, today, title, policy, assignee, due)
            }
            CheckAction::List => cmd_check_list(&engine, today),
            CheckAction::Done { id, on } => cmd_check_done(&mut engine, id, on.unwrap_or(today)),
            CheckAction::Upcoming { id, count } => cmd_check_upcoming(&engine, id, count),
            CheckAction::Rm { id } => {
                engine.delete_checklist(id)?;
                println!("Deleted checklist {id}");
                Ok(())
            }
        },
        Command::Event { action } => match action {
            EventAction::Add {
                date,
                title,
                location,
                link,
                description,
            } => cmd_event_add(&mut engine, date, title, location, link, description),
            EventAction::List { month } => cmd_event_list(&engine, month),
            EventAction::Rm { id } => {
                engine.delete_calendar_event(id)?;
                println!("Deleted event {id}");
                Ok(())
            }
        },
        Command::Day { date } => cmd_day(&engine, date.unwrap_or(today)),
        Command::Due { within } => cmd_due(&engine, today, within),
        Command::Stats => cmd_stats(&engine, today),
        Command::Export { format, out } => cmd_export(&engine, format, out),
        Command::Import { file, replace } => cmd_import(&mut engine, file, replace),
    }
}

// ---------------------------------------------------------------------------
// Work logs
// ---------------------------------------------------------------------------

fn cmd_log_add(
    engine: &mut Engine,
    date: NaiveDate,
    title: String,
    content: Option<String>,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let mut new = NewWorkLog::new(date, title).tags(tags);
    if let Some(content) = content {
        new = new.content(content);
    }
    let log = engine.add_work_log(new)?;
    println!("Added work log {} ({})", log.id, log.date);
    Ok(())
}

fn cmd_log_list(engine: &Engine, on: Option<NaiveDate>, limit: usize) -> anyhow::Result<()> {
    let logs = match on {
        Some(date) => engine.work_logs_on(date)?,
        None => engine.list_work_logs()?,
    };
    print_log_table(&logs, limit)
}

fn cmd_log_search(engine: &Engine, query: String) -> anyhow::Result<()> {
    let logs = engine.search_work_logs(&query)?;
    print_log_table(&logs, logs.len())
}

fn print_log_table(logs: &[WorkLog], limit: usize) -> anyhow::Result<()> {
    if logs.is_empty() {
        println!("No work logs found.");
        return Ok(());
    }
    println!("{:<6}  {:<12}  {:<32}  TAGS", "ID", "DATE", "TITLE");
    println!("{}", "-".repeat(76));
    for log in logs.iter().take(limit) {
        println!(
            "{:<6}  {:<12}  {:<32}  {}",
            log.id,
            log.date.to_string(),
            clip(&log.title, 32),
            log.tags.join(", ")
        );
    }
    println!("\n{} log(s)", logs.len().min(limit));
    Ok(())
}

// ---------------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------------

fn cmd_todo_add(
    engine: &mut Engine,
    title: String,
    priority: String,
    due: Option<NaiveDate>,
    repeat: Option<String>,
    every: u32,
) -> anyhow::Result<()> {
    let priority: Priority = priority.parse()?;
    let mut new = NewTodo::new(title).priority(priority);
    if let Some(date) = due {
        new = new.due(date);
    }
    if let Some(period) = repeat {
        let period_type: PeriodType = period.parse()?;
        new = new.recurrence(RecurrencePolicy::every(period_type, every));
    }
    let todo = engine.add_todo(new)?;
    println!("Added todo {} ({})", todo.id, todo.priority);
    Ok(())
}

fn cmd_todo_list(engine: &Engine, done: bool, today: NaiveDate) -> anyhow::Result<()> {
    if done {
        let todos = engine.completed_todos()?;
        if todos.is_empty() {
            println!("No completed todos.");
            return Ok(());
        }
        println!("{:<6}  {:<12}  {:<8}  TITLE", "ID", "DONE ON", "PRI");
        println!("{}", "-".repeat(60));
        for todo in &todos {
            println!(
                "{:<6}  {:<12}  {:<8}  {}",
                todo.id,
                opt_date(todo.completed_on),
                todo.priority.to_string(),
                todo.title
            );
        }
        println!("\n{} todo(s)", todos.len());
        return Ok(());
    }

    let todos = engine.active_todos()?;
    if todos.is_empty() {
        println!("No active todos.");
        return Ok(());
    }
    println!(
        "{:<6}  {:<8}  {:<14}  {:<16}  TITLE",
        "ID", "PRI", "DUE", "REPEATS"
    );
    println!("{}", "-".repeat(76));
    for todo in &todos {
        println!(
            "{:<6}  {:<8}  {:<14}  {:<16}  {}",
            todo.id,
            todo.priority.to_string(),
            due_cell(todo.due_date, today),
            repeat_cell(todo),
            todo.title
        );
    }
    println!("\n{} todo(s)", todos.len());
    Ok(())
}

fn cmd_todo_done(engine: &mut Engine, id: i64, on: NaiveDate) -> anyhow::Result<()> {
    let result = engine.complete_todo(id, on)?;
    println!("Completed: [{}] {}", result.todo.id, result.todo.title);
    if let Some(next) = result.next {
        println!("Next instance: [{}] due {}", next.id, opt_date(next.due_date));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Checklists
// ---------------------------------------------------------------------------

fn cmd_check_add(
    engine: &mut Engine,
    today: NaiveDate,
    title: String,
    policy: RecurrencePolicy,
    assignee: Option<String>,
    due: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let mut new = NewChecklist::new(title, policy);
    if let Some(who) = assignee {
        new = new.assignee(who);
    }
    if let Some(date) = due {
        new = new.due(date);
    }
    let item = engine.add_checklist(new, today)?;
    match item.next_due {
        Some(due) => println!("Added checklist {} (first due {due})", item.id),
        None => println!("Added checklist {}", item.id),
    }
    Ok(())
}

fn cmd_check_list(engine: &Engine, today: NaiveDate) -> anyhow::Result<()> {
    let items = engine.list_checklists()?;
    if items.is_empty() {
        println!("No checklist items.");
        return Ok(());
    }
    println!(
        "{:<6}  {:<14}  {:<16}  {:<12}  TITLE",
        "ID", "DUE", "REPEATS", "LAST DONE"
    );
    println!("{}", "-".repeat(80));
    for item in &items {
        println!(
            "{:<6}  {:<14}  {:<16}  {:<12}  {}",
            item.id,
            due_cell(item.next_due, today),
            item.policy.to_string(),
            opt_date(item.last_completed),
            check_title(item)
        );
    }
    println!("\n{} item(s)", items.len());
    Ok(())
}

fn cmd_check_done(engine: &mut Engine, id: i64, on: NaiveDate) -> anyhow::Result<()> {
    let item = engine.mark_checked(id, on)?;
    match item.next_due {
        Some(due) => println!("Checked: [{}] {} (next due {due})", item.id, item.title),
        None => println!("Checked: [{}] {}", item.id, item.title),
    }
    Ok(())
}

fn cmd_check_upcoming(engine: &Engine, id: i64, count: u32) -> anyhow::Result<()> {
    let item = engine.get_checklist(id)?;
    let dates = engine.upcoming_occurrences(id, count)?;
    println!("{} ({})", item.title, item.policy);
    if let Some(due) = item.next_due {
        println!("  next: {due}");
    }
    for date in dates {
        println!("  then: {date}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Calendar events
// ---------------------------------------------------------------------------

fn cmd_event_add(
    engine: &mut Engine,
    date: NaiveDate,
    title: String,
    location: Option<String>,
    link: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let mut new = NewCalendarEvent::new(date, title);
    if let Some(place) = location {
        new = new.location(place);
    }
    if let Some(url) = link {
        new = new.link(url);
    }
    if let Some(text) = description {
        new = new.description(text);
    }
    let event = engine.add_calendar_event(new)?;
    println!("Added event {} ({})", event.id, event.date);
    Ok(())
}

fn cmd_event_list(engine: &Engine, month: Option<String>) -> anyhow::Result<()> {
    let events = match month {
        Some(spec) => {
            let (year, month) = parse_month(&spec)?;
            engine.month_summary(year, month)?.events
        }
        None => engine.list_calendar_events()?,
    };
    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }
    println!("{:<6}  {:<12}  {:<32}  LOCATION", "ID", "DATE", "TITLE");
    println!("{}", "-".repeat(76));
    for event in &events {
        println!(
            "{:<6}  {:<12}  {:<32}  {}",
            event.id,
            event.date.to_string(),
            clip(&event.title, 32),
            event.location.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} event(s)", events.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

fn cmd_day(engine: &Engine, date: NaiveDate) -> anyhow::Result<()> {
    let summary = engine.day_summary(date)?;
    println!("{}", summary.date);

    if summary.events.is_empty()
        && summary.logs.is_empty()
        && summary.due_todos.is_empty()
        && summary.due_checklists.is_empty()
    {
        println!("\nNothing scheduled.");
        return Ok(());
    }

    if !summary.events.is_empty() {
        println!("\nEvents:");
        for event in &summary.events {
            match &event.location {
                Some(place) => println!("  [{}] {} @ {place}", event.id, event.title),
                None => println!("  [{}] {}", event.id, event.title),
            }
        }
    }
    if !summary.logs.is_empty() {
        println!("\nWork logs:");
        for log in &summary.logs {
            println!("  [{}] {}", log.id, log.title);
        }
    }
    if !summary.due_todos.is_empty() {
        println!("\nTodos due:");
        for todo in &summary.due_todos {
            println!("  [{}] {} ({})", todo.id, todo.title, todo.priority);
        }
    }
    if !summary.due_checklists.is_empty() {
        println!("\nChecklists due:");
        for item in &summary.due_checklists {
            println!("  [{}] {}", item.id, check_title(item));
        }
    }
    Ok(())
}

fn cmd_due(engine: &Engine, today: NaiveDate, within: u32) -> anyhow::Result<()> {
    let report = engine.due_within(today, within)?;
    if report.todos.is_empty() && report.checklists.is_empty() {
        println!("Nothing due within {within} day(s).");
        return Ok(());
    }
    if !report.todos.is_empty() {
        println!("Todos:");
        for todo in &report.todos {
            println!(
                "  [{}] {:<14}  {}",
                todo.id,
                due_cell(todo.due_date, today),
                todo.title
            );
        }
    }
    if !report.checklists.is_empty() {
        println!("Checklists:");
        for item in &report.checklists {
            println!(
                "  [{}] {:<14}  {}",
                item.id,
                due_cell(item.next_due, today),
                check_title(item)
            );
        }
    }
    Ok(())
}

fn cmd_stats(engine: &Engine, today: NaiveDate) -> anyhow::Result<()> {
    let stats = engine.statistics(today)?;
    println!("Work logs:        {}", stats.work_logs);
    println!("Calendar events:  {}", stats.calendar_events);
    println!("Active todos:     {}", stats.active_todos);
    println!("Completed todos:  {}", stats.completed_todos);
    println!("Checklists:       {}", stats.checklists);
    println!("  due now:        {}", stats.due_checklists);
    Ok(())
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

fn cmd_export(engine: &Engine, format: ExportFormat, out: Option<PathBuf>) -> anyhow::Result<()> {
    let bundle = engine.export_bundle()?;
    let content = match format {
        ExportFormat::Json => export::to_json(&bundle)?,
        ExportFormat::Csv => export::to_csv(&bundle),
        ExportFormat::Markdown => export::to_markdown(&bundle),
    };
    match out {
        Some(path) => {
            std::fs::write(&path, content)?;
            println!("Exported to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn cmd_import(engine: &mut Engine, file: PathBuf, replace: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)?;
    let bundle = export::parse_bundle(&raw)?;
    let mode = if replace {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };
    let summary = engine.import_bundle(bundle, mode)?;
    println!(
        "Imported {} work log(s), {} event(s), {} todo(s), {} checklist(s)",
        summary.work_logs, summary.calendar_events, summary.todos, summary.checklists
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(max - 3).collect();
        format!("{clipped}...")
    }
}

fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Due date cell, flagged when the item needs attention today.
fn due_cell(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        Some(due) if recur::is_due(due, today) => format!("{due} !"),
        Some(due) => due.to_string(),
        None => "-".to_string(),
    }
}

fn repeat_cell(todo: &Todo) -> String {
    todo.recurrence
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn check_title(item: &Checklist) -> String {
    match &item.assignee {
        Some(who) => format!("{} ({who})", item.title),
        None => item.title.clone(),
    }
}

fn parse_month(spec: &str) -> anyhow::Result<(i32, u32)> {
    let (year, month) = spec
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("expected YYYY-MM, got '{spec}'"))?;
    Ok((year.parse()?, month.parse()?))
}
