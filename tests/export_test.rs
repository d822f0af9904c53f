//! Integration tests for export bundles: engine to JSON and back.

use chrono::{NaiveDate, Utc};
use workpad::engine::Engine;
use workpad::error::Error;
use workpad::export::{self, EXPORT_VERSION, ExportBundle, ImportMode};
use workpad::model::{
    CalendarEvent, Checklist, NewCalendarEvent, NewChecklist, NewTodo, NewWorkLog, PeriodType,
    Priority, RecurrencePolicy, Todo, WorkLog,
};

fn test_engine() -> Engine {
    Engine::in_memory().expect("failed to create in-memory engine")
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn empty_bundle() -> ExportBundle {
    ExportBundle {
        version: EXPORT_VERSION,
        exported_at: Utc::now(),
        work_logs: Vec::new(),
        calendar_events: Vec::new(),
        todos: Vec::new(),
        checklists: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Round trip: engine -> JSON -> fresh engine
// ---------------------------------------------------------------------------

#[test]
fn bundle_round_trips_between_engines() {
    let mut source = test_engine();
    source
        .add_work_log(NewWorkLog::new(d(2024, 1, 15), "deploy notes").tag("ops"))
        .unwrap();
    source
        .add_calendar_event(
            NewCalendarEvent::new(d(2024, 1, 20), "planning").link("https://example.com"),
        )
        .unwrap();
    source
        .add_todo(
            NewTodo::new("rotate keys")
                .priority(Priority::High)
                .due(d(2024, 2, 1))
                .recurrence(RecurrencePolicy::every(PeriodType::Monthly, 1)),
        )
        .unwrap();
    let done = source.add_todo(NewTodo::new("one off")).unwrap();
    source.complete_todo(done.id, d(2024, 1, 16)).unwrap();
    let item = source
        .add_checklist(
            NewChecklist::new("backup drives", RecurrencePolicy::every(PeriodType::Weekly, 2)),
            d(2024, 1, 1),
        )
        .unwrap();
    source.mark_checked(item.id, d(2024, 1, 16)).unwrap();

    let json = export::to_json(&source.export_bundle().unwrap()).unwrap();
    let parsed = export::parse_bundle(&json).unwrap();

    let mut target = test_engine();
    let summary = target.import_bundle(parsed, ImportMode::Merge).unwrap();
    assert_eq!(summary.work_logs, 1);
    assert_eq!(summary.calendar_events, 1);
    assert_eq!(summary.todos, 2);
    assert_eq!(summary.checklists, 1);

    // Schedule state survives the trip.
    let items = target.list_checklists().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "backup drives");
    assert_eq!(items[0].policy, RecurrencePolicy::every(PeriodType::Weekly, 2));
    assert_eq!(items[0].next_due, Some(d(2024, 1, 30)));
    assert_eq!(items[0].last_completed, Some(d(2024, 1, 16)));

    // So do completion flags and tags.
    assert_eq!(target.completed_todos().unwrap().len(), 1);
    let active = target.active_todos().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].recurrence, Some(RecurrencePolicy::every(PeriodType::Monthly, 1)));
    assert_eq!(target.all_tags().unwrap(), vec!["ops".to_string()]);
}

// ---------------------------------------------------------------------------
// Merge vs. replace
// ---------------------------------------------------------------------------

#[test]
fn merge_import_adds_alongside_existing_records() {
    let mut engine = test_engine();
    let existing = engine
        .add_work_log(NewWorkLog::new(d(2024, 3, 1), "already here"))
        .unwrap();

    let mut bundle = empty_bundle();
    bundle.work_logs.push(WorkLog {
        id: 42,
        date: d(2024, 3, 2),
        title: "from the file".to_string(),
        content: String::new(),
        tags: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    engine.import_bundle(bundle, ImportMode::Merge).unwrap();

    let logs = engine.list_work_logs().unwrap();
    assert_eq!(logs.len(), 2);
    let imported = logs.iter().find(|l| l.title == "from the file").unwrap();
    assert_ne!(imported.id, 42, "imported records get fresh ids");
    assert_ne!(imported.id, existing.id);
}

#[test]
fn replace_import_wipes_every_store_first() {
    let mut engine = test_engine();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 3, 1), "old log"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 3, 1), "old event"))
        .unwrap();
    engine.add_todo(NewTodo::new("old todo")).unwrap();

    let mut bundle = empty_bundle();
    bundle.work_logs.push(WorkLog {
        id: 0,
        date: d(2024, 4, 1),
        title: "replacement".to_string(),
        content: String::new(),
        tags: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    engine.import_bundle(bundle, ImportMode::Replace).unwrap();

    let stats = engine.statistics(d(2024, 4, 1)).unwrap();
    assert_eq!(stats.work_logs, 1);
    assert_eq!(stats.calendar_events, 0);
    assert_eq!(stats.active_todos, 0);
    assert_eq!(engine.list_work_logs().unwrap()[0].title, "replacement");
}

// ---------------------------------------------------------------------------
// Imported data passes the same boundaries as typed input
// ---------------------------------------------------------------------------

#[test]
fn import_cleans_text_and_drops_script_links() {
    let mut bundle = empty_bundle();
    bundle.calendar_events.push(CalendarEvent {
        id: 0,
        date: d(2024, 5, 1),
        title: "<script>alert(1)</script>".to_string(),
        location: None,
        link: Some("javascript:alert(1)".to_string()),
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });
    bundle.todos.push(Todo {
        id: 0,
        title: "plain".to_string(),
        priority: Priority::Medium,
        due_date: None,
        completed: false,
        completed_on: None,
        recurrence: Some(RecurrencePolicy::once()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    let mut engine = test_engine();
    engine.import_bundle(bundle, ImportMode::Merge).unwrap();

    let events = engine.list_calendar_events().unwrap();
    assert_eq!(events[0].title, "&lt;script&gt;alert(1)&lt;/script&gt;");
    assert_eq!(events[0].link, None);

    // A non-recurring policy on a todo is dropped, same as on add.
    assert_eq!(engine.active_todos().unwrap()[0].recurrence, None);
}

#[test]
fn invalid_policy_in_bundle_imports_nothing() {
    let mut bundle = empty_bundle();
    bundle.work_logs.push(WorkLog {
        id: 0,
        date: d(2024, 5, 1),
        title: "good log".to_string(),
        content: String::new(),
        tags: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });
    bundle.checklists.push(Checklist {
        id: 0,
        title: "bad item".to_string(),
        assignee: None,
        policy: RecurrencePolicy {
            period_type: PeriodType::Weekly,
            period_value: 0,
            repeat_count: None,
        },
        next_due: None,
        last_completed: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    });

    let mut engine = test_engine();
    let result = engine.import_bundle(bundle, ImportMode::Merge);
    match result {
        Err(Error::InvalidImport(msg)) => assert!(msg.contains("bad item")),
        other => panic!("expected InvalidImport, got {other:?}"),
    }

    // The good record was not written either.
    let stats = engine.statistics(d(2024, 5, 1)).unwrap();
    assert_eq!(stats.work_logs, 0);
}
