//! Integration tests for the workpad engine.

use chrono::NaiveDate;
use workpad::engine::Engine;
use workpad::error::Error;
use workpad::model::{
    NewCalendarEvent, NewChecklist, NewTodo, NewWorkLog, PeriodType, Priority, RecurrencePolicy,
};

fn test_engine() -> Engine {
    Engine::in_memory().expect("failed to create in-memory engine")
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ---------------------------------------------------------------------------
// Work logs
// ---------------------------------------------------------------------------

#[test]
fn add_work_log_stores_cleaned_fields() {
    let mut engine = test_engine();
    let log = engine
        .add_work_log(
            NewWorkLog::new(d(2024, 1, 15), "  <b>deploy</b> ")
                .content("shipped & verified")
                .tag(" ops ")
                .tag("<x>"),
        )
        .unwrap();

    assert!(log.id > 0);
    assert_eq!(log.title, "&lt;b&gt;deploy&lt;/b&gt;");
    assert_eq!(log.content, "shipped &amp; verified");
    assert_eq!(log.tags, vec!["ops".to_string(), "&lt;x&gt;".to_string()]);

    let fetched = engine.get_work_log(log.id).unwrap();
    assert_eq!(fetched.title, log.title);
    assert_eq!(fetched.tags, log.tags);
}

#[test]
fn blank_title_is_rejected() {
    let mut engine = test_engine();
    let result = engine.add_work_log(NewWorkLog::new(d(2024, 1, 15), "   "));
    match result {
        Err(Error::Other(msg)) => assert!(msg.contains("title")),
        other => panic!("expected Other, got {other:?}"),
    }
}

#[test]
fn update_work_log_replaces_every_field() {
    let mut engine = test_engine();
    let log = engine
        .add_work_log(
            NewWorkLog::new(d(2024, 1, 15), "standup")
                .content("notes")
                .tag("meetings"),
        )
        .unwrap();

    let updated = engine
        .update_work_log(log.id, NewWorkLog::new(d(2024, 1, 16), "retro"))
        .unwrap();

    assert_eq!(updated.id, log.id);
    assert_eq!(updated.date, d(2024, 1, 16));
    assert_eq!(updated.title, "retro");
    assert_eq!(updated.content, "");
    assert!(updated.tags.is_empty());
    assert_eq!(updated.created_at, log.created_at);
}

#[test]
fn search_matches_title_content_and_tags_case_insensitively() {
    let mut engine = test_engine();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 10), "deploy api").tag("release"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 11), "standup").content("discussed deploys"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 12), "review").tag("Deployment"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 13), "lunch"))
        .unwrap();

    assert_eq!(engine.search_work_logs("DEPLOY").unwrap().len(), 3);
    assert_eq!(engine.search_work_logs("standup").unwrap().len(), 1);
    assert!(engine.search_work_logs("   ").unwrap().is_empty());
}

#[test]
fn work_logs_between_rejects_inverted_range() {
    let engine = test_engine();
    let result = engine.work_logs_between(d(2024, 2, 1), d(2024, 1, 1));
    assert!(matches!(result, Err(Error::InvalidDate(_))));
}

#[test]
fn all_tags_are_unique_and_sorted() {
    let mut engine = test_engine();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 10), "a").tag("ops").tag("alpha"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 11), "b").tag("ops").tag("beta"))
        .unwrap();

    assert_eq!(
        engine.all_tags().unwrap(),
        vec!["alpha".to_string(), "beta".to_string(), "ops".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Calendar events
// ---------------------------------------------------------------------------

#[test]
fn calendar_event_filters_script_links() {
    let mut engine = test_engine();
    let event = engine
        .add_calendar_event(
            NewCalendarEvent::new(d(2024, 3, 1), "demo")
                .location(" room 4 ")
                .link("javascript:alert(1)"),
        )
        .unwrap();
    assert_eq!(event.location.as_deref(), Some("room 4"));
    assert_eq!(event.link, None);

    let event = engine
        .add_calendar_event(
            NewCalendarEvent::new(d(2024, 3, 2), "offsite").link("https://example.com/agenda"),
        )
        .unwrap();
    assert_eq!(event.link.as_deref(), Some("https://example.com/agenda"));
}

#[test]
fn calendar_events_on_returns_only_that_day() {
    let mut engine = test_engine();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 3, 1), "demo"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 3, 1), "one on one"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 3, 2), "offsite"))
        .unwrap();

    let events = engine.calendar_events_on(d(2024, 3, 1)).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.date == d(2024, 3, 1)));
}

// ---------------------------------------------------------------------------
// Todos: completion spawns the next instance
// ---------------------------------------------------------------------------

#[test]
fn completing_recurring_todo_spawns_next_instance() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(
            NewTodo::new("water plants")
                .priority(Priority::Low)
                .due(d(2024, 1, 10))
                .recurrence(RecurrencePolicy::every(PeriodType::Weekly, 1)),
        )
        .unwrap();

    let done = engine.complete_todo(todo.id, d(2024, 1, 10)).unwrap();
    assert!(done.todo.completed);
    assert_eq!(done.todo.completed_on, Some(d(2024, 1, 10)));

    let next = done.next.expect("recurring completion should spawn");
    assert_ne!(next.id, todo.id);
    assert_eq!(next.title, "water plants");
    assert_eq!(next.priority, Priority::Low);
    assert_eq!(next.due_date, Some(d(2024, 1, 17)));
    assert!(!next.completed);
    assert_eq!(next.recurrence, todo.recurrence);

    let active = engine.active_todos().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, next.id);
    let completed = engine.completed_todos().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, todo.id);
}

#[test]
fn late_todo_completion_keeps_the_original_cadence() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(
            NewTodo::new("invoice")
                .due(d(2024, 1, 10))
                .recurrence(RecurrencePolicy::every(PeriodType::Weekly, 1)),
        )
        .unwrap();

    // Completed three days late: the next instance still lands one period
    // after the original due date.
    let done = engine.complete_todo(todo.id, d(2024, 1, 13)).unwrap();
    assert_eq!(done.next.unwrap().due_date, Some(d(2024, 1, 17)));
}

#[test]
fn recurring_todo_without_due_date_advances_from_completion_day() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(NewTodo::new("stretch").recurrence(RecurrencePolicy::every(PeriodType::Daily, 2)))
        .unwrap();

    let done = engine.complete_todo(todo.id, d(2024, 3, 5)).unwrap();
    assert_eq!(done.next.unwrap().due_date, Some(d(2024, 3, 7)));
}

#[test]
fn completing_a_completed_todo_changes_nothing() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(
            NewTodo::new("renew cert")
                .due(d(2024, 1, 10))
                .recurrence(RecurrencePolicy::every(PeriodType::Monthly, 1)),
        )
        .unwrap();

    engine.complete_todo(todo.id, d(2024, 1, 10)).unwrap();
    let again = engine.complete_todo(todo.id, d(2024, 1, 20)).unwrap();

    assert!(again.next.is_none());
    assert_eq!(again.todo.completed_on, Some(d(2024, 1, 10)));
    // The first completion spawned exactly one open instance.
    assert_eq!(engine.active_todos().unwrap().len(), 1);
}

#[test]
fn reopen_clears_completion_and_leaves_spawned_instance() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(
            NewTodo::new("report")
                .due(d(2024, 1, 10))
                .recurrence(RecurrencePolicy::every(PeriodType::Weekly, 1)),
        )
        .unwrap();
    engine.complete_todo(todo.id, d(2024, 1, 10)).unwrap();

    let reopened = engine.reopen_todo(todo.id).unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_on, None);
    assert_eq!(engine.active_todos().unwrap().len(), 2);
}

#[test]
fn update_todo_preserves_completion_state() {
    let mut engine = test_engine();
    let todo = engine.add_todo(NewTodo::new("file taxes")).unwrap();
    engine.complete_todo(todo.id, d(2024, 4, 10)).unwrap();

    let updated = engine
        .update_todo(
            todo.id,
            NewTodo::new("file state taxes").priority(Priority::High),
        )
        .unwrap();
    assert_eq!(updated.title, "file state taxes");
    assert_eq!(updated.priority, Priority::High);
    assert!(updated.completed);
    assert_eq!(updated.completed_on, Some(d(2024, 4, 10)));
}

#[test]
fn non_recurring_policy_on_todo_is_dropped() {
    let mut engine = test_engine();
    let todo = engine
        .add_todo(NewTodo::new("one off").recurrence(RecurrencePolicy::once()))
        .unwrap();
    assert_eq!(todo.recurrence, None);

    let done = engine.complete_todo(todo.id, d(2024, 5, 1)).unwrap();
    assert!(done.next.is_none());
}

#[test]
fn active_todos_sort_by_priority_then_due_date() {
    let mut engine = test_engine();
    engine
        .add_todo(
            NewTodo::new("someday")
                .priority(Priority::Low)
                .due(d(2024, 1, 1)),
        )
        .unwrap();
    engine
        .add_todo(NewTodo::new("urgent later").priority(Priority::High))
        .unwrap();
    engine
        .add_todo(
            NewTodo::new("urgent soon")
                .priority(Priority::High)
                .due(d(2024, 2, 1)),
        )
        .unwrap();
    engine
        .add_todo(
            NewTodo::new("normal")
                .priority(Priority::Medium)
                .due(d(2024, 1, 15)),
        )
        .unwrap();

    let active = engine.active_todos().unwrap();
    let titles: Vec<&str> = active.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["urgent soon", "urgent later", "normal", "someday"]);
}

// ---------------------------------------------------------------------------
// Checklists: schedules roll from the completion day
// ---------------------------------------------------------------------------

#[test]
fn new_recurring_checklist_seeds_first_due_date() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("backup drives", RecurrencePolicy::every(PeriodType::Weekly, 2)),
            d(2024, 1, 1),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 1, 15)));
    assert_eq!(item.last_completed, None);
}

#[test]
fn checking_off_rolls_schedule_from_completion_day() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("backup drives", RecurrencePolicy::every(PeriodType::Weekly, 2)),
            d(2024, 1, 1),
        )
        .unwrap();

    // Checked one day after it came due: the whole schedule shifts.
    let item = engine.mark_checked(item.id, d(2024, 1, 16)).unwrap();
    assert_eq!(item.last_completed, Some(d(2024, 1, 16)));
    assert_eq!(item.next_due, Some(d(2024, 1, 30)));
}

#[test]
fn rolled_schedule_depends_only_on_completion_day() {
    let mut engine = test_engine();
    let early = engine
        .add_checklist(
            NewChecklist::new("a", RecurrencePolicy::every(PeriodType::Weekly, 2)),
            d(2024, 1, 1),
        )
        .unwrap();
    let late = engine
        .add_checklist(
            NewChecklist::new("b", RecurrencePolicy::every(PeriodType::Weekly, 2)),
            d(2024, 1, 9),
        )
        .unwrap();
    assert_ne!(early.next_due, late.next_due);

    let early = engine.mark_checked(early.id, d(2024, 2, 5)).unwrap();
    let late = engine.mark_checked(late.id, d(2024, 2, 5)).unwrap();
    assert_eq!(early.next_due, late.next_due);
    assert_eq!(early.next_due, Some(d(2024, 2, 19)));
}

#[test]
fn month_end_checklist_clamps_to_february() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("pay rent", RecurrencePolicy::every(PeriodType::Monthly, 1)),
            d(2023, 12, 31),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 1, 31)));

    let item = engine.mark_checked(item.id, d(2024, 1, 31)).unwrap();
    assert_eq!(item.next_due, Some(d(2024, 2, 29)), "leap year keeps the 29th");

    let item = engine.mark_checked(item.id, d(2025, 1, 31)).unwrap();
    assert_eq!(item.next_due, Some(d(2025, 2, 28)));
}

#[test]
fn non_recurring_checklist_completion_clears_due_date() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("onboarding form", RecurrencePolicy::once()).due(d(2024, 6, 1)),
            d(2024, 5, 20),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 6, 1)));

    let item = engine.mark_checked(item.id, d(2024, 5, 25)).unwrap();
    assert_eq!(item.next_due, None);
    assert_eq!(item.last_completed, Some(d(2024, 5, 25)));
}

#[test]
fn update_checklist_rederives_schedule_only_on_policy_change() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new(
                "water office plants",
                RecurrencePolicy::every(PeriodType::Weekly, 1),
            ),
            d(2024, 1, 1),
        )
        .unwrap();
    let item = engine.mark_checked(item.id, d(2024, 1, 8)).unwrap();
    assert_eq!(item.next_due, Some(d(2024, 1, 15)));

    // Same policy, new title: the schedule stays put.
    let item = engine
        .update_checklist(
            item.id,
            NewChecklist::new("water plants", RecurrencePolicy::every(PeriodType::Weekly, 1)),
        )
        .unwrap();
    assert_eq!(item.title, "water plants");
    assert_eq!(item.next_due, Some(d(2024, 1, 15)));

    // New cadence: re-derived from the last completion.
    let item = engine
        .update_checklist(
            item.id,
            NewChecklist::new("water plants", RecurrencePolicy::every(PeriodType::Daily, 3)),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 1, 11)));
    assert_eq!(item.last_completed, Some(d(2024, 1, 8)));
}

#[test]
fn upcoming_occurrences_project_from_current_due_date() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("standup notes", RecurrencePolicy::every(PeriodType::Weekly, 1)),
            d(2024, 1, 1),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 1, 8)));

    let dates = engine.upcoming_occurrences(item.id, 3).unwrap();
    assert_eq!(dates, vec![d(2024, 1, 15), d(2024, 1, 22), d(2024, 1, 29)]);
}

#[test]
fn upcoming_occurrences_need_a_due_date() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("someday", RecurrencePolicy::once()),
            d(2024, 1, 1),
        )
        .unwrap();
    assert_eq!(item.next_due, None);

    let result = engine.upcoming_occurrences(item.id, 3);
    assert!(matches!(result, Err(Error::InvalidPolicy(_))));
}

#[test]
fn due_checklists_boundary_is_exact() {
    let mut engine = test_engine();
    let item = engine
        .add_checklist(
            NewChecklist::new("rotate keys", RecurrencePolicy::every(PeriodType::Weekly, 1)),
            d(2024, 3, 3),
        )
        .unwrap();
    assert_eq!(item.next_due, Some(d(2024, 3, 10)));

    assert!(engine.due_checklists(d(2024, 3, 9)).unwrap().is_empty());
    assert_eq!(engine.due_checklists(d(2024, 3, 10)).unwrap().len(), 1);
    assert_eq!(engine.due_checklists(d(2024, 3, 11)).unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Dashboard views
// ---------------------------------------------------------------------------

#[test]
fn day_summary_collects_exactly_one_day() {
    let mut engine = test_engine();
    let day = d(2024, 4, 10);
    engine
        .add_calendar_event(NewCalendarEvent::new(day, "planning"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 4, 11), "retro"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(day, "morning notes"))
        .unwrap();
    engine.add_todo(NewTodo::new("send agenda").due(day)).unwrap();
    engine
        .add_todo(NewTodo::new("later").due(d(2024, 4, 12)))
        .unwrap();
    engine
        .add_checklist(
            NewChecklist::new("tidy desk", RecurrencePolicy::every(PeriodType::Daily, 1)),
            d(2024, 4, 9),
        )
        .unwrap();

    let summary = engine.day_summary(day).unwrap();
    assert_eq!(summary.events.len(), 1);
    assert_eq!(summary.logs.len(), 1);
    assert_eq!(summary.due_todos.len(), 1);
    assert_eq!(summary.due_todos[0].title, "send agenda");
    assert_eq!(summary.due_checklists.len(), 1);
}

#[test]
fn month_summary_filters_to_the_month() {
    let mut engine = test_engine();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 1, 5), "kickoff"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 2, 1), "next month"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 31), "eom wrap"))
        .unwrap();
    engine
        .add_todo(NewTodo::new("in month").due(d(2024, 1, 20)))
        .unwrap();
    engine
        .add_todo(NewTodo::new("overdue from december").due(d(2023, 12, 28)))
        .unwrap();
    engine
        .add_todo(NewTodo::new("next month").due(d(2024, 2, 2)))
        .unwrap();

    let summary = engine.month_summary(2024, 1).unwrap();
    assert_eq!(summary.events.len(), 1);
    assert_eq!(summary.logs.len(), 1);
    assert_eq!(summary.todos.len(), 1);
    assert_eq!(summary.todos[0].title, "in month");
}

#[test]
fn month_summary_rejects_bad_month() {
    let engine = test_engine();
    assert!(matches!(
        engine.month_summary(2024, 13),
        Err(Error::InvalidDate(_))
    ));
}

#[test]
fn due_within_includes_overdue_and_horizon() {
    let mut engine = test_engine();
    engine
        .add_todo(NewTodo::new("overdue").due(d(2024, 6, 1)))
        .unwrap();
    engine
        .add_todo(NewTodo::new("inside").due(d(2024, 6, 17)))
        .unwrap();
    engine
        .add_todo(NewTodo::new("outside").due(d(2024, 6, 18)))
        .unwrap();
    engine
        .add_checklist(
            NewChecklist::new("water", RecurrencePolicy::every(PeriodType::Weekly, 1)),
            d(2024, 6, 8),
        )
        .unwrap();

    let report = engine.due_within(d(2024, 6, 10), 7).unwrap();
    let titles: Vec<&str> = report.todos.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["overdue", "inside"]);
    assert_eq!(report.checklists.len(), 1);
}

#[test]
fn statistics_count_each_store() {
    let mut engine = test_engine();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 1), "a"))
        .unwrap();
    engine
        .add_work_log(NewWorkLog::new(d(2024, 1, 2), "b"))
        .unwrap();
    engine
        .add_calendar_event(NewCalendarEvent::new(d(2024, 1, 3), "c"))
        .unwrap();
    engine.add_todo(NewTodo::new("open")).unwrap();
    let done = engine.add_todo(NewTodo::new("done")).unwrap();
    engine.complete_todo(done.id, d(2024, 1, 4)).unwrap();
    engine
        .add_checklist(
            NewChecklist::new("due now", RecurrencePolicy::every(PeriodType::Daily, 1)),
            d(2024, 1, 4),
        )
        .unwrap();
    engine
        .add_checklist(
            NewChecklist::new("due later", RecurrencePolicy::every(PeriodType::Monthly, 1)),
            d(2024, 1, 4),
        )
        .unwrap();

    let stats = engine.statistics(d(2024, 1, 5)).unwrap();
    assert_eq!(stats.work_logs, 2);
    assert_eq!(stats.calendar_events, 1);
    assert_eq!(stats.active_todos, 1);
    assert_eq!(stats.completed_todos, 1);
    assert_eq!(stats.checklists, 2);
    assert_eq!(stats.due_checklists, 1);
}

// ---------------------------------------------------------------------------
// Missing ids
// ---------------------------------------------------------------------------

#[test]
fn missing_ids_surface_kind_and_id() {
    let engine = test_engine();
    match engine.get_todo(999) {
        Err(Error::NotFound { kind, id }) => {
            assert_eq!(kind, "todo");
            assert_eq!(id, 999);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(engine.get_work_log(1), Err(Error::NotFound { .. })));
    assert!(matches!(engine.get_checklist(1), Err(Error::NotFound { .. })));
    assert!(matches!(
        engine.get_calendar_event(1),
        Err(Error::NotFound { .. })
    ));
}
