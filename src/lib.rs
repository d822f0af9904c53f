//! # workpad
//!
//! Offline-first personal work management: calendar events, work logs,
//! todos, and recurring checklists over a single SQLite file.
//!
//! The recurrence engine rolls checklist due dates forward from completion
//! dates and spawns follow-up instances of recurring todos. The whole
//! dataset round-trips as a JSON bundle; CSV and Markdown are one-way
//! reports.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod model;
pub mod recur;
pub mod sanitize;
pub mod storage;
pub mod telemetry;
