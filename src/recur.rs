//! Recurrence arithmetic.
//!
//! Pure calendar-day math over [`RecurrencePolicy`]: computing the next due
//! date from a completion date, due checks against a reference day, and
//! forward materialization of future occurrences. No function here reads
//! the clock; callers pass every date in.

use chrono::{Days, Months, NaiveDate};

use crate::error::{Error, Result};
use crate::model::{PeriodType, RecurrencePolicy};

/// Next due date strictly after `from` under `policy`.
///
/// Daily and weekly advance by exact day counts. Monthly advances by
/// calendar months and clamps to the last day when the target month is
/// shorter: Jan 31 plus one month is Feb 29 in a leap year, Feb 28
/// otherwise. A non-recurring policy has no next due date and is an error.
pub fn next_due_after(from: NaiveDate, policy: &RecurrencePolicy) -> Result<NaiveDate> {
    policy.validate()?;
    let value = policy.period_value;
    let next = match policy.period_type {
        PeriodType::Daily => from.checked_add_days(Days::new(u64::from(value))),
        PeriodType::Weekly => from.checked_add_days(Days::new(u64::from(value) * 7)),
        PeriodType::Monthly => from.checked_add_months(Months::new(value)),
        PeriodType::None => {
            return Err(Error::InvalidPolicy(
                "non-recurring policy has no next due date".into(),
            ));
        }
    };
    next.ok_or_else(|| Error::InvalidDate(format!("next due date after {from} is out of range")))
}

/// True when the item is due on `on`: its due date is that day or earlier.
/// Day granularity only.
pub fn is_due(next_due: NaiveDate, on: NaiveDate) -> bool {
    next_due <= on
}

/// Materialize the next occurrences after `next_due`.
///
/// The first date is one period after `next_due`, each later date one
/// period after the previous, so the result is strictly increasing. Returns
/// exactly `count` dates, clamped to the policy's `repeat_count` when one
/// is set. `count` must be at least 1 and the policy must recur.
pub fn materialize(
    next_due: NaiveDate,
    policy: &RecurrencePolicy,
    count: u32,
) -> Result<Vec<NaiveDate>> {
    policy.validate()?;
    if !policy.is_recurring() {
        return Err(Error::InvalidPolicy(
            "cannot materialize occurrences of a non-recurring policy".into(),
        ));
    }
    if count < 1 {
        return Err(Error::InvalidCount(
            "occurrence count must be at least 1".into(),
        ));
    }
    let count = match policy.repeat_count {
        Some(cap) => count.min(cap),
        None => count,
    };

    let mut dates = Vec::with_capacity(count as usize);
    let mut cursor = next_due;
    for _ in 0..count {
        cursor = next_due_after(cursor, policy)?;
        dates.push(cursor);
    }
    Ok(dates)
}
