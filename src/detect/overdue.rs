use crate::detect::DetectError;
use crate::grocy::Chore;
use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeZone};
use tracing::{debug, warn};

/// Format Grocy uses for `next_estimated_execution_time`.
pub const DUE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of classifying one chore list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Overdue chore names, in API response order.
    pub overdue_names: Vec<String>,
    /// Assigned user id of the last chore that matched the target user.
    pub last_user_id: Option<i64>,
}

impl Evaluation {
    pub fn overdue_count(&self) -> usize {
        self.overdue_names.len()
    }

    pub fn has_overdue(&self) -> bool {
        !self.overdue_names.is_empty()
    }
}

/// Parse a Grocy due time as wall-clock time in `tz`.
///
/// Ambiguous local times (DST fold) resolve to the earlier instant. Times
/// inside a DST gap are read with the offset in force before the jump, so
/// `02:30` on a spring-forward night becomes `03:30` daylight time.
pub fn parse_due_time<Tz: TimeZone>(value: &str, tz: &Tz) -> Result<DateTime<Tz>, DetectError> {
    let naive = NaiveDateTime::parse_from_str(value, DUE_TIME_FORMAT).map_err(|source| {
        DetectError::Timestamp {
            value: value.to_string(),
            source,
        }
    })?;
    Ok(match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t,
        LocalResult::None => {
            let before = tz.offset_from_utc_datetime(&naive).fix();
            let utc = naive - chrono::Duration::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    })
}

/// Collect the chores assigned to `username` whose next execution is strictly
/// before `now`.
pub fn evaluate<Tz: TimeZone>(chores: &[Chore], username: &str, now: &DateTime<Tz>) -> Evaluation {
    let tz = now.timezone();
    let mut result = Evaluation::default();

    for chore in chores {
        if chore.assigned_username() != Some(username) {
            continue;
        }

        // Last match wins.
        result.last_user_id = chore.next_execution_assigned_to_user_id;

        let Some(due) = chore.next_execution() else {
            continue;
        };

        let due_at = match parse_due_time(due, &tz) {
            Ok(t) => t,
            Err(e) => {
                warn!(chore = %chore.chore_name, error = %e, "Error parsing due time");
                continue;
            }
        };

        if due_at < *now {
            debug!(chore = %chore.chore_name, due = %due, "Overdue");
            result.overdue_names.push(chore.chore_name.clone());
        }
    }

    result
}
