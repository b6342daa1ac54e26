// Schedule parsing and next-occurrence calculation
//
// A template is due when the first occurrence of its cron expression after
// the last successful run is not in the future. The calculation is
// deterministic given (expression, timezone, last run, now).

use crate::errors::ScheduleError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// The cron library expects a seconds column. A standard five-field crontab
/// expression gets a zero seconds column prepended; descriptors (@daily, ...)
/// and expressions that already carry seconds pass through untouched.
pub fn normalize_crontab(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.starts_with('@') {
        return trimmed.to_string();
    }
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Parse and validate a crontab expression
pub fn parse_crontab(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(&normalize_crontab(expression)).map_err(|e| {
        ScheduleError::InvalidCronExpression {
            expression: expression.to_string(),
            reason: e.to_string(),
        }
    })
}

/// First occurrence strictly after `after`, evaluated in `timezone` and
/// returned in UTC.
pub fn next_occurrence(
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let schedule = parse_crontab(expression)?;
    let after_in_tz = after.with_timezone(&timezone);
    let next_in_tz =
        schedule
            .after(&after_in_tz)
            .next()
            .ok_or_else(|| ScheduleError::NoNextOccurrence {
                expression: expression.to_string(),
            })?;
    Ok(next_in_tz.with_timezone(&Utc))
}

/// Whether the schedule has fired since `last_run` as of `now`
pub fn is_due(
    expression: &str,
    timezone: Tz,
    last_run: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<bool, ScheduleError> {
    Ok(next_occurrence(expression, timezone, last_run)? <= now)
}
