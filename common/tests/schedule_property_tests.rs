// Property-based tests for schedule calculation

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::schedule::{is_due, next_occurrence, normalize_crontab, parse_crontab};
use proptest::prelude::*;

fn arbitrary_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 through 2090-ish, whole seconds
    (946_684_800i64..3_786_825_600i64).prop_map(|ts| Utc.timestamp_opt(ts, 0).unwrap())
}

proptest! {
    /// *For any* valid hour/minute expression and reference instant, the next
    /// occurrence is strictly after the reference.
    #[test]
    fn property_next_occurrence_is_strictly_after(
        minute in 0u32..60,
        hour in 0u32..24,
        after in arbitrary_instant(),
    ) {
        let expression = format!("{} {} * * *", minute, hour);
        let next = next_occurrence(&expression, chrono_tz::UTC, after).unwrap();
        prop_assert!(next > after);
    }

    /// *For any* daily expression, the next occurrence lands within 24 hours
    /// of the reference and on the requested minute and hour.
    #[test]
    fn property_daily_occurrence_lands_on_schedule(
        minute in 0u32..60,
        hour in 0u32..24,
        after in arbitrary_instant(),
    ) {
        let expression = format!("{} {} * * *", minute, hour);
        let next = next_occurrence(&expression, chrono_tz::UTC, after).unwrap();
        prop_assert!(next - after <= Duration::hours(24));
        use chrono::Timelike;
        prop_assert_eq!(next.minute(), minute);
        prop_assert_eq!(next.hour(), hour);
        prop_assert_eq!(next.second(), 0);
    }

    /// *For any* schedule due at instant T, it stays due at every later
    /// instant (due-ness is monotone in `now`).
    #[test]
    fn property_due_is_monotone_in_now(
        minute in 0u32..60,
        hour in 0u32..24,
        last_run in arbitrary_instant(),
        advance_secs in 0i64..864_000,
    ) {
        let expression = format!("{} {} * * *", minute, hour);
        let now = last_run + Duration::hours(25);
        prop_assert!(is_due(&expression, chrono_tz::UTC, last_run, now).unwrap());
        let later = now + Duration::seconds(advance_secs);
        prop_assert!(is_due(&expression, chrono_tz::UTC, last_run, later).unwrap());
    }

    /// *For any* expression, normalization is idempotent.
    #[test]
    fn property_normalize_is_idempotent(expression in "[0-9*/ ]{1,40}") {
        let once = normalize_crontab(&expression);
        prop_assert_eq!(normalize_crontab(&once), once.clone());
    }

    /// *For any* five-field expression, prepending the seconds column by hand
    /// parses to the same schedule as letting normalization do it.
    #[test]
    fn property_five_field_matches_explicit_seconds(
        minute in 0u32..60,
        hour in 0u32..24,
    ) {
        let five = format!("{} {} * * *", minute, hour);
        let six = format!("0 {} {} * * *", minute, hour);
        let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let a = next_occurrence(&five, chrono_tz::UTC, after).unwrap();
        let b = next_occurrence(&six, chrono_tz::UTC, after).unwrap();
        prop_assert_eq!(a, b);
    }

    /// *For any* garbage that is not a cron expression, parsing reports a
    /// typed error instead of panicking.
    #[test]
    fn property_garbage_is_rejected(expression in "[a-z!#]{1,20}") {
        prop_assert!(parse_crontab(&expression).is_err());
    }
}
