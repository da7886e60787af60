//! Time helpers for expiry dates and the sweeper's daily cutoff

use chrono::{DateTime, Duration as ChronoDuration, Months, NaiveTime, Utc};
use chrono_tz::Tz;

const DAY_MS: i64 = 86_400_000;

/// Parse a "HH:MM" cutoff; invalid input falls back to 03:30
pub fn parse_cutoff(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(3, 30, 0).expect("valid fallback cutoff"))
}

/// Calendar-aware "N months later" in Unix millis
pub fn millis_after_months(now: i64, months: u32) -> i64 {
    DateTime::<Utc>::from_timestamp_millis(now)
        .and_then(|dt| dt.checked_add_months(Months::new(months)))
        .map(|dt| dt.timestamp_millis())
        // 30-day months if the calendar walk overflows
        .unwrap_or(now + months as i64 * 30 * DAY_MS)
}

/// `now + days` in Unix millis
pub fn millis_after_days(now: i64, days: i64) -> i64 {
    now + days * DAY_MS
}

/// Duration until the next daily cutoff in the given timezone
pub fn duration_until_next_cutoff(cutoff: NaiveTime, tz: Tz) -> std::time::Duration {
    let now = Utc::now().with_timezone(&tz);
    let today = now.date_naive();

    let target_date = if now.time() >= cutoff {
        today + ChronoDuration::days(1)
    } else {
        today
    };

    let target_datetime = target_date
        .and_time(cutoff)
        .and_local_timezone(tz)
        .single()
        .unwrap_or_else(|| {
            // DST edge case: shift a minute and take the later mapping
            (target_date.and_time(cutoff) + ChronoDuration::minutes(1))
                .and_local_timezone(tz)
                .latest()
                .unwrap_or_else(|| {
                    tracing::error!("Cannot resolve local cutoff time, using fallback");
                    now + ChronoDuration::hours(1)
                })
        });

    let duration = target_datetime.signed_duration_since(now);
    if duration.num_seconds() <= 0 {
        std::time::Duration::from_secs(60)
    } else {
        duration
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60))
    }
}
