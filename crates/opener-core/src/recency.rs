//! Time windows over a project's last-opened timestamp (epoch millis).
//!
//! Weeks are 7 days and months are 30 days; nothing here is calendar aware.

use chrono::Utc;
use serde::Serialize;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;
pub const MONTH_MS: i64 = 30 * DAY_MS;

pub const RECENT_DAYS: i64 = 7;
pub const STALE_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyIndicator {
    /// Opened within the last day.
    Fresh,
    /// Untouched for the stale window or longer.
    Stale,
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn is_recent_project(last_opened: Option<i64>, now: i64) -> bool {
    last_opened.is_some_and(|opened| now - opened < RECENT_DAYS * DAY_MS)
}

pub fn is_stale_project(last_opened: Option<i64>, now: i64) -> bool {
    last_opened.is_some_and(|opened| now - opened >= STALE_DAYS * DAY_MS)
}

pub fn recency_indicator(last_opened: Option<i64>, now: i64) -> Option<RecencyIndicator> {
    let elapsed = now - last_opened?;
    if elapsed < DAY_MS {
        Some(RecencyIndicator::Fresh)
    } else if elapsed >= STALE_DAYS * DAY_MS {
        Some(RecencyIndicator::Stale)
    } else {
        None
    }
}

pub fn format_relative_time(last_opened: Option<i64>, now: i64) -> Option<String> {
    let elapsed = now - last_opened?;

    let text = if elapsed < MINUTE_MS {
        "just now".to_string()
    } else if elapsed < HOUR_MS {
        plural(elapsed / MINUTE_MS, "minute")
    } else if elapsed < DAY_MS {
        plural(elapsed / HOUR_MS, "hour")
    } else if elapsed < WEEK_MS {
        plural(elapsed / DAY_MS, "day")
    } else if elapsed < MONTH_MS {
        plural(elapsed / WEEK_MS, "week")
    } else {
        plural(elapsed / MONTH_MS, "month")
    };

    Some(text)
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000_000;

    #[test]
    fn relative_time_bucket_boundaries() {
        let at = |elapsed: i64| format_relative_time(Some(NOW - elapsed), NOW);

        assert_eq!(at(MINUTE_MS - 1).as_deref(), Some("just now"));
        assert_eq!(at(MINUTE_MS).as_deref(), Some("1 minute ago"));
        assert_eq!(at(45 * MINUTE_MS).as_deref(), Some("45 minutes ago"));
        assert_eq!(at(DAY_MS - 1).as_deref(), Some("23 hours ago"));
        assert_eq!(at(DAY_MS).as_deref(), Some("1 day ago"));
        assert_eq!(at(2 * WEEK_MS).as_deref(), Some("2 weeks ago"));
        assert_eq!(at(MONTH_MS).as_deref(), Some("1 month ago"));
        assert_eq!(at(400 * DAY_MS).as_deref(), Some("13 months ago"));
    }

    #[test]
    fn missing_timestamp_formats_to_none() {
        assert_eq!(format_relative_time(None, NOW), None);
    }

    #[test]
    fn recent_window_is_seven_days() {
        assert!(is_recent_project(Some(NOW - 6 * DAY_MS), NOW));
        assert!(!is_recent_project(Some(NOW - 8 * DAY_MS), NOW));
        assert!(!is_recent_project(None, NOW));
    }

    #[test]
    fn stale_window_starts_at_ninety_days() {
        assert!(is_stale_project(Some(NOW - 90 * DAY_MS), NOW));
        assert!(!is_stale_project(Some(NOW - 89 * DAY_MS), NOW));
        assert!(!is_stale_project(None, NOW));
    }

    #[test]
    fn indicator_marks_fresh_and_stale_only() {
        assert_eq!(recency_indicator(Some(NOW - HOUR_MS), NOW), Some(RecencyIndicator::Fresh));
        assert_eq!(recency_indicator(Some(NOW - 10 * DAY_MS), NOW), None);
        assert_eq!(
            recency_indicator(Some(NOW - 120 * DAY_MS), NOW),
            Some(RecencyIndicator::Stale)
        );
        assert_eq!(recency_indicator(None, NOW), None);
    }
}
