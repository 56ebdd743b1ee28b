//! Service clock helpers
//!
//! The reminder flows operate on "today" pinned to local midnight in the
//! service's fixed timezone (JST by default). Both batch queries and the
//! due-date preview endpoint share this definition.

use chrono::{DateTime, FixedOffset, Utc};

/// Local midnight of the current day in the given fixed offset
pub fn today_local_midnight(offset_hours: i32) -> DateTime<Utc> {
    local_midnight(Utc::now(), offset_hours)
}

/// Local midnight of the day containing `now`, expressed back in UTC
pub fn local_midnight(now: DateTime<Utc>, offset_hours: i32) -> DateTime<Utc> {
    let offset = FixedOffset::east_opt(offset_hours * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let local = now.with_timezone(&offset);
    let midnight = local
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time");
    midnight
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        // Fixed offsets have no DST gaps, this branch is unreachable
        .unwrap_or(now)
}

/// Day portion of a timestamp as shown in notification bodies
pub fn format_day(ts: &DateTime<Utc>, offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(offset_hours * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    ts.with_timezone(&offset).format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_midnight_jst() {
        // 2025-06-10 20:00 UTC is 2025-06-11 05:00 JST
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap();
        let midnight = local_midnight(now, 9);
        // JST midnight of the 11th is 15:00 UTC on the 10th
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 6, 10, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_local_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap();
        let midnight = local_midnight(now, 0);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_format_day_crosses_date_line() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap();
        assert_eq!(format_day(&ts, 9), "2025-06-11");
        assert_eq!(format_day(&ts, 0), "2025-06-10");
    }
}
