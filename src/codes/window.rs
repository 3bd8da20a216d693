/// Validity window normalization
///
/// The lock gateway refuses codes that start less than a fixed lead time
/// from "now". For same-day bookings the start sent to the gateway is
/// bumped forward to satisfy that, but the window persisted and shown to
/// the customer keeps the intended start (e.g. midnight of the day pass).
/// The two fields may diverge only for same-day bookings.
use crate::error::{LockError, LockResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Result of normalizing a requested window
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWindow {
    /// Intended start: persisted and customer-facing
    pub starts_at: DateTime<Utc>,
    /// End of validity
    pub ends_at: DateTime<Utc>,
    /// Start to hand to the lock gateway; equals `starts_at` except for
    /// same-day bookings inside the lead time
    pub gateway_starts_at: DateTime<Utc>,
    /// Warning: `now` is already past the intended end. The code is still
    /// created but will classify as expired immediately.
    pub already_expired: bool,
}

/// Normalize a requested window against "now".
///
/// Fails with `InvalidWindow` if the end is not after the start. The
/// same-day test uses the property's civil zone (`offset`), never the
/// host zone.
pub fn normalize(
    requested_start: DateTime<Utc>,
    requested_end: DateTime<Utc>,
    now: DateTime<Utc>,
    lead_time: Duration,
    offset: FixedOffset,
) -> LockResult<NormalizedWindow> {
    if requested_end <= requested_start {
        return Err(LockError::InvalidWindow(format!(
            "end {} must be after start {}",
            requested_end, requested_start
        )));
    }

    let min_gateway_start = now + lead_time;

    // Bump only same-day starts: a future day's midnight is always far
    // enough out, and a past day is already a lost cause the expired
    // warning covers.
    let start_day = requested_start.with_timezone(&offset).date_naive();
    let today = now.with_timezone(&offset).date_naive();

    let gateway_starts_at = if start_day == today && requested_start < min_gateway_start {
        min_gateway_start
    } else {
        requested_start
    };

    let already_expired = now > requested_end;
    if already_expired {
        tracing::warn!(
            "Window {} - {} is already past at {}; code will be created expired",
            requested_start,
            requested_end,
            now
        );
    }

    Ok(NormalizedWindow {
        starts_at: requested_start,
        ends_at: requested_end,
        gateway_starts_at,
        already_expired,
    })
}

/// Instant window covering one civil day at the property: local midnight
/// through 23:59:59.999, both as UTC instants
pub fn day_window(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let utc_shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    let local_midnight = date.and_time(NaiveTime::MIN);

    let starts_at = Utc.from_utc_datetime(&(local_midnight - utc_shift));
    let ends_at = starts_at + Duration::days(1) - Duration::milliseconds(1);
    (starts_at, ends_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    const LEAD: i64 = 15;

    #[test]
    fn test_future_day_passes_through_unchanged() {
        let now = utc(2025, 6, 1, 10, 0, 0);
        let start = utc(2025, 6, 3, 0, 0, 0);
        let end = utc(2025, 6, 3, 23, 59, 59);

        let window =
            normalize(start, end, now, Duration::minutes(LEAD), FixedOffset::east_opt(0).unwrap())
                .unwrap();

        assert_eq!(window.starts_at, start);
        assert_eq!(window.gateway_starts_at, start);
        assert_eq!(window.ends_at, end);
        assert!(!window.already_expired);
    }

    #[test]
    fn test_same_day_start_is_bumped_for_gateway_only() {
        let now = utc(2025, 6, 1, 10, 0, 0);
        let start = utc(2025, 6, 1, 0, 0, 0); // midnight today, long past
        let end = utc(2025, 6, 1, 23, 59, 59);

        let window =
            normalize(start, end, now, Duration::minutes(LEAD), FixedOffset::east_opt(0).unwrap())
                .unwrap();

        // Stored start keeps the intended midnight
        assert_eq!(window.starts_at, start);
        // Gateway start moved to now + lead time
        assert_eq!(window.gateway_starts_at, now + Duration::minutes(LEAD));
        assert!(!window.already_expired);
    }

    #[test]
    fn test_same_day_is_judged_in_property_zone() {
        // 01:00 UTC on June 2 is still June 1 at UTC-6
        let offset = FixedOffset::west_opt(6 * 3600).unwrap();
        let now = utc(2025, 6, 2, 1, 0, 0);
        let (start, end) = day_window(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), offset);

        let window = normalize(start, end, now, Duration::minutes(LEAD), offset).unwrap();

        // Same civil day at the property, so the bump applies
        assert_eq!(window.gateway_starts_at, now + Duration::minutes(LEAD));
        assert_eq!(window.starts_at, start);
    }

    #[test]
    fn test_end_not_after_start_is_rejected() {
        let now = utc(2025, 6, 1, 10, 0, 0);
        let start = utc(2025, 6, 2, 12, 0, 0);

        let err = normalize(
            start,
            start,
            now,
            Duration::minutes(LEAD),
            FixedOffset::east_opt(0).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, LockError::InvalidWindow(_)));
    }

    #[test]
    fn test_past_window_warns_but_succeeds() {
        let now = utc(2025, 6, 5, 10, 0, 0);
        let start = utc(2025, 6, 1, 0, 0, 0);
        let end = utc(2025, 6, 1, 23, 59, 59);

        let window =
            normalize(start, end, now, Duration::minutes(LEAD), FixedOffset::east_opt(0).unwrap())
                .unwrap();
        assert!(window.already_expired);
        assert_eq!(window.starts_at, start);
        // Not today, so no bump either
        assert_eq!(window.gateway_starts_at, start);
    }

    #[test]
    fn test_day_window_spans_the_civil_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let (start, end) = day_window(date, FixedOffset::east_opt(0).unwrap());
        assert_eq!(start, utc(2025, 6, 1, 0, 0, 0));
        assert_eq!(end, utc(2025, 6, 1, 23, 59, 59) + Duration::milliseconds(999));

        // At UTC-6 local midnight is 06:00 UTC
        let (start, end) = day_window(date, FixedOffset::west_opt(6 * 3600).unwrap());
        assert_eq!(start, utc(2025, 6, 1, 6, 0, 0));
        assert_eq!(end, utc(2025, 6, 2, 5, 59, 59) + Duration::milliseconds(999));
    }
}
