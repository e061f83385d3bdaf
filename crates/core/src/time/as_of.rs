use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

/// Reference date for the recency window: an explicit `YYYY-MM-DD` argument,
/// otherwise the UTC calendar date of `now_utc`.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    match as_of_date_arg.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid as-of date {s:?} (expected YYYY-MM-DD)")),
        None => Ok(now_utc.date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn explicit_date_wins() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let d = resolve_as_of_date(Some("2024-02-01"), now).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn defaults_to_utc_calendar_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 23, 59, 0).unwrap();
        assert_eq!(
            resolve_as_of_date(None, now).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
        assert_eq!(
            resolve_as_of_date(Some("  "), now).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        assert!(resolve_as_of_date(Some("05/01/2026"), now).is_err());
    }
}
