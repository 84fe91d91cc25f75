//! Date and race-time helpers
//!
//! Race times are kept as zero-padded `HH:MM` strings: the exporter sorts them
//! lexicographically, which only matches chronological order with padding.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Today's local date as `YYYY-MM-DD`
pub fn today_str() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parse `H:MM` / `HH:MM` (anything after the minutes is ignored)
pub fn parse_hhmm(hhmm: &str) -> Option<NaiveTime> {
    let mut parts = hhmm.trim().splitn(3, ':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().get(..2)?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Zero-pad a race time (`"9:05"` -> `"09:05"`). Unparseable input is
/// returned trimmed but otherwise unchanged.
pub fn normalize_hhmm(hhmm: &str) -> String {
    match parse_hhmm(hhmm) {
        Some(t) => t.format("%H:%M").to_string(),
        None => hhmm.trim().to_string(),
    }
}

/// `HH:MM` on the given day as ISO-8601 with minute precision
pub fn hhmm_to_iso(hhmm: &str, day: NaiveDate) -> Option<String> {
    let time = parse_hhmm(hhmm)?;
    Some(day.and_time(time).format("%Y-%m-%dT%H:%M").to_string())
}

/// Extract `HH:MM` from an ISO-8601 timestamp
pub fn iso_to_hhmm(iso: &str) -> Option<String> {
    let iso = iso.trim();
    if iso.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.format("%H:%M").to_string());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(iso, fmt).ok())
        .map(|dt| dt.format("%H:%M").to_string())
}

/// Whether a race starting at `hhmm` on `now`'s day is already past, allowing
/// `grace_minutes` after the start. Unparseable times are never past.
pub fn is_past_race(hhmm: &str, now: NaiveDateTime, grace_minutes: i64) -> bool {
    match parse_hhmm(hhmm) {
        Some(time) => now.date().and_time(time) < now - Duration::minutes(grace_minutes),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("13:10"), NaiveTime::from_hms_opt(13, 10, 0));
        assert_eq!(parse_hhmm("9:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("abc"), None);
        assert_eq!(parse_hhmm(""), None);
    }

    #[test]
    fn test_normalize_hhmm_pads() {
        assert_eq!(normalize_hhmm("9:05"), "09:05");
        assert_eq!(normalize_hhmm(" 14:00 "), "14:00");
        assert_eq!(normalize_hhmm("TBC"), "TBC");
    }

    #[test]
    fn test_hhmm_to_iso() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(hhmm_to_iso("18:42", day), Some("2025-01-14T18:42".to_string()));
        assert_eq!(hhmm_to_iso("x", day), None);
    }

    #[test]
    fn test_iso_to_hhmm() {
        assert_eq!(iso_to_hhmm("2025-01-14T18:42"), Some("18:42".to_string()));
        assert_eq!(iso_to_hhmm("2025-01-14T18:42:30"), Some("18:42".to_string()));
        assert_eq!(iso_to_hhmm("2025-01-14T18:42:00+00:00"), Some("18:42".to_string()));
        assert_eq!(iso_to_hhmm("not a date"), None);
        assert_eq!(iso_to_hhmm(""), None);
    }

    #[test]
    fn test_is_past_race_with_grace() {
        let now = at(14, 0);
        assert!(is_past_race("13:50", now, 2));
        assert!(!is_past_race("13:59", now, 2));
        assert!(!is_past_race("14:30", now, 2));
        assert!(is_past_race("13:59", now, 0));
        assert!(!is_past_race("??", now, 2));
    }
}
