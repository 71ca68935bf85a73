use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone, Utc};

/// `850ms`, `42s`, `3m 7s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let s = ms / 1000;
    if s < 60 {
        return format!("{}s", s);
    }
    format!("{}m {}s", s / 60, s % 60)
}

/// Parses backend timestamps. RFC 3339 is expected; naive timestamps are
/// taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Local wall-clock rendering, or the raw string when it cannot be parsed.
pub fn format_timestamp(s: &str) -> String {
    match parse_timestamp(s) {
        Some(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => s.to_string(),
    }
}

/// `M/D` label in local time.
pub fn short_date(s: &str) -> String {
    match parse_timestamp(s) {
        Some(dt) => {
            let local = dt.with_timezone(&Local);
            format!("{}/{}", local.month(), local.day())
        }
        None => String::new(),
    }
}

/// Relative age: `just now`, `5m ago`, `3h ago`, `2d ago`.
pub fn time_ago(s: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(s) else {
        return s.to_string();
    };
    let mins = (now - then).num_minutes();
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hrs = mins / 60;
    if hrs < 24 {
        return format!("{}h ago", hrs);
    }
    format!("{}d ago", hrs / 24)
}
