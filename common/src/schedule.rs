use crate::job::{Frequency, Schedule, DEFAULT_DAY_OF_MONTH, DEFAULT_DAY_OF_WEEK,
                 DEFAULT_HOURLY_INTERVAL};
use anyhow::{anyhow, Result};

pub const DAY_NAMES: [&str; 7] =
    ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

/// Display form of a schedule: a sentence and a 5-field cron string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub description: String,
    pub cron: String,
}

/// Interprets a schedule for display. Never fails: missing fields take their
/// defaults and unknown frequencies are shown capitalized.
///
/// Weekly and monthly cron strings use the same `{minute} {hour} * * *` shape
/// as daily; the day constraint only appears in the description.
pub fn describe(schedule: &Schedule) -> ScheduleSummary {
    let hour = schedule.hour_or_default();
    let minute = schedule.minute_or_default();
    let at = format!("{:02}:{:02}", hour, minute);
    let time_cron = format!("{} {} * * *", minute, hour);

    match &schedule.frequency {
        Frequency::Hourly => {
            let interval = schedule.interval.unwrap_or(DEFAULT_HOURLY_INTERVAL);
            ScheduleSummary {
                description: format!("Every {} minutes", interval),
                cron: format!("*/{} * * * *", interval),
            }
        }
        Frequency::Daily => ScheduleSummary {
            description: format!("Daily at {}", at),
            cron: time_cron,
        },
        Frequency::Weekly => {
            let day = schedule.day_of_week.unwrap_or(DEFAULT_DAY_OF_WEEK);
            ScheduleSummary {
                description: format!("Weekly on {} at {}", day_name(day), at),
                cron: time_cron,
            }
        }
        Frequency::Monthly => {
            let day = schedule.day_of_month.unwrap_or(DEFAULT_DAY_OF_MONTH);
            ScheduleSummary {
                description: format!("Monthly on day {} at {}", day, at),
                cron: time_cron,
            }
        }
        Frequency::Custom => match schedule.cron_expression.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => ScheduleSummary {
                description: format!("Custom ({})", expr),
                cron: expr.to_string(),
            },
            _ => ScheduleSummary { description: "Custom".to_string(), cron: time_cron },
        },
        Frequency::Other(raw) => ScheduleSummary {
            description: capitalize(raw),
            cron: time_cron,
        },
    }
}

/// Day name for a 0-based Sunday-first index; out of range falls back to Sunday.
pub fn day_name(day_of_week: u32) -> &'static str {
    DAY_NAMES.get(day_of_week as usize).copied().unwrap_or(DAY_NAMES[0])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses `HH:MM` into `(hour, minute)`.
pub fn parse_time(s: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = s.trim().split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow!("Invalid time format. Use HH:MM"));
    }
    let hour: u32 = parts[0].parse()?;
    let minute: u32 = parts[1].parse()?;
    if hour > 23 || minute > 59 {
        return Err(anyhow!("Time out of range: {}", s));
    }
    Ok((hour, minute))
}

/// Parses a weekday name or 0-6 index into the Sunday-first index.
pub fn parse_weekday(s: &str) -> Result<u32> {
    match s.trim().to_lowercase().as_str() {
        "sun" | "sunday" | "0" => Ok(0),
        "mon" | "monday" | "1" => Ok(1),
        "tue" | "tuesday" | "2" => Ok(2),
        "wed" | "wednesday" | "3" => Ok(3),
        "thu" | "thursday" | "4" => Ok(4),
        "fri" | "friday" | "5" => Ok(5),
        "sat" | "saturday" | "6" => Ok(6),
        _ => Err(anyhow!("Invalid weekday: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_description_and_cron() {
        let summary = describe(&Schedule::weekly(3, 9, 30));
        assert_eq!(summary.description, "Weekly on Wednesday at 09:30");
        assert_eq!(summary.cron, "30 9 * * *");
    }

    #[test]
    fn test_hourly_defaults_interval() {
        let mut schedule = Schedule::hourly(15);
        assert_eq!(describe(&schedule).description, "Every 15 minutes");
        assert_eq!(describe(&schedule).cron, "*/15 * * * *");

        schedule.interval = None;
        assert_eq!(describe(&schedule).cron, "*/30 * * * *");
    }

    #[test]
    fn test_daily_and_monthly() {
        assert_eq!(describe(&Schedule::daily(7, 5)).description, "Daily at 07:05");
        assert_eq!(describe(&Schedule::daily(7, 5)).cron, "5 7 * * *");

        let monthly = describe(&Schedule::monthly(15, 23, 0));
        assert_eq!(monthly.description, "Monthly on day 15 at 23:00");
        assert_eq!(monthly.cron, "0 23 * * *");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let weekly: Schedule = serde_json::from_str(r#"{"frequency":"weekly"}"#).unwrap();
        assert_eq!(describe(&weekly).description, "Weekly on Sunday at 00:00");

        let monthly: Schedule = serde_json::from_str(r#"{"frequency":"monthly","hour":4}"#).unwrap();
        assert_eq!(describe(&monthly).description, "Monthly on day 1 at 04:00");
        assert_eq!(describe(&monthly).cron, "0 4 * * *");
    }

    #[test]
    fn test_unknown_frequency_is_capitalized() {
        let schedule: Schedule = serde_json::from_str(r#"{"frequency":"yearly"}"#).unwrap();
        let summary = describe(&schedule);
        assert_eq!(summary.description, "Yearly");
        assert_eq!(summary.cron, "0 0 * * *");
    }

    #[test]
    fn test_custom_expression() {
        let summary = describe(&Schedule::custom(" 0 */2 * * 1-5 "));
        assert_eq!(summary.description, "Custom (0 */2 * * 1-5)");
        assert_eq!(summary.cron, "0 */2 * * 1-5");

        let bare: Schedule = serde_json::from_str(r#"{"frequency":"custom"}"#).unwrap();
        assert_eq!(describe(&bare).description, "Custom");
    }

    #[test]
    fn test_out_of_range_weekday_falls_back() {
        assert_eq!(day_name(9), "Sunday");
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("09:30").unwrap(), (9, 30));
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("930").is_err());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Wed").unwrap(), 3);
        assert_eq!(parse_weekday("sunday").unwrap(), 0);
        assert_eq!(parse_weekday("6").unwrap(), 6);
        assert!(parse_weekday("someday").is_err());
    }
}
