use common::{Frequency, JobConfig, JobId, JobPayload, Schedule};
use std::str::FromStr;

pub const CREATE_TITLE: &str = "Create New Job";
pub const EDIT_TITLE: &str = "Edit Job";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: u64, max: u64 },
    #[error("invalid cron expression: {0}")]
    InvalidCron(String),
    #[error("unsupported frequency '{0}'")]
    UnsupportedFrequency(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    ScriptPath,
    Frequency,
    Interval,
    Hour,
    Minute,
    DayOfWeek,
    DayOfMonth,
    CronExpression,
    Timeout,
}

impl FormField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "name" => Some(FormField::Name),
            "script" | "script_path" => Some(FormField::ScriptPath),
            "frequency" | "freq" => Some(FormField::Frequency),
            "interval" => Some(FormField::Interval),
            "hour" => Some(FormField::Hour),
            "minute" => Some(FormField::Minute),
            "dow" | "day_of_week" => Some(FormField::DayOfWeek),
            "dom" | "day_of_month" => Some(FormField::DayOfMonth),
            "cron" | "cron_expression" => Some(FormField::CronExpression),
            "timeout" | "timeout_seconds" => Some(FormField::Timeout),
            _ => None,
        }
    }
}

/// Which schedule inputs are shown for the selected frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleFields {
    pub interval: bool,
    pub time: bool,
    pub day_of_week: bool,
    pub day_of_month: bool,
    pub cron_expression: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobForm {
    /// Set when editing an existing job; submit then issues a PUT.
    pub edit_id: Option<JobId>,
    pub name: String,
    pub script_path: String,
    pub frequency: Frequency,
    pub interval: String,
    pub hour: String,
    pub minute: String,
    pub day_of_week: String,
    pub day_of_month: String,
    pub cron_expression: String,
    pub timeout: String,
}

impl Default for JobForm {
    fn default() -> Self {
        Self {
            edit_id: None,
            name: String::new(),
            script_path: String::new(),
            frequency: Frequency::Daily,
            interval: common::job::DEFAULT_HOURLY_INTERVAL.to_string(),
            hour: "0".to_string(),
            minute: "0".to_string(),
            day_of_week: common::job::DEFAULT_DAY_OF_WEEK.to_string(),
            day_of_month: common::job::DEFAULT_DAY_OF_MONTH.to_string(),
            cron_expression: String::new(),
            timeout: common::DEFAULT_TIMEOUT_SECONDS.to_string(),
        }
    }
}

impl JobForm {
    pub fn title(&self) -> &'static str {
        if self.edit_id.is_some() { EDIT_TITLE } else { CREATE_TITLE }
    }

    pub fn reset(&mut self) {
        *self = JobForm::default();
    }

    /// Loads an existing job. Only the fields that apply to the job's
    /// frequency are taken; the rest keep their defaults.
    pub fn populate(&mut self, job: &JobConfig) {
        self.reset();
        let schedule = job.schedule.normalized();
        self.edit_id = Some(job.id.clone());
        self.name = job.name.clone();
        self.script_path = job.script_path.clone();
        self.frequency = schedule.frequency.clone();
        self.hour = schedule.hour_or_default().to_string();
        self.minute = schedule.minute_or_default().to_string();
        self.timeout = job.timeout_seconds.to_string();

        if let Some(interval) = schedule.interval {
            self.interval = interval.to_string();
        }
        if let Some(dow) = schedule.day_of_week {
            self.day_of_week = dow.to_string();
        }
        if let Some(dom) = schedule.day_of_month {
            self.day_of_month = dom.to_string();
        }
        if let Some(expr) = schedule.cron_expression {
            self.cron_expression = expr;
        }
    }

    pub fn set(&mut self, field: FormField, value: &str) {
        let value = value.to_string();
        match field {
            FormField::Name => self.name = value,
            FormField::ScriptPath => self.script_path = value,
            FormField::Frequency => self.frequency = Frequency::from(value.trim()),
            FormField::Interval => self.interval = value,
            FormField::Hour => self.hour = value,
            FormField::Minute => self.minute = value,
            FormField::DayOfWeek => self.day_of_week = value,
            FormField::DayOfMonth => self.day_of_month = value,
            FormField::CronExpression => self.cron_expression = value,
            FormField::Timeout => self.timeout = value,
        }
    }

    pub fn visible_fields(&self) -> ScheduleFields {
        let freq = &self.frequency;
        ScheduleFields {
            interval: *freq == Frequency::Hourly,
            time: !matches!(freq, Frequency::Hourly | Frequency::Custom),
            day_of_week: *freq == Frequency::Weekly,
            day_of_month: *freq == Frequency::Monthly,
            cron_expression: *freq == Frequency::Custom,
        }
    }

    /// Builds the schedule from the inputs relevant to the selected frequency
    /// only.
    pub fn schedule(&self) -> Result<Schedule, FormError> {
        let time = || -> Result<(u32, u32), FormError> {
            Ok((
                number("hour", &self.hour, 0, 23)? as u32,
                number("minute", &self.minute, 0, 59)? as u32,
            ))
        };

        match &self.frequency {
            Frequency::Hourly => Ok(Schedule::hourly(number("interval", &self.interval, 1, u32::MAX as u64)? as u32)),
            Frequency::Daily => {
                let (hour, minute) = time()?;
                Ok(Schedule::daily(hour, minute))
            }
            Frequency::Weekly => {
                let (hour, minute) = time()?;
                let dow = number("day of week", &self.day_of_week, 0, 6)? as u32;
                Ok(Schedule::weekly(dow, hour, minute))
            }
            Frequency::Monthly => {
                let (hour, minute) = time()?;
                let dom = number("day of month", &self.day_of_month, 1, 31)? as u32;
                Ok(Schedule::monthly(dom, hour, minute))
            }
            Frequency::Custom => {
                let expr = self.cron_expression.trim();
                if expr.is_empty() {
                    return Err(FormError::Missing("cron expression"));
                }
                validate_cron(expr)?;
                Ok(Schedule::custom(expr))
            }
            Frequency::Other(raw) => Err(FormError::UnsupportedFrequency(raw.clone())),
        }
    }

    pub fn to_payload(&self) -> Result<JobPayload, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::Missing("name"));
        }
        let script_path = self.script_path.trim();
        if script_path.is_empty() {
            return Err(FormError::Missing("script path"));
        }
        Ok(JobPayload {
            name: name.to_string(),
            script_path: script_path.to_string(),
            schedule: self.schedule()?,
            timeout_seconds: number("timeout", &self.timeout, 1, u64::MAX)?,
        })
    }
}

fn number(field: &'static str, raw: &str, min: u64, max: u64) -> Result<u64, FormError> {
    let value: u64 = raw.trim().parse().map_err(|_| FormError::NotANumber {
        field,
        value: raw.to_string(),
    })?;
    if value < min || value > max {
        return Err(FormError::OutOfRange { field, min, max });
    }
    Ok(value)
}

/// Checks a 5-field expression. The `cron` crate expects a leading seconds
/// field and numbers weekdays 1-7 from Sunday, so the weekday field is
/// shifted before parsing.
fn validate_cron(expr: &str) -> Result<(), FormError> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(FormError::InvalidCron(format!(
            "expected 5 fields, got {}",
            fields.len()
        )));
    }
    let expanded = format!(
        "0 {} {} {} {} {}",
        fields[0],
        fields[1],
        fields[2],
        fields[3],
        shift_weekdays(fields[4])
    );
    cron::Schedule::from_str(&expanded)
        .map(|_| ())
        .map_err(|e| FormError::InvalidCron(e.to_string()))
}

/// Rewrites 0-7 (0 and 7 both Sunday) to the crate's 1-7. Steps, names and
/// out of range numbers pass through unchanged.
fn shift_weekdays(field: &str) -> String {
    let shift = |part: &str| match part.parse::<u32>() {
        Ok(n @ 0..=6) => (n + 1).to_string(),
        _ => part.to_string(),
    };
    field
        .split(',')
        .map(|item| {
            let (base, step) = match item.split_once('/') {
                Some((base, step)) => (base, Some(step)),
                None => (item, None),
            };
            let mut out = base.split('-').map(shift).collect::<Vec<_>>().join("-");
            if let Some(step) = step {
                out.push('/');
                out.push_str(step);
            }
            out
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::job_config;

    #[test]
    fn test_default_form_is_daily_create() {
        let form = JobForm::default();
        assert_eq!(form.title(), CREATE_TITLE);
        assert_eq!(form.frequency, Frequency::Daily);
        let fields = form.visible_fields();
        assert!(fields.time && !fields.interval && !fields.day_of_week && !fields.day_of_month);
    }

    #[test]
    fn test_edit_round_trip_reproduces_schedule() {
        let schedules = [
            Schedule::hourly(15),
            Schedule::daily(23, 45),
            Schedule::weekly(3, 9, 30),
            Schedule::monthly(28, 1, 0),
            Schedule::custom("*/5 8-18 * * 1-5"),
        ];
        for schedule in schedules {
            let mut job = job_config("j1", "sync", "/srv/sync.py");
            job.schedule = schedule.clone();
            let mut form = JobForm::default();
            form.populate(&job);

            let payload = form.to_payload().unwrap();
            assert_eq!(payload.schedule, schedule);
            assert_eq!(
                serde_json::to_string(&payload).unwrap(),
                serde_json::to_string(&JobPayload::from(&job)).unwrap()
            );
        }
    }

    #[test]
    fn test_populate_ignores_foreign_fields() {
        // Backend echoes hour/minute defaults and nulls for every schedule.
        let mut job = job_config("j1", "poll", "/srv/poll.sh");
        job.schedule = serde_json::from_str(
            r#"{"frequency":"hourly","interval":10,"hour":0,"minute":0,
                "day_of_week":null,"day_of_month":null}"#,
        )
        .unwrap();
        let mut form = JobForm::default();
        form.populate(&job);

        assert_eq!(form.title(), EDIT_TITLE);
        assert_eq!(form.day_of_week, "0");
        assert_eq!(form.day_of_month, "1");
        assert!(form.visible_fields().interval);
        assert_eq!(
            serde_json::to_string(&form.schedule().unwrap()).unwrap(),
            r#"{"frequency":"hourly","interval":10}"#
        );
    }

    #[test]
    fn test_weekly_sends_only_relevant_fields() {
        let mut form = JobForm::default();
        form.set(FormField::Frequency, "weekly");
        form.set(FormField::Hour, "9");
        form.set(FormField::Minute, "30");
        form.set(FormField::DayOfWeek, "3");
        form.set(FormField::Interval, "5");
        assert_eq!(
            serde_json::to_string(&form.schedule().unwrap()).unwrap(),
            r#"{"frequency":"weekly","hour":9,"minute":30,"day_of_week":3}"#
        );
    }

    #[test]
    fn test_validation_errors() {
        let mut form = JobForm::default();
        assert_eq!(form.to_payload().unwrap_err(), FormError::Missing("name"));

        form.set(FormField::Name, "backup");
        form.set(FormField::ScriptPath, "/srv/backup.sh");
        form.set(FormField::Hour, "25");
        assert_eq!(
            form.to_payload().unwrap_err(),
            FormError::OutOfRange { field: "hour", min: 0, max: 23 }
        );

        form.set(FormField::Hour, "nine");
        assert!(matches!(form.to_payload(), Err(FormError::NotANumber { field: "hour", .. })));

        form.set(FormField::Frequency, "custom");
        form.set(FormField::CronExpression, "*/5 * *");
        assert!(matches!(form.to_payload(), Err(FormError::InvalidCron(_))));

        form.set(FormField::CronExpression, "99 * * * *");
        assert!(matches!(form.to_payload(), Err(FormError::InvalidCron(_))));
    }

    #[test]
    fn test_populate_drops_fields_of_other_frequencies() {
        let mut job = job_config("j1", "report", "/srv/report.sh");
        job.schedule = serde_json::from_str(
            r#"{"frequency":"daily","hour":6,"minute":15,
                "interval":10,"day_of_week":5,"day_of_month":20}"#,
        )
        .unwrap();
        let mut form = JobForm::default();
        form.populate(&job);

        assert_eq!(form.interval, "30");
        assert_eq!(form.day_of_week, "0");
        assert_eq!(form.day_of_month, "1");
        assert_eq!(
            serde_json::to_string(&form.schedule().unwrap()).unwrap(),
            r#"{"frequency":"daily","hour":6,"minute":15}"#
        );
    }

    #[test]
    fn test_hourly_interval_above_an_hour() {
        let mut job = job_config("j1", "digest", "/srv/digest.py");
        job.schedule = Schedule::hourly(90);
        let mut form = JobForm::default();
        form.populate(&job);
        assert_eq!(form.schedule().unwrap(), Schedule::hourly(90));

        form.set(FormField::Interval, "0");
        assert!(matches!(
            form.schedule(),
            Err(FormError::OutOfRange { field: "interval", min: 1, .. })
        ));
    }

    #[test]
    fn test_custom_weekday_field_is_checked() {
        let mut form = JobForm::default();
        form.set(FormField::Frequency, "custom");
        for bad in ["0 0 * * banana", "0 0 * * 9", "0 0 * * 1-8"] {
            form.set(FormField::CronExpression, bad);
            assert!(matches!(form.schedule(), Err(FormError::InvalidCron(_))), "{}", bad);
        }
        for good in ["0 0 * * 0", "0 0 * * 7", "0 0 * * */2", "0 0 * * mon-fri", "0 0 * * 0,6", "0 0 * * 1-5/2"] {
            form.set(FormField::CronExpression, good);
            assert!(form.schedule().is_ok(), "{}", good);
        }
    }

    #[test]
    fn test_shift_weekdays() {
        assert_eq!(shift_weekdays("0-6/2"), "1-7/2");
        assert_eq!(shift_weekdays("*"), "*");
        assert_eq!(shift_weekdays("7,Mon"), "7,Mon");
    }

    #[test]
    fn test_field_names() {
        assert_eq!(FormField::parse("script-path"), Some(FormField::ScriptPath));
        assert_eq!(FormField::parse("dow"), Some(FormField::DayOfWeek));
        assert_eq!(FormField::parse("color"), None);
    }
}
