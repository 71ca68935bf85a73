use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        RunId(s.to_string())
    }
}

/// Recurrence kind of a schedule. Frequencies the console does not know are
/// kept verbatim so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Custom,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Custom => "custom",
            Frequency::Other(raw) => raw,
        }
    }
}

impl From<String> for Frequency {
    fn from(s: String) -> Self {
        match s.as_str() {
            "hourly" => Frequency::Hourly,
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "monthly" => Frequency::Monthly,
            "custom" => Frequency::Custom,
            _ => Frequency::Other(s),
        }
    }
}

impl From<&str> for Frequency {
    fn from(s: &str) -> Self {
        Frequency::from(s.to_string())
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.as_str().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence descriptor. Only the fields matching `frequency` carry meaning;
/// the rest are ignored when interpreting and dropped by [`Schedule::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    /// Minutes between runs (hourly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    /// 0 = Sunday .. 6 = Saturday (weekly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    /// 1-based (monthly).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Raw 5-field expression (custom).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,
}

pub const DEFAULT_HOURLY_INTERVAL: u32 = 30;
pub const DEFAULT_DAY_OF_WEEK: u32 = 0;
pub const DEFAULT_DAY_OF_MONTH: u32 = 1;

impl Schedule {
    fn empty(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: None,
            hour: None,
            minute: None,
            day_of_week: None,
            day_of_month: None,
            cron_expression: None,
        }
    }

    pub fn hourly(interval: u32) -> Self {
        Self { interval: Some(interval), ..Self::empty(Frequency::Hourly) }
    }

    pub fn daily(hour: u32, minute: u32) -> Self {
        Self { hour: Some(hour), minute: Some(minute), ..Self::empty(Frequency::Daily) }
    }

    pub fn weekly(day_of_week: u32, hour: u32, minute: u32) -> Self {
        Self {
            day_of_week: Some(day_of_week),
            ..Self::daily(hour, minute).with_frequency(Frequency::Weekly)
        }
    }

    pub fn monthly(day_of_month: u32, hour: u32, minute: u32) -> Self {
        Self {
            day_of_month: Some(day_of_month),
            ..Self::daily(hour, minute).with_frequency(Frequency::Monthly)
        }
    }

    pub fn custom(expression: impl Into<String>) -> Self {
        Self { cron_expression: Some(expression.into()), ..Self::empty(Frequency::Custom) }
    }

    fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn hour_or_default(&self) -> u32 {
        self.hour.unwrap_or(0)
    }

    pub fn minute_or_default(&self) -> u32 {
        self.minute.unwrap_or(0)
    }

    /// Keeps only the fields relevant to the frequency, filling the same
    /// defaults the interpreter applies.
    pub fn normalized(&self) -> Schedule {
        let hour = self.hour_or_default();
        let minute = self.minute_or_default();
        match &self.frequency {
            Frequency::Hourly => Schedule::hourly(self.interval.unwrap_or(DEFAULT_HOURLY_INTERVAL)),
            Frequency::Daily => Schedule::daily(hour, minute),
            Frequency::Weekly => {
                Schedule::weekly(self.day_of_week.unwrap_or(DEFAULT_DAY_OF_WEEK), hour, minute)
            }
            Frequency::Monthly => {
                Schedule::monthly(self.day_of_month.unwrap_or(DEFAULT_DAY_OF_MONTH), hour, minute)
            }
            Frequency::Custom => Schedule {
                cron_expression: self.cron_expression.as_ref().map(|e| e.trim().to_string()),
                ..Self::empty(Frequency::Custom)
            },
            Frequency::Other(_) => Schedule::daily(hour, minute).with_frequency(self.frequency.clone()),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    crate::DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: JobId,
    pub name: String,
    pub script_path: String,
    pub schedule: Schedule,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Body of `POST /api/jobs` and `PUT /api/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub name: String,
    pub script_path: String,
    pub schedule: Schedule,
    pub timeout_seconds: u64,
}

impl From<&JobConfig> for JobPayload {
    fn from(job: &JobConfig) -> Self {
        Self {
            name: job.name.clone(),
            script_path: job.script_path.clone(),
            schedule: job.schedule.normalized(),
            timeout_seconds: job.timeout_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
    Timeout,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Unknown => "unknown",
        }
    }

    /// Human label used by status columns.
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Running => "Running",
            RunStatus::Success => "Succeeded",
            RunStatus::Failed => "Failed",
            RunStatus::Timeout => "Timeout",
            RunStatus::Cancelled => "Cancelled",
            RunStatus::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RunStatus::Running)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub job_id: JobId,
    pub status: RunStatus,
    #[serde(default)]
    pub trigger: String,
    pub started_at: String,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRun {
    pub id: RunId,
    pub status: RunStatus,
    pub started_at: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// One row of `GET /api/jobs`: the config plus backend-computed run info.
/// `recent_runs` arrives newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub config: JobConfig,
    #[serde(default)]
    pub last_status: Option<RunStatus>,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub next_run: Option<String>,
    #[serde(default)]
    pub recent_runs: Vec<RecentRun>,
}

impl JobSummary {
    pub fn id(&self) -> &JobId {
        &self.config.id
    }

    pub fn has_running(&self) -> bool {
        self.recent_runs.iter().any(|r| r.status.is_running())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_from_backend_json() {
        let json = r#"{"frequency":"weekly","minute":30,"hour":9,"day_of_week":3,
                       "day_of_month":null,"interval":null,"cron_expression":null}"#;
        let schedule: Schedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule, Schedule::weekly(3, 9, 30));
    }

    #[test]
    fn test_unknown_frequency_is_preserved() {
        let schedule: Schedule = serde_json::from_str(r#"{"frequency":"yearly"}"#).unwrap();
        assert_eq!(schedule.frequency, Frequency::Other("yearly".to_string()));
        let back = serde_json::to_string(&schedule).unwrap();
        assert_eq!(back, r#"{"frequency":"yearly"}"#);
    }

    #[test]
    fn test_hourly_payload_only_carries_interval() {
        let json = serde_json::to_string(&Schedule::hourly(15)).unwrap();
        assert_eq!(json, r#"{"frequency":"hourly","interval":15}"#);
    }

    #[test]
    fn test_normalized_drops_foreign_fields() {
        let mut schedule = Schedule::monthly(12, 6, 5);
        schedule.interval = Some(10);
        schedule.day_of_week = Some(2);
        assert_eq!(schedule.normalized(), Schedule::monthly(12, 6, 5));

        let mut hourly = Schedule::daily(0, 0).with_frequency(Frequency::Hourly);
        hourly.interval = None;
        assert_eq!(hourly.normalized(), Schedule::hourly(DEFAULT_HOURLY_INTERVAL));
    }

    #[test]
    fn test_run_status_falls_back_to_unknown() {
        let run: Run = serde_json::from_str(
            r#"{"id":"r1","job_id":"j1","status":"queued","trigger":"manual",
                "started_at":"2025-01-02T03:04:05+00:00","duration_ms":null,"exit_code":null}"#,
        )
        .unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert_eq!(run.duration_ms, None);
    }

    #[test]
    fn test_job_config_defaults() {
        let job: JobConfig = serde_json::from_str(
            r#"{"id":"j1","name":"backup","script_path":"/srv/backup.sh",
                "schedule":{"frequency":"daily","hour":2,"minute":0}}"#,
        )
        .unwrap();
        assert!(job.enabled);
        assert_eq!(job.timeout_seconds, crate::DEFAULT_TIMEOUT_SECONDS);
    }
}
