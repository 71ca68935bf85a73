pub mod api;
pub mod format;
pub mod job;
pub mod schedule;

pub use api::{BrowseItem, BrowseListing, EntryKind, ErrorBody, KillResponse, RunTriggered};
pub use job::{Frequency, JobConfig, JobId, JobPayload, JobSummary, RecentRun, Run, RunId,
              RunStatus, Schedule};
pub use schedule::{describe, parse_time, parse_weekday, ScheduleSummary, DAY_NAMES};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/cronboard/config.yaml";
pub const DEFAULT_WATCH_LOG_FILE: &str = "cronboard.log";

// Refresh cadence of the dashboard pages
pub const LIST_REFRESH_MS: u64 = 10_000;
pub const DETAIL_REFRESH_MS: u64 = 5_000;
// Delay before re-fetching after run/kill so the backend can register the change
pub const ACTION_RELOAD_DELAY_MS: u64 = 500;

pub const DETAIL_RUN_LIMIT: u32 = 50;
pub const ALL_RUNS_LIMIT: u32 = 100;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;
