use common::format::{format_duration, format_timestamp, short_date};
use common::{describe, JobConfig, JobId, JobSummary, RecentRun, Run, RunId, RunStatus};

use crate::state::{DashboardState, JobCache, Load};

pub const NO_VALUE: &str = "—";
pub const NO_JOBS: &str = "No jobs yet";
pub const NO_MATCHING_JOBS: &str = "No jobs match the current filter";
pub const NO_RUNS: &str = "No runs yet";
pub const RUNS_FAILED: &str = "Failed to load runs";
pub const NO_CHART_DATA: &str = "No run data to display";
pub const NO_FILES: &str = "No files here";

pub const CHART_MAX_RUNS: usize = 30;
pub const CHART_HEIGHT: f64 = 120.0;
const CHART_MIN_BAR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Loading,
    Empty(&'static str),
    Failed(&'static str),
    Rows(Vec<T>),
}

impl<T> ListView<T> {
    fn from_rows(rows: Vec<T>, empty: &'static str) -> Self {
        if rows.is_empty() {
            ListView::Empty(empty)
        } else {
            ListView::Rows(rows)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMarker {
    pub run_id: RunId,
    pub status: RunStatus,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub id: JobId,
    pub name: String,
    pub script_kind: &'static str,
    pub next_run: String,
    pub trigger_type: &'static str,
    /// Oldest on the left.
    pub recent: Vec<RunMarker>,
    pub can_stop: bool,
}

pub fn script_kind(script_path: &str) -> &'static str {
    if script_path.ends_with(".py") { "Python" } else { "Shell" }
}

fn marker(run: &RecentRun) -> RunMarker {
    RunMarker {
        run_id: run.id.clone(),
        status: run.status,
        title: format!("{} {} {}", run.status, NO_VALUE, format_timestamp(&run.started_at)),
    }
}

pub fn job_row(job: &JobSummary) -> JobRow {
    let config = &job.config;
    JobRow {
        id: config.id.clone(),
        name: config.name.clone(),
        script_kind: script_kind(&config.script_path),
        next_run: job.next_run.clone().unwrap_or_else(|| NO_VALUE.to_string()),
        trigger_type: if config.enabled { "Scheduled" } else { "None" },
        recent: job.recent_runs.iter().rev().map(marker).collect(),
        can_stop: job.has_running(),
    }
}

pub fn job_list(state: &DashboardState) -> ListView<JobRow> {
    let cache = state.cache();
    if !cache.is_loaded() {
        return ListView::Loading;
    }
    let empty = if cache.jobs().is_empty() { NO_JOBS } else { NO_MATCHING_JOBS };
    ListView::from_rows(state.visible_jobs().into_iter().map(job_row).collect(), empty)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRow {
    pub id: RunId,
    pub job_id: JobId,
    pub job_name: String,
    pub status: RunStatus,
    pub trigger: String,
    pub started: String,
    pub duration: String,
    pub exit_code: String,
    pub can_stop: bool,
}

pub fn run_row(run: &Run, cache: &JobCache) -> RunRow {
    RunRow {
        id: run.id.clone(),
        job_id: run.job_id.clone(),
        job_name: cache.job_name(&run.job_id),
        status: run.status,
        trigger: run.trigger.clone(),
        started: if run.started_at.is_empty() {
            NO_VALUE.to_string()
        } else {
            format_timestamp(&run.started_at)
        },
        duration: run.duration_ms.map(format_duration).unwrap_or_else(|| NO_VALUE.to_string()),
        exit_code: run.exit_code.map(|c| c.to_string()).unwrap_or_else(|| NO_VALUE.to_string()),
        can_stop: run.status.is_running(),
    }
}

fn run_rows(load: &Load<Vec<Run>>, cache: &JobCache) -> ListView<RunRow> {
    match load {
        Load::Idle | Load::Loading => ListView::Loading,
        Load::Failed(_) => ListView::Failed(RUNS_FAILED),
        Load::Ready(runs) => {
            ListView::from_rows(runs.iter().map(|r| run_row(r, cache)).collect(), NO_RUNS)
        }
    }
}

/// Global run list of the monitor page.
pub fn all_runs(state: &DashboardState) -> ListView<RunRow> {
    run_rows(state.all_runs(), state.cache())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub script_path: String,
    pub schedule: String,
    pub cron: String,
    pub timeout: String,
    pub enabled: bool,
}

pub fn task_info(job: &JobConfig) -> TaskInfo {
    let summary = describe(&job.schedule);
    TaskInfo {
        script_path: job.script_path.clone(),
        schedule: summary.description,
        cron: summary.cron,
        timeout: format_duration(job.timeout_seconds.saturating_mul(1000)),
        enabled: job.enabled,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub run_id: RunId,
    pub status: RunStatus,
    pub height: f64,
    pub label: Option<String>,
    pub title: String,
}

/// Duration bars for the newest runs, oldest first, scaled to the longest.
pub fn run_chart(runs: &[Run]) -> Vec<ChartBar> {
    let data: Vec<&Run> = runs.iter().take(CHART_MAX_RUNS).rev().collect();
    let max = data.iter().map(|r| r.duration_ms.unwrap_or(0)).max().unwrap_or(0).max(1);
    let label_every = (data.len() / 8).max(1);

    data.iter()
        .enumerate()
        .map(|(i, run)| {
            let duration = run.duration_ms.unwrap_or(0);
            ChartBar {
                run_id: run.id.clone(),
                status: run.status,
                height: (duration as f64 / max as f64 * CHART_HEIGHT).max(CHART_MIN_BAR),
                label: (i % label_every == 0).then(|| short_date(&run.started_at)),
                title: format!(
                    "{} {} {} {} {}",
                    run.status,
                    NO_VALUE,
                    format_duration(duration),
                    NO_VALUE,
                    format_timestamp(&run.started_at)
                ),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub job_id: JobId,
    pub title: String,
    /// Latest run status, or `no runs`.
    pub badge: String,
    pub can_stop: bool,
    pub runs: ListView<RunRow>,
    pub task: Option<TaskInfo>,
    pub chart: Vec<ChartBar>,
}

pub fn detail(state: &DashboardState) -> Option<DetailView> {
    let detail = state.detail()?;
    let runs = detail.runs.as_deref();
    Some(DetailView {
        job_id: detail.job_id.clone(),
        title: detail.job_name.clone(),
        badge: match runs.and_then(|r| r.first()) {
            Some(latest) => latest.status.to_string(),
            None => "no runs".to_string(),
        },
        can_stop: runs.map_or(false, |r| r.iter().any(|run| run.status.is_running())),
        runs: match runs {
            None => ListView::Loading,
            Some(runs) => ListView::from_rows(
                runs.iter().map(|r| run_row(r, state.cache())).collect(),
                NO_RUNS,
            ),
        },
        task: detail.job.as_ref().map(task_info),
        chart: runs.map(run_chart).unwrap_or_default(),
    })
}
