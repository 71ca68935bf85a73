use async_trait::async_trait;
use common::{BrowseListing, JobConfig, JobId, JobPayload, JobSummary, KillResponse, Run, RunId,
             RunStatus, RunTriggered, Schedule};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::api::{ApiError, JobsApi};
use crate::dashboard::Dashboard;

pub fn job_config(id: &str, name: &str, script_path: &str) -> JobConfig {
    JobConfig {
        id: JobId::from(id),
        name: name.to_string(),
        script_path: script_path.to_string(),
        schedule: Schedule::daily(2, 0),
        enabled: true,
        timeout_seconds: 3600,
    }
}

pub fn summary(id: &str, name: &str, script_path: &str) -> JobSummary {
    JobSummary {
        config: job_config(id, name, script_path),
        last_status: None,
        last_run: None,
        next_run: None,
        recent_runs: Vec::new(),
    }
}

pub fn run(id: &str, job_id: &str, status: RunStatus) -> Run {
    Run {
        id: RunId::from(id),
        job_id: JobId::from(job_id),
        status,
        trigger: "manual".to_string(),
        started_at: "2025-01-01T00:00:00Z".to_string(),
        finished_at: None,
        duration_ms: (!status.is_running()).then_some(1500),
        exit_code: match status {
            RunStatus::Running => None,
            RunStatus::Success => Some(0),
            _ => Some(1),
        },
        error_msg: None,
    }
}

pub fn not_found(what: &str) -> ApiError {
    ApiError::Status { status: 404, detail: format!("{} not found", what) }
}

/// Backend double. Every call is recorded as `METHOD path`.
#[derive(Default)]
pub struct MockApi {
    pub jobs: Mutex<Vec<JobSummary>>,
    pub runs: Mutex<HashMap<JobId, Vec<Run>>>,
    pub all_runs: Mutex<Vec<Run>>,
    pub killed: Mutex<u32>,
    pub logs: Mutex<HashMap<RunId, Result<String, ApiError>>>,
    pub listings: Mutex<HashMap<String, BrowseListing>>,
    /// When set, every write call fails with this error.
    pub write_error: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn with_jobs(jobs: Vec<JobSummary>) -> Self {
        let api = MockApi::default();
        *api.jobs.lock().unwrap() = jobs;
        api
    }

    pub fn set_runs(&self, job_id: &str, runs: Vec<Run>) {
        self.runs.lock().unwrap().insert(JobId::from(job_id), runs);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self) -> Result<(), ApiError> {
        match self.write_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl JobsApi for MockApi {
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        self.record("GET /api/jobs".to_string());
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn get_job(&self, id: &JobId) -> Result<JobConfig, ApiError> {
        self.record(format!("GET /api/jobs/{}", id));
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id() == id)
            .map(|j| j.config.clone())
            .ok_or_else(|| not_found(&format!("Job {}", id)))
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<JobConfig, ApiError> {
        self.record("POST /api/jobs".to_string());
        self.check_write()?;
        let mut config = job_config("new1", &payload.name, &payload.script_path);
        config.schedule = payload.schedule.clone();
        config.timeout_seconds = payload.timeout_seconds;
        self.jobs.lock().unwrap().push(JobSummary { config: config.clone(), ..summary("new1", "", "") });
        Ok(config)
    }

    async fn update_job(&self, id: &JobId, payload: &JobPayload) -> Result<JobConfig, ApiError> {
        self.record(format!("PUT /api/jobs/{}", id));
        self.check_write()?;
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id() == id)
            .ok_or_else(|| not_found(&format!("Job {}", id)))?;
        job.config.name = payload.name.clone();
        job.config.script_path = payload.script_path.clone();
        job.config.schedule = payload.schedule.clone();
        job.config.timeout_seconds = payload.timeout_seconds;
        Ok(job.config.clone())
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError> {
        self.record(format!("DELETE /api/jobs/{}", id));
        self.check_write()?;
        self.jobs.lock().unwrap().retain(|j| j.id() != id);
        Ok(())
    }

    async fn run_job(&self, id: &JobId) -> Result<RunTriggered, ApiError> {
        self.record(format!("POST /api/jobs/{}/run", id));
        self.check_write()?;
        Ok(RunTriggered { run_id: RunId::from("run-new") })
    }

    async fn kill_job(&self, id: &JobId) -> Result<KillResponse, ApiError> {
        self.record(format!("POST /api/jobs/{}/kill", id));
        self.check_write()?;
        Ok(KillResponse { ok: true, killed: *self.killed.lock().unwrap() })
    }

    async fn job_runs(&self, id: &JobId, limit: u32) -> Result<Vec<Run>, ApiError> {
        self.record(format!("GET /api/jobs/{}/runs", id));
        let runs = self.runs.lock().unwrap().get(id).cloned().unwrap_or_default();
        Ok(runs.into_iter().take(limit as usize).collect())
    }

    async fn all_runs(&self, limit: u32) -> Result<Vec<Run>, ApiError> {
        self.record("GET /api/runs".to_string());
        Ok(self.all_runs.lock().unwrap().iter().take(limit as usize).cloned().collect())
    }

    async fn run_log(&self, id: &RunId) -> Result<String, ApiError> {
        self.record(format!("GET /api/runs/{}/log", id));
        self.logs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(not_found("Log")))
    }

    async fn browse(&self, path: &str) -> Result<BrowseListing, ApiError> {
        self.record(format!("GET /api/browse?path={}", path));
        self.listings
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("Path"))
    }
}

/// Lets spawned fetches finish and feeds their results to the engine.
/// Paused-clock timers and deferred reloads are not advanced.
pub async fn settle<A: JobsApi>(dashboard: &mut Dashboard<A>) {
    for _ in 0..32 {
        tokio::task::yield_now().await;
        while let Some(event) = dashboard.try_next_event() {
            dashboard.handle(event);
        }
    }
}
