use common::{JobConfig, JobId, KillResponse, RunTriggered};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::{ApiError, JobsApi};
use crate::dashboard::{Dashboard, Event, TabTarget};
use crate::state::Confirm;

impl<A: JobsApi> Dashboard<A> {
    pub(crate) fn alert(&mut self, message: String) {
        log::error!("{}", message);
        self.state.alert = Some(message);
    }

    /// Posts [`Event::DeferredReload`] once the backend has had time to
    /// register the change.
    fn schedule_reload(&self, job_id: JobId) {
        let events = self.events_tx.clone();
        let due = Instant::now() + Duration::from_millis(common::ACTION_RELOAD_DELAY_MS);
        tokio::spawn(async move {
            tokio::time::sleep_until(due).await;
            let _ = events.send(Event::DeferredReload { job_id });
        });
    }

    pub(crate) fn on_deferred_reload(&mut self, job_id: JobId) {
        self.load_jobs();
        if self.state.is_showing_detail(&job_id) {
            self.load_detail();
        }
    }

    pub(crate) fn run_now(&mut self, job_id: JobId) {
        log::info!("Triggering run of job {}", job_id);
        self.spawn(move |api| async move {
            let result = api.run_job(&job_id).await;
            Event::RunStarted { job_id, result }
        });
    }

    pub(crate) fn on_run_started(&mut self, job_id: JobId, result: Result<RunTriggered, ApiError>) {
        match result {
            Ok(triggered) => {
                log::info!("Job {} started run {}", job_id, triggered.run_id);
                self.schedule_reload(job_id);
            }
            Err(e) => self.alert(format!("Failed to trigger run: {}", e)),
        }
    }

    pub(crate) fn kill_job(&mut self, job_id: JobId) {
        log::info!("Stopping job {}", job_id);
        self.spawn(move |api| async move {
            let result = api.kill_job(&job_id).await;
            Event::KillDone { job_id, result }
        });
    }

    pub(crate) fn on_kill_done(&mut self, job_id: JobId, result: Result<KillResponse, ApiError>) {
        match result {
            Ok(response) if response.killed > 0 => {
                log::info!("Killed {} run(s) of job {}", response.killed, job_id);
                self.schedule_reload(job_id);
            }
            Ok(_) => log::info!("Job {} had no running runs", job_id),
            Err(e) => self.alert(format!("Failed to stop job: {}", e)),
        }
    }

    /// Asks for confirmation; nothing is sent until [`Self::answer_confirm`].
    pub(crate) fn delete_job(&mut self, job_id: JobId, name: String) {
        self.state.confirm = Some(Confirm::DeleteJob { job_id, name });
    }

    pub(crate) fn answer_confirm(&mut self, confirmed: bool) {
        let Some(pending) = self.state.confirm.take() else {
            return;
        };
        if !confirmed {
            return;
        }
        match pending {
            Confirm::DeleteJob { job_id, name } => {
                log::info!("Deleting job {} ({})", job_id, name);
                self.spawn(move |api| async move {
                    let result = api.delete_job(&job_id).await;
                    Event::DeleteDone { job_id, result }
                });
            }
        }
    }

    pub(crate) fn on_delete_done(&mut self, job_id: JobId, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                log::info!("Deleted job {}", job_id);
                if self.state.is_showing_detail(&job_id) {
                    self.switch_tab(TabTarget::Monitor);
                } else {
                    self.load_jobs();
                }
            }
            Err(e) => self.alert(format!("Failed to delete: {}", e)),
        }
    }

    pub(crate) fn edit_job(&mut self, job_id: JobId) {
        self.spawn(move |api| async move {
            Event::EditFetched { result: api.get_job(&job_id).await }
        });
    }

    pub(crate) fn on_edit_fetched(&mut self, result: Result<JobConfig, ApiError>) {
        match result {
            Ok(job) => {
                self.switch_tab(TabTarget::Create);
                self.state.form.populate(&job);
            }
            Err(e) => self.alert(format!("Failed to load job: {}", e)),
        }
    }

    pub(crate) fn submit_job(&mut self) {
        let payload = match self.state.form.to_payload() {
            Ok(payload) => payload,
            Err(e) => return self.alert(format!("Error: {}", e)),
        };
        let edit_id = self.state.form.edit_id.clone();
        self.spawn(move |api| async move {
            let result = match &edit_id {
                Some(id) => api.update_job(id, &payload).await,
                None => api.create_job(&payload).await,
            };
            Event::SubmitDone { result }
        });
    }

    pub(crate) fn on_submit_done(&mut self, result: Result<JobConfig, ApiError>) {
        match result {
            Ok(job) => {
                log::info!("Saved job {} ({})", job.id, job.name);
                self.switch_tab(TabTarget::Monitor);
            }
            Err(e) => self.alert(format!("Error: {}", e)),
        }
    }
}
