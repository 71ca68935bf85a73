//! The dashboard engine: owns [`DashboardState`], the refresh timer and the
//! API handle, and applies one [`Event`] at a time.
//!
//! Remote calls run as spawned tasks that post their result back on the
//! engine channel. Nothing is cancelled; a late result is recognised when it
//! is handled, by its request ticket and by checking that the page it was
//! fetched for is still the visible one.

use common::{BrowseListing, JobConfig, JobId, JobSummary, KillResponse, Run, RunId,
             RunTriggered};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiError, JobsApi};
use crate::browser::BrowserEntry;
use crate::filter::FilterType;
use crate::form::FormField;
use crate::state::{DashboardState, DetailState, DetailSubTab, Load, LogContent, LogViewer,
                   SubTab, Tab};
use crate::timers::{TimerCoordinator, TimerKind};

/// Page to show, with whatever the page needs to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabTarget {
    Monitor,
    Create,
    JobDetail { job_id: JobId, job_name: String },
}

impl TabTarget {
    pub fn tab(&self) -> Tab {
        match self {
            TabTarget::Monitor => Tab::Monitor,
            TabTarget::Create => Tab::Create,
            TabTarget::JobDetail { .. } => Tab::JobDetail,
        }
    }

    fn timer(&self) -> Option<TimerKind> {
        match self {
            TabTarget::Monitor => Some(TimerKind::List),
            TabTarget::Create => None,
            TabTarget::JobDetail { .. } => Some(TimerKind::Detail),
        }
    }
}

/// Operator intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SwitchTab(TabTarget),
    SwitchSubTab(SubTab),
    SwitchDetailSubTab(DetailSubTab),
    Search(String),
    Filter(FilterType),
    RunNow(JobId),
    Kill(JobId),
    Delete { job_id: JobId, name: String },
    /// Answer to the pending confirmation.
    Confirm(bool),
    Edit(JobId),
    SetField(FormField, String),
    Submit,
    CancelEdit,
    ViewLog(RunId),
    CloseLog,
    OpenBrowser,
    BrowseDir(String),
    OpenEntry(BrowserEntry),
    CloseBrowser,
    /// Closes the log viewer and the file browser.
    Dismiss,
    DismissAlert,
}

#[derive(Debug)]
pub enum Event {
    Command(Command),
    TimerFired { kind: TimerKind, generation: u64 },
    JobsLoaded { ticket: u64, result: Result<Vec<JobSummary>, ApiError> },
    DetailLoaded { ticket: u64, job_id: JobId, result: Result<(JobConfig, Vec<Run>), ApiError> },
    AllRunsLoaded { ticket: u64, result: Result<Vec<Run>, ApiError> },
    LogLoaded { run_id: RunId, result: Result<String, ApiError> },
    BrowseLoaded { path: String, result: Result<BrowseListing, ApiError> },
    RunStarted { job_id: JobId, result: Result<RunTriggered, ApiError> },
    KillDone { job_id: JobId, result: Result<KillResponse, ApiError> },
    DeleteDone { job_id: JobId, result: Result<(), ApiError> },
    EditFetched { result: Result<JobConfig, ApiError> },
    SubmitDone { result: Result<JobConfig, ApiError> },
    /// Re-fetch after a run/kill once the backend has registered it.
    DeferredReload { job_id: JobId },
    Shutdown,
}

/// Monotonic request numbering for one kind of fetch. A result is applied
/// only if it is newer than the last one applied.
#[derive(Debug, Default)]
struct Ticket {
    issued: u64,
    applied: u64,
}

impl Ticket {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, ticket: u64) -> bool {
        if ticket <= self.applied {
            return false;
        }
        self.applied = ticket;
        true
    }
}

pub struct Dashboard<A: JobsApi> {
    pub(crate) api: Arc<A>,
    pub(crate) state: DashboardState,
    timers: TimerCoordinator,
    pub(crate) events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    jobs_ticket: Ticket,
    detail_ticket: Ticket,
    runs_ticket: Ticket,
}

impl<A: JobsApi> Dashboard<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            state: DashboardState::default(),
            timers: TimerCoordinator::new(events_tx.clone()),
            events_tx,
            events_rx,
            jobs_ticket: Ticket::default(),
            detail_ticket: Ticket::default(),
            runs_ticket: Ticket::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn armed_timer(&self) -> Option<TimerKind> {
        self.timers.armed_kind()
    }

    /// Handle for hosts to post commands (wrapped in [`Event::Command`]) or
    /// [`Event::Shutdown`].
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.events_tx.clone()
    }

    /// Shows the monitor page.
    pub fn start(&mut self) {
        self.switch_tab(TabTarget::Monitor);
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events_rx.try_recv().ok()
    }

    /// Waits for and applies the next event. Returns `false` on shutdown.
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(Event::Shutdown) | None => false,
            Some(event) => {
                self.handle(event);
                true
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) {
        self.handle(Event::Command(command));
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Command(command) => self.on_command(command),
            Event::TimerFired { kind, generation } => self.on_timer(kind, generation),
            Event::JobsLoaded { ticket, result } => self.on_jobs_loaded(ticket, result),
            Event::DetailLoaded { ticket, job_id, result } => {
                self.on_detail_loaded(ticket, job_id, result)
            }
            Event::AllRunsLoaded { ticket, result } => self.on_all_runs_loaded(ticket, result),
            Event::LogLoaded { run_id, result } => self.on_log_loaded(run_id, result),
            Event::BrowseLoaded { path, result } => self.on_browse_loaded(path, result),
            Event::RunStarted { job_id, result } => self.on_run_started(job_id, result),
            Event::KillDone { job_id, result } => self.on_kill_done(job_id, result),
            Event::DeleteDone { job_id, result } => self.on_delete_done(job_id, result),
            Event::EditFetched { result } => self.on_edit_fetched(result),
            Event::SubmitDone { result } => self.on_submit_done(result),
            Event::DeferredReload { job_id } => self.on_deferred_reload(job_id),
            Event::Shutdown => {}
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SwitchTab(target) => self.switch_tab(target),
            Command::SwitchSubTab(sub_tab) => self.switch_sub_tab(sub_tab),
            Command::SwitchDetailSubTab(sub_tab) => self.state.current_detail_sub_tab = sub_tab,
            Command::Search(query) => self.state.search_query = query,
            Command::Filter(filter) => self.state.current_filter = filter,
            Command::RunNow(job_id) => self.run_now(job_id),
            Command::Kill(job_id) => self.kill_job(job_id),
            Command::Delete { job_id, name } => self.delete_job(job_id, name),
            Command::Confirm(answer) => self.answer_confirm(answer),
            Command::Edit(job_id) => self.edit_job(job_id),
            Command::SetField(field, value) => self.state.form.set(field, &value),
            Command::Submit => self.submit_job(),
            Command::CancelEdit => self.switch_tab(TabTarget::Monitor),
            Command::ViewLog(run_id) => self.view_log(run_id),
            Command::CloseLog => self.state.log = None,
            Command::OpenBrowser => {
                self.state.browser.open();
                self.load_browser_dir(String::new());
            }
            Command::BrowseDir(path) => self.load_browser_dir(path),
            Command::OpenEntry(entry) => self.open_entry(entry),
            Command::CloseBrowser => self.state.browser.close(),
            Command::Dismiss => {
                self.state.log = None;
                self.state.browser.close();
            }
            Command::DismissAlert => self.state.alert = None,
        }
    }

    /// The only way the visible page changes.
    pub(crate) fn switch_tab(&mut self, target: TabTarget) {
        // Pages and their tab indicators follow `current_tab`.
        self.state.current_tab = target.tab();

        let owned = target.timer();
        for kind in [TimerKind::List, TimerKind::Detail] {
            if owned != Some(kind) {
                self.timers.disarm(kind);
            }
        }
        if let Some(kind) = owned {
            self.timers.arm(kind);
        }

        match target {
            TabTarget::Monitor => self.load_jobs(),
            TabTarget::Create => self.state.form.reset(),
            TabTarget::JobDetail { job_id, job_name } => {
                self.state.current_detail_sub_tab = DetailSubTab::Runs;
                match self.state.detail.as_mut() {
                    Some(detail) if detail.job_id == job_id => detail.job_name = job_name,
                    _ => {
                        self.state.detail = Some(DetailState {
                            job_id,
                            job_name,
                            job: None,
                            runs: None,
                        })
                    }
                }
                self.load_detail();
            }
        }
    }

    fn switch_sub_tab(&mut self, sub_tab: SubTab) {
        self.state.current_sub_tab = sub_tab;
        if sub_tab == SubTab::Runs {
            self.load_all_runs();
        }
    }

    fn on_timer(&mut self, kind: TimerKind, generation: u64) {
        if !self.timers.is_current(kind, generation) {
            return;
        }
        match kind {
            TimerKind::List if self.state.current_tab == Tab::Monitor => self.load_jobs(),
            TimerKind::Detail if self.state.current_tab == Tab::JobDetail => self.load_detail(),
            _ => {}
        }
    }

    /// Runs `request` on its own task and posts the event it produces.
    pub(crate) fn spawn<F, Fut>(&self, request: F)
    where
        F: FnOnce(Arc<A>) -> Fut,
        Fut: Future<Output = Event> + Send + 'static,
    {
        let events = self.events_tx.clone();
        let fut = request(self.api.clone());
        tokio::spawn(async move {
            let _ = events.send(fut.await);
        });
    }

    pub(crate) fn load_jobs(&mut self) {
        let ticket = self.jobs_ticket.issue();
        self.spawn(move |api| async move {
            Event::JobsLoaded { ticket, result: api.list_jobs().await }
        });
    }

    fn on_jobs_loaded(&mut self, ticket: u64, result: Result<Vec<JobSummary>, ApiError>) {
        match result {
            Ok(jobs) => {
                if self.jobs_ticket.accept(ticket) {
                    log::debug!("Loaded {} jobs", jobs.len());
                    self.state.cache.replace(jobs);
                }
            }
            Err(e) => log::warn!("Failed to load jobs: {}", e),
        }
    }

    pub(crate) fn load_detail(&mut self) {
        let Some(job_id) = self.state.detail_job_id().cloned() else {
            return;
        };
        let ticket = self.detail_ticket.issue();
        self.spawn(move |api| async move {
            let (job, runs) = tokio::join!(
                api.get_job(&job_id),
                api.job_runs(&job_id, common::DETAIL_RUN_LIMIT)
            );
            let result = job.and_then(|job| runs.map(|runs| (job, runs)));
            Event::DetailLoaded { ticket, job_id, result }
        });
    }

    fn on_detail_loaded(
        &mut self,
        ticket: u64,
        job_id: JobId,
        result: Result<(JobConfig, Vec<Run>), ApiError>,
    ) {
        if !self.state.is_showing_detail(&job_id) {
            log::debug!("Discarding detail result for {}: page no longer shown", job_id);
            return;
        }
        match result {
            Ok((job, runs)) => {
                if !self.detail_ticket.accept(ticket) {
                    return;
                }
                if let Some(detail) = self.state.detail.as_mut() {
                    detail.job = Some(job);
                    detail.runs = Some(runs);
                }
            }
            Err(e) => log::warn!("Failed to load job detail for {}: {}", job_id, e),
        }
    }

    fn load_all_runs(&mut self) {
        self.state.all_runs = Load::Loading;
        let ticket = self.runs_ticket.issue();
        self.spawn(move |api| async move {
            Event::AllRunsLoaded { ticket, result: api.all_runs(common::ALL_RUNS_LIMIT).await }
        });
    }

    fn on_all_runs_loaded(&mut self, ticket: u64, result: Result<Vec<Run>, ApiError>) {
        if !self.runs_ticket.accept(ticket) {
            return;
        }
        self.state.all_runs = match result {
            Ok(runs) => Load::Ready(runs),
            Err(e) => {
                log::warn!("Failed to load all runs: {}", e);
                Load::Failed(e.to_string())
            }
        };
    }

    fn view_log(&mut self, run_id: RunId) {
        self.state.log = Some(LogViewer { run_id: run_id.clone(), content: LogContent::Loading });
        self.spawn(move |api| async move {
            let result = api.run_log(&run_id).await;
            Event::LogLoaded { run_id, result }
        });
    }

    fn on_log_loaded(&mut self, run_id: RunId, result: Result<String, ApiError>) {
        let Some(viewer) = self.state.log.as_mut().filter(|v| v.run_id == run_id) else {
            return;
        };
        viewer.content = match result {
            Ok(text) if text.is_empty() => LogContent::Text("(empty log)".to_string()),
            Ok(text) => LogContent::Text(text),
            Err(e) => LogContent::Error(format!("Error loading log: {}", e)),
        };
    }

    fn load_browser_dir(&mut self, path: String) {
        self.state.browser.navigate(&path);
        self.spawn(move |api| async move {
            let result = api.browse(&path).await;
            Event::BrowseLoaded { path, result }
        });
    }

    fn open_entry(&mut self, entry: BrowserEntry) {
        match entry {
            BrowserEntry::Parent { path } | BrowserEntry::Dir { path, .. } => {
                self.load_browser_dir(path)
            }
            BrowserEntry::File { path, .. } => {
                self.state.form.set(FormField::ScriptPath, &path);
                self.state.browser.close();
            }
        }
    }

    fn on_browse_loaded(&mut self, path: String, result: Result<BrowseListing, ApiError>) {
        if let Err(e) = &result {
            log::warn!("Browse error for '{}': {}", path, e);
        }
        self.state.browser.apply(&path, result.map_err(|e| e.to_string()));
    }
}
