use common::{JobConfig, JobId, JobSummary, Run, RunId};
use std::collections::HashMap;

use crate::browser::FileBrowser;
use crate::filter::{apply_filters, FilterType};
use crate::form::JobForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Monitor,
    Create,
    JobDetail,
}

impl Tab {
    /// Tab whose indicator is lit; the detail page belongs to the monitor.
    pub fn indicator(&self) -> Tab {
        match self {
            Tab::JobDetail => Tab::Monitor,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubTab {
    #[default]
    Jobs,
    Runs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailSubTab {
    #[default]
    Runs,
    Tasks,
}

/// Lifecycle of a panel fed by a single fetch. Loading, failure and an empty
/// `Ready` are distinct states.
#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Load<T> {
    fn default() -> Self {
        Load::Idle
    }
}

/// Last full job list plus the id lookup used to name runs fetched on their
/// own. Both are replaced wholesale on every fetch.
#[derive(Debug, Default)]
pub struct JobCache {
    jobs: Vec<JobSummary>,
    configs: HashMap<JobId, JobConfig>,
    loaded: bool,
}

impl JobCache {
    pub fn replace(&mut self, jobs: Vec<JobSummary>) {
        self.configs = jobs.iter().map(|j| (j.id().clone(), j.config.clone())).collect();
        self.jobs = jobs;
        self.loaded = true;
    }

    /// Registers a single job's name without listing it.
    pub fn insert(&mut self, job: JobConfig) {
        self.configs.insert(job.id.clone(), job);
    }

    /// Jobs in the order the backend listed them.
    pub fn jobs(&self) -> &[JobSummary] {
        &self.jobs
    }

    pub fn config(&self, id: &JobId) -> Option<&JobConfig> {
        self.configs.get(id)
    }

    /// Display name for a job id; unknown ids (e.g. deleted jobs) show as
    /// the raw id.
    pub fn job_name(&self, id: &JobId) -> String {
        self.config(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Whether at least one fetch has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// The job shown on the detail page. `job` and `runs` stay `None` until the
/// first fetch for this job completes.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub job_id: JobId,
    pub job_name: String,
    pub job: Option<JobConfig>,
    pub runs: Option<Vec<Run>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogContent {
    Loading,
    Text(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogViewer {
    pub run_id: RunId,
    pub content: LogContent,
}

/// Destructive action waiting for the operator's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteJob { job_id: JobId, name: String },
}

impl Confirm {
    pub fn prompt(&self) -> String {
        match self {
            Confirm::DeleteJob { name, .. } => format!("Delete job \"{}\"?", name),
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub(crate) current_tab: Tab,
    pub(crate) current_sub_tab: SubTab,
    pub(crate) current_detail_sub_tab: DetailSubTab,
    pub(crate) current_filter: FilterType,
    pub(crate) search_query: String,
    pub(crate) detail: Option<DetailState>,
    pub(crate) cache: JobCache,
    pub(crate) all_runs: Load<Vec<Run>>,
    pub(crate) form: JobForm,
    pub(crate) browser: FileBrowser,
    pub(crate) log: Option<LogViewer>,
    pub(crate) confirm: Option<Confirm>,
    pub(crate) alert: Option<String>,
}

impl DashboardState {
    pub fn current_tab(&self) -> Tab {
        self.current_tab
    }

    pub fn current_sub_tab(&self) -> SubTab {
        self.current_sub_tab
    }

    pub fn current_detail_sub_tab(&self) -> DetailSubTab {
        self.current_detail_sub_tab
    }

    pub fn current_filter(&self) -> FilterType {
        self.current_filter
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn detail(&self) -> Option<&DetailState> {
        self.detail.as_ref()
    }

    pub fn detail_job_id(&self) -> Option<&JobId> {
        self.detail.as_ref().map(|d| &d.job_id)
    }

    /// Whether the detail page for `job_id` is the visible page.
    pub fn is_showing_detail(&self, job_id: &JobId) -> bool {
        self.current_tab == Tab::JobDetail && self.detail_job_id() == Some(job_id)
    }

    pub fn cache(&self) -> &JobCache {
        &self.cache
    }

    /// The job list as currently filtered.
    pub fn visible_jobs(&self) -> Vec<&JobSummary> {
        apply_filters(self.cache.jobs(), &self.search_query, self.current_filter)
    }

    pub fn all_runs(&self) -> &Load<Vec<Run>> {
        &self.all_runs
    }

    pub fn form(&self) -> &JobForm {
        &self.form
    }

    pub fn browser(&self) -> &FileBrowser {
        &self.browser
    }

    pub fn log(&self) -> Option<&LogViewer> {
        self.log.as_ref()
    }

    pub fn confirm(&self) -> Option<&Confirm> {
        self.confirm.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }
}
