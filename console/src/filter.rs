use common::JobSummary;

/// Filter chip of the job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    All,
    Enabled,
    Disabled,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::All => "all",
            FilterType::Enabled => "enabled",
            FilterType::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(FilterType::All),
            "enabled" => Some(FilterType::Enabled),
            "disabled" => Some(FilterType::Disabled),
            _ => None,
        }
    }

    fn admits(&self, job: &JobSummary) -> bool {
        match self {
            FilterType::All => true,
            FilterType::Enabled => job.config.enabled,
            FilterType::Disabled => !job.config.enabled,
        }
    }
}

fn matches_query(job: &JobSummary, query: &str) -> bool {
    job.config.name.to_lowercase().contains(query)
        || job.config.script_path.to_lowercase().contains(query)
}

/// Narrows the cached job list to what the list page shows: text search over
/// name and script path first, then the filter chip. Order is preserved.
pub fn apply_filters<'a>(jobs: &'a [JobSummary], query: &str, filter: FilterType) -> Vec<&'a JobSummary> {
    let query = query.trim().to_lowercase();
    jobs.iter()
        .filter(|job| query.is_empty() || matches_query(job, &query))
        .filter(|job| filter.admits(job))
        .collect()
}
