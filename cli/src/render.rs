use chrono::Utc;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use common::format::time_ago;
use common::{JobConfig, JobSummary};
use cronboard_console::browser::BrowserView;
use cronboard_console::state::{DashboardState, DetailSubTab, LogContent, SubTab, Tab};
use cronboard_console::view::{self, DetailView, ListView, RunRow, TaskInfo, NO_FILES, NO_VALUE};
use std::fmt::Write as _;
use std::io::Write;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// One glyph per recent run, oldest first.
fn run_strip(markers: &[view::RunMarker]) -> String {
    markers
        .iter()
        .map(|m| match m.status {
            common::RunStatus::Success => '+',
            common::RunStatus::Running => '>',
            common::RunStatus::Failed | common::RunStatus::Timeout => 'x',
            common::RunStatus::Cancelled => '-',
            common::RunStatus::Unknown => '?',
        })
        .collect()
}

pub fn jobs_table(jobs: &[&JobSummary]) -> Table {
    let now = Utc::now();
    let mut t = table(vec!["ID", "Name", "Type", "Trigger", "Next Run", "Last Run", "Recent"]);
    for job in jobs {
        let row = view::job_row(job);
        let last = job
            .last_run
            .as_deref()
            .map(|s| time_ago(s, now))
            .unwrap_or_else(|| NO_VALUE.to_string());
        let recent = if row.can_stop {
            format!("{} (running)", run_strip(&row.recent))
        } else {
            run_strip(&row.recent)
        };
        t.add_row(vec![
            row.id.to_string(),
            row.name,
            row.script_kind.to_string(),
            row.trigger_type.to_string(),
            row.next_run,
            last,
            recent,
        ]);
    }
    t
}

pub fn runs_table(rows: &[RunRow], with_job: bool) -> Table {
    let mut header = vec!["Run", "Status", "Trigger", "Started", "Duration", "Exit"];
    if with_job {
        header.insert(1, "Job");
    }
    let mut t = table(header);
    for row in rows {
        let mut cells = vec![
            row.id.to_string(),
            row.status.label().to_string(),
            row.trigger.clone(),
            row.started.clone(),
            row.duration.clone(),
            row.exit_code.clone(),
        ];
        if with_job {
            cells.insert(1, row.job_name.clone());
        }
        t.add_row(cells);
    }
    t
}

pub fn write_runs_csv<W: Write>(rows: &[RunRow], out: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["run_id", "job_id", "job_name", "status", "trigger", "started", "duration", "exit_code"])?;
    for row in rows {
        wtr.write_record([
            row.id.as_str(),
            row.job_id.as_str(),
            row.job_name.as_str(),
            row.status.as_str(),
            row.trigger.as_str(),
            row.started.as_str(),
            row.duration.as_str(),
            row.exit_code.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn task_info(info: &TaskInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Script:   {}", info.script_path);
    let _ = writeln!(out, "  Schedule: {}", info.schedule);
    let _ = writeln!(out, "  Cron:     {}", info.cron);
    let _ = writeln!(out, "  Timeout:  {}", info.timeout);
    let _ = writeln!(out, "  Enabled:  {}", if info.enabled { "yes" } else { "no" });
    out
}

pub fn job_details(job: &JobConfig) -> String {
    format!("Job Details:\n  ID:       {}\n  Name:     {}\n{}", job.id, job.name, task_info(&view::task_info(job)))
}

/// Text bar chart of run durations, one line per run, oldest first.
fn chart(bars: &[view::ChartBar]) -> String {
    if bars.is_empty() {
        return format!("  {}\n", view::NO_CHART_DATA);
    }
    let mut out = String::new();
    for bar in bars {
        let width = (bar.height / view::CHART_HEIGHT * 40.0).round().max(1.0) as usize;
        let _ = writeln!(
            out,
            "  {:>5} {} {}",
            bar.label.as_deref().unwrap_or(""),
            "#".repeat(width),
            bar.title
        );
    }
    out
}

fn list_view<T>(out: &mut String, list: ListView<T>, render: impl FnOnce(Vec<T>) -> Table) {
    match list {
        ListView::Loading => out.push_str("Loading...\n"),
        ListView::Empty(msg) | ListView::Failed(msg) => {
            let _ = writeln!(out, "{}", msg);
        }
        ListView::Rows(rows) => {
            let _ = writeln!(out, "{}", render(rows));
        }
    }
}

fn detail(out: &mut String, state: &DashboardState, detail: DetailView) {
    let _ = writeln!(out, "{} [{}]{}", detail.title, detail.badge, if detail.can_stop { " (running)" } else { "" });
    match state.current_detail_sub_tab() {
        DetailSubTab::Runs => {
            list_view(out, detail.runs, |rows| runs_table(&rows, false));
            out.push_str("Durations:\n");
            out.push_str(&chart(&detail.chart));
        }
        DetailSubTab::Tasks => match &detail.task {
            Some(info) => out.push_str(&task_info(info)),
            None => out.push_str("Loading...\n"),
        },
    }
}

fn browser(out: &mut String, view: BrowserView) {
    let crumbs: Vec<&str> = view.crumbs.iter().map(|c| c.label.as_str()).collect();
    let _ = writeln!(out, "-- Browse: {} --", crumbs.join(" / "));
    if view.loading {
        out.push_str("Loading...\n");
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    for (i, entry) in view.entries.iter().enumerate() {
        let suffix = match entry {
            cronboard_console::browser::BrowserEntry::File { .. } => "",
            _ => "/",
        };
        let _ = writeln!(out, "  [{}] {}{}", i, entry.label(), suffix);
    }
    if view.empty {
        let _ = writeln!(out, "  {}", NO_FILES);
    }
}

/// Full-screen rendering of the current dashboard state for `watch`.
pub fn screen(state: &DashboardState) -> String {
    let mut out = String::new();
    let lit = state.current_tab().indicator();
    let tab = |t: Tab, label: &str| if lit == t { format!("[{}]", label) } else { label.to_string() };
    let _ = writeln!(out, "{}  {}", tab(Tab::Monitor, "Monitor"), tab(Tab::Create, "Create"));

    match state.current_tab() {
        Tab::Monitor => {
            let _ = writeln!(
                out,
                "search: '{}'  filter: {}",
                state.search_query(),
                state.current_filter().as_str()
            );
            match state.current_sub_tab() {
                SubTab::Jobs => {
                    list_view(&mut out, view::job_list(state), |_| jobs_table(&state.visible_jobs()));
                }
                SubTab::Runs => list_view(&mut out, view::all_runs(state), |rows| runs_table(&rows, true)),
            }
        }
        Tab::Create => {
            let form = state.form();
            let fields = form.visible_fields();
            let _ = writeln!(out, "{}", form.title());
            let _ = writeln!(out, "  name:      {}", form.name);
            let _ = writeln!(out, "  script:    {}", form.script_path);
            let _ = writeln!(out, "  frequency: {}", form.frequency);
            if fields.interval {
                let _ = writeln!(out, "  interval:  {}", form.interval);
            }
            if fields.time {
                let _ = writeln!(out, "  time:      {}:{}", form.hour, form.minute);
            }
            if fields.day_of_week {
                let _ = writeln!(out, "  dow:       {}", form.day_of_week);
            }
            if fields.day_of_month {
                let _ = writeln!(out, "  dom:       {}", form.day_of_month);
            }
            if fields.cron_expression {
                let _ = writeln!(out, "  cron:      {}", form.cron_expression);
            }
            let _ = writeln!(out, "  timeout:   {}", form.timeout);
        }
        Tab::JobDetail => {
            if let Some(view) = view::detail(state) {
                detail(&mut out, state, view);
            }
        }
    }

    if let Some(log) = state.log() {
        let _ = writeln!(out, "-- Log {} --", log.run_id);
        match &log.content {
            LogContent::Loading => out.push_str("Loading...\n"),
            LogContent::Text(text) | LogContent::Error(text) => {
                let _ = writeln!(out, "{}", text);
            }
        }
    }
    if state.browser().is_open() {
        browser(&mut out, state.browser().view());
    }
    if let Some(confirm) = state.confirm() {
        let _ = writeln!(out, "{} (yes/no)", confirm.prompt());
    }
    if let Some(alert) = state.alert() {
        let _ = writeln!(out, "! {}", alert);
    }
    out
}
