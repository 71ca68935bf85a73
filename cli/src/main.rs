use anyhow::Context;
use clap::{Parser, Subcommand};
use common::{parse_time, parse_weekday, JobId, RunId};
use cronboard_console::config::Config;
use cronboard_console::logging::setup_logging;
use cronboard_console::state::JobCache;
use cronboard_console::view::run_row;
use cronboard_console::{FormField, HttpApi, JobForm, JobsApi};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod render;
mod watch;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the job runner API, overrides the config file
    #[arg(long, global = true)]
    url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard driven by line commands on stdin
    Watch,
    /// List all jobs
    List {
        /// Print the raw JSON returned by the server
        #[arg(long)]
        json: bool,
    },
    /// Get job details
    Get {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Add a new job
    Add {
        /// Name of the job
        #[arg(short, long)]
        name: String,
        /// Script to run (.sh or .py)
        #[arg(short, long)]
        script: String,
        /// hourly, daily, weekly, monthly or custom
        #[arg(short, long, default_value = "daily")]
        frequency: String,
        /// Minutes between runs (hourly)
        #[arg(long)]
        interval: Option<u32>,
        /// Time of day as HH:MM (daily, weekly, monthly)
        #[arg(long)]
        at: Option<String>,
        /// Weekday name or 0-6, Sunday first (weekly)
        #[arg(long)]
        day_of_week: Option<String>,
        /// Day of month 1-31 (monthly)
        #[arg(long)]
        day_of_month: Option<u32>,
        /// Five-field cron expression (custom)
        #[arg(long)]
        cron: Option<String>,
        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Remove a job
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start a job manually
    Start {
        id: String,
    },
    /// Stop the running runs of a job
    Kill {
        id: String,
    },
    /// View job history
    History {
        id: String,
        #[arg(long, default_value_t = common::DETAIL_RUN_LIMIT)]
        limit: u32,
        /// Write CSV to stdout instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Recent runs across all jobs
    Runs {
        #[arg(long, default_value_t = common::ALL_RUNS_LIMIT)]
        limit: u32,
        #[arg(long)]
        csv: bool,
    },
    /// Print the output log of a run
    Log {
        run_id: String,
    },
    /// List a directory on the server
    Browse {
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_url(cli.url);

    let watch_log = matches!(cli.command, Commands::Watch)
        .then(|| PathBuf::from(common::DEFAULT_WATCH_LOG_FILE));
    setup_logging(&config.logging, watch_log.as_deref())?;

    let api = HttpApi::new(&config.server.url, config.server.request_timeout())
        .context("Failed to build HTTP client")?;
    log::info!("Using job runner at {}", api.base_url());

    match cli.command {
        Commands::Watch => watch::run(Arc::new(api)).await?,
        Commands::List { json } => {
            let jobs = api.list_jobs().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else if jobs.is_empty() {
                println!("{}", cronboard_console::view::NO_JOBS);
            } else {
                println!("{}", render::jobs_table(&jobs.iter().collect::<Vec<_>>()));
            }
        }
        Commands::Get { id, json } => {
            let job = api.get_job(&JobId(id)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&job)?);
            } else {
                print!("{}", render::job_details(&job));
            }
        }
        Commands::Add { name, script, frequency, interval, at, day_of_week, day_of_month, cron, timeout } => {
            let mut form = JobForm::default();
            form.set(FormField::Name, &name);
            form.set(FormField::ScriptPath, &script);
            form.set(FormField::Frequency, &frequency);
            if let Some(interval) = interval {
                form.set(FormField::Interval, &interval.to_string());
            }
            if let Some(at) = at {
                let (hour, minute) = parse_time(&at)?;
                form.set(FormField::Hour, &hour.to_string());
                form.set(FormField::Minute, &minute.to_string());
            }
            if let Some(dow) = day_of_week {
                form.set(FormField::DayOfWeek, &parse_weekday(&dow)?.to_string());
            }
            if let Some(dom) = day_of_month {
                form.set(FormField::DayOfMonth, &dom.to_string());
            }
            if let Some(cron) = cron {
                form.set(FormField::CronExpression, &cron);
            }
            if let Some(timeout) = timeout {
                form.set(FormField::Timeout, &timeout.to_string());
            }

            let payload = form.to_payload()?;
            let job = api.create_job(&payload).await?;
            println!("Created job {} ({})", job.id, common::describe(&job.schedule).description);
        }
        Commands::Remove { id, yes } => {
            let id = JobId(id);
            if !yes {
                let job = api.get_job(&id).await?;
                if !confirm(&format!("Delete job \"{}\"?", job.name))? {
                    println!("Aborted");
                    return Ok(());
                }
            }
            api.delete_job(&id).await?;
            println!("Deleted job {}", id);
        }
        Commands::Start { id } => {
            let triggered = api.run_job(&JobId(id)).await?;
            println!("Started run {}", triggered.run_id);
        }
        Commands::Kill { id } => {
            let response = api.kill_job(&JobId(id.clone())).await?;
            if response.killed > 0 {
                println!("Stopped {} run(s) of {}", response.killed, id);
            } else {
                println!("No running runs for {}", id);
            }
        }
        Commands::History { id, limit, csv } => {
            let id = JobId(id);
            let (job, runs) = tokio::try_join!(api.get_job(&id), api.job_runs(&id, limit))?;
            let mut cache = JobCache::default();
            cache.insert(job);
            print_runs(&runs, &cache, csv, false)?;
        }
        Commands::Runs { limit, csv } => {
            let (jobs, runs) = tokio::try_join!(api.list_jobs(), api.all_runs(limit))?;
            let mut cache = JobCache::default();
            cache.replace(jobs);
            print_runs(&runs, &cache, csv, true)?;
        }
        Commands::Log { run_id } => {
            let text = api.run_log(&RunId(run_id)).await?;
            if text.is_empty() {
                println!("(empty log)");
            } else {
                print!("{}", text);
            }
        }
        Commands::Browse { path } => {
            let listing = api.browse(path.as_deref().unwrap_or("")).await?;
            print_listing(&listing, path.as_deref().unwrap_or(""));
        }
    }

    Ok(())
}

fn print_runs(runs: &[common::Run], cache: &JobCache, csv: bool, with_job: bool) -> anyhow::Result<()> {
    let rows: Vec<_> = runs.iter().map(|r| run_row(r, cache)).collect();
    if csv {
        return render::write_runs_csv(&rows, std::io::stdout().lock());
    }
    if rows.is_empty() {
        println!("{}", cronboard_console::view::NO_RUNS);
    } else {
        println!("{}", render::runs_table(&rows, with_job));
    }
    Ok(())
}

fn print_listing(listing: &common::BrowseListing, path: &str) {
    let mut browser = cronboard_console::browser::FileBrowser::default();
    browser.show(path, listing.clone());
    let view = browser.view();
    let crumbs: Vec<&str> = view.crumbs.iter().map(|c| c.label.as_str()).collect();
    println!("{}", crumbs.join(" / "));
    for entry in &view.entries {
        match entry {
            cronboard_console::browser::BrowserEntry::Parent { .. } => println!("  ../"),
            cronboard_console::browser::BrowserEntry::Dir { name, .. } => println!("  {}/", name),
            cronboard_console::browser::BrowserEntry::File { path, .. } => println!("  {}", path),
        }
    }
    if view.empty {
        println!("  {}", cronboard_console::view::NO_FILES);
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
