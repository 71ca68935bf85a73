use anyhow::Result;
use common::{JobId, RunId};
use cronboard_console::browser::BrowserEntry;
use cronboard_console::state::DashboardState;
use cronboard_console::{Command, Dashboard, DetailSubTab, Event, FilterType, FormField, JobsApi,
                        SubTab, TabTarget};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
commands:
  jobs | runs                 monitor sub tabs
  open <id> | tasks | back    job detail
  new | edit <id>             job form
  set <field> <value>         name, script, frequency, interval, hour, minute, dow, dom, cron, timeout
  submit | cancel
  run <id> | kill <id> | delete <id> | yes | no
  search <text> | filter all|enabled|disabled
  log <run> | browse [path] | pick <n> | close
  quit";

#[derive(Debug, PartialEq)]
pub enum Input {
    Commands(Vec<Command>),
    Help,
    Quit,
}

fn one(command: Command) -> Result<Input, String> {
    Ok(Input::Commands(vec![command]))
}

/// Job id argument; defaults to the job shown on the detail page.
fn job_arg(arg: &str, state: &DashboardState) -> Result<JobId, String> {
    if !arg.is_empty() {
        return Ok(JobId::from(arg));
    }
    state
        .detail_job_id()
        .cloned()
        .ok_or_else(|| "a job id is required".to_string())
}

/// Translates one line of operator input against the current state.
pub fn parse_line(line: &str, state: &DashboardState) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "" => Ok(Input::Commands(Vec::new())),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" | "q" => Ok(Input::Quit),
        "jobs" | "runs" => {
            let sub_tab = if word == "jobs" { SubTab::Jobs } else { SubTab::Runs };
            Ok(Input::Commands(vec![
                Command::SwitchTab(TabTarget::Monitor),
                Command::SwitchSubTab(sub_tab),
            ]))
        }
        "back" => one(Command::SwitchTab(TabTarget::Monitor)),
        "open" => {
            let job_id = job_arg(rest, state)?;
            let job_name = state.cache().job_name(&job_id);
            one(Command::SwitchTab(TabTarget::JobDetail { job_id, job_name }))
        }
        "tasks" => one(Command::SwitchDetailSubTab(DetailSubTab::Tasks)),
        "new" => one(Command::SwitchTab(TabTarget::Create)),
        "edit" => one(Command::Edit(job_arg(rest, state)?)),
        "set" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let field = FormField::parse(field).ok_or_else(|| format!("unknown field '{}'", field))?;
            one(Command::SetField(field, value.trim().to_string()))
        }
        "submit" => one(Command::Submit),
        "cancel" => one(Command::CancelEdit),
        "run" => one(Command::RunNow(job_arg(rest, state)?)),
        "kill" | "stop" => one(Command::Kill(job_arg(rest, state)?)),
        "delete" => {
            let job_id = job_arg(rest, state)?;
            let name = state.cache().job_name(&job_id);
            one(Command::Delete { job_id, name })
        }
        "yes" | "y" => one(Command::Confirm(true)),
        "no" | "n" => one(Command::Confirm(false)),
        "search" => one(Command::Search(rest.to_string())),
        "filter" => FilterType::parse(rest)
            .ok_or_else(|| format!("unknown filter '{}'", rest))
            .and_then(|f| one(Command::Filter(f))),
        "log" => {
            if rest.is_empty() {
                return Err("a run id is required".to_string());
            }
            one(Command::ViewLog(RunId::from(rest)))
        }
        "browse" if rest.is_empty() => one(Command::OpenBrowser),
        "browse" if state.browser().is_open() => one(Command::BrowseDir(rest.to_string())),
        "browse" => Ok(Input::Commands(vec![
            Command::OpenBrowser,
            Command::BrowseDir(rest.to_string()),
        ])),
        "pick" => {
            if !state.browser().is_open() {
                return Err("the file browser is not open".to_string());
            }
            let index: usize = rest.parse().map_err(|_| format!("'{}' is not an entry number", rest))?;
            let entry: BrowserEntry = state
                .browser()
                .view()
                .entries
                .get(index)
                .cloned()
                .ok_or_else(|| format!("no entry {}", index))?;
            one(Command::OpenEntry(entry))
        }
        "close" => one(Command::Dismiss),
        "ok" => one(Command::DismissAlert),
        other => Err(format!("unknown command '{}' (try 'help')", other)),
    }
}

fn redraw(state: &DashboardState) {
    print!("\x1b[2J\x1b[H{}", crate::render::screen(state));
}

/// Runs the dashboard until `quit`, end of input or Ctrl-C.
pub async fn run<A: JobsApi>(api: Arc<A>) -> Result<()> {
    let mut dashboard = Dashboard::new(api);
    let shutdown = dashboard.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(Event::Shutdown);
        }
    });

    dashboard.start();
    redraw(dashboard.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notice: Option<String> = None;
    loop {
        tokio::select! {
            event = dashboard.next_event() => match event {
                Some(Event::Shutdown) | None => break,
                Some(event @ Event::TimerFired { .. }) => {
                    dashboard.handle(event);
                    continue;
                }
                Some(event) => dashboard.handle(event),
            },
            line = lines.next_line() => match line? {
                None => break,
                Some(line) => match parse_line(&line, dashboard.state()) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => notice = Some(HELP.to_string()),
                    Ok(Input::Commands(commands)) => {
                        for command in commands {
                            dashboard.dispatch(command);
                        }
                    }
                    Err(e) => notice = Some(e),
                },
            },
        }
        redraw(dashboard.state());
        if let Some(text) = notice.take() {
            println!("{}", text);
        }
    }

    log::info!("Watch session ended");
    Ok(())
}
