use std::path::Path;
use std::str::FromStr;

use crate::config::LoggingConfig;

/// Installs the global logger. `fallback` is used when the config names no
/// output file; `None` there means stderr.
pub fn setup_logging(config: &LoggingConfig, fallback: Option<&Path>) -> anyhow::Result<()> {
    let level = log::LevelFilter::from_str(&config.level).unwrap_or_else(|_| {
        eprintln!("Unknown log level '{}', using info", config.level);
        log::LevelFilter::Info
    });

    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        // transport internals stay at warn
        .level_for("hyper", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn);

    let dispatch = match config.output.as_deref().or(fallback) {
        Some(path) => dispatch.chain(fern::log_file(path)?),
        None => dispatch.chain(std::io::stderr()),
    };
    dispatch.apply()?;

    Ok(())
}
