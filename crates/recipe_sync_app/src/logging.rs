//! Log sinks for the recipe-sync binary.
//!
//! File output is appended to `./recipe_sync.log` in the working directory.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./recipe_sync.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDestination {
    File,
    #[default]
    Terminal,
    Both,
}

impl LogDestination {
    fn wants_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }

    fn wants_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }
}

/// Install the global logger. Safe to call more than once; later calls are
/// ignored by `simplelog`.
pub fn initialize(destination: LogDestination) {
    let level = LevelFilter::Info;
    let config = sink_config();

    let mut sinks: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(2);
    if destination.wants_terminal() {
        sinks.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if destination.wants_file() {
        match open_log_file(Path::new(LOG_FILE)) {
            Ok(file) => sinks.push(WriteLogger::new(level, config, file)),
            Err(err) => eprintln!("Warning: log file {LOG_FILE} unavailable: {err}"),
        }
    }
    if sinks.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(sinks);
}

fn sink_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        // HTTP stack internals are noise at info level.
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build()
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
