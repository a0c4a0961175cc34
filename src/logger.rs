use crate::config::Config;
use crate::utils::ErrorStr;

use std::fmt::Display;
use std::fs::OpenOptions;
use std::str::FromStr;

use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TerminalMode, TermLogger, WriteLogger};


const LOGGER_ERROR: &str = "logger init error";

const LOG_CONSOLE: &str = "console";
const LOG_FILE: &str = "file";


/// Install the global logger: `console` writes to stderr, `file` appends to `log.file`.
pub fn init_logger(cfg: &Config) -> Result<(), ErrorStr> {
    let level = LevelFilter::from_str(&cfg.log.level).unwrap_or_else(|_| {
        eprintln!("Unknown log level: {}, use `info` by default", cfg.log.level);
        LevelFilter::Info
    });
    let log_cfg = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|builder| builder)
        .build();

    let installed = match cfg.log.kind.as_str() {
        LOG_FILE => {
            let file = OpenOptions::new().create(true).append(true).open(&cfg.log.file).map_err(|e| {
                eprintln!("Could not open log file {}: {}", cfg.log.file, e);
                LOGGER_ERROR
            })?;
            WriteLogger::init(level, log_cfg, file)
        }
        kind => {
            if kind != LOG_CONSOLE {
                eprintln!("Unsupported log kind: {}, logging to the console", kind);
            }
            TermLogger::init(level, log_cfg, TerminalMode::Stderr, ColorChoice::Auto)
        }
    };
    installed.map_err(|e| {
        eprintln!("Could not init {} logger: {}", cfg.log.kind, e);
        LOGGER_ERROR
    })
}

/// Build a `map_err` adapter which logs the error under `[module]` and
/// replaces it with the static error `err`.
pub fn get_reporter<E: Display>(module: &'static str, label: &'static str, err: ErrorStr) -> impl Fn(E) -> ErrorStr {
    move |e: E| {
        if label.is_empty() {
            error!("[{}] {}", module, e);
        } else {
            error!("[{}] {} error: {}", module, label, e);
        }
        err
    }
}
