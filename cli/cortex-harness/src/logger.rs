use std::sync::Mutex;

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// The harness logger
///
/// Everything goes to stderr so that stdout carries only command output.
pub struct HarnessLogger {
    state: Mutex<LoggerState>,
}

/// The inner state of the logger
struct LoggerState {
    level: LevelFilter,
}

static LOGGER: HarnessLogger = HarnessLogger {
    state: Mutex::new(LoggerState {
        level: LevelFilter::Info,
    }),
};

impl HarnessLogger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        LOGGER.set_level(level);
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);
        Ok(())
    }

    fn level(&self) -> LevelFilter {
        self.state.lock().map_or(LevelFilter::Info, |s| s.level)
    }

    fn set_level(&self, level: LevelFilter) {
        if let Ok(mut state) = self.state.lock() {
            state.level = level;
        }
    }
}

/// Pick the console level: flags win over the manifest, which wins over `info`.
pub fn select_level(verbose: u8, quiet: bool, configured: Option<LevelFilter>) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => configured.unwrap_or(LevelFilter::Info),
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

impl log::Log for HarnessLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Error => {
                    eprintln!("\x1b[31merror: {}\x1b[0m", record.args());
                }
                Level::Warn => {
                    eprintln!("\x1b[33mwarning: {}\x1b[0m", record.args());
                }
                Level::Info => {
                    eprintln!("{}", record.args());
                }
                Level::Debug | Level::Trace => {
                    eprintln!("\x1b[2m[{}] {}\x1b[0m", record.target(), record.args());
                }
            }
        }
    }

    fn flush(&self) {}
}
