//! Logging sinks for peripheral output.
//!
//! A [`LogSink`] receives text at a log level. In append mode the text
//! continues the previous entry instead of starting a new one, which is how
//! the output device streams one character at a time.

use std::cell::RefCell;

use log::Level;

/// `log` target used by [`FacadeSink`].
pub const OUTPUT_TARGET: &str = "cortex_periph::output";

/// Capability to record peripheral log text.
pub trait LogSink {
    fn log(&self, level: Level, text: &str, append: bool);
}

/// Forwards every call to the `log` facade as its own record.
///
/// The facade has no notion of appending, so appended text is marked with a
/// `+` prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, level: Level, text: &str, append: bool) {
        let text = text.escape_debug();
        if append {
            log::log!(target: OUTPUT_TARGET, level, "+{text}");
        } else {
            log::log!(target: OUTPUT_TARGET, level, "{text}");
        }
    }
}

/// One logical log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub text: String,
}

/// Keeps entries in memory, merging appended text into the last entry.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<LogEntry>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// All recorded text, concatenated.
    pub fn text(&self) -> String {
        self.entries.borrow().iter().map(|e| e.text.as_str()).collect()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: Level, text: &str, append: bool) {
        let mut entries = self.entries.borrow_mut();
        match entries.last_mut() {
            Some(last) if append => last.text.push_str(text),
            _ => entries.push(LogEntry {
                level,
                text: text.to_string(),
            }),
        }
    }
}
