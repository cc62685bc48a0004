//! Character output device.
//!
//! Register layout (32-bit registers):
//!
//! | Offset | Name    | Behaviour                                      |
//! |--------|---------|------------------------------------------------|
//! | 0x00   | DATA    | write: low byte is emitted as a character      |
//! | 0x04   | STATUS  | reserved, writes ignored                       |
//! | 0x08   | CONTROL | reserved, writes ignored                       |
//!
//! Every register reads as zero. Characters are logged one at a time in
//! append mode; completed lines (terminated by `\n`) are handed to the line
//! handler with trailing whitespace removed.

use std::fmt;
use std::rc::Rc;

use log::Level;

use crate::peripheral::{Peripheral, WriteAck};
use crate::sink::LogSink;

/// Offset of the data register.
pub const DATA_OFFSET: u32 = 0x00;

/// Size of the register window.
pub const OUTPUT_WINDOW_SIZE: u32 = 0x0C;

/// Called with every character written, in order.
pub type Observer = Box<dyn FnMut(char)>;

/// Called with every completed line.
pub type LineHandler = Box<dyn FnMut(&str)>;

/// Line state of the output accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// The accumulator is empty or holds a partial line.
    Idle,
    /// The accumulator holds a complete line that is being flushed.
    LineReady,
}

pub struct OutputDevice {
    buffer: String,
    state: OutputState,
    lines_flushed: usize,
    sink: Rc<dyn LogSink>,
    level: Level,
    on_line: LineHandler,
    observer: Option<Observer>,
}

impl OutputDevice {
    /// Create a device logging to `sink` and reporting lines to `on_line`.
    pub fn new(sink: Rc<dyn LogSink>, on_line: LineHandler) -> Self {
        Self {
            buffer: String::new(),
            state: OutputState::Idle,
            lines_flushed: 0,
            sink,
            level: Level::Info,
            on_line,
            observer: None,
        }
    }

    /// Register a per-character observer.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Log level used for character output.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Characters received since the last line feed.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    /// Number of lines handed to the line handler so far.
    pub fn lines_flushed(&self) -> usize {
        self.lines_flushed
    }

    fn push(&mut self, ch: char) {
        self.buffer.push(ch);

        let mut utf8 = [0u8; 4];
        self.sink.log(self.level, ch.encode_utf8(&mut utf8), true);

        if ch == '\n' {
            self.state = OutputState::LineReady;
            self.flush_line();
        }

        if let Some(observer) = self.observer.as_mut() {
            observer(ch);
        }
    }

    fn flush_line(&mut self) {
        debug_assert_eq!(self.state, OutputState::LineReady);
        (self.on_line)(self.buffer.trim_end());
        self.buffer.clear();
        self.lines_flushed += 1;
        self.state = OutputState::Idle;
    }
}

impl Peripheral for OutputDevice {
    fn name(&self) -> &str {
        "test-output"
    }

    fn size(&self) -> u32 {
        OUTPUT_WINDOW_SIZE
    }

    fn read(&mut self, _offset: u32) -> u32 {
        0
    }

    fn write(&mut self, offset: u32, value: u32) -> WriteAck {
        if offset != DATA_OFFSET {
            return WriteAck::Ignored;
        }
        // Low byte only, mapped one-to-one onto U+0000..=U+00FF.
        let ch = char::from((value & 0xFF) as u8);
        self.push(ch);
        WriteAck::Applied
    }
}

impl fmt::Debug for OutputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDevice")
            .field("buffer", &self.buffer)
            .field("state", &self.state)
            .field("lines_flushed", &self.lines_flushed)
            .field("level", &self.level)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
