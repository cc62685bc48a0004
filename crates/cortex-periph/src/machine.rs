//! Simulated machine wiring the test peripherals onto a bus.

use std::rc::Rc;

use log::Level;
use serde::{Deserialize, Serialize};

use crate::bus::{BusError, SystemBus};
use crate::completion::{CompletionFlag, CompletionRegister};
use crate::output::{LineHandler, Observer, OutputDevice};
use crate::sink::LogSink;
use crate::trace::{Access, BusTrace};

/// Default base of the output device.
pub const DEFAULT_OUTPUT_BASE: u32 = 0x4000_0000;

/// Default base of the completion register.
pub const DEFAULT_COMPLETION_BASE: u32 = 0x4000_1000;

/// Peripheral placement and output logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MachineConfig {
    pub output_base: u32,
    pub completion_base: u32,
    /// Level the output device logs characters at.
    pub output_level: Level,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            output_base: DEFAULT_OUTPUT_BASE,
            completion_base: DEFAULT_COMPLETION_BASE,
            output_level: Level::Info,
        }
    }
}

/// Counters from a trace replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub reads: usize,
    pub writes: usize,
    /// Whether the completion register was written during the replay.
    pub completed: bool,
}

/// A bus with the output device and completion register mapped.
///
/// Peripheral state lives as long as the machine; build a new machine to
/// start from a clean slate.
pub struct Machine {
    bus: SystemBus,
    completion: CompletionFlag,
}

impl Machine {
    /// Build the machine, handing the output device its collaborators.
    pub fn new(
        config: MachineConfig,
        sink: Rc<dyn LogSink>,
        on_line: LineHandler,
        observer: Option<Observer>,
    ) -> Result<Self, BusError> {
        let mut output = OutputDevice::new(sink, on_line).with_level(config.output_level);
        if let Some(observer) = observer {
            output = output.with_observer(observer);
        }
        let (completion_reg, completion) = CompletionRegister::new();

        let mut bus = SystemBus::new();
        bus.map(config.output_base, Box::new(output))?;
        bus.map(config.completion_base, Box::new(completion_reg))?;
        Ok(Self { bus, completion })
    }

    pub fn bus(&self) -> &SystemBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Whether firmware has signalled the end of its run.
    pub fn is_complete(&self) -> bool {
        self.completion.is_set()
    }

    /// Apply every access in `trace`, stopping after the access that
    /// completes the run. A machine that is already complete applies nothing.
    pub fn replay(&mut self, trace: &BusTrace) -> Result<ReplaySummary, BusError> {
        let mut summary = ReplaySummary::default();
        if self.is_complete() {
            log::debug!("run already complete, skipping {} accesses", trace.len());
            summary.completed = true;
            return Ok(summary);
        }
        for access in trace.accesses() {
            match *access {
                Access::Read { addr } => {
                    self.bus.read(addr)?;
                    summary.reads += 1;
                }
                Access::Write { addr, value } => {
                    self.bus.write(addr, value)?;
                    summary.writes += 1;
                }
            }
            if self.is_complete() {
                summary.completed = true;
                break;
            }
        }
        Ok(summary)
    }
}
