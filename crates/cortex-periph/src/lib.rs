//! Peripheral emulation for Cortex-M test firmware.
//!
//! Test binaries report progress by storing characters into a memory-mapped
//! output register and signal the end of a run by storing a magic value into
//! a completion register. This crate models both devices, the bus that
//! dispatches loads and stores to them, and a text trace format to replay
//! recorded bus traffic.
//!
//! Everything here is single-threaded: a [`Machine`] owns its bus, the bus
//! owns its peripherals, and each access runs to completion before the next.

pub mod bus;
pub mod completion;
pub mod machine;
pub mod output;
pub mod peripheral;
pub mod sink;
pub mod trace;

pub use bus::{BusError, SystemBus};
pub use completion::{CompletionFlag, CompletionRegister, COMPLETION_MAGIC};
pub use machine::{Machine, MachineConfig, ReplaySummary};
pub use output::{LineHandler, Observer, OutputDevice, OutputState};
pub use peripheral::{Peripheral, WriteAck};
pub use sink::{FacadeSink, LogEntry, LogSink, RecordingSink};
pub use trace::{Access, BusTrace, TraceError};
