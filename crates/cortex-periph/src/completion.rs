//! Run completion register.
//!
//! Firmware stores [`COMPLETION_MAGIC`] at offset 0 once its test summary
//! has been printed, then parks the core. Any other store is ignored.

use std::cell::Cell;
use std::rc::Rc;

use crate::peripheral::{Peripheral, WriteAck};

/// Value that marks a run as complete.
pub const COMPLETION_MAGIC: u32 = 0xDEAD_BEEF;

/// Size of the register window.
pub const COMPLETION_WINDOW_SIZE: u32 = 0x04;

/// Read side of a completion register, shared with whoever drives the machine.
#[derive(Debug, Clone, Default)]
pub struct CompletionFlag(Rc<Cell<bool>>);

impl CompletionFlag {
    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
pub struct CompletionRegister {
    flag: CompletionFlag,
}

impl CompletionRegister {
    /// Create the register and the flag it raises.
    pub fn new() -> (Self, CompletionFlag) {
        let flag = CompletionFlag::default();
        (Self { flag: flag.clone() }, flag)
    }
}

impl Peripheral for CompletionRegister {
    fn name(&self) -> &str {
        "test-complete"
    }

    fn size(&self) -> u32 {
        COMPLETION_WINDOW_SIZE
    }

    fn read(&mut self, _offset: u32) -> u32 {
        0
    }

    fn write(&mut self, offset: u32, value: u32) -> WriteAck {
        if offset != 0 || value != COMPLETION_MAGIC {
            return WriteAck::Ignored;
        }
        if !self.flag.is_set() {
            log::debug!("completion register written, run finished");
        }
        self.flag.0.set(true);
        WriteAck::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_sets_flag() {
        let (mut reg, flag) = CompletionRegister::new();
        assert!(!flag.is_set());
        assert_eq!(reg.write(0, COMPLETION_MAGIC), WriteAck::Applied);
        assert!(flag.is_set());
        // Idempotent.
        assert_eq!(reg.write(0, COMPLETION_MAGIC), WriteAck::Applied);
        assert!(flag.is_set());
    }

    #[test]
    fn other_values_and_offsets_ignored() {
        let (mut reg, flag) = CompletionRegister::new();
        assert_eq!(reg.write(0, 1), WriteAck::Ignored);
        assert_eq!(reg.write(0, 0xBEEF_DEAD), WriteAck::Ignored);
        assert_eq!(reg.write(2, COMPLETION_MAGIC), WriteAck::Ignored);
        assert!(!flag.is_set());
        assert_eq!(reg.read(0), 0);
    }
}
