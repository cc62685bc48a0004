//! System bus.
//!
//! Maps non-overlapping address windows to peripherals and forwards each
//! access with an offset relative to the window base.

use thiserror::Error;

use crate::peripheral::{Peripheral, WriteAck};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("no peripheral mapped at 0x{addr:08X}")]
    Unmapped { addr: u32 },

    #[error("'{name}' at 0x{base:08X} overlaps '{existing}'")]
    Overlap {
        name: String,
        base: u32,
        existing: String,
    },

    #[error("'{name}' at 0x{base:08X} does not fit in the 32-bit address space")]
    OutOfRange { name: String, base: u32 },
}

struct Window {
    base: u32,
    end: u64,
    device: Box<dyn Peripheral>,
}

impl Window {
    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && u64::from(addr) < self.end
    }
}

/// Address decoder owning every mapped peripheral.
#[derive(Default)]
pub struct SystemBus {
    windows: Vec<Window>,
}

impl SystemBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `device` at `base`, covering `device.size()` bytes.
    pub fn map(&mut self, base: u32, device: Box<dyn Peripheral>) -> Result<(), BusError> {
        let end = u64::from(base) + u64::from(device.size());
        if end > 1 << 32 {
            return Err(BusError::OutOfRange {
                name: device.name().to_string(),
                base,
            });
        }
        if let Some(existing) = self
            .windows
            .iter()
            .find(|w| u64::from(base) < w.end && u64::from(w.base) < end)
        {
            return Err(BusError::Overlap {
                name: device.name().to_string(),
                base,
                existing: existing.device.name().to_string(),
            });
        }
        log::debug!(
            "mapped '{}' at 0x{:08X}..0x{:08X}",
            device.name(),
            base,
            end
        );
        self.windows.push(Window { base, end, device });
        Ok(())
    }

    pub fn read(&mut self, addr: u32) -> Result<u32, BusError> {
        let window = self.window_mut(addr)?;
        let value = window.device.read(addr - window.base);
        log::trace!("read  0x{addr:08X} -> 0x{value:08X}");
        Ok(value)
    }

    pub fn write(&mut self, addr: u32, value: u32) -> Result<WriteAck, BusError> {
        let window = self.window_mut(addr)?;
        let ack = window.device.write(addr - window.base, value);
        log::trace!("write 0x{addr:08X} <- 0x{value:08X} ({ack:?})");
        Ok(ack)
    }

    /// Mapped windows as (name, base, size), in mapping order.
    pub fn windows(&self) -> impl Iterator<Item = (&str, u32, u32)> {
        self.windows
            .iter()
            .map(|w| (w.device.name(), w.base, w.device.size()))
    }

    fn window_mut(&mut self, addr: u32) -> Result<&mut Window, BusError> {
        self.windows
            .iter_mut()
            .find(|w| w.contains(addr))
            .ok_or(BusError::Unmapped { addr })
    }
}
