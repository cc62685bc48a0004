//! Memory-mapped peripheral contract.

/// Outcome of a register write. Writes never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteAck {
    /// The write reached a register and had its side effects.
    Applied,
    /// The offset is reserved or the value is not meaningful; nothing happened.
    Ignored,
}

/// A device occupying a window of the system bus.
///
/// Offsets are relative to the start of the window. Implementations must
/// tolerate any offset inside `0..size()`; the bus never passes one outside.
pub trait Peripheral {
    /// Name used in bus diagnostics.
    fn name(&self) -> &str;

    /// Size of the register window in bytes.
    fn size(&self) -> u32;

    /// Load a 32-bit value from the window.
    fn read(&mut self, offset: u32) -> u32;

    /// Store a 32-bit value into the window.
    fn write(&mut self, offset: u32, value: u32) -> WriteAck;
}
