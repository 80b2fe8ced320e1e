//! Memory and I/O bus interfaces.

use crate::TStates;

/// Memory bus interface.
///
/// The CPU performs every memory access through this trait, instruction
/// fetches included. The running T-state counter is passed in so that an
/// implementation can insert wait states for contended addresses with
/// `clock.add()` before the access completes. The CPU then charges the
/// normal cost of the machine cycle itself.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16, clock: &mut TStates) -> u8;

    /// Write a byte to the given address.
    ///
    /// Implementations may silently drop writes (ROM, unmapped space).
    fn write(&mut self, address: u16, value: u8, clock: &mut TStates);
}

/// A bus that also supports the separate Z80 I/O port space.
///
/// The port address is split the way the CPU drives it: `high` is the upper
/// address byte (B for `IN r,(C)`, A for `IN A,(n)`) and `low` the lower one.
/// There is no default behaviour; unconnected ports conventionally read 0xFF.
pub trait IoBus: Bus {
    /// Read a byte from the given I/O port.
    fn read_port(&mut self, high: u8, low: u8, clock: &mut TStates) -> u8;

    /// Write a byte to the given I/O port.
    fn write_port(&mut self, high: u8, low: u8, value: u8, clock: &mut TStates);
}

/// Side-effect free view of memory.
///
/// Used by debugging tools (the disassembler) which must not disturb
/// paging state, contention or the T-state counter.
pub trait Peek {
    /// Read a byte without side effects.
    fn peek(&self, address: u16) -> u8;
}

/// A plain byte slice is a memory view; addresses wrap modulo its length.
impl Peek for [u8] {
    fn peek(&self, address: u16) -> u8 {
        if self.is_empty() {
            return 0xFF;
        }
        self[usize::from(address) % self.len()]
    }
}

impl<const N: usize> Peek for [u8; N] {
    fn peek(&self, address: u16) -> u8 {
        self.as_slice().peek(address)
    }
}

impl Peek for Vec<u8> {
    fn peek(&self, address: u16) -> u8 {
        self.as_slice().peek(address)
    }
}

/// Combine a port's high and low address bytes into the 16-bit port number.
#[must_use]
pub const fn port_address(high: u8, low: u8) -> u16 {
    (high as u16) << 8 | low as u16
}
