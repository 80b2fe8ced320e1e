//! Flat 64K RAM bus for tests and harnesses.

use std::collections::HashMap;

use crate::{Bus, IoBus, Peek, TStates, port_address};

/// 64K of uncontended RAM plus a minimal port space.
///
/// Port reads return the value preset with [`SimpleBus::set_port_input`],
/// or 0xFF for unconnected ports. Port writes are recorded in order until
/// drained with [`SimpleBus::take_port_writes`].
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
    port_inputs: HashMap<u16, u8>,
    port_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            port_inputs: HashMap::new(),
            port_writes: Vec::new(),
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at 64K.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Write a byte without going through the bus.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    /// Read a little-endian word without side effects.
    #[must_use]
    pub fn peek_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }

    /// Set the value returned when `port` is read.
    pub fn set_port_input(&mut self, port: u16, value: u8) {
        self.port_inputs.insert(port, value);
    }

    /// All port writes so far as `(port, value)`.
    #[must_use]
    pub fn port_writes(&self) -> &[(u16, u8)] {
        &self.port_writes
    }

    /// Drain the recorded port writes, leaving the log empty.
    pub fn take_port_writes(&mut self) -> Vec<(u16, u8)> {
        std::mem::take(&mut self.port_writes)
    }

    /// The whole address space.
    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory[..]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Peek for SimpleBus {
    fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16, _clock: &mut TStates) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8, _clock: &mut TStates) {
        self.memory[usize::from(address)] = value;
    }
}

impl IoBus for SimpleBus {
    fn read_port(&mut self, high: u8, low: u8, _clock: &mut TStates) -> u8 {
        self.port_inputs
            .get(&port_address(high, low))
            .copied()
            .unwrap_or(0xFF)
    }

    fn write_port(&mut self, high: u8, low: u8, value: u8, _clock: &mut TStates) {
        self.port_writes.push((port_address(high, low), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x11, 0x22]);
        assert_eq!(bus.peek(0xFFFF), 0x11);
        assert_eq!(bus.peek(0x0000), 0x22);
        assert_eq!(bus.peek_word(0xFFFF), 0x2211);
    }

    #[test]
    fn ports_default_to_floating_bus() {
        let mut bus = SimpleBus::new();
        let mut clock = TStates::new();
        assert_eq!(bus.read_port(0x12, 0x34, &mut clock), 0xFF);
        bus.set_port_input(0x1234, 0x5A);
        assert_eq!(bus.read_port(0x12, 0x34, &mut clock), 0x5A);
        bus.write_port(0x00, 0x05, 0x41, &mut clock);
        assert_eq!(bus.port_writes(), &[(0x0005, 0x41)]);
        assert_eq!(clock.total(), 0);
    }

    #[test]
    fn taking_port_writes_empties_the_log() {
        let mut bus = SimpleBus::new();
        let mut clock = TStates::new();
        bus.write_port(0x01, 0xFE, 0x07, &mut clock);
        bus.write_port(0x02, 0xFE, 0x00, &mut clock);
        assert_eq!(bus.take_port_writes(), vec![(0x01FE, 0x07), (0x02FE, 0x00)]);
        assert!(bus.port_writes().is_empty());

        bus.write_port(0x00, 0xFE, 0x03, &mut clock);
        assert_eq!(bus.port_writes(), &[(0x00FE, 0x03)]);
    }
}
