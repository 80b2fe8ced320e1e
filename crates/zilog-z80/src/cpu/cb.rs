//! CB-prefixed bit operations, including the DDCB/FDCB indexed forms.

use emu_core::Bus;

use super::Z80;
use crate::alu;
use crate::flags::CF;
use crate::registers::{IndexMode, Reg8};

impl Z80 {
    /// Rotate/shift, RES or SET on `value`. BIT is handled by the callers.
    fn bit_operation(&mut self, op: u8, value: u8) -> u8 {
        let n = (op >> 3) & 7;
        match op >> 6 {
            0 => {
                let result = alu::rotate_shift(n, value, self.flag(CF));
                self.set_f(result.flags);
                result.value
            }
            2 => value & !(1 << n),
            _ => value | (1 << n),
        }
    }

    pub(super) fn execute_cb<B: Bus>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        let n = (op >> 3) & 7;

        match Reg8::from_code(op) {
            Some(reg) => {
                let value = self.regs.get8(reg, IndexMode::None);
                if op >> 6 == 1 {
                    let flags = alu::bit(n, value, value, self.regs.f);
                    self.set_f(flags);
                } else {
                    let result = self.bit_operation(op, value);
                    self.regs.set8(reg, IndexMode::None, result);
                }
            }
            None => {
                let address = self.regs.hl();
                let value = self.read_mem(bus, address);
                self.internal(1);
                if op >> 6 == 1 {
                    // BIT n,(HL) leaks WZ into X/Y
                    let xy = (self.regs.wz >> 8) as u8;
                    let flags = alu::bit(n, value, xy, self.regs.f);
                    self.set_f(flags);
                } else {
                    let result = self.bit_operation(op, value);
                    self.write_mem(bus, address, result);
                }
            }
        }
    }

    /// DDCB d op / FDCB d op.
    ///
    /// The displacement precedes the operation byte, which is read as data
    /// rather than fetched, so R is not advanced for it. Non-BIT forms with
    /// a register field other than 6 also copy the result into that
    /// register.
    pub(super) fn execute_indexed_cb<B: Bus>(&mut self, bus: &mut B, mode: IndexMode) {
        let d = self.read_imm(bus) as i8;
        let op = self.read_imm(bus);
        self.internal(2);

        let address = self.regs.index(mode).wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        let value = self.read_mem(bus, address);
        self.internal(1);

        if op >> 6 == 1 {
            let flags = alu::bit((op >> 3) & 7, value, (address >> 8) as u8, self.regs.f);
            self.set_f(flags);
            return;
        }

        let result = self.bit_operation(op, value);
        self.write_mem(bus, address, result);
        if let Some(reg) = Reg8::from_code(op) {
            self.regs.set8(reg, IndexMode::None, result);
        }
    }
}
