//! ED-prefixed instructions: extended loads, 16-bit arithmetic, port I/O
//! on (C), interrupt control and the block transfer/compare/I/O family.
//!
//! Any DD/FD prefix before ED is dropped. Unassigned ED opcodes execute as
//! 8 T-state NOPs.

use emu_core::IoBus;

use super::Z80;
use crate::alu;
use crate::flags::{CF, PF, sz53, sz53p};
use crate::registers::{IndexMode, Reg8, Reg16};

/// Direction of a block instruction: I forms step up, D forms step down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

impl Step {
    fn from_opcode(op: u8) -> Self {
        if op & 0x08 == 0 { Step::Up } else { Step::Down }
    }

    fn apply(self, value: u16) -> u16 {
        match self {
            Step::Up => value.wrapping_add(1),
            Step::Down => value.wrapping_sub(1),
        }
    }
}

impl Z80 {
    pub(super) fn execute_ed<B: IoBus>(&mut self, bus: &mut B) {
        let op = self.fetch_opcode(bus);
        let y = (op >> 3) & 7;
        let p = y >> 1;

        match op {
            // IN r,(C) / IN F,(C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x70 | 0x78 => {
                let bc = self.regs.bc();
                let value = self.port_in(bus, self.regs.b, self.regs.c);
                self.regs.wz = bc.wrapping_add(1);
                if let Some(reg) = Reg8::from_code(y) {
                    self.regs.set8(reg, IndexMode::None, value);
                }
                self.set_f(sz53p(value) | (self.regs.f & CF));
            }

            // OUT (C),r / OUT (C),0
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x71 | 0x79 => {
                let value = Reg8::from_code(y).map_or(0, |reg| self.regs.get8(reg, IndexMode::None));
                let bc = self.regs.bc();
                self.port_out(bus, self.regs.b, self.regs.c, value);
                self.regs.wz = bc.wrapping_add(1);
            }

            // SBC HL,rr / ADC HL,rr
            0x42 | 0x52 | 0x62 | 0x72 | 0x4A | 0x5A | 0x6A | 0x7A => {
                let hl = self.regs.hl();
                let operand = self.regs.get16(Reg16::from_code(p), IndexMode::None);
                self.internal(7);
                let result = if y & 1 == 0 {
                    alu::sbc16(hl, operand, self.flag(CF))
                } else {
                    alu::adc16(hl, operand, self.flag(CF))
                };
                self.regs.wz = hl.wrapping_add(1);
                self.regs.set_hl(result.value);
                self.set_f(result.flags);
            }

            // LD (nn),rr
            0x43 | 0x53 | 0x63 | 0x73 => {
                let nn = self.read_imm16(bus);
                let value = self.regs.get16(Reg16::from_code(p), IndexMode::None);
                self.write_word(bus, nn, value);
                self.regs.wz = nn.wrapping_add(1);
            }

            // LD rr,(nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let nn = self.read_imm16(bus);
                let value = self.read_word(bus, nn);
                self.regs.set16(Reg16::from_code(p), IndexMode::None, value);
                self.regs.wz = nn.wrapping_add(1);
            }

            // NEG (and mirrors)
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::sub8(0, self.regs.a, false);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // RETN / RETI (and mirrors). Both copy IFF2 into IFF1.
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.regs.iff1 = self.regs.iff2;
                self.regs.pc = self.pop(bus);
                self.regs.wz = self.regs.pc;
            }

            // IM 0 / IM 1 / IM 2 (and mirrors; the 0x4E/0x6E slots select IM 0)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x76 | 0x7E => {
                self.regs.im = match y & 3 {
                    2 => 1,
                    3 => 2,
                    _ => 0,
                };
            }

            // LD I,A
            0x47 => {
                self.internal(1);
                self.regs.i = self.regs.a;
            }

            // LD R,A
            0x4F => {
                self.internal(1);
                self.regs.r = self.regs.a;
            }

            // LD A,I / LD A,R
            0x57 | 0x5F => {
                self.internal(1);
                let value = if op == 0x57 { self.regs.i } else { self.regs.r };
                self.regs.a = value;
                let iff = if self.regs.iff2 { PF } else { 0 };
                self.set_f(sz53(value) | iff | (self.regs.f & CF));
            }

            // RRD
            0x67 => {
                let hl = self.regs.hl();
                let m = self.read_mem(bus, hl);
                self.internal(4);
                let a = self.regs.a;
                self.write_mem(bus, hl, (a << 4) | (m >> 4));
                self.regs.a = (a & 0xF0) | (m & 0x0F);
                self.regs.wz = hl.wrapping_add(1);
                self.set_f(sz53p(self.regs.a) | (self.regs.f & CF));
            }

            // RLD
            0x6F => {
                let hl = self.regs.hl();
                let m = self.read_mem(bus, hl);
                self.internal(4);
                let a = self.regs.a;
                self.write_mem(bus, hl, (m << 4) | (a & 0x0F));
                self.regs.a = (a & 0xF0) | (m >> 4);
                self.regs.wz = hl.wrapping_add(1);
                self.set_f(sz53p(self.regs.a) | (self.regs.f & CF));
            }

            // LDI / LDD / LDIR / LDDR
            0xA0 | 0xA8 | 0xB0 | 0xB8 => self.block_load(bus, op),

            // CPI / CPD / CPIR / CPDR
            0xA1 | 0xA9 | 0xB1 | 0xB9 => self.block_compare(bus, op),

            // INI / IND / INIR / INDR
            0xA2 | 0xAA | 0xB2 | 0xBA => self.block_in(bus, op),

            // OUTI / OUTD / OTIR / OTDR
            0xA3 | 0xAB | 0xB3 | 0xBB => self.block_out(bus, op),

            // LD I/R slots 0x77 and 0x7F, and every unassigned code
            _ => {
                log::debug!(
                    "reserved opcode ED {op:02X} at {:04X} executed as NOP",
                    self.regs.pc.wrapping_sub(2)
                );
            }
        }
    }

    /// Rewind PC onto the ED prefix of a repeating block instruction.
    fn repeat_block(&mut self) {
        self.internal(5);
        self.regs.pc = self.regs.pc.wrapping_sub(2);
    }

    fn block_load<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        let step = Step::from_opcode(op);
        let value = self.read_mem(bus, self.regs.hl());
        self.write_mem(bus, self.regs.de(), value);
        self.internal(2);

        self.regs.set_hl(step.apply(self.regs.hl()));
        self.regs.set_de(step.apply(self.regs.de()));
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let flags = alu::block_load_flags(self.regs.f, self.regs.a, value, bc != 0);
        self.set_f(flags);

        if op & 0x10 != 0 && bc != 0 {
            self.repeat_block();
            self.regs.wz = self.regs.pc.wrapping_add(1);
        }
    }

    fn block_compare<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        let step = Step::from_opcode(op);
        let value = self.read_mem(bus, self.regs.hl());
        self.internal(5);

        self.regs.set_hl(step.apply(self.regs.hl()));
        self.regs.wz = step.apply(self.regs.wz);
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);

        let flags = alu::block_compare_flags(self.regs.f, self.regs.a, value, bc != 0);
        self.set_f(flags);

        if op & 0x10 != 0 && bc != 0 && self.regs.a != value {
            self.repeat_block();
            self.regs.wz = self.regs.pc.wrapping_add(1);
        }
    }

    fn block_in<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        let step = Step::from_opcode(op);
        self.internal(1);
        let bc = self.regs.bc();
        let value = self.port_in(bus, self.regs.b, self.regs.c);
        self.write_mem(bus, self.regs.hl(), value);

        self.regs.wz = step.apply(bc);
        self.regs.set_hl(step.apply(self.regs.hl()));
        self.regs.b = self.regs.b.wrapping_sub(1);

        let adjusted_c = step.apply(u16::from(self.regs.c)) & 0xFF;
        let k = u16::from(value) + adjusted_c;
        self.set_f(alu::block_io_flags(value, k, self.regs.b));

        if op & 0x10 != 0 && self.regs.b != 0 {
            self.repeat_block();
        }
    }

    fn block_out<B: IoBus>(&mut self, bus: &mut B, op: u8) {
        let step = Step::from_opcode(op);
        self.internal(1);
        let value = self.read_mem(bus, self.regs.hl());
        self.regs.b = self.regs.b.wrapping_sub(1);
        self.port_out(bus, self.regs.b, self.regs.c, value);

        self.regs.set_hl(step.apply(self.regs.hl()));
        self.regs.wz = step.apply(self.regs.bc());

        let k = u16::from(value) + u16::from(self.regs.l);
        self.set_f(alu::block_io_flags(value, k, self.regs.b));

        if op & 0x10 != 0 && self.regs.b != 0 {
            self.repeat_block();
        }
    }
}
