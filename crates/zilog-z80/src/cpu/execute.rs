//! Unprefixed and DD/FD-prefixed instructions.
//!
//! DD and FD reuse this table: the index mode redirects H, L, HL and (HL)
//! to IXH, IXL, IX and (IX+d) (or the IY equivalents). Instructions that do
//! not touch those operands behave as unprefixed, having paid 4 T-states
//! for the prefix fetch.

use emu_core::{Bus, IoBus};

use super::Z80;
use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::{IndexMode, Reg8, Reg16};

impl Z80 {
    /// Address of the memory operand: HL, or IX+d / IY+d with the
    /// displacement read and the 5 T-state address calculation charged.
    pub(super) fn memory_operand<B: Bus>(&mut self, bus: &mut B, mode: IndexMode) -> u16 {
        if mode == IndexMode::None {
            return self.regs.hl();
        }
        let d = self.read_imm(bus) as i8;
        self.internal(5);
        let address = self.regs.index(mode).wrapping_add_signed(i16::from(d));
        self.regs.wz = address;
        address
    }

    fn jump_relative(&mut self, d: i8) {
        self.internal(5);
        self.regs.pc = self.regs.pc.wrapping_add_signed(i16::from(d));
        self.regs.wz = self.regs.pc;
    }

    pub(super) fn execute_main<B: IoBus>(&mut self, bus: &mut B, op: u8, mode: IndexMode) {
        let y = (op >> 3) & 7;
        let z = op & 7;
        let p = y >> 1;

        match op {
            // NOP
            0x00 => {}

            // EX AF,AF'
            0x08 => self.regs.exchange_af(),

            // DJNZ d
            0x10 => {
                self.internal(1);
                let d = self.read_imm(bus) as i8;
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.jump_relative(d);
                }
            }

            // JR d
            0x18 => {
                let d = self.read_imm(bus) as i8;
                self.jump_relative(d);
            }

            // JR cc,d
            0x20 | 0x28 | 0x30 | 0x38 => {
                let d = self.read_imm(bus) as i8;
                if self.condition(y - 4) {
                    self.jump_relative(d);
                }
            }

            // LD rr,nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let nn = self.read_imm16(bus);
                self.regs.set16(Reg16::from_code(p), mode, nn);
            }

            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let target = self.regs.index(mode);
                let operand = self.regs.get16(Reg16::from_code(p), mode);
                self.internal(7);
                let result = alu::add16(target, operand, self.regs.f);
                self.regs.wz = target.wrapping_add(1);
                self.regs.set_index(mode, result.value);
                self.set_f(result.flags);
            }

            // LD (BC),A / LD (DE),A
            0x02 | 0x12 => {
                let address = if op == 0x02 {
                    self.regs.bc()
                } else {
                    self.regs.de()
                };
                self.write_mem(bus, address, self.regs.a);
                self.regs.wz = u16::from(self.regs.a) << 8 | (address.wrapping_add(1) & 0xFF);
            }

            // LD A,(BC) / LD A,(DE)
            0x0A | 0x1A => {
                let address = if op == 0x0A {
                    self.regs.bc()
                } else {
                    self.regs.de()
                };
                self.regs.a = self.read_mem(bus, address);
                self.regs.wz = address.wrapping_add(1);
            }

            // LD (nn),HL
            0x22 => {
                let nn = self.read_imm16(bus);
                self.write_word(bus, nn, self.regs.index(mode));
                self.regs.wz = nn.wrapping_add(1);
            }

            // LD HL,(nn)
            0x2A => {
                let nn = self.read_imm16(bus);
                let value = self.read_word(bus, nn);
                self.regs.set_index(mode, value);
                self.regs.wz = nn.wrapping_add(1);
            }

            // LD (nn),A
            0x32 => {
                let nn = self.read_imm16(bus);
                self.write_mem(bus, nn, self.regs.a);
                self.regs.wz = u16::from(self.regs.a) << 8 | (nn.wrapping_add(1) & 0xFF);
            }

            // LD A,(nn)
            0x3A => {
                let nn = self.read_imm16(bus);
                self.regs.a = self.read_mem(bus, nn);
                self.regs.wz = nn.wrapping_add(1);
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 | 0x0B | 0x1B | 0x2B | 0x3B => {
                let reg = Reg16::from_code(p);
                let value = self.regs.get16(reg, mode);
                self.internal(2);
                let value = if y & 1 == 0 {
                    value.wrapping_add(1)
                } else {
                    value.wrapping_sub(1)
                };
                self.regs.set16(reg, mode, value);
            }

            // INC r / DEC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C | 0x05 | 0x0D | 0x15
            | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let step = |value: u8, f: u8| {
                    if z == 4 {
                        alu::inc8(value, f)
                    } else {
                        alu::dec8(value, f)
                    }
                };
                match Reg8::from_code(y) {
                    Some(reg) => {
                        let result = step(self.regs.get8(reg, mode), self.regs.f);
                        self.regs.set8(reg, mode, result.value);
                        self.set_f(result.flags);
                    }
                    None => {
                        let address = self.memory_operand(bus, mode);
                        let value = self.read_mem(bus, address);
                        self.internal(1);
                        let result = step(value, self.regs.f);
                        self.write_mem(bus, address, result.value);
                        self.set_f(result.flags);
                    }
                }
            }

            // LD r,n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => match Reg8::from_code(y) {
                Some(reg) => {
                    let n = self.read_imm(bus);
                    self.regs.set8(reg, mode, n);
                }
                None if mode == IndexMode::None => {
                    let n = self.read_imm(bus);
                    self.write_mem(bus, self.regs.hl(), n);
                }
                None => {
                    // LD (IX+d),n: the immediate overlaps the address calculation.
                    let d = self.read_imm(bus) as i8;
                    let n = self.read_imm(bus);
                    self.internal(2);
                    let address = self.regs.index(mode).wrapping_add_signed(i16::from(d));
                    self.regs.wz = address;
                    self.write_mem(bus, address, n);
                }
            },

            // RLCA / RRCA / RLA / RRA
            0x07 | 0x0F | 0x17 | 0x1F => {
                let result = alu::rotate_accumulator(y, self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // CPL
            0x2F => {
                self.regs.a = !self.regs.a;
                self.set_f(
                    (self.regs.f & (SF | ZF | PF | CF)) | HF | NF | (self.regs.a & (XF | YF)),
                );
            }

            // SCF
            0x37 => {
                let xy = ((self.prev_q ^ self.regs.f) | self.regs.a) & (XF | YF);
                self.set_f((self.regs.f & (SF | ZF | PF)) | CF | xy);
            }

            // CCF
            0x3F => {
                let xy = ((self.prev_q ^ self.regs.f) | self.regs.a) & (XF | YF);
                let old_carry = self.regs.f & CF;
                let h = if old_carry != 0 { HF } else { 0 };
                self.set_f((self.regs.f & (SF | ZF | PF)) | xy | h | (old_carry ^ CF));
            }

            // HALT
            0x76 => {
                self.regs.halted = true;
                log::trace!("HALT at {:04X}", self.regs.pc.wrapping_sub(1));
            }

            // LD r,r'
            0x40..=0x7F => match (Reg8::from_code(y), Reg8::from_code(z)) {
                (Some(dst), Some(src)) => {
                    let value = self.regs.get8(src, mode);
                    self.regs.set8(dst, mode, value);
                }
                // LD r,(HL): r is never redirected
                (Some(dst), None) => {
                    let address = self.memory_operand(bus, mode);
                    let value = self.read_mem(bus, address);
                    self.regs.set8(dst, IndexMode::None, value);
                }
                (None, Some(src)) => {
                    let address = self.memory_operand(bus, mode);
                    let value = self.regs.get8(src, IndexMode::None);
                    self.write_mem(bus, address, value);
                }
                (None, None) => unreachable!("0x76 is HALT"),
            },

            // ALU A,r
            0x80..=0xBF => {
                let operand = match Reg8::from_code(z) {
                    Some(reg) => self.regs.get8(reg, mode),
                    None => {
                        let address = self.memory_operand(bus, mode);
                        self.read_mem(bus, address)
                    }
                };
                self.accumulator(y, operand);
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.internal(1);
                if self.condition(y) {
                    self.regs.pc = self.pop(bus);
                    self.regs.wz = self.regs.pc;
                }
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop(bus);
                if p == 3 {
                    self.regs.set_af(value);
                } else {
                    self.regs.set16(Reg16::from_code(p), mode, value);
                }
            }

            // RET
            0xC9 => {
                self.regs.pc = self.pop(bus);
                self.regs.wz = self.regs.pc;
            }

            // EXX
            0xD9 => self.regs.exchange_all(),

            // JP (HL)
            0xE9 => self.regs.pc = self.regs.index(mode),

            // LD SP,HL
            0xF9 => {
                self.internal(2);
                self.regs.sp = self.regs.index(mode);
            }

            // JP cc,nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let nn = self.read_imm16(bus);
                self.regs.wz = nn;
                if self.condition(y) {
                    self.regs.pc = nn;
                }
            }

            // JP nn
            0xC3 => {
                let nn = self.read_imm16(bus);
                self.regs.wz = nn;
                self.regs.pc = nn;
            }

            // OUT (n),A
            0xD3 => {
                let n = self.read_imm(bus);
                let a = self.regs.a;
                self.port_out(bus, a, n, a);
                self.regs.wz = u16::from(a) << 8 | u16::from(n.wrapping_add(1));
            }

            // IN A,(n)
            0xDB => {
                let n = self.read_imm(bus);
                let port = u16::from(self.regs.a) << 8 | u16::from(n);
                self.regs.a = self.port_in(bus, self.regs.a, n);
                self.regs.wz = port.wrapping_add(1);
            }

            // EX (SP),HL
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read_word(bus, sp);
                self.internal(1);
                let [lo, hi] = self.regs.index(mode).to_le_bytes();
                self.write_mem(bus, sp.wrapping_add(1), hi);
                self.write_mem(bus, sp, lo);
                self.internal(2);
                self.regs.set_index(mode, value);
                self.regs.wz = value;
            }

            // EX DE,HL: never redirected
            0xEB => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }

            // DI
            0xF3 => {
                self.regs.iff1 = false;
                self.regs.iff2 = false;
            }

            // EI
            0xFB => {
                self.regs.iff1 = true;
                self.regs.iff2 = true;
                self.ei_shadow = true;
            }

            // CALL cc,nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let nn = self.read_imm16(bus);
                self.regs.wz = nn;
                if self.condition(y) {
                    self.internal(1);
                    self.push(bus, self.regs.pc);
                    self.regs.pc = nn;
                }
            }

            // PUSH rr
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                self.internal(1);
                let value = if p == 3 {
                    self.regs.af()
                } else {
                    self.regs.get16(Reg16::from_code(p), mode)
                };
                self.push(bus, value);
            }

            // CALL nn
            0xCD => {
                let nn = self.read_imm16(bus);
                self.internal(1);
                self.push(bus, self.regs.pc);
                self.regs.pc = nn;
                self.regs.wz = nn;
            }

            // ALU A,n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let n = self.read_imm(bus);
                self.accumulator(y, n);
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.internal(1);
                self.push(bus, self.regs.pc);
                self.regs.pc = u16::from(op & 0x38);
                self.regs.wz = self.regs.pc;
            }

            // Prefixes are consumed by the fetch loop.
            0xCB | 0xDD | 0xED | 0xFD => unreachable!("prefix {op:02X} dispatched as opcode"),
        }
    }

    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP A,operand.
    fn accumulator(&mut self, op: u8, operand: u8) {
        let result = alu::accumulator_op(op, self.regs.a, operand, self.regs.f);
        self.regs.a = result.value;
        self.set_f(result.flags);
    }
}
