//! Z80 disassembler.
//!
//! Decodes one instruction from any [`Peek`] memory view without side
//! effects. Covers the same opcode space as the executor, undocumented
//! forms included.

use emu_core::Peek;

use crate::registers::IndexMode;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Mnemonic with operands (e.g. "LD A,(IX+5)").
    pub text: String,
    /// Instruction length in bytes, prefixes included.
    pub length: u16,
}

const CONDITIONS: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];
const ALU_OPS: [&str; 8] = [
    "ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP ",
];
const SHIFTS: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];
const ACCUMULATOR_OPS: [&str; 8] = ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"];
const BLOCK_OPS: [[&str; 4]; 4] = [
    ["LDI", "CPI", "INI", "OUTI"],
    ["LDD", "CPD", "IND", "OUTD"],
    ["LDIR", "CPIR", "INIR", "OTIR"],
    ["LDDR", "CPDR", "INDR", "OTDR"],
];

/// Decode the instruction at `address`.
pub fn disassemble<M: Peek + ?Sized>(memory: &M, address: u16) -> Disassembly {
    let mut cursor = Cursor {
        memory,
        address,
        length: 0,
    };
    let op = cursor.byte();
    let text = match op {
        0xDD | 0xFD => {
            let mode = if op == 0xDD {
                IndexMode::Ix
            } else {
                IndexMode::Iy
            };
            match memory.peek(address.wrapping_add(1)) {
                // Another prefix follows: this one is spent as a NOP.
                0xDD | 0xFD => "NOP".to_string(),
                0xED => {
                    cursor.byte();
                    decode_ed(&mut cursor)
                }
                0xCB => {
                    cursor.byte();
                    decode_indexed_cb(&mut cursor, mode)
                }
                _ => {
                    let op = cursor.byte();
                    decode_main(&mut cursor, op, mode)
                }
            }
        }
        0xED => decode_ed(&mut cursor),
        0xCB => decode_cb(&mut cursor),
        _ => decode_main(&mut cursor, op, IndexMode::None),
    };
    Disassembly {
        text,
        length: cursor.length,
    }
}

struct Cursor<'a, M: Peek + ?Sized> {
    memory: &'a M,
    address: u16,
    length: u16,
}

impl<M: Peek + ?Sized> Cursor<'_, M> {
    fn byte(&mut self) -> u8 {
        let value = self.memory.peek(self.address.wrapping_add(self.length));
        self.length += 1;
        value
    }

    fn word(&mut self) -> u16 {
        let lo = self.byte();
        let hi = self.byte();
        u16::from_le_bytes([lo, hi])
    }

    /// Absolute target of a relative jump whose displacement is next.
    fn relative_target(&mut self) -> u16 {
        let d = self.byte() as i8;
        self.address
            .wrapping_add(self.length)
            .wrapping_add_signed(i16::from(d))
    }
}

fn index_name(mode: IndexMode) -> &'static str {
    match mode {
        IndexMode::None => "HL",
        IndexMode::Ix => "IX",
        IndexMode::Iy => "IY",
    }
}

/// Register name for a 3-bit field other than 6.
fn reg8_name(code: u8, mode: IndexMode) -> &'static str {
    match (code & 7, mode) {
        (0, _) => "B",
        (1, _) => "C",
        (2, _) => "D",
        (3, _) => "E",
        (4, IndexMode::None) => "H",
        (5, IndexMode::None) => "L",
        (4, IndexMode::Ix) => "IXH",
        (5, IndexMode::Ix) => "IXL",
        (4, IndexMode::Iy) => "IYH",
        (5, IndexMode::Iy) => "IYL",
        _ => "A",
    }
}

fn indexed(mode: IndexMode, d: i8) -> String {
    format!("({}{:+})", index_name(mode), d)
}

/// (HL), or (IX+d)/(IY+d) with the displacement taken from the stream.
fn memory_operand<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>, mode: IndexMode) -> String {
    if mode == IndexMode::None {
        "(HL)".to_string()
    } else {
        let d = cursor.byte() as i8;
        indexed(mode, d)
    }
}

/// 8-bit operand for a register field, reading a displacement for code 6.
fn operand<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>, code: u8, mode: IndexMode) -> String {
    if code & 7 == 6 {
        memory_operand(cursor, mode)
    } else {
        reg8_name(code, mode).to_string()
    }
}

/// BC, DE, HL/IX/IY, SP.
fn pair_name(p: u8, mode: IndexMode) -> &'static str {
    match p & 3 {
        0 => "BC",
        1 => "DE",
        2 => index_name(mode),
        _ => "SP",
    }
}

/// BC, DE, HL/IX/IY, AF (PUSH/POP).
fn stack_pair_name(p: u8, mode: IndexMode) -> &'static str {
    if p & 3 == 3 { "AF" } else { pair_name(p, mode) }
}

fn decode_main<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>, op: u8, mode: IndexMode) -> String {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let hl = index_name(mode);

    match (x, z) {
        (0, 0) => match y {
            0 => "NOP".to_string(),
            1 => "EX AF,AF'".to_string(),
            2 => format!("DJNZ 0x{:04X}", cursor.relative_target()),
            3 => format!("JR 0x{:04X}", cursor.relative_target()),
            _ => format!(
                "JR {},0x{:04X}",
                CONDITIONS[usize::from(y - 4)],
                cursor.relative_target()
            ),
        },
        (0, 1) if y & 1 == 0 => format!("LD {},0x{:04X}", pair_name(p, mode), cursor.word()),
        (0, 1) => format!("ADD {hl},{}", pair_name(p, mode)),
        (0, 2) => match y {
            0 => "LD (BC),A".to_string(),
            1 => "LD A,(BC)".to_string(),
            2 => "LD (DE),A".to_string(),
            3 => "LD A,(DE)".to_string(),
            4 => format!("LD (0x{:04X}),{hl}", cursor.word()),
            5 => format!("LD {hl},(0x{:04X})", cursor.word()),
            6 => format!("LD (0x{:04X}),A", cursor.word()),
            _ => format!("LD A,(0x{:04X})", cursor.word()),
        },
        (0, 3) if y & 1 == 0 => format!("INC {}", pair_name(p, mode)),
        (0, 3) => format!("DEC {}", pair_name(p, mode)),
        (0, 4) => format!("INC {}", operand(cursor, y, mode)),
        (0, 5) => format!("DEC {}", operand(cursor, y, mode)),
        (0, 6) => {
            let target = operand(cursor, y, mode);
            format!("LD {target},0x{:02X}", cursor.byte())
        }
        (0, _) => ACCUMULATOR_OPS[usize::from(y)].to_string(),

        (1, _) if y == 6 && z == 6 => "HALT".to_string(),
        (1, _) if z == 6 => format!(
            "LD {},{}",
            reg8_name(y, IndexMode::None),
            memory_operand(cursor, mode)
        ),
        (1, _) if y == 6 => format!(
            "LD {},{}",
            memory_operand(cursor, mode),
            reg8_name(z, IndexMode::None)
        ),
        (1, _) => format!("LD {},{}", reg8_name(y, mode), reg8_name(z, mode)),

        (2, _) => format!("{}{}", ALU_OPS[usize::from(y)], operand(cursor, z, mode)),

        (_, 0) => format!("RET {}", CONDITIONS[usize::from(y)]),
        (_, 1) => match y {
            1 => "RET".to_string(),
            3 => "EXX".to_string(),
            5 => format!("JP ({hl})"),
            7 => format!("LD SP,{hl}"),
            _ => format!("POP {}", stack_pair_name(p, mode)),
        },
        (_, 2) => format!("JP {},0x{:04X}", CONDITIONS[usize::from(y)], cursor.word()),
        (_, 3) => match y {
            0 => format!("JP 0x{:04X}", cursor.word()),
            2 => format!("OUT (0x{:02X}),A", cursor.byte()),
            3 => format!("IN A,(0x{:02X})", cursor.byte()),
            4 => format!("EX (SP),{hl}"),
            5 => "EX DE,HL".to_string(),
            6 => "DI".to_string(),
            7 => "EI".to_string(),
            // CB is decoded by the caller
            _ => "NOP".to_string(),
        },
        (_, 4) => format!("CALL {},0x{:04X}", CONDITIONS[usize::from(y)], cursor.word()),
        (_, 5) if y & 1 == 0 => format!("PUSH {}", stack_pair_name(p, mode)),
        (_, 5) if y == 1 => format!("CALL 0x{:04X}", cursor.word()),
        // DD, ED, FD are decoded by the caller
        (_, 5) => "NOP".to_string(),
        (_, 6) => format!("{}0x{:02X}", ALU_OPS[usize::from(y)], cursor.byte()),
        _ => format!("RST {:02X}h", y * 8),
    }
}

fn bit_mnemonic(op: u8, target: &str) -> String {
    let y = (op >> 3) & 7;
    match op >> 6 {
        0 => format!("{} {target}", SHIFTS[usize::from(y)]),
        1 => format!("BIT {y},{target}"),
        2 => format!("RES {y},{target}"),
        _ => format!("SET {y},{target}"),
    }
}

fn decode_cb<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>) -> String {
    let op = cursor.byte();
    let target = operand(cursor, op & 7, IndexMode::None);
    bit_mnemonic(op, &target)
}

fn decode_indexed_cb<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>, mode: IndexMode) -> String {
    let d = cursor.byte() as i8;
    let op = cursor.byte();
    let target = indexed(mode, d);
    let text = bit_mnemonic(op, &target);
    // Non-BIT forms with a register field also store to that register.
    if op >> 6 != 1 && op & 7 != 6 {
        format!("{text},{}", reg8_name(op, IndexMode::None))
    } else {
        text
    }
}

fn decode_ed<M: Peek + ?Sized>(cursor: &mut Cursor<'_, M>) -> String {
    let op = cursor.byte();
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;

    if x == 2 && y >= 4 && z <= 3 {
        return BLOCK_OPS[usize::from(y - 4)][usize::from(z)].to_string();
    }
    if x != 1 {
        return "NOP".to_string();
    }

    let pair = pair_name(p, IndexMode::None);
    match z {
        0 if y == 6 => "IN F,(C)".to_string(),
        0 => format!("IN {},(C)", reg8_name(y, IndexMode::None)),
        1 if y == 6 => "OUT (C),0".to_string(),
        1 => format!("OUT (C),{}", reg8_name(y, IndexMode::None)),
        2 if y & 1 == 0 => format!("SBC HL,{pair}"),
        2 => format!("ADC HL,{pair}"),
        3 if y & 1 == 0 => format!("LD (0x{:04X}),{pair}", cursor.word()),
        3 => format!("LD {pair},(0x{:04X})", cursor.word()),
        4 => "NEG".to_string(),
        5 if y == 1 => "RETI".to_string(),
        5 => "RETN".to_string(),
        6 => {
            let mode = match y & 3 {
                2 => 1,
                3 => 2,
                _ => 0,
            };
            format!("IM {mode}")
        }
        _ => match y {
            0 => "LD I,A".to_string(),
            1 => "LD R,A".to_string(),
            2 => "LD A,I".to_string(),
            3 => "LD A,R".to_string(),
            4 => "RRD".to_string(),
            5 => "RLD".to_string(),
            _ => "NOP".to_string(),
        },
    }
}
