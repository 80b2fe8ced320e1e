//! ALU operations for the Z80.
//!
//! Every function is pure: operands and incoming flags in, result and
//! outgoing flags out. Half-carry and overflow come from XOR patterns of
//! the operands and the result.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, parity, sz53, sz53p};

/// Result of an 8-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Result of a 16-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult16 {
    pub value: u16,
    pub flags: u8,
}

/// ADD / ADC.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let sum = u16::from(a) + u16::from(b) + u16::from(carry);
    let value = sum as u8;
    let mut flags = sz53(value) | ((a ^ b ^ value) & HF);
    if (a ^ value) & (b ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if sum > 0xFF {
        flags |= CF;
    }
    AluResult { value, flags }
}

/// SUB / SBC.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let diff = u16::from(a)
        .wrapping_sub(u16::from(b))
        .wrapping_sub(u16::from(carry));
    let value = diff as u8;
    let mut flags = NF | sz53(value) | ((a ^ b ^ value) & HF);
    if (a ^ b) & (a ^ value) & 0x80 != 0 {
        flags |= PF;
    }
    if diff > 0xFF {
        flags |= CF;
    }
    AluResult { value, flags }
}

/// CP: a subtraction whose X/Y come from the operand, not the result.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let diff = sub8(a, b, false);
    AluResult {
        value: a,
        flags: (diff.flags & !(XF | YF)) | (b & (XF | YF)),
    }
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult {
        value,
        flags: sz53p(value) | HF,
    }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult {
        value,
        flags: sz53p(value),
    }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult {
        value,
        flags: sz53p(value),
    }
}

/// One of the eight accumulator operations selected by opcode bits 3-5:
/// ADD, ADC, SUB, SBC, AND, XOR, OR, CP.
#[must_use]
pub fn accumulator_op(op: u8, a: u8, operand: u8, f: u8) -> AluResult {
    let carry = f & CF != 0;
    match op & 7 {
        0 => add8(a, operand, false),
        1 => add8(a, operand, carry),
        2 => sub8(a, operand, false),
        3 => sub8(a, operand, carry),
        4 => and8(a, operand),
        5 => xor8(a, operand),
        6 => or8(a, operand),
        _ => cp8(a, operand),
    }
}

/// INC r. Carry is preserved from `f`.
#[must_use]
pub fn inc8(a: u8, f: u8) -> AluResult {
    let value = a.wrapping_add(1);
    let mut flags = (f & CF) | sz53(value) | ((a ^ value) & HF);
    if a == 0x7F {
        flags |= PF;
    }
    AluResult { value, flags }
}

/// DEC r. Carry is preserved from `f`.
#[must_use]
pub fn dec8(a: u8, f: u8) -> AluResult {
    let value = a.wrapping_sub(1);
    let mut flags = (f & CF) | NF | sz53(value) | ((a ^ value) & HF);
    if a == 0x80 {
        flags |= PF;
    }
    AluResult { value, flags }
}

/// CB-prefixed rotate/shift selected by opcode bits 3-5:
/// RLC, RRC, RL, RR, SLA, SRA, SLL, SRL.
///
/// Flags are fully recomputed from the shifted result.
#[must_use]
pub fn rotate_shift(op: u8, value: u8, carry_in: bool) -> AluResult {
    let (result, carry_out) = match op & 7 {
        0 => (value.rotate_left(1), value & 0x80 != 0),
        1 => (value.rotate_right(1), value & 0x01 != 0),
        2 => (value << 1 | u8::from(carry_in), value & 0x80 != 0),
        3 => (value >> 1 | u8::from(carry_in) << 7, value & 0x01 != 0),
        4 => (value << 1, value & 0x80 != 0),
        5 => (value >> 1 | (value & 0x80), value & 0x01 != 0),
        // SLL shifts a 1 into bit 0
        6 => (value << 1 | 1, value & 0x80 != 0),
        _ => (value >> 1, value & 0x01 != 0),
    };
    AluResult {
        value: result,
        flags: sz53p(result) | if carry_out { CF } else { 0 },
    }
}

/// RLCA, RRCA, RLA, RRA selected by opcode bits 3-4.
///
/// S, Z and P/V are kept; H and N are cleared; X/Y come from the result.
#[must_use]
pub fn rotate_accumulator(op: u8, a: u8, f: u8) -> AluResult {
    let shifted = rotate_shift(op & 3, a, f & CF != 0);
    AluResult {
        value: shifted.value,
        flags: (f & (SF | ZF | PF)) | (shifted.value & (XF | YF)) | (shifted.flags & CF),
    }
}

/// ADD HL,rr (and IX/IY). S, Z and P/V are kept from `f`.
#[must_use]
pub fn add16(a: u16, b: u16, f: u8) -> AluResult16 {
    let sum = u32::from(a) + u32::from(b);
    let value = sum as u16;
    let high = (value >> 8) as u8;
    let mut flags = (f & (SF | ZF | PF)) | (high & (XF | YF));
    flags |= ((a ^ b ^ value) >> 8) as u8 & HF;
    if sum > 0xFFFF {
        flags |= CF;
    }
    AluResult16 { value, flags }
}

/// ADC HL,rr.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> AluResult16 {
    let sum = u32::from(a) + u32::from(b) + u32::from(carry);
    let value = sum as u16;
    let mut flags = sz53((value >> 8) as u8) & !ZF;
    if value == 0 {
        flags |= ZF;
    }
    flags |= ((a ^ b ^ value) >> 8) as u8 & HF;
    if (a ^ value) & (b ^ value) & 0x8000 != 0 {
        flags |= PF;
    }
    if sum > 0xFFFF {
        flags |= CF;
    }
    AluResult16 { value, flags }
}

/// SBC HL,rr.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> AluResult16 {
    let diff = u32::from(a)
        .wrapping_sub(u32::from(b))
        .wrapping_sub(u32::from(carry));
    let value = diff as u16;
    let mut flags = NF | (sz53((value >> 8) as u8) & !ZF);
    if value == 0 {
        flags |= ZF;
    }
    flags |= ((a ^ b ^ value) >> 8) as u8 & HF;
    if (a ^ b) & (a ^ value) & 0x8000 != 0 {
        flags |= PF;
    }
    if diff > 0xFFFF {
        flags |= CF;
    }
    AluResult16 { value, flags }
}

/// DAA: BCD-correct A after an addition or subtraction.
///
/// The correction is 0x06 for the low digit and 0x60 for the high digit,
/// applied in the direction given by N. The new H depends on N too.
#[must_use]
pub fn daa(a: u8, f: u8) -> AluResult {
    let subtract = f & NF != 0;
    let half = f & HF != 0;
    let mut carry = f & CF != 0;

    let mut correction = 0u8;
    if half || a & 0x0F > 9 {
        correction |= 0x06;
    }
    if carry || a > 0x99 {
        correction |= 0x60;
        carry = true;
    }

    let value = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let new_half = if subtract {
        half && a & 0x0F < 6
    } else {
        a & 0x0F > 9
    };

    let mut flags = sz53p(value) | (f & NF);
    if carry {
        flags |= CF;
    }
    if new_half {
        flags |= HF;
    }
    AluResult { value, flags }
}

/// BIT n: Z and P/V from the tested bit, S only for bit 7. X/Y come from
/// `xy_source`, which the caller picks per addressing mode.
#[must_use]
pub fn bit(n: u8, value: u8, xy_source: u8, f: u8) -> u8 {
    let tested = value & (1 << (n & 7));
    let mut flags = (f & CF) | HF | (xy_source & (XF | YF));
    if tested == 0 {
        flags |= ZF | PF;
    }
    flags |= tested & SF;
    flags
}

/// Flags after LDI/LDD. X is bit 3 and Y is bit 1 of `value + A`.
#[must_use]
pub fn block_load_flags(f: u8, a: u8, value: u8, bc_nonzero: bool) -> u8 {
    let n = value.wrapping_add(a);
    let mut flags = (f & (SF | ZF | CF)) | (n & XF) | ((n & 0x02) << 4);
    if bc_nonzero {
        flags |= PF;
    }
    flags
}

/// Flags after CPI/CPD. X/Y come from `A - value - H`.
#[must_use]
pub fn block_compare_flags(f: u8, a: u8, value: u8, bc_nonzero: bool) -> u8 {
    let result = a.wrapping_sub(value);
    let half = (a ^ value ^ result) & HF;
    let n = result.wrapping_sub(half >> 4);
    let mut flags = (f & CF) | NF | half | (sz53(result) & (SF | ZF));
    flags |= (n & XF) | ((n & 0x02) << 4);
    if bc_nonzero {
        flags |= PF;
    }
    flags
}

/// Flags after INI/IND/OUTI/OUTD.
///
/// `k` is the transferred byte plus the adjusted C (input) or the new L
/// (output). `b` is B after the decrement.
#[must_use]
pub fn block_io_flags(value: u8, k: u16, b: u8) -> u8 {
    let mut flags = sz53(b);
    if value & 0x80 != 0 {
        flags |= NF;
    }
    if k > 0xFF {
        flags |= HF | CF;
    }
    flags | parity((k as u8 & 7) ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_half_carry_and_overflow() {
        let r = add8(0x0F, 0x01, false);
        assert_eq!(r.value, 0x10);
        assert_eq!(r.flags, HF);

        let r = add8(0x7F, 0x01, false);
        assert_eq!(r.value, 0x80);
        assert_eq!(r.flags, SF | HF | PF);

        let r = add8(0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | HF | CF);
    }

    #[test]
    fn sub_borrow_and_overflow() {
        let r = sub8(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert_eq!(r.flags, SF | YF | HF | XF | NF | CF);

        let r = sub8(0x80, 0x01, false);
        assert_eq!(r.value, 0x7F);
        assert_eq!(r.flags & (PF | CF), PF);

        let r = sub8(0x10, 0x0F, true);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags & (ZF | CF | NF), ZF | NF);
    }

    #[test]
    fn add_then_sub_restores_accumulator() {
        for a in 0..=255u8 {
            for b in (0..=255u8).step_by(7) {
                let sum = add8(a, b, false);
                let back = sub8(sum.value, b, false);
                assert_eq!(back.value, a);
                assert_ne!(back.flags & NF, 0);
                // the subtraction borrows exactly when the addition carried
                assert_eq!(back.flags & CF, sum.flags & CF);
            }
        }
    }

    #[test]
    fn cp_takes_undocumented_bits_from_operand() {
        let r = cp8(0x00, 0x28);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags & (XF | YF), XF | YF);
        assert_ne!(r.flags & CF, 0);
    }

    #[test]
    fn inc_dec_keep_carry() {
        let r = inc8(0x7F, CF);
        assert_eq!(r.value, 0x80);
        assert_eq!(r.flags, SF | HF | PF | CF);

        let r = dec8(0x01, 0);
        assert_eq!(r.flags, ZF | NF);

        let r = dec8(0x80, 0);
        assert_eq!(r.value, 0x7F);
        assert_eq!(r.flags, YF | HF | XF | PF | NF);
    }

    #[test]
    fn daa_after_9a_wraps_to_zero() {
        let r = daa(0x9A, 0);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | HF | PF | CF);
    }

    #[test]
    fn daa_after_subtraction() {
        // 0x10 - 0x01 = 0x0F with H set
        let sub = sub8(0x10, 0x01, false);
        let r = daa(sub.value, sub.flags);
        assert_eq!(r.value, 0x09);
        assert_ne!(r.flags & NF, 0);
        assert_eq!(r.flags & CF, 0);
    }

    #[test]
    fn rotate_accumulator_touches_only_h_n_c() {
        let r = rotate_accumulator(0, 0x55, HF | NF);
        assert_eq!(r.value, 0xAA);
        assert_eq!(r.flags & (SF | ZF | HF | PF | NF | CF), 0);

        let r = rotate_accumulator(3, 0x01, SF | ZF);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, SF | ZF | CF);
    }

    #[test]
    fn shifts() {
        assert_eq!(rotate_shift(6, 0x80, false), AluResult { value: 0x01, flags: CF });
        assert_eq!(rotate_shift(5, 0x81, false).value, 0xC0);
        assert_eq!(rotate_shift(7, 0x01, false).flags, ZF | PF | CF);
        assert_eq!(rotate_shift(2, 0x00, true).value, 0x01);
    }

    #[test]
    fn sixteen_bit_arithmetic() {
        let r = add16(0x0FFF, 0x0001, SF | ZF);
        assert_eq!(r.value, 0x1000);
        assert_eq!(r.flags, SF | ZF | HF);

        let r = adc16(0x7FFF, 0x0000, true);
        assert_eq!(r.value, 0x8000);
        assert_eq!(r.flags, SF | HF | PF);

        let r = sbc16(0x0000, 0x0000, true);
        assert_eq!(r.value, 0xFFFF);
        assert_eq!(r.flags, SF | YF | HF | XF | NF | CF);

        let r = sbc16(0x1234, 0x1234, false);
        assert_eq!(r.flags, ZF | NF);
    }

    #[test]
    fn bit_flags() {
        assert_eq!(bit(0, 0x00, 0x00, CF), ZF | HF | PF | CF);
        assert_eq!(bit(7, 0x80, 0x28, 0), SF | HF | YF | XF);
    }

    #[test]
    fn block_flag_derivations() {
        // value + A = 0x0A: bit 3 -> X, bit 1 -> Y
        assert_eq!(block_load_flags(0, 0x05, 0x05, true), XF | YF | PF);
        assert_eq!(block_load_flags(CF | ZF, 0, 0, false), CF | ZF);

        let f = block_compare_flags(0, 0x10, 0x10, false);
        assert_eq!(f, ZF | NF);

        // INI with k overflowing: H and C set
        let f = block_io_flags(0x80, 0x100, 0x00);
        assert_eq!(f & (NF | HF | CF | ZF), NF | HF | CF | ZF);
    }
}
