//! Z80 flag register bits and precomputed flag tables.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - usually a copy of bit 5 of the result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - usually a copy of bit 3 of the result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

/// PF if the byte has even parity, else 0.
pub static PARITY: [u8; 256] = build_parity();

/// S, Z, Y and X for every byte value.
pub static SZ53: [u8; 256] = build_sz53();

/// S, Z, Y, X and parity for every byte value.
pub static SZ53P: [u8; 256] = build_sz53p();

const fn build_parity() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        if (i as u8).count_ones() % 2 == 0 {
            table[i] = PF;
        }
        i += 1;
    }
    table
}

const fn build_sz53() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let value = i as u8;
        let mut f = value & (SF | YF | XF);
        if value == 0 {
            f |= ZF;
        }
        table[i] = f;
        i += 1;
    }
    table
}

const fn build_sz53p() -> [u8; 256] {
    let parity = build_parity();
    let sz53 = build_sz53();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = sz53[i] | parity[i];
        i += 1;
    }
    table
}

/// S, Z, Y and X of a result byte.
#[inline]
#[must_use]
pub fn sz53(value: u8) -> u8 {
    SZ53[usize::from(value)]
}

/// S, Z, Y, X and parity of a result byte.
#[inline]
#[must_use]
pub fn sz53p(value: u8) -> u8 {
    SZ53P[usize::from(value)]
}

/// PF if `value` has even parity.
#[inline]
#[must_use]
pub fn parity(value: u8) -> u8 {
    PARITY[usize::from(value)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_table_matches_popcount() {
        for v in 0..=255u8 {
            let expected = if v.count_ones() % 2 == 0 { PF } else { 0 };
            assert_eq!(parity(v), expected, "parity of {v:#04X}");
        }
    }

    #[test]
    fn sz53p_samples() {
        assert_eq!(sz53p(0x00), ZF | PF);
        assert_eq!(sz53p(0x80), SF);
        assert_eq!(sz53p(0x28), YF | XF | PF);
        assert_eq!(sz53p(0xFF), SF | YF | XF | PF);
        assert_eq!(sz53(0x01), 0);
    }
}
