//! Z80 register file and operand selectors.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

/// Which register the H/L-derived operands of the current instruction use.
///
/// Set by a DD (IX) or FD (IY) prefix and passed into every decode step.
/// Only H, L, (HL) and HL are redirected; A, B, C, D, E and the other pairs
/// are unaffected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexMode {
    #[default]
    None,
    Ix,
    Iy,
}

/// 8-bit register operand as encoded in opcode bits (code 6 is (HL), not a register).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
}

impl Reg8 {
    /// Decode a 3-bit register field. Returns `None` for 6, the memory operand.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code & 7 {
            0 => Some(Self::B),
            1 => Some(Self::C),
            2 => Some(Self::D),
            3 => Some(Self::E),
            4 => Some(Self::H),
            5 => Some(Self::L),
            7 => Some(Self::A),
            _ => None,
        }
    }
}

/// 16-bit register pair operand as encoded in opcode bits 4-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Bc,
    De,
    Hl,
    Sp,
}

impl Reg16 {
    /// Decode a 2-bit pair field (BC, DE, HL, SP).
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => Self::Bc,
            1 => Self::De,
            2 => Self::Hl,
            _ => Self::Sp,
        }
    }
}

/// Complete Z80 register file, including shadow bank and interrupt state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    /// Refresh counter. Fetches advance bits 0-6 only.
    pub r: u8,

    /// WZ/MEMPTR. Leaks into the X/Y flags of BIT n,(HL).
    pub wz: u16,

    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
}

#[inline]
const fn pair(hi: u8, lo: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        pair(self.a, self.f)
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        pair(self.b, self.c)
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        pair(self.d, self.e)
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        pair(self.h, self.l)
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    #[must_use]
    pub const fn af_alt(&self) -> u16 {
        pair(self.a_alt, self.f_alt)
    }

    #[must_use]
    pub const fn bc_alt(&self) -> u16 {
        pair(self.b_alt, self.c_alt)
    }

    #[must_use]
    pub const fn de_alt(&self) -> u16 {
        pair(self.d_alt, self.e_alt)
    }

    #[must_use]
    pub const fn hl_alt(&self) -> u16 {
        pair(self.h_alt, self.l_alt)
    }

    pub fn set_af_alt(&mut self, value: u16) {
        self.a_alt = (value >> 8) as u8;
        self.f_alt = value as u8;
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        self.b_alt = (value >> 8) as u8;
        self.c_alt = value as u8;
    }

    pub fn set_de_alt(&mut self, value: u16) {
        self.d_alt = (value >> 8) as u8;
        self.e_alt = value as u8;
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        self.h_alt = (value >> 8) as u8;
        self.l_alt = value as u8;
    }

    /// HL, IX or IY depending on the index mode.
    #[must_use]
    pub const fn index(&self, mode: IndexMode) -> u16 {
        match mode {
            IndexMode::None => self.hl(),
            IndexMode::Ix => self.ix,
            IndexMode::Iy => self.iy,
        }
    }

    pub fn set_index(&mut self, mode: IndexMode, value: u16) {
        match mode {
            IndexMode::None => self.set_hl(value),
            IndexMode::Ix => self.ix = value,
            IndexMode::Iy => self.iy = value,
        }
    }

    /// Read an 8-bit register. H and L follow the index mode.
    #[must_use]
    pub const fn get8(&self, reg: Reg8, mode: IndexMode) -> u8 {
        match reg {
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => (self.index(mode) >> 8) as u8,
            Reg8::L => self.index(mode) as u8,
            Reg8::A => self.a,
        }
    }

    /// Write an 8-bit register. H and L follow the index mode.
    pub fn set8(&mut self, reg: Reg8, mode: IndexMode, value: u8) {
        match reg {
            Reg8::B => self.b = value,
            Reg8::C => self.c = value,
            Reg8::D => self.d = value,
            Reg8::E => self.e = value,
            Reg8::H => {
                let lo = self.index(mode) & 0x00FF;
                self.set_index(mode, u16::from(value) << 8 | lo);
            }
            Reg8::L => {
                let hi = self.index(mode) & 0xFF00;
                self.set_index(mode, hi | u16::from(value));
            }
            Reg8::A => self.a = value,
        }
    }

    /// Read a register pair. HL follows the index mode.
    #[must_use]
    pub const fn get16(&self, reg: Reg16, mode: IndexMode) -> u16 {
        match reg {
            Reg16::Bc => self.bc(),
            Reg16::De => self.de(),
            Reg16::Hl => self.index(mode),
            Reg16::Sp => self.sp,
        }
    }

    /// Write a register pair. HL follows the index mode.
    pub fn set16(&mut self, reg: Reg16, mode: IndexMode, value: u16) {
        match reg {
            Reg16::Bc => self.set_bc(value),
            Reg16::De => self.set_de(value),
            Reg16::Hl => self.set_index(mode, value),
            Reg16::Sp => self.sp = value,
        }
    }

    /// EX AF,AF'
    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_alt);
        std::mem::swap(&mut self.f, &mut self.f_alt);
    }

    /// EXX: swap BC, DE and HL with their shadows.
    pub fn exchange_all(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_alt);
        std::mem::swap(&mut self.c, &mut self.c_alt);
        std::mem::swap(&mut self.d, &mut self.d_alt);
        std::mem::swap(&mut self.e, &mut self.e_alt);
        std::mem::swap(&mut self.h, &mut self.h_alt);
        std::mem::swap(&mut self.l, &mut self.l_alt);
    }

    /// Advance the low seven bits of R, keeping bit 7.
    pub fn increment_r(&mut self, count: u8) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(count) & 0x7F);
    }
}
