//! Flat CPU state record for save states and test assertions.

use crate::registers::Registers;

/// Externally visible CPU state, as carried by snapshot formats.
///
/// Converting to and from the live register file is lossless for every
/// field listed here. Internal state (WZ, HALT, the EI shadow) is not
/// part of the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuState {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,
    pub im: u8,
    pub iff1: bool,
    pub iff2: bool,
}

impl CpuState {
    pub(crate) fn capture(regs: &Registers) -> Self {
        Self {
            af: regs.af(),
            bc: regs.bc(),
            de: regs.de(),
            hl: regs.hl(),
            af_alt: regs.af_alt(),
            bc_alt: regs.bc_alt(),
            de_alt: regs.de_alt(),
            hl_alt: regs.hl_alt(),
            ix: regs.ix,
            iy: regs.iy,
            sp: regs.sp,
            pc: regs.pc,
            i: regs.i,
            r: regs.r,
            im: regs.im,
            iff1: regs.iff1,
            iff2: regs.iff2,
        }
    }

    pub(crate) fn apply(&self, regs: &mut Registers) {
        regs.set_af(self.af);
        regs.set_bc(self.bc);
        regs.set_de(self.de);
        regs.set_hl(self.hl);
        regs.set_af_alt(self.af_alt);
        regs.set_bc_alt(self.bc_alt);
        regs.set_de_alt(self.de_alt);
        regs.set_hl_alt(self.hl_alt);
        regs.ix = self.ix;
        regs.iy = self.iy;
        regs.sp = self.sp;
        regs.pc = self.pc;
        regs.i = self.i;
        regs.r = self.r;
        // only modes 0-2 exist
        regs.im = self.im.min(2);
        regs.iff1 = self.iff1;
        regs.iff2 = self.iff2;
    }
}
