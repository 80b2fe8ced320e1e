//! Z80 CPU: run loop, bus cycles and interrupt acknowledge.
//!
//! Instructions execute whole. Each machine cycle charges its T-states to
//! the clock as it happens (opcode fetch 4, memory 3, port 4, internal n),
//! and the bus sees the clock before the cycle's cost is added so a
//! contended memory can insert its wait states at the true frame position.

mod cb;
mod ed;
mod execute;

use emu_core::{Bus, Cpu, IoBus, Observable, TStates, Value};

use crate::config::{Im0Mode, Z80Config};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::registers::{IndexMode, Registers};
use crate::state::CpuState;

/// Zilog Z80 CPU.
pub struct Z80 {
    regs: Registers,
    clock: TStates,
    config: Z80Config,

    /// INT line and the byte the interrupting device drives onto the bus.
    int_line: Option<u8>,
    nmi_pending: bool,
    /// Set by EI; blocks INT acceptance at the next boundary.
    ei_shadow: bool,

    /// Flags written by the current instruction, or 0.
    q: u8,
    /// Q of the previous instruction. Feeds SCF/CCF X/Y.
    prev_q: u8,
}

impl Z80 {
    /// A CPU in its power-on state with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Z80Config::default())
    }

    /// A CPU in its power-on state with the given configuration.
    #[must_use]
    pub fn with_config(config: Z80Config) -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            clock: TStates::new(),
            config,
            int_line: None,
            nmi_pending: false,
            ei_shadow: false,
            q: 0,
            prev_q: 0,
        };
        cpu.power_on();
        cpu
    }

    fn power_on(&mut self) {
        self.regs.set_af(self.config.power_on_af);
        self.regs.sp = self.config.power_on_sp;
        self.regs.pc = 0;
        self.regs.i = 0;
        self.regs.r = 0;
        self.regs.wz = 0;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.im = 0;
        self.regs.halted = false;
        self.int_line = None;
        self.nmi_pending = false;
        self.ei_shadow = false;
        self.q = 0;
        self.prev_q = 0;
    }

    /// The configuration this CPU was built with.
    #[must_use]
    pub fn config(&self) -> &Z80Config {
        &self.config
    }

    /// Programmer-visible registers, plus WZ, IFF1/IFF2, IM and HALT.
    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// The T-state counter charged by every bus cycle.
    #[must_use]
    pub fn clock(&self) -> &TStates {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut TStates {
        &mut self.clock
    }

    /// The internal WZ register.
    #[must_use]
    pub fn memptr(&self) -> u16 {
        self.regs.wz
    }

    /// Deassert the INT line without servicing it.
    pub fn clear_interrupt(&mut self) {
        self.int_line = None;
    }

    /// True while the INT line is asserted.
    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        self.int_line.is_some()
    }

    /// Snapshot of the externally visible register state.
    #[must_use]
    pub fn state(&self) -> CpuState {
        CpuState::capture(&self.regs)
    }

    /// Load a snapshot. Clears HALT and the EI shadow.
    pub fn set_state(&mut self, state: &CpuState) {
        state.apply(&mut self.regs);
        self.regs.halted = false;
        self.ei_shadow = false;
        self.q = 0;
        self.prev_q = 0;
        log::debug!(
            "state restored: PC={:04X} SP={:04X} IM{} IFF1={}",
            state.pc,
            state.sp,
            state.im,
            state.iff1
        );
    }

    // === Bus cycles ===

    /// M1: opcode fetch. 4 T-states, advances R.
    fn fetch_opcode<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let op = bus.read(self.regs.pc, &mut self.clock);
        self.clock.add(4);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.regs.increment_r(1);
        op
    }

    fn read_mem<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        let value = bus.read(address, &mut self.clock);
        self.clock.add(3);
        value
    }

    fn write_mem<B: Bus>(&mut self, bus: &mut B, address: u16, value: u8) {
        bus.write(address, value, &mut self.clock);
        self.clock.add(3);
    }

    fn read_word<B: Bus>(&mut self, bus: &mut B, address: u16) -> u16 {
        let lo = self.read_mem(bus, address);
        let hi = self.read_mem(bus, address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write_word<B: Bus>(&mut self, bus: &mut B, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_mem(bus, address, lo);
        self.write_mem(bus, address.wrapping_add(1), hi);
    }

    fn read_imm<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = self.read_mem(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn read_imm16<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.read_imm(bus);
        let hi = self.read_imm(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn port_in<B: IoBus>(&mut self, bus: &mut B, high: u8, low: u8) -> u8 {
        let value = bus.read_port(high, low, &mut self.clock);
        self.clock.add(4);
        value
    }

    fn port_out<B: IoBus>(&mut self, bus: &mut B, high: u8, low: u8, value: u8) {
        bus.write_port(high, low, value, &mut self.clock);
        self.clock.add(4);
    }

    fn internal(&mut self, cycles: u32) {
        self.clock.add(cycles);
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_mem(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write_mem(bus, self.regs.sp, lo);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.read_mem(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read_mem(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    // === Flags ===

    /// Write F from an instruction that computes flags.
    fn set_f(&mut self, flags: u8) {
        self.regs.f = flags;
        self.q = flags;
    }

    fn flag(&self, mask: u8) -> bool {
        self.regs.f & mask != 0
    }

    /// Condition code from opcode bits 3-5: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, cc: u8) -> bool {
        let (mask, expect_set) = match cc & 7 {
            0 => (ZF, false),
            1 => (ZF, true),
            2 => (CF, false),
            3 => (CF, true),
            4 => (PF, false),
            5 => (PF, true),
            6 => (SF, false),
            _ => (SF, true),
        };
        self.flag(mask) == expect_set
    }

    // === Instruction boundary ===

    /// Execute one instruction including all of its prefixes.
    ///
    /// A run of DD/FD bytes costs 4 T-states and one R increment each; only
    /// the last one selects the index register.
    fn execute_instruction<B: IoBus>(&mut self, bus: &mut B) {
        self.prev_q = self.q;
        self.q = 0;
        let mut mode = IndexMode::None;

        loop {
            let op = self.fetch_opcode(bus);
            match op {
                0xDD => mode = IndexMode::Ix,
                0xFD => mode = IndexMode::Iy,
                0xCB => {
                    match mode {
                        IndexMode::None => self.execute_cb(bus),
                        _ => self.execute_indexed_cb(bus, mode),
                    }
                    return;
                }
                0xED => {
                    self.execute_ed(bus);
                    return;
                }
                _ => {
                    self.execute_main(bus, op, mode);
                    return;
                }
            }
        }
    }

    /// Accept a pending NMI or INT. Returns true if one was taken.
    fn service_interrupts<B: Bus>(&mut self, bus: &mut B) -> bool {
        let shadowed = std::mem::take(&mut self.ei_shadow);

        if self.nmi_pending {
            self.nmi_pending = false;
            self.accept_nmi(bus);
            return true;
        }

        if shadowed || !self.regs.iff1 {
            return false;
        }
        match self.int_line.take() {
            Some(data) => {
                self.accept_interrupt(bus, data);
                true
            }
            None => false,
        }
    }

    fn accept_nmi<B: Bus>(&mut self, bus: &mut B) {
        log::trace!("NMI accepted at PC={:04X}", self.regs.pc);
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.increment_r(1);
        self.prev_q = self.q;
        self.q = 0;
        // Discarded opcode fetch plus one internal cycle.
        self.internal(5);
        self.push(bus, self.regs.pc);
        self.regs.pc = 0x0066;
        self.regs.wz = 0x0066;
    }

    fn accept_interrupt<B: Bus>(&mut self, bus: &mut B, data: u8) {
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.increment_r(1);
        self.prev_q = self.q;
        self.q = 0;
        // Acknowledge cycle: M1 with two wait states, then one internal.
        self.internal(7);
        self.push(bus, self.regs.pc);

        let target = match self.regs.im {
            2 => {
                let vector = u16::from(self.regs.i) << 8 | u16::from(data);
                self.read_word(bus, vector)
            }
            1 => 0x0038,
            _ => self.im0_target(data),
        };
        log::trace!(
            "INT accepted in IM{}: data={data:02X} target={target:04X}",
            self.regs.im
        );
        self.regs.pc = target;
        self.regs.wz = target;
    }

    fn im0_target(&self, data: u8) -> u16 {
        if self.config.im0 == Im0Mode::Restart {
            if data & 0xC7 == 0xC7 {
                return u16::from(data & 0x38);
            }
            log::debug!("IM0 data byte {data:02X} is not an RST; using RST 38h");
        }
        0x0038
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Z80 {
    fn run<B: IoBus>(&mut self, bus: &mut B, t_states: u32) {
        self.clock.set_budget(t_states);
        while !self.clock.is_budget_exhausted() {
            if self.service_interrupts(bus) {
                continue;
            }
            if self.regs.halted {
                let nops = self.clock.consume_halt();
                self.regs.increment_r((nops % 128) as u8);
                break;
            }
            self.execute_instruction(bus);
            if self.clock.take_yield() {
                break;
            }
        }
    }

    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let start = self.clock.total();
        if !self.service_interrupts(bus) {
            if self.regs.halted {
                self.internal(4);
                self.regs.increment_r(1);
            } else {
                self.execute_instruction(bus);
            }
        }
        self.clock.take_yield();
        (self.clock.total() - start) as u32
    }

    fn request_interrupt(&mut self, data_bus: u8) {
        self.int_line = Some(data_bus);
    }

    fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn reset(&mut self) {
        self.power_on();
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }
}

const Z80_QUERY_PATHS: &[&str] = &[
    "a", "f", "b", "c", "d", "e", "h", "l",
    "af", "bc", "de", "hl",
    "af'", "bc'", "de'", "hl'",
    "ix", "iy", "ixh", "ixl", "iyh", "iyl",
    "sp", "pc", "i", "r", "wz",
    "flags.s", "flags.z", "flags.y", "flags.h",
    "flags.x", "flags.p", "flags.n", "flags.c",
    "iff1", "iff2", "im", "halted", "int_pending", "nmi_pending",
    "t_states.total", "t_states.current", "t_states.target",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        let value: Value = match path {
            "a" => r.a.into(),
            "f" => r.f.into(),
            "b" => r.b.into(),
            "c" => r.c.into(),
            "d" => r.d.into(),
            "e" => r.e.into(),
            "h" => r.h.into(),
            "l" => r.l.into(),

            "af" => r.af().into(),
            "bc" => r.bc().into(),
            "de" => r.de().into(),
            "hl" => r.hl().into(),
            "af'" => r.af_alt().into(),
            "bc'" => r.bc_alt().into(),
            "de'" => r.de_alt().into(),
            "hl'" => r.hl_alt().into(),

            "ix" => r.ix.into(),
            "iy" => r.iy.into(),
            "ixh" => ((r.ix >> 8) as u8).into(),
            "ixl" => (r.ix as u8).into(),
            "iyh" => ((r.iy >> 8) as u8).into(),
            "iyl" => (r.iy as u8).into(),

            "sp" => r.sp.into(),
            "pc" => r.pc.into(),
            "i" => r.i.into(),
            "r" => r.r.into(),
            "wz" => r.wz.into(),

            "flags.s" => self.flag(SF).into(),
            "flags.z" => self.flag(ZF).into(),
            "flags.y" => self.flag(YF).into(),
            "flags.h" => self.flag(HF).into(),
            "flags.x" => self.flag(XF).into(),
            "flags.p" => self.flag(PF).into(),
            "flags.n" => self.flag(NF).into(),
            "flags.c" => self.flag(CF).into(),

            "iff1" => r.iff1.into(),
            "iff2" => r.iff2.into(),
            "im" => r.im.into(),
            "halted" => r.halted.into(),
            "int_pending" => self.int_line.is_some().into(),
            "nmi_pending" => self.nmi_pending.into(),

            "t_states.total" => self.clock.total().into(),
            "t_states.current" => self.clock.current().into(),
            "t_states.target" => self.clock.target().into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
