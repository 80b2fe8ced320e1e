//! T-state accurate Zilog Z80 CPU emulator.
//!
//! Instructions execute whole, charging each machine cycle to the shared
//! [`emu_core::TStates`] counter as it happens so that contended memory
//! sees the correct frame position. Undocumented behaviour (X/Y flags,
//! MEMPTR, IXH/IXL, SLL, DDCB register copies) is modelled.
//!
//! ```
//! use emu_core::{Cpu, SimpleBus};
//! use zilog_z80::Z80;
//!
//! let mut bus = SimpleBus::new();
//! bus.load(0x0000, &[0x3E, 0x2A, 0x76]); // LD A,42; HALT
//! let mut cpu = Z80::new();
//! cpu.run(&mut bus, 100);
//! assert_eq!(cpu.registers().a, 42);
//! assert!(cpu.is_halted());
//! ```

mod alu;
mod config;
mod cpu;
mod disasm;
mod flags;
mod registers;
mod state;

pub mod cpm;

pub use config::{Im0Mode, Z80Config};
pub use cpu::Z80;
pub use disasm::{Disassembly, disassemble};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use registers::{IndexMode, Reg8, Reg16, Registers};
pub use state::CpuState;
