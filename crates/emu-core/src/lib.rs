//! Core traits and types for T-state accurate CPU emulation.
//!
//! The CPU never owns memory. It reaches memory and I/O through the [`Bus`]
//! and [`IoBus`] traits and charges every machine cycle to a [`TStates`]
//! counter that bus implementations may also advance for contention.

mod banked;
mod bus;
mod cpu;
mod observable;
mod simple_bus;
mod tstates;

pub use banked::{BANK_SIZE, BankedMemory, ContentionTable, WINDOWS};
pub use bus::{Bus, IoBus, Peek, port_address};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use simple_bus::SimpleBus;
pub use tstates::TStates;
