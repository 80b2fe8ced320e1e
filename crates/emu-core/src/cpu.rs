//! CPU core trait.

use crate::IoBus;

/// A CPU core driven by T-state budgets.
///
/// The bus is passed in, not owned, so it can be shared with other
/// components (video, paging) that mutate memory between runs. Execution is
/// single-threaded and never suspends mid-instruction.
pub trait Cpu {
    /// Execute until `t_states` have elapsed.
    ///
    /// The budget is checked after every complete instruction, so the last
    /// instruction may overrun; the overrun is carried into the next call.
    /// A halted CPU consumes the rest of the budget as 4 T-state NOPs.
    fn run<B: IoBus>(&mut self, bus: &mut B, t_states: u32);

    /// Execute exactly one instruction (or interrupt acknowledge, or one
    /// HALT NOP). Returns the T-states consumed, contention included.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Assert the maskable interrupt line with the value the interrupting
    /// device places on the data bus. Sampled at the next instruction
    /// boundary.
    fn request_interrupt(&mut self, data_bus: u8);

    /// Signal a non-maskable interrupt.
    fn request_nmi(&mut self);

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;
}
