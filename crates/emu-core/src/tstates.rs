//! T-state accounting.

/// Running T-state counter for one CPU.
///
/// `total` is the lifetime count and never resets; consumers use it for
/// sound and border timing. `current` counts cycles within the present
/// execution budget and `target` is where the run loop stops.
///
/// Both counters advance together through [`TStates::add`], which memory and
/// I/O implementations may call mid-instruction to insert contention delays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TStates {
    total: u64,
    current: u32,
    target: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    yield_requested: bool,
}

impl TStates {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: 0,
            current: 0,
            target: 0,
            yield_requested: false,
        }
    }

    /// Lifetime T-states.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// T-states elapsed within the current budget period.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// The point at which the current budget is exhausted.
    #[must_use]
    pub const fn target(&self) -> u32 {
        self.target
    }

    /// Advance both counters.
    pub fn add(&mut self, delta: u32) {
        self.total += u64::from(delta);
        self.current = self.current.wrapping_add(delta);
    }

    /// Start a new budget period of `budget` T-states.
    ///
    /// Whatever the previous period overran its target by is carried into
    /// the new one, so an instruction that straddles a frame boundary is
    /// paid for exactly once. A period that ended early (yield) carries
    /// nothing.
    pub fn set_budget(&mut self, budget: u32) {
        let overrun = self.current.saturating_sub(self.target);
        self.current = overrun;
        self.target = budget;
    }

    /// True once `current` has reached `target`.
    #[must_use]
    pub const fn is_budget_exhausted(&self) -> bool {
        self.current >= self.target
    }

    /// T-states left before the budget is exhausted.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.current)
    }

    /// Burn the rest of the budget as HALT NOPs.
    ///
    /// Each NOP costs 4 T-states, so the remaining budget is rounded up to
    /// the next multiple of 4. Returns how many NOPs were executed so the
    /// caller can advance R accordingly.
    pub fn consume_halt(&mut self) -> u32 {
        let nops = self.remaining().div_ceil(4);
        self.add(nops * 4);
        nops
    }

    /// Ask the run loop to return at the end of the current instruction.
    ///
    /// Intended for bus implementations that trap on an access and need
    /// the host to inspect CPU state before execution continues.
    pub fn request_yield(&mut self) {
        self.yield_requested = true;
    }

    /// Consume a pending yield request.
    pub fn take_yield(&mut self) -> bool {
        std::mem::take(&mut self.yield_requested)
    }
}
