//! Bank-switched memory with optional contention.
//!
//! The 64K address space is split into four 16K windows. Each window holds
//! an index into an arena of 16K bank buffers, so switching a page is a
//! single table write and every access costs one extra index lookup.

use crate::{Bus, Peek, TStates};

/// Size of one bank and of one address window.
pub const BANK_SIZE: usize = 0x4000;

/// Number of 16K windows in the 64K address space.
pub const WINDOWS: usize = 4;

/// Per-T-state wait table for contended windows.
///
/// `delays[t]` is the number of extra T-states inserted when an access to a
/// contended window starts at frame position `t`. Positions past the end of
/// the table are uncontended.
#[derive(Debug, Clone, Default)]
pub struct ContentionTable {
    delays: Vec<u8>,
}

impl ContentionTable {
    /// Build a table of `frame_length` entries from a delay function.
    #[must_use]
    pub fn from_fn(frame_length: u32, delay: impl Fn(u32) -> u8) -> Self {
        Self {
            delays: (0..frame_length).map(delay).collect(),
        }
    }

    /// Wait states for an access starting at `t_state`.
    #[must_use]
    pub fn delay_at(&self, t_state: u32) -> u8 {
        usize::try_from(t_state)
            .ok()
            .and_then(|t| self.delays.get(t))
            .copied()
            .unwrap_or(0)
    }
}

/// Banked memory: an arena of 16K banks mapped into four windows.
pub struct BankedMemory {
    banks: Vec<Box<[u8; BANK_SIZE]>>,
    read_only: Vec<bool>,
    windows: [usize; WINDOWS],
    contended: [bool; WINDOWS],
    contention: Option<ContentionTable>,
}

impl BankedMemory {
    /// Create `rom_banks` read-only banks followed by `ram_banks` RAM banks.
    ///
    /// Windows initially map banks 0..4 (clamped to the last bank).
    ///
    /// # Panics
    ///
    /// Panics if no banks are requested.
    #[must_use]
    pub fn new(rom_banks: usize, ram_banks: usize) -> Self {
        let count = rom_banks + ram_banks;
        assert!(count > 0, "banked memory needs at least one bank");
        let banks = (0..count).map(|_| Box::new([0u8; BANK_SIZE])).collect();
        let read_only = (0..count).map(|bank| bank < rom_banks).collect();
        let windows = std::array::from_fn(|w| w.min(count - 1));
        Self {
            banks,
            read_only,
            windows,
            contended: [false; WINDOWS],
            contention: None,
        }
    }

    /// Number of banks in the arena.
    #[must_use]
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Map `bank` into `window` (0-3). Out-of-range requests are ignored.
    pub fn map(&mut self, window: usize, bank: usize) {
        if window < WINDOWS && bank < self.banks.len() {
            self.windows[window] = bank;
        }
    }

    /// Bank currently mapped into `window`.
    #[must_use]
    pub fn mapped(&self, window: usize) -> usize {
        self.windows[window % WINDOWS]
    }

    /// Copy data into a bank directly (ROM images, snapshot pages).
    pub fn load_bank(&mut self, bank: usize, data: &[u8]) {
        if let Some(buffer) = self.banks.get_mut(bank) {
            let len = data.len().min(BANK_SIZE);
            buffer[..len].copy_from_slice(&data[..len]);
        }
    }

    /// Raw contents of a bank.
    #[must_use]
    pub fn bank(&self, bank: usize) -> Option<&[u8]> {
        self.banks.get(bank).map(|b| &b[..])
    }

    /// Mark a window as contended.
    pub fn set_contended(&mut self, window: usize, contended: bool) {
        if window < WINDOWS {
            self.contended[window] = contended;
        }
    }

    /// Install the wait table used for contended windows.
    pub fn set_contention(&mut self, table: ContentionTable) {
        self.contention = Some(table);
    }

    fn locate(&self, address: u16) -> (usize, usize) {
        let address = usize::from(address);
        (address / BANK_SIZE, address % BANK_SIZE)
    }

    fn contend(&self, window: usize, clock: &mut TStates) {
        if !self.contended[window] {
            return;
        }
        if let Some(table) = &self.contention {
            let delay = table.delay_at(clock.current());
            if delay > 0 {
                clock.add(u32::from(delay));
            }
        }
    }
}

impl Peek for BankedMemory {
    fn peek(&self, address: u16) -> u8 {
        let (window, offset) = self.locate(address);
        self.banks[self.windows[window]][offset]
    }
}

impl Bus for BankedMemory {
    fn read(&mut self, address: u16, clock: &mut TStates) -> u8 {
        let (window, offset) = self.locate(address);
        self.contend(window, clock);
        self.banks[self.windows[window]][offset]
    }

    fn write(&mut self, address: u16, value: u8, clock: &mut TStates) {
        let (window, offset) = self.locate(address);
        self.contend(window, clock);
        let bank = self.windows[window];
        if !self.read_only[bank] {
            self.banks[bank][offset] = value;
        }
    }
}
