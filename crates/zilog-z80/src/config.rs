//! CPU configuration.

/// How interrupt mode 0 interprets the byte on the data bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Im0Mode {
    /// Execute an RST opcode from the bus; any other byte is treated as RST 38h.
    #[default]
    Restart,
    /// Always RST 38h, for machines whose floating bus reads 0xFF.
    ForceRst38,
}

/// Configuration for creating a [`Z80`](crate::Z80).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Z80Config {
    /// AF after power-on and reset.
    pub power_on_af: u16,
    /// SP after power-on and reset.
    pub power_on_sp: u16,
    /// Data-bus handling in interrupt mode 0.
    pub im0: Im0Mode,
}

impl Default for Z80Config {
    fn default() -> Self {
        Self {
            power_on_af: 0xFFFF,
            power_on_sp: 0xFFFF,
            im0: Im0Mode::Restart,
        }
    }
}
