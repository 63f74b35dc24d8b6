//! Fixed hardware constants shared across the debug core.
//!
//! The slave addresses are part of the board's contract with the transport
//! and must not change without a hardware revision. Register maps internal
//! to one chip live with that chip's module instead.

/// 7-bit address of the GPIO expander on each optical-module port.
pub const GPIO_EXPANDER_ADDR: u8 = 0x20;

/// 7-bit address of the second-stage channel multiplexer.
pub const CHANNEL_MUX_ADDR: u8 = 0x70;

/// 7-bit address of the clock synthesizers (one per first-stage port).
pub const CLOCK_SYNTH_ADDR: u8 = 0x77;

/// 7-bit address of the FireFly optical modules.
pub const OPTICAL_MODULE_ADDR: u8 = 0x50;

/// Reset pulse width in milliseconds, wide enough for every resettable
/// peripheral on the board.
pub const SETTLE_MS: u32 = 500;
