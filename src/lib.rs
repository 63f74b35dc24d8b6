//! Hardware addressing and register encoding for the Trefoil carrier board's
//! debug console.
//!
//! The board hangs its debug-visible peripherals off one shared I2C bus behind
//! two cascaded multiplexers: an FPGA-driven first-stage selector and a
//! TCA9548-class channel mux per selector port. This crate resolves a
//! transceiver lane number to that two-stage route, encodes and decodes the
//! SI5341 fractional N-divider register blocks, sequences the byte-level
//! transactions of one console command, and runs the board's timed reset
//! protocols.
//!
//! The console itself (argument parsing, printing) is not here; it hands this
//! crate parsed integers and owns the [`transport::Transport`] the crate
//! issues transactions on.

pub mod bus;
pub mod config;
pub mod delay;
pub mod devices;
pub mod mux;
pub mod prelude;
pub mod reset;
pub mod transport;

use thiserror::Error;
use transport::TransportError;

/// Errors surfaced by the addressing and register-encoding layer.
///
/// The first three are validation failures, detected before any bus traffic.
/// A [`Error::Transport`] aborts whatever multi-step sequence was in flight;
/// steps already issued are not rolled back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The lane number is not bonded to the mux fabric on this board.
    #[error("lane {0} is outside the wired transceiver ranges")]
    InvalidLane(u8),

    /// No such synthesizer device or divider unit.
    #[error("no divider {divider} on synthesizer device {device}")]
    InvalidDividerTarget {
        /// Synthesizer device number as given by the caller.
        device: u8,
        /// Divider unit number as given by the caller.
        divider: u8,
    },

    /// A field does not fit the register width declared for it.
    #[error("{0} exceeds its register width")]
    InvalidFieldWidth(&'static str),

    /// The underlying bus transaction failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
