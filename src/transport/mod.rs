//! The transport seam between the debug core and the board.
//!
//! The console owns the bus controller; this crate only issues transactions
//! on it. Implementations assume the controller is already brought up — line
//! state recovery and bus configuration are the transport's problem.

pub mod mock;

use thiserror::Error;

/// Errors from the underlying bus controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Lost arbitration against another master.
    #[error("lost bus arbitration")]
    ArbitrationLost,

    /// The addressed device did not acknowledge a byte.
    #[error("no acknowledge from device {0:#04x}")]
    Nack(u8),

    /// Nothing responded at the given address.
    #[error("no device at address {0:#04x}")]
    NoDevice(u8),
}

/// FPGA sideband CSR lines the debug core drives besides the shared bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SidebandLine {
    /// First-stage multiplexer select lines.
    MuxSelect,
    /// Clock synthesizer control lines (in_sel / syncb / rstb pairs).
    SynthControl,
    /// Channel multiplexer reset lines.
    MuxReset,
}

/// One bus controller on the carrier board.
///
/// `write` and `read` are register-addressed I2C transactions with a 7-bit
/// slave address; `sideband_write` pokes one of the FPGA CSRs that steer the
/// bus fabric. The currently selected route is implicit hardware state, so a
/// caller must serialize route-changing operations itself.
pub trait Transport {
    /// Write `bytes` to `slave_addr` starting at register `reg_addr`.
    fn write(&mut self, slave_addr: u8, reg_addr: u8, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read `len` bytes from `slave_addr` starting at register `reg_addr`.
    /// `send_stop` controls whether the transaction ends with a stop
    /// condition or leaves the bus claimed.
    fn read(
        &mut self,
        slave_addr: u8,
        reg_addr: u8,
        len: usize,
        send_stop: bool,
    ) -> Result<Vec<u8>, TransportError>;

    /// Write `value` to the sideband CSR `line`.
    fn sideband_write(&mut self, line: SidebandLine, value: u8) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, slave_addr: u8, reg_addr: u8, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(slave_addr, reg_addr, bytes)
    }

    fn read(
        &mut self,
        slave_addr: u8,
        reg_addr: u8,
        len: usize,
        send_stop: bool,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).read(slave_addr, reg_addr, len, send_stop)
    }

    fn sideband_write(&mut self, line: SidebandLine, value: u8) -> Result<(), TransportError> {
        (**self).sideband_write(line, value)
    }
}
