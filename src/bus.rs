//! Byte-level session on the shared debug bus.

use crate::{
    config::CHANNEL_MUX_ADDR,
    mux::{
        MuxRoute,
        SynthDevice,
    },
    transport::{
        SidebandLine,
        Transport,
        TransportError,
    },
};
use tracing::trace;

/// The channel mux exposes a single control register.
const CHANNEL_MUX_CONTROL_REG: u8 = 0x00;

/// A transaction sequence over one console command.
///
/// The session owns the transport for its lifetime. Route selection is
/// stateful in hardware — whichever route was selected last stays selected —
/// so a session must not be shared between logically concurrent commands.
/// Payloads pass through untouched; the session never reinterprets what the
/// device layers encode.
#[derive(Debug)]
pub struct BusSession<T> {
    transport: T,
}

impl<T: Transport> BusSession<T> {
    /// Start a session on `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Route the bus to one transceiver lane's peripheral: drive the
    /// first-stage select lines, then enable the lane's channel on the
    /// second-stage mux.
    ///
    /// # Errors
    /// Fails on the first transport error; the route is then undefined.
    pub fn select_lane(&mut self, route: MuxRoute) -> Result<(), TransportError> {
        trace!(
            selector = route.selector(),
            mask = route.channel_mask(),
            "selecting lane route"
        );
        self.transport
            .sideband_write(SidebandLine::MuxSelect, route.selector())?;
        self.transport.write(
            CHANNEL_MUX_ADDR,
            CHANNEL_MUX_CONTROL_REG,
            &[route.channel_mask()],
        )
    }

    /// Route the bus to one clock synthesizer. Synthesizer ports have no
    /// second stage, so this is a single select-line write.
    ///
    /// # Errors
    /// Fails if the select write fails.
    pub fn select_synth(&mut self, device: SynthDevice) -> Result<(), TransportError> {
        trace!(select = device.first_stage_select(), "selecting synthesizer");
        self.transport
            .sideband_write(SidebandLine::MuxSelect, device.first_stage_select())
    }

    /// Write `bytes` to the currently routed `slave_addr` at `reg_addr`.
    ///
    /// # Errors
    /// Propagates the transport failure.
    pub fn write_block(
        &mut self,
        slave_addr: u8,
        reg_addr: u8,
        bytes: &[u8],
    ) -> Result<(), TransportError> {
        trace!(slave_addr, reg_addr, len = bytes.len(), "i2c write");
        self.transport.write(slave_addr, reg_addr, bytes)
    }

    /// Read `len` bytes from the currently routed `slave_addr` at `reg_addr`.
    ///
    /// # Errors
    /// Propagates the transport failure.
    pub fn read_block(
        &mut self,
        slave_addr: u8,
        reg_addr: u8,
        len: usize,
        send_stop: bool,
    ) -> Result<Vec<u8>, TransportError> {
        trace!(slave_addr, reg_addr, len, send_stop, "i2c read");
        self.transport.read(slave_addr, reg_addr, len, send_stop)
    }

    /// Drive a sideband CSR line directly. Used by the reset protocols.
    ///
    /// # Errors
    /// Propagates the transport failure.
    pub fn sideband(&mut self, line: SidebandLine, value: u8) -> Result<(), TransportError> {
        trace!(?line, value, "sideband write");
        self.transport.sideband_write(line, value)
    }
}
