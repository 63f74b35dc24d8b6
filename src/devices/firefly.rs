//! FireFly optical modules behind the lane mux.
//!
//! Each 4-lane module group shares one mux channel carrying the module's
//! management interface at 0x50 and a PCA9555-class GPIO expander at 0x20
//! for the sideband pins (reset among them). The console's module peek and
//! poke commands come through here; the reset fan-out lives with the other
//! reset protocols in [`crate::reset`].

use crate::{
    bus::BusSession,
    config::OPTICAL_MODULE_ADDR,
    mux::resolve_lane,
    transport::Transport,
    Error,
};
use tracing::debug;

/// Base lane of each populated module group, one entry per module.
pub(crate) const MODULE_BASE_LANES: [u8; 7] = [120, 124, 128, 132, 220, 228, 232];

/// GPIO expander direction register pair.
pub(crate) const EXPANDER_DIR_REGS: [u8; 2] = [0x06, 0x07];
/// GPIO expander output register pair.
pub(crate) const EXPANDER_OUT_REGS: [u8; 2] = [0x02, 0x03];
/// Direction value driving every expander pin as an output.
pub(crate) const EXPANDER_ALL_OUTPUTS: u8 = 0x00;
/// Output value with the active-low reset pins asserted.
pub(crate) const EXPANDER_RESET_ASSERTED: u8 = 0x00;
/// Output value with all pins released.
pub(crate) const EXPANDER_RESET_RELEASED: u8 = 0xFF;

/// Raw access to one module's management memory for a console command.
#[derive(Debug)]
pub struct Firefly<'b, T> {
    bus: &'b mut BusSession<T>,
}

impl<'b, T: Transport> Firefly<'b, T> {
    /// Attach to an open bus session.
    pub fn new(bus: &'b mut BusSession<T>) -> Self {
        Self { bus }
    }

    /// Read `len` bytes of module memory on `lane` starting at `reg_addr`.
    /// The caller's `send_stop` is passed through unchanged.
    ///
    /// # Errors
    /// [`Error::InvalidLane`] before any bus traffic, or the transport
    /// failure.
    pub fn read(
        &mut self,
        lane: u8,
        reg_addr: u8,
        len: usize,
        send_stop: bool,
    ) -> Result<Vec<u8>, Error> {
        let route = resolve_lane(lane)?;
        debug!(lane, reg_addr, len, "module read");
        self.bus.select_lane(route)?;
        Ok(self
            .bus
            .read_block(OPTICAL_MODULE_ADDR, reg_addr, len, send_stop)?)
    }

    /// Write `bytes` to module memory on `lane` starting at `reg_addr`.
    ///
    /// # Errors
    /// [`Error::InvalidLane`] before any bus traffic, or the transport
    /// failure.
    pub fn write(&mut self, lane: u8, reg_addr: u8, bytes: &[u8]) -> Result<(), Error> {
        let route = resolve_lane(lane)?;
        debug!(lane, reg_addr, len = bytes.len(), "module write");
        self.bus.select_lane(route)?;
        Ok(self.bus.write_block(OPTICAL_MODULE_ADDR, reg_addr, bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{
        mock::{
            Event,
            Mock,
        },
        SidebandLine,
    };

    #[test]
    fn test_read_routes_then_reads() -> anyhow::Result<()> {
        let mut mock = Mock::new();
        mock.preload(OPTICAL_MODULE_ADDR, 0x00, &[0x11, 0x22]);
        {
            let mut bus = BusSession::new(&mut mock);
            let bytes = Firefly::new(&mut bus).read(121, 0x00, 2, true)?;
            assert_eq!(bytes, [0x11, 0x22]);
        }
        assert_eq!(
            mock.events(),
            [
                Event::Sideband {
                    line: SidebandLine::MuxSelect,
                    value: 7
                },
                Event::Write {
                    slave_addr: 0x70,
                    reg_addr: 0x00,
                    bytes: vec![0x02]
                },
                Event::Read {
                    slave_addr: OPTICAL_MODULE_ADDR,
                    reg_addr: 0x00,
                    len: 2,
                    send_stop: true
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_write_lands_on_module() {
        let mut mock = Mock::new();
        {
            let mut bus = BusSession::new(&mut mock);
            Firefly::new(&mut bus).write(235, 0x7A, &[0x55]).unwrap();
        }
        assert_eq!(mock.writes_to(OPTICAL_MODULE_ADDR), 1);
    }

    #[test]
    fn test_invalid_lane_is_rejected_before_io() {
        let mut mock = Mock::new();
        {
            let mut bus = BusSession::new(&mut mock);
            let result = Firefly::new(&mut bus).read(136, 0x00, 1, true);
            assert_eq!(result.unwrap_err(), Error::InvalidLane(136));
        }
        assert!(mock.events().is_empty());
    }

    #[test]
    fn test_module_base_lanes_resolve() {
        for lane in MODULE_BASE_LANES {
            assert!(resolve_lane(lane).is_ok());
        }
    }
}
