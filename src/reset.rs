//! Timed reset protocols for the board's resettable peripherals.
//!
//! Two protocols, both idempotent and stateless between invocations. The
//! direct pulse drives one sideband CSR: assert, settle, de-assert. The
//! fan-out protocol walks every optical-module port asserting reset through
//! the port's GPIO expander, takes a single shared settle delay, then walks
//! the ports again releasing them — so every module sees the same pulse
//! width regardless of per-port write latency. Both stop at the first
//! transport error.

use crate::{
    bus::BusSession,
    config::{
        GPIO_EXPANDER_ADDR,
        SETTLE_MS,
    },
    delay::Delay,
    devices::{
        firefly::{
            EXPANDER_ALL_OUTPUTS,
            EXPANDER_DIR_REGS,
            EXPANDER_OUT_REGS,
            EXPANDER_RESET_ASSERTED,
            EXPANDER_RESET_RELEASED,
            MODULE_BASE_LANES,
        },
        si5341::SynthControl,
    },
    mux::resolve_lane,
    transport::{
        SidebandLine,
        Transport,
        TransportError,
    },
    Error,
};
use packed_struct::PackedStruct;
use tracing::debug;

/// Channel mux reset lines low (asserted, active low).
const MUX_RESET_ASSERTED: u8 = 0x00;
/// All four channel mux reset lines released.
const MUX_RESET_RELEASED: u8 = 0x0F;

/// Runs the board's reset protocols over a bus session and a settle timer.
#[derive(Debug)]
pub struct ResetSequencer<'b, T, D> {
    bus: &'b mut BusSession<T>,
    delay: D,
}

impl<'b, T: Transport, D: Delay> ResetSequencer<'b, T, D> {
    /// Attach to an open bus session with the given settle timer.
    pub fn new(bus: &'b mut BusSession<T>, delay: D) -> Self {
        Self { bus, delay }
    }

    /// Assert `line`, hold for the settle width, then de-assert.
    fn pulse(&mut self, line: SidebandLine, assert: u8, release: u8) -> Result<(), TransportError> {
        self.bus.sideband(line, assert)?;
        self.delay.delay_ms(SETTLE_MS);
        self.bus.sideband(line, release)
    }

    /// Pulse the reset lines of both clock synthesizers at once.
    ///
    /// # Errors
    /// A failed write aborts the pulse, leaving the lines wherever the last
    /// successful write put them; the caller may retry the whole sequence.
    pub fn reset_clock_synths(&mut self) -> Result<(), Error> {
        debug!("resetting clock synthesizers");
        let assert = SynthControl::reset_asserted()
            .pack()
            .map_err(|_| Error::InvalidFieldWidth("synthesizer control byte"))?;
        let release = SynthControl::reset_released()
            .pack()
            .map_err(|_| Error::InvalidFieldWidth("synthesizer control byte"))?;
        Ok(self.pulse(SidebandLine::SynthControl, assert[0], release[0])?)
    }

    /// Pulse the reset lines of the four second-stage channel muxes.
    ///
    /// # Errors
    /// Same abort semantics as [`reset_clock_synths`](Self::reset_clock_synths).
    pub fn reset_channel_muxes(&mut self) -> Result<(), Error> {
        debug!("resetting channel muxes");
        Ok(self.pulse(SidebandLine::MuxReset, MUX_RESET_ASSERTED, MUX_RESET_RELEASED)?)
    }

    /// Pulse reset on every optical module through its GPIO expander.
    ///
    /// Assert phase: per port, route to it, program the expander's
    /// direction pair as outputs and drive the output pair low. One shared
    /// settle delay. Release phase: per port, route to it again and drive
    /// the output pair high.
    ///
    /// # Errors
    /// Stops at the first transport failure; ports already asserted stay
    /// asserted until the caller retries.
    pub fn reset_optical_modules(&mut self) -> Result<(), Error> {
        debug!(ports = MODULE_BASE_LANES.len(), "resetting optical modules");
        for lane in MODULE_BASE_LANES {
            self.bus.select_lane(resolve_lane(lane)?)?;
            for reg in EXPANDER_DIR_REGS {
                self.bus
                    .write_block(GPIO_EXPANDER_ADDR, reg, &[EXPANDER_ALL_OUTPUTS])?;
            }
            for reg in EXPANDER_OUT_REGS {
                self.bus
                    .write_block(GPIO_EXPANDER_ADDR, reg, &[EXPANDER_RESET_ASSERTED])?;
            }
        }
        self.delay.delay_ms(SETTLE_MS);
        for lane in MODULE_BASE_LANES {
            self.bus.select_lane(resolve_lane(lane)?)?;
            for reg in EXPANDER_OUT_REGS {
                self.bus
                    .write_block(GPIO_EXPANDER_ADDR, reg, &[EXPANDER_RESET_RELEASED])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{
        Event,
        Mock,
    };

    fn expander_writes(events: &[Event]) -> Vec<&Event> {
        events
            .iter()
            .filter(|e| matches!(e, Event::Write { slave_addr, .. } if *slave_addr == GPIO_EXPANDER_ADDR))
            .collect()
    }

    #[test]
    fn test_clock_synth_pulse() {
        let mut mock = Mock::new();
        let delay = mock.delay();
        {
            let mut bus = BusSession::new(&mut mock);
            ResetSequencer::new(&mut bus, delay)
                .reset_clock_synths()
                .unwrap();
        }
        assert_eq!(
            mock.events(),
            [
                Event::Sideband {
                    line: SidebandLine::SynthControl,
                    value: 0x0C
                },
                Event::Delay { ms: SETTLE_MS },
                Event::Sideband {
                    line: SidebandLine::SynthControl,
                    value: 0x3C
                },
            ]
        );
    }

    #[test]
    fn test_channel_mux_pulse() {
        let mut mock = Mock::new();
        let delay = mock.delay();
        {
            let mut bus = BusSession::new(&mut mock);
            ResetSequencer::new(&mut bus, delay)
                .reset_channel_muxes()
                .unwrap();
        }
        assert_eq!(
            mock.events(),
            [
                Event::Sideband {
                    line: SidebandLine::MuxReset,
                    value: 0x00
                },
                Event::Delay { ms: SETTLE_MS },
                Event::Sideband {
                    line: SidebandLine::MuxReset,
                    value: 0x0F
                },
            ]
        );
    }

    #[test]
    fn test_fanout_phase_structure() {
        let mut mock = Mock::new();
        let delay = mock.delay();
        {
            let mut bus = BusSession::new(&mut mock);
            ResetSequencer::new(&mut bus, delay)
                .reset_optical_modules()
                .unwrap();
        }
        let events = mock.events();
        let delays: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, Event::Delay { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(delays.len(), 1, "exactly one shared settle delay");
        let split = delays[0];

        assert_eq!(expander_writes(&events[..split]).len(), 28);
        assert_eq!(expander_writes(&events[split..]).len(), 14);

        // Release phase only touches the output pair, always high
        for event in expander_writes(&events[split..]) {
            if let Event::Write { reg_addr, bytes, .. } = event {
                assert!(EXPANDER_OUT_REGS.contains(reg_addr));
                assert_eq!(bytes, &vec![EXPANDER_RESET_RELEASED]);
            }
        }
    }

    #[test]
    fn test_fanout_routes_every_port_twice() {
        let mut mock = Mock::new();
        let delay = mock.delay();
        {
            let mut bus = BusSession::new(&mut mock);
            ResetSequencer::new(&mut bus, delay)
                .reset_optical_modules()
                .unwrap();
        }
        let selects: Vec<u8> = mock
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::Sideband {
                    line: SidebandLine::MuxSelect,
                    value,
                } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(selects, [7, 7, 8, 8, 9, 10, 10, 7, 7, 8, 8, 9, 10, 10]);
    }

    #[test]
    fn test_fanout_fails_fast() {
        let mut mock = Mock::new();
        // Write 0 is the first port's channel mask; writes 1..=4 are its
        // expander programming. Kill the third expander write.
        mock.fail_write(3);
        let delay = mock.delay();
        {
            let mut bus = BusSession::new(&mut mock);
            let result = ResetSequencer::new(&mut bus, delay).reset_optical_modules();
            assert_eq!(
                result,
                Err(Error::Transport(TransportError::Nack(GPIO_EXPANDER_ADDR)))
            );
        }
        let events = mock.events();
        assert!(events.iter().all(|e| !matches!(e, Event::Delay { .. })));
        assert_eq!(expander_writes(&events).len(), 3);
    }
}
