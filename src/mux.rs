//! Addressing through the board's two-stage multiplexer fabric.
//!
//! Two schemes coexist and stay distinct types on purpose: transceiver
//! lanes resolve to a first-stage select plus a one-hot channel mask on the
//! second-stage mux, while the clock synthesizers sit directly on their own
//! first-stage ports with no second stage.

use crate::Error;

/// First-stage select value for synthesizer device 0; device 1 follows.
const SYNTH_SELECT_BASE: u8 = 11;

/// The resolved two-stage path to one lane's peripheral.
///
/// Only [`resolve_lane`] constructs these, so a route in hand always has a
/// valid selector and exactly one bit set in the channel mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MuxRoute {
    selector: u8,
    channel_mask: u8,
}

impl MuxRoute {
    /// First-stage multiplexer select value.
    #[must_use]
    pub fn selector(&self) -> u8 {
        self.selector
    }

    /// One-hot channel-enable byte for the second-stage mux.
    #[must_use]
    pub fn channel_mask(&self) -> u8 {
        self.channel_mask
    }
}

/// Resolve a transceiver lane number to its multiplexer route.
///
/// Lanes are wired in three disjoint ranges, split over four first-stage
/// ports of eight channels each:
///
/// | lanes   | selector | channel bit |
/// |---------|----------|-------------|
/// | 120–127 | 7        | lane − 120  |
/// | 128–135 | 8        | lane − 128  |
/// | 220–223 | 9        | lane − 220  |
/// | 228–235 | 10       | lane − 228  |
///
/// # Errors
/// [`Error::InvalidLane`] for any lane outside the three ranges.
pub fn resolve_lane(lane: u8) -> Result<MuxRoute, Error> {
    let (selector, bit) = match lane {
        120..=127 => (7, lane - 120),
        128..=135 => (8, lane - 128),
        220..=223 => (9, lane - 220),
        228..=235 => (10, lane - 228),
        _ => return Err(Error::InvalidLane(lane)),
    };
    Ok(MuxRoute {
        selector,
        channel_mask: 1 << bit,
    })
}

/// One of the two clock synthesizers.
///
/// Each device owns a dedicated first-stage port past the lane ports, so
/// selecting it needs no second-stage mask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthDevice {
    /// Feeds the 1xx-side transceiver reference clocks.
    Synth0,
    /// Feeds the 2xx-side transceiver reference clocks.
    Synth1,
}

impl SynthDevice {
    /// Device number as the console numbers them.
    #[must_use]
    pub fn device_num(&self) -> u8 {
        match self {
            SynthDevice::Synth0 => 0,
            SynthDevice::Synth1 => 1,
        }
    }

    /// First-stage multiplexer select value for this device.
    #[must_use]
    pub fn first_stage_select(&self) -> u8 {
        SYNTH_SELECT_BASE + self.device_num()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    macro_rules! test_lane_route {
        ($lane:literal, $selector:literal, $mask:literal) => {
            paste! {
                #[test]
                fn [<test_lane_ $lane _route>]() {
                    let route = resolve_lane($lane).unwrap();
                    assert_eq!(route.selector(), $selector);
                    assert_eq!(route.channel_mask(), $mask);
                }
            }
        };
    }

    test_lane_route!(120, 7, 0x01);
    test_lane_route!(127, 7, 0x80);
    test_lane_route!(128, 8, 0x01);
    test_lane_route!(135, 8, 0x80);
    test_lane_route!(220, 9, 0x01);
    test_lane_route!(223, 9, 0x08);
    test_lane_route!(228, 10, 0x01);
    test_lane_route!(235, 10, 0x80);

    #[test]
    fn test_valid_lanes_are_one_hot() {
        let lanes = (120..=135).chain(220..=223).chain(228..=235);
        for lane in lanes {
            let route = resolve_lane(lane).unwrap();
            assert_eq!(
                route.channel_mask().count_ones(),
                1,
                "lane {lane} mask {:#04x}",
                route.channel_mask()
            );
        }
    }

    #[test]
    fn test_invalid_lanes_rejected() {
        for lane in [0, 1, 119, 136, 219, 224, 227, 236, 255] {
            assert_eq!(resolve_lane(lane), Err(Error::InvalidLane(lane)));
        }
    }

    #[test]
    fn test_synth_selects() {
        assert_eq!(SynthDevice::Synth0.first_stage_select(), 11);
        assert_eq!(SynthDevice::Synth1.first_stage_select(), 12);
    }
}
