//! N-divider access for the SI5341 clock synthesizers.
//!
//! Both synthesizers expose the same layout: the divider blocks sit on one
//! register page, strided 11 bytes apart. Programming a divider is a strict
//! four-write sequence — page select, numerator, denominator, then a
//! one-byte latch that brings the new value into effect. An aborted
//! sequence leaves the divider unlatched and therefore inert.

use crate::{
    bus::BusSession,
    config::CLOCK_SYNTH_ADDR,
    mux::SynthDevice,
    transport::Transport,
    Error,
};
use packed_struct::prelude::*;
use tracing::debug;

/// Page-select register, common to every page.
const PAGE_REG: u8 = 0x01;
/// The page holding the N-divider blocks.
const DIVIDER_PAGE: u8 = 0x03;
/// Numerator base address within the divider page.
const NUMERATOR_BASE: u8 = 0x02;
/// Denominator base address within the divider page.
const DENOMINATOR_BASE: u8 = 0x08;
/// Update (latch) base address within the divider page.
const UPDATE_BASE: u8 = 0x0C;
/// Distance between consecutive divider blocks.
const BLOCK_STRIDE: u8 = 11;
/// Value written to the update register to latch a divider.
const UPDATE_LATCH: u8 = 0x01;
/// Divider units per device.
const DIVIDERS_PER_DEVICE: u8 = 6;

/// One divider unit on one synthesizer device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DividerTarget {
    device: SynthDevice,
    divider: u8,
}

impl DividerTarget {
    /// Validate a console-supplied device and divider number.
    ///
    /// # Errors
    /// [`Error::InvalidDividerTarget`] unless `device_num` is 0 or 1 and
    /// `divider_num` is below 6.
    pub fn new(device_num: u8, divider_num: u8) -> Result<Self, Error> {
        let device = match device_num {
            0 => SynthDevice::Synth0,
            1 => SynthDevice::Synth1,
            _ => {
                return Err(Error::InvalidDividerTarget {
                    device: device_num,
                    divider: divider_num,
                })
            }
        };
        if divider_num >= DIVIDERS_PER_DEVICE {
            return Err(Error::InvalidDividerTarget {
                device: device_num,
                divider: divider_num,
            });
        }
        Ok(Self {
            device,
            divider: divider_num,
        })
    }

    /// The synthesizer device this divider lives on.
    #[must_use]
    pub fn device(&self) -> SynthDevice {
        self.device
    }

    /// Divider unit number within the device.
    #[must_use]
    pub fn divider(&self) -> u8 {
        self.divider
    }

    /// Register addresses of this divider's block.
    fn registers(&self) -> DividerRegisters {
        let offset = self.divider * BLOCK_STRIDE;
        DividerRegisters {
            numerator: NUMERATOR_BASE + offset,
            denominator: DENOMINATOR_BASE + offset,
            update: UPDATE_BASE + offset,
        }
    }
}

/// Per-block register addresses, derived, never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct DividerRegisters {
    numerator: u8,
    denominator: u8,
    update: u8,
}

/// A fractional N-divider setting: a 44-bit numerator over a 32-bit
/// denominator.
///
/// The numerator is held split the way the registers hold it — a 12-bit
/// high part and a 32-bit low part. Construction guards the 12-bit width so
/// malformed values are rejected before any transaction is attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DividerValue {
    numerator_high: u16,
    numerator_low: u32,
    denominator: u32,
}

impl DividerValue {
    /// Build a divider value from its register-split parts.
    ///
    /// # Errors
    /// [`Error::InvalidFieldWidth`] if `numerator_high` exceeds 12 bits.
    pub fn new(numerator_high: u16, numerator_low: u32, denominator: u32) -> Result<Self, Error> {
        if numerator_high > 0xFFF {
            return Err(Error::InvalidFieldWidth("divider numerator high part"));
        }
        Ok(Self {
            numerator_high,
            numerator_low,
            denominator,
        })
    }

    /// High 12 bits of the numerator.
    #[must_use]
    pub fn numerator_high(&self) -> u16 {
        self.numerator_high
    }

    /// Low 32 bits of the numerator.
    #[must_use]
    pub fn numerator_low(&self) -> u32 {
        self.numerator_low
    }

    /// The full 44-bit numerator.
    #[must_use]
    pub fn numerator(&self) -> u64 {
        u64::from(self.numerator_high) << 32 | u64::from(self.numerator_low)
    }

    /// The 32-bit denominator.
    #[must_use]
    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Numerator register image: low part little-endian, then the low byte
    /// of the high part, then its top nibble.
    #[must_use]
    pub fn numerator_bytes(&self) -> [u8; 6] {
        let low = self.numerator_low.to_le_bytes();
        [
            low[0],
            low[1],
            low[2],
            low[3],
            (self.numerator_high & 0xFF) as u8,
            (self.numerator_high >> 8) as u8,
        ]
    }

    /// Denominator register image, little-endian.
    #[must_use]
    pub fn denominator_bytes(&self) -> [u8; 4] {
        self.denominator.to_le_bytes()
    }

    /// Reassemble a divider value from its register images. Exact inverse
    /// of [`numerator_bytes`](Self::numerator_bytes) and
    /// [`denominator_bytes`](Self::denominator_bytes); the upper nibble of
    /// the last numerator byte is reserved and ignored.
    #[must_use]
    pub fn from_register_bytes(numerator: [u8; 6], denominator: [u8; 4]) -> Self {
        let [n0, n1, n2, n3, n4, n5] = numerator;
        Self {
            numerator_high: u16::from(n5 & 0x0F) << 8 | u16::from(n4),
            numerator_low: u32::from_le_bytes([n0, n1, n2, n3]),
            denominator: u32::from_le_bytes(denominator),
        }
    }
}

/// The sideband control byte shared by both synthesizers, one bit per
/// device in each line pair. All lines are driven together through
/// [`SidebandLine::SynthControl`](crate::transport::SidebandLine).
#[derive(PackedStruct, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "1")]
pub struct SynthControl {
    /// Reset lines, active low.
    #[packed_field(bits = "2..=3")]
    pub rstb: Integer<u8, packed_bits::Bits<2>>,
    /// Sync lines, active low.
    #[packed_field(bits = "4..=5")]
    pub syncb: Integer<u8, packed_bits::Bits<2>>,
    /// Input-select lines.
    #[packed_field(bits = "6..=7")]
    pub in_sel: Integer<u8, packed_bits::Bits<2>>,
}

impl SynthControl {
    /// Both devices held in reset, sync released, input select 0.
    #[must_use]
    pub fn reset_asserted() -> Self {
        Self {
            in_sel: 0.into(),
            syncb: 0b11.into(),
            rstb: 0b00.into(),
        }
    }

    /// Both devices running.
    #[must_use]
    pub fn reset_released() -> Self {
        Self {
            in_sel: 0.into(),
            syncb: 0b11.into(),
            rstb: 0b11.into(),
        }
    }
}

/// Driver for one console command against the synthesizers.
#[derive(Debug)]
pub struct Si5341<'b, T> {
    bus: &'b mut BusSession<T>,
}

impl<'b, T: Transport> Si5341<'b, T> {
    /// Attach to an open bus session.
    pub fn new(bus: &'b mut BusSession<T>) -> Self {
        Self { bus }
    }

    /// Program one N divider and latch it.
    ///
    /// Write order is fixed by the hardware: page select, numerator,
    /// denominator, then the latch byte.
    ///
    /// # Errors
    /// A transport failure aborts the remaining writes. Nothing is rolled
    /// back; without the latch write the divider keeps its old setting.
    pub fn set_n_divider(&mut self, target: DividerTarget, value: DividerValue) -> Result<(), Error> {
        debug!(
            device = target.device().device_num(),
            divider = target.divider(),
            numerator = value.numerator(),
            denominator = value.denominator(),
            "programming N divider"
        );
        let regs = target.registers();
        self.bus.select_synth(target.device())?;
        self.bus
            .write_block(CLOCK_SYNTH_ADDR, PAGE_REG, &[DIVIDER_PAGE])?;
        self.bus
            .write_block(CLOCK_SYNTH_ADDR, regs.numerator, &value.numerator_bytes())?;
        self.bus.write_block(
            CLOCK_SYNTH_ADDR,
            regs.denominator,
            &value.denominator_bytes(),
        )?;
        self.bus
            .write_block(CLOCK_SYNTH_ADDR, regs.update, &[UPDATE_LATCH])?;
        Ok(())
    }

    /// Read back one N divider's current register contents.
    ///
    /// # Errors
    /// Fails on a transport error, or with
    /// [`Error::InvalidFieldWidth`] if the transport returns fewer bytes
    /// than the register block holds.
    pub fn n_divider(&mut self, target: DividerTarget) -> Result<DividerValue, Error> {
        debug!(
            device = target.device().device_num(),
            divider = target.divider(),
            "reading N divider"
        );
        let regs = target.registers();
        self.bus.select_synth(target.device())?;
        self.bus
            .write_block(CLOCK_SYNTH_ADDR, PAGE_REG, &[DIVIDER_PAGE])?;
        let numerator: [u8; 6] = self
            .bus
            .read_block(CLOCK_SYNTH_ADDR, regs.numerator, 6, true)?
            .try_into()
            .map_err(|_| Error::InvalidFieldWidth("divider numerator registers"))?;
        let denominator: [u8; 4] = self
            .bus
            .read_block(CLOCK_SYNTH_ADDR, regs.denominator, 4, true)?
            .try_into()
            .map_err(|_| Error::InvalidFieldWidth("divider denominator registers"))?;
        Ok(DividerValue::from_register_bytes(numerator, denominator))
    }
}
