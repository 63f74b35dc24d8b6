//! Drivers for the peripherals reachable from the debug console.

pub mod firefly;
pub mod si5341;
