//! Blocking settle-delay primitive.

use std::time::{
    Duration,
    Instant,
};

/// A blocking wait. Implementations may overshoot but must never return
/// before the requested time has elapsed.
pub trait Delay {
    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Busy-waits on the monotonic clock without yielding.
///
/// Reset pulse widths must be bounded relative to the enclosing sequence,
/// not subject to scheduler wake-up latency, so this spins instead of
/// sleeping.
#[derive(Debug, Default, Copy, Clone)]
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn delay_ms(&mut self, ms: u32) {
        let deadline = Instant::now() + Duration::from_millis(u64::from(ms));
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}
