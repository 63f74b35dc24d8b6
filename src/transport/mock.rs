//! Mock transport used in testing the interface.

use super::{
    SidebandLine,
    Transport,
    TransportError,
};
use crate::delay::Delay;
use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};

/// One action observed at the bus boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A sideband CSR write.
    Sideband {
        /// Which CSR line.
        line: SidebandLine,
        /// Value driven onto it.
        value: u8,
    },
    /// An I2C register write (recorded even when it is made to fail).
    Write {
        /// 7-bit slave address.
        slave_addr: u8,
        /// Starting register address.
        reg_addr: u8,
        /// Payload.
        bytes: Vec<u8>,
    },
    /// An I2C register read.
    Read {
        /// 7-bit slave address.
        slave_addr: u8,
        /// Starting register address.
        reg_addr: u8,
        /// Requested length.
        len: usize,
        /// Whether a stop condition was requested.
        send_stop: bool,
    },
    /// A settle delay taken through [`MockDelay`].
    Delay {
        /// Requested wait in milliseconds.
        ms: u32,
    },
}

type Journal = Rc<RefCell<Vec<Event>>>;

/// A bus that mocks reads and writes, useful for testing.
///
/// Writes land in a sparse `(slave, register) → byte` memory so they read
/// back; unwritten registers read as zero. Mux state is not modeled — the
/// memory is one flat space regardless of the selected route.
#[derive(Debug, Default)]
pub struct Mock {
    journal: Journal,
    memory: HashMap<(u8, u8), u8>,
    fail_write_at: Option<usize>,
    fail_read_at: Option<usize>,
    writes_seen: usize,
    reads_seen: usize,
}

impl Mock {
    /// Construct a mock bus with empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A delay primitive recording into the same journal, so ordering
    /// between transactions and settle delays can be asserted.
    #[must_use]
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            journal: Rc::clone(&self.journal),
        }
    }

    /// Everything observed so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.journal.borrow().clone()
    }

    /// Number of I2C writes attempted against `slave_addr`.
    #[must_use]
    pub fn writes_to(&self, slave_addr: u8) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Write { slave_addr: s, .. } if *s == slave_addr))
            .count()
    }

    /// Make the `index`-th I2C write (0-based, counted across all slaves)
    /// fail with a missing acknowledge.
    pub fn fail_write(&mut self, index: usize) {
        self.fail_write_at = Some(index);
    }

    /// Make the `index`-th I2C read fail with a missing acknowledge.
    pub fn fail_read(&mut self, index: usize) {
        self.fail_read_at = Some(index);
    }

    /// Seed backing memory at `(slave_addr, reg_addr..)` with `bytes`.
    pub fn preload(&mut self, slave_addr: u8, reg_addr: u8, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory
                .insert((slave_addr, reg_addr.wrapping_add(i as u8)), *byte);
        }
    }
}

impl Transport for Mock {
    fn write(&mut self, slave_addr: u8, reg_addr: u8, bytes: &[u8]) -> Result<(), TransportError> {
        self.journal.borrow_mut().push(Event::Write {
            slave_addr,
            reg_addr,
            bytes: bytes.to_vec(),
        });
        let index = self.writes_seen;
        self.writes_seen += 1;
        if self.fail_write_at == Some(index) {
            return Err(TransportError::Nack(slave_addr));
        }
        for (i, byte) in bytes.iter().enumerate() {
            self.memory
                .insert((slave_addr, reg_addr.wrapping_add(i as u8)), *byte);
        }
        Ok(())
    }

    fn read(
        &mut self,
        slave_addr: u8,
        reg_addr: u8,
        len: usize,
        send_stop: bool,
    ) -> Result<Vec<u8>, TransportError> {
        self.journal.borrow_mut().push(Event::Read {
            slave_addr,
            reg_addr,
            len,
            send_stop,
        });
        let index = self.reads_seen;
        self.reads_seen += 1;
        if self.fail_read_at == Some(index) {
            return Err(TransportError::Nack(slave_addr));
        }
        Ok((0..len)
            .map(|i| {
                self.memory
                    .get(&(slave_addr, reg_addr.wrapping_add(i as u8)))
                    .copied()
                    .unwrap_or(0)
            })
            .collect())
    }

    fn sideband_write(&mut self, line: SidebandLine, value: u8) -> Result<(), TransportError> {
        self.journal
            .borrow_mut()
            .push(Event::Sideband { line, value });
        Ok(())
    }
}

/// Companion to [`Mock`]: records settle delays instead of taking them.
#[derive(Debug)]
pub struct MockDelay {
    journal: Journal,
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.journal.borrow_mut().push(Event::Delay { ms });
    }
}
