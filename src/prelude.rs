//! Prelude (helpful reexports) for this package.

pub use crate::{
    bus::BusSession,
    delay::{
        Delay,
        SpinDelay,
    },
    devices::{
        firefly::Firefly,
        si5341::{
            DividerTarget,
            DividerValue,
            Si5341,
        },
    },
    mux::{
        resolve_lane,
        MuxRoute,
        SynthDevice,
    },
    reset::ResetSequencer,
    transport::{
        Transport,
        TransportError,
    },
    Error,
};
