//! # IntelliFlo Core Library
//!
//! Driver for Pentair IntelliFlo variable-speed pool pumps.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Incremental framing and checksum validation of the RS-485 byte stream
//! - Decoding of pump status reports into run state, power and speed
//! - Encoding of pump commands (run/stop, programs, speed, flow)
//! - A quiet-window transmit scheduler for the half-duplex bus
//!
//! ## Example
//!
//! ```rust,ignore
//! use intelliflo_core::prelude::*;
//! use intelliflo_core::protocol::{open_port, SerialTransport};
//!
//! let port = open_port("/dev/ttyUSB0", None)?;
//! let power = SharedState::new();
//! let mut pump = Intelliflo::new(SerialTransport::new(port), SystemClock::new())
//!     .with_sensors(PumpSensors::new().with_power(power.clone()));
//!
//! pump.setup();
//! pump.set_speed(1800);
//! loop {
//!     pump.tick()?;
//!     println!("Power: {:?} W", power.get());
//! }
//! ```

pub mod protocol;
pub mod sensors;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        Clock, Command, DriverConfig, Intelliflo, LinkState, ProtocolError, PumpEvent,
        SystemClock, TickError, TickReport, Transport,
    };
    pub use crate::sensors::{PumpSensors, PumpStatus, SharedState, StateSink};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
