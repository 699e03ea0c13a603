//! Serial Protocol Communication
//!
//! Implements the Pentair IntelliFlo RS-485 protocol.
//!
//! Wire format (bit-exact):
//! `FF 00 FF A5 [reserved x4] [len] [payload x len] [ck_hi] [ck_lo]`
//! where the checksum is the sum of every byte from `A5` through the end
//! of the payload, mod 65536.

mod clock;
pub mod command_builder;
pub mod commands;
mod driver;
mod error;
pub mod interpreter;
pub mod packet;
mod scheduler;
pub mod serial;
pub mod stream;
mod validator;

pub use clock::{Clock, SystemClock};
pub use command_builder::PayloadBuilder;
pub use commands::Command;
pub use driver::{DriverConfig, Intelliflo, LinkCounters, TickError, TickReport};
pub use error::ProtocolError;
pub use interpreter::{PacketInterpreter, PumpEvent};
pub use scheduler::{LinkState, TransmitScheduler};
pub use serial::{configure_port, list_ports, open_port, PortInfo};
pub use stream::{SerialTransport, TcpTransport, Transport};
pub use validator::{FeedResult, FrameValidator};

/// Link preamble preceding every frame
pub const PREAMBLE: [u8; 3] = [0xFF, 0x00, 0xFF];

/// Preamble plus the `A5` header byte
pub const FRAME_HEADER: [u8; 4] = [0xFF, 0x00, 0xFF, HEADER_BYTE];

/// First byte after the preamble
pub const HEADER_BYTE: u8 = 0xA5;

/// Index of the payload length byte in a raw frame
pub const LENGTH_INDEX: usize = 8;

/// Size of the checksum trailer
pub const CHECKSUM_SIZE: usize = 2;

/// Address of the (first) pump on the bus
pub const PUMP_ADDRESS: u8 = 0x60;

/// Address we send from (remote controller)
pub const REMOTE_ADDRESS: u8 = 0x10;

/// Default baud rate for the pump bus
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Silence required on the link before we transmit
pub const DEFAULT_QUIET_WINDOW_MS: u64 = 100;

/// Default status polling interval
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10_000;
