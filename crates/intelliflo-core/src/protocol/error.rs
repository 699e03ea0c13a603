//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the pump
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Port could not be listed, opened or configured
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// A byte did not match the fixed frame header
    #[error("Header mismatch at byte {position}: expected {expected:#04x}, got {actual:#04x}")]
    HeaderMismatch {
        /// Index in the raw frame
        position: usize,
        /// Byte the header requires there
        expected: u8,
        /// Byte received
        actual: u8,
    },

    /// Trailer did not match the sum of the frame
    #[error("Checksum mismatch: computed {computed:#06x}, received {received:#06x}")]
    ChecksumMismatch {
        /// Sum over the frame
        computed: u16,
        /// Trailer value
        received: u16,
    },

    /// Frame too short or otherwise undecodable
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// An outbound packet failed its self-check
    #[error("Asked to queue malformed packet: checksum {computed:#06x}, trailer {trailer:#06x}")]
    MalformedOutboundPacket {
        /// Sum over the packet
        computed: u16,
        /// Trailer the packet carries
        trailer: u16,
    },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport or file I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
