//! Command Builder
//!
//! Builds command payloads addressed from the controller to the pump.
//!
//! Every payload starts with the same five-byte header followed by a
//! length byte that counts the parameter bytes:
//!
//! `A5 00 <dest> <src> <action> <len> [params...]`

use byteorder::{BigEndian, ByteOrder};

use super::{HEADER_BYTE, PUMP_ADDRESS, REMOTE_ADDRESS};

/// Builder for pump command payloads (pre-checksum)
pub struct PayloadBuilder {
    action: u8,
    params: Vec<u8>,
}

impl PayloadBuilder {
    /// Start a payload for `action`, addressed from the controller to the pump
    pub fn new(action: u8) -> Self {
        Self {
            action,
            params: Vec::new(),
        }
    }

    /// Add a single parameter byte
    pub fn byte(mut self, b: u8) -> Self {
        self.params.push(b);
        self
    }

    /// Add a 16-bit parameter (big-endian)
    pub fn u16_be(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.params.extend_from_slice(&bytes);
        self
    }

    /// Build the payload, filling in the header and length byte
    pub fn build(self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(6 + self.params.len());
        payload.extend_from_slice(&[
            HEADER_BYTE,
            0x00,
            PUMP_ADDRESS,
            REMOTE_ADDRESS,
            self.action,
            self.params.len() as u8,
        ]);
        payload.extend_from_slice(&self.params);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_params() {
        let payload = PayloadBuilder::new(0x07).build();
        assert_eq!(payload, vec![0xA5, 0x00, 0x60, 0x10, 0x07, 0x00]);
    }

    #[test]
    fn test_length_counts_params() {
        let payload = PayloadBuilder::new(0x0A)
            .byte(0x02)
            .byte(0xC4)
            .u16_be(1800)
            .build();
        assert_eq!(
            payload,
            vec![0xA5, 0x00, 0x60, 0x10, 0x0A, 0x04, 0x02, 0xC4, 0x07, 0x08]
        );
    }
}
