//! Frame validator for the inbound byte stream.
//!
//! Bytes are judged positionally as they arrive. The receive buffer only
//! ever holds a plausible frame prefix:
//!
//! - bytes 0..=3 must match `FF 00 FF A5`
//! - bytes 4..=8 are taken as-is (byte 8 is the payload length)
//! - the frame is complete at `payload_len + 11` bytes, the last two of
//!   which are the big-endian checksum
//!
//! Any mismatch clears the buffer. There is no attempt to resynchronise
//! inside the discarded bytes; the next byte starts a fresh candidate.

use byteorder::{BigEndian, ByteOrder};
use tracing::{info, warn};

use super::packet::{checksum, hex_pretty};
use super::{ProtocolError, CHECKSUM_SIZE, FRAME_HEADER, LENGTH_INDEX, PREAMBLE};

/// Outcome of feeding one byte
#[derive(Debug)]
pub enum FeedResult {
    /// Still a plausible frame prefix
    Incomplete,
    /// A checksum-verified frame with the `FF 00 FF` preamble stripped
    Accepted(Vec<u8>),
    /// The candidate frame was discarded
    Rejected(ProtocolError),
}

/// Incremental frame validator
#[derive(Debug, Default)]
pub struct FrameValidator {
    /// Current candidate frame
    buffer: Vec<u8>,
}

impl FrameValidator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    /// Append one byte and judge the candidate frame.
    pub fn feed(&mut self, byte: u8) -> FeedResult {
        self.buffer.push(byte);

        match self.judge() {
            Ok(false) => FeedResult::Incomplete,
            Ok(true) => {
                let frame = self.buffer.split_off(PREAMBLE.len());
                self.buffer.clear();
                info!("Package received: {}", hex_pretty(&frame));
                FeedResult::Accepted(frame)
            }
            Err(e) => {
                self.buffer.clear();
                FeedResult::Rejected(e)
            }
        }
    }

    /// Number of bytes in the current candidate frame
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if no candidate frame is in progress
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop any partial frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// `Ok(true)` when the buffer holds a complete valid frame,
    /// `Ok(false)` while it is still a valid prefix.
    fn judge(&self) -> Result<bool, ProtocolError> {
        let at = self.buffer.len() - 1;
        let data = &self.buffer;

        if at < FRAME_HEADER.len() {
            let expected = FRAME_HEADER[at];
            if data[at] != expected {
                return Err(ProtocolError::HeaderMismatch {
                    position: at,
                    expected,
                    actual: data[at],
                });
            }
            return Ok(false);
        }

        // Reserved bytes and the length byte are not checked
        if at <= LENGTH_INDEX {
            return Ok(false);
        }

        let payload_len = data[LENGTH_INDEX] as usize;
        let last = payload_len + LENGTH_INDEX + CHECKSUM_SIZE;
        if at < last {
            return Ok(false);
        }

        let trailer = last + 1 - CHECKSUM_SIZE;
        let computed = checksum(&data[PREAMBLE.len()..trailer]);
        let received = BigEndian::read_u16(&data[trailer..=last]);

        if computed != received {
            warn!(
                "CHECKSUM MISMATCH - computed {}, received {}",
                computed, received
            );
            return Err(ProtocolError::ChecksumMismatch { computed, received });
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::encode;

    fn feed_all(validator: &mut FrameValidator, bytes: &[u8]) -> Vec<FeedResult> {
        bytes.iter().map(|&b| validator.feed(b)).collect()
    }

    #[test]
    fn test_zero_length_frame() {
        let mut validator = FrameValidator::new();
        let bytes = [
            0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xA5,
        ];
        let results = feed_all(&mut validator, &bytes);

        assert!(results[..10]
            .iter()
            .all(|r| matches!(r, FeedResult::Incomplete)));
        match &results[10] {
            FeedResult::Accepted(frame) => {
                assert_eq!(
                    frame,
                    &vec![0xA5, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xA5]
                );
            }
            other => panic!("expected accept, got {:?}", other),
        }
        assert!(validator.is_empty());
    }

    #[test]
    fn test_bad_preamble_rejected_immediately() {
        let mut validator = FrameValidator::new();
        match validator.feed(0x00) {
            FeedResult::Rejected(ProtocolError::HeaderMismatch { position, .. }) => {
                assert_eq!(position, 0)
            }
            other => panic!("expected header mismatch, got {:?}", other),
        }
        assert!(validator.is_empty());

        feed_all(&mut validator, &[0xFF, 0x00]);
        assert!(matches!(
            validator.feed(0x00),
            FeedResult::Rejected(ProtocolError::HeaderMismatch { position: 2, .. })
        ));
        assert!(validator.is_empty());
    }

    #[test]
    fn test_wrong_header_byte() {
        let mut validator = FrameValidator::new();
        let results = feed_all(&mut validator, &[0xFF, 0x00, 0xFF, 0xA4]);
        assert!(matches!(
            results[3],
            FeedResult::Rejected(ProtocolError::HeaderMismatch {
                position: 3,
                expected: 0xA5,
                actual: 0xA4
            })
        ));
    }

    #[test]
    fn test_checksum_mismatch_clears() {
        let mut validator = FrameValidator::new();
        let mut frame = encode(&[0xA5, 0x00, 0x10, 0x60, 0x07, 0x00]);
        let last = frame.len() - 1;
        frame[last] ^= 0x80;

        let results = feed_all(&mut validator, &frame);
        assert!(matches!(
            results[last],
            FeedResult::Rejected(ProtocolError::ChecksumMismatch { .. })
        ));
        assert!(validator.is_empty());
    }

    #[test]
    fn test_partial_frame_is_retained() {
        let mut validator = FrameValidator::new();
        let frame = encode(&[0xA5, 0x00, 0x10, 0x60, 0x07, 0x02, 0x01, 0x02]);
        feed_all(&mut validator, &frame[..9]);
        assert_eq!(validator.len(), 9);

        validator.clear();
        assert!(validator.is_empty());
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut validator = FrameValidator::new();
        let first = encode(&[0xA5, 0x00, 0x10, 0x60, 0x04, 0x01, 0xFF]);
        let second = encode(&[0xA5, 0x00, 0x10, 0x60, 0x05, 0x01, 0x00]);

        let mut stream = first.clone();
        stream.extend_from_slice(&second);

        let accepted: Vec<Vec<u8>> = feed_all(&mut validator, &stream)
            .into_iter()
            .filter_map(|r| match r {
                FeedResult::Accepted(f) => Some(f),
                _ => None,
            })
            .collect();

        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0], first[3..].to_vec());
        assert_eq!(accepted[1], second[3..].to_vec());
    }
}
