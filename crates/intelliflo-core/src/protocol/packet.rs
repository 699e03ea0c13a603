//! Packet encoding
//!
//! Implements the IntelliFlo link framing for outbound commands.
//!
//! Packet format:
//! - 3 bytes: link preamble `FF 00 FF`
//! - N bytes: payload, starting with the `A5` header byte
//! - 2 bytes: checksum (big-endian sum of payload bytes, mod 65536)

use byteorder::{BigEndian, ByteOrder};

use super::{ProtocolError, CHECKSUM_SIZE, PREAMBLE};

/// Sum bytes into a 16-bit checksum, wrapping on overflow.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// Wrap a payload with the link preamble and checksum trailer.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(PREAMBLE.len() + payload.len() + CHECKSUM_SIZE);
    packet.extend_from_slice(&PREAMBLE);
    packet.extend_from_slice(payload);

    let mut ck = [0u8; CHECKSUM_SIZE];
    BigEndian::write_u16(&mut ck, checksum(payload));
    packet.extend_from_slice(&ck);

    packet
}

/// Re-derive the checksum of an assembled packet and compare it with its trailer.
///
/// The summed region is everything between the preamble and the trailer.
pub fn verify(packet: &[u8]) -> Result<(), ProtocolError> {
    if packet.len() < PREAMBLE.len() + CHECKSUM_SIZE {
        return Err(ProtocolError::MalformedPacket(format!(
            "packet of {} bytes cannot hold preamble and checksum",
            packet.len()
        )));
    }

    let split = packet.len() - CHECKSUM_SIZE;
    let computed = checksum(&packet[PREAMBLE.len()..split]);
    let trailer = BigEndian::read_u16(&packet[split..]);

    if computed != trailer {
        return Err(ProtocolError::MalformedOutboundPacket { computed, trailer });
    }

    Ok(())
}

/// Render bytes as dot-separated upper-case hex followed by the length,
/// e.g. `A5.00.60 (3)`.
pub fn hex_pretty(data: &[u8]) -> String {
    let body = data
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(".");
    format!("{} ({})", body, data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_wraps() {
        let data = vec![0xFF; 300];
        // 300 * 255 = 76500, mod 65536 = 10964
        assert_eq!(checksum(&data), 10964);
    }

    #[test]
    fn test_encode_run() {
        let packet = encode(&[0xA5, 0x00, 0x60, 0x10, 0x06, 0x01, 0x0A]);
        assert_eq!(
            packet,
            vec![0xFF, 0x00, 0xFF, 0xA5, 0x00, 0x60, 0x10, 0x06, 0x01, 0x0A, 0x01, 0x26]
        );
        assert!(verify(&packet).is_ok());
    }

    #[test]
    fn test_verify_detects_corruption() {
        let mut packet = encode(&[0xA5, 0x00, 0x60, 0x10, 0x07, 0x00]);
        packet[6] ^= 0x01;

        match verify(&packet) {
            Err(ProtocolError::MalformedOutboundPacket { computed, trailer }) => {
                assert_ne!(computed, trailer);
            }
            other => panic!("expected malformed outbound packet, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_too_short() {
        assert!(verify(&[0xFF, 0x00, 0xFF, 0x00]).is_err());
    }

    #[test]
    fn test_hex_pretty() {
        assert_eq!(hex_pretty(&[0xA5, 0x00, 0x0A]), "A5.00.0A (3)");
        assert_eq!(hex_pretty(&[]), " (0)");
    }
}
