//! Packet interpretation
//!
//! Classifies accepted frames (preamble already stripped, so `frame[0]` is
//! `A5`) and publishes status reports.
//!
//! Frame layout after stripping:
//! `A5 00 <dest> <src> <action> <len> [payload...] <ck_hi> <ck_lo>`

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ProtocolError;
use crate::sensors::{PumpSensors, PumpStatus};

const RUN_STOPPED: u8 = 0x00;
const RUN_RUNNING: u8 = 0x01;

/// Pump addresses that mark a frame as relevant in the source position
const PUMP_SOURCES: [u8; 3] = [0x60, 0x61, 0x62];

/// Something the pump told us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpEvent {
    /// Pump switched to an external program
    ExternalProgram(u8),
    /// Pump is under local (panel) control
    LocalControl,
    /// Pump is under remote control
    RemoteControl,
    /// Pump switched to a local program
    LocalProgram(u8),
    /// Status report
    Status(PumpStatus),
}

/// Stateless decoder for accepted frames
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketInterpreter;

impl PacketInterpreter {
    /// Create an interpreter
    pub fn new() -> Self {
        Self
    }

    /// Decode a frame and publish status values to the monitored sensors.
    ///
    /// Returns `None` for frames that are not relevant or not recognised,
    /// and for relevant frames too short to decode (logged at warn).
    pub fn interpret(&self, frame: &[u8], sensors: &mut PumpSensors) -> Option<PumpEvent> {
        match decode(frame) {
            Ok(Some(event)) => {
                self.report(&event);
                if let PumpEvent::Status(status) = &event {
                    sensors.publish(status);
                }
                Some(event)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Dropping packet: {}", e);
                None
            }
        }
    }

    fn report(&self, event: &PumpEvent) {
        match event {
            PumpEvent::ExternalProgram(p) => info!("Pump goes to ext program {}", p),
            PumpEvent::LocalControl => info!("Pump is local"),
            PumpEvent::RemoteControl => info!("Pump is remote"),
            PumpEvent::LocalProgram(p) => info!("Pump goes to local program {}", p),
            PumpEvent::Status(status) => {
                if status.running.is_none() {
                    warn!("Received unknown running value {}", status.run_code);
                }
                info!(
                    "Pump status: run={:#04x} power={}W speed={}rpm",
                    status.run_code, status.power_watts, status.speed_rpm
                );
            }
        }
    }
}

/// Decode without side effects.
pub fn decode(frame: &[u8]) -> Result<Option<PumpEvent>, ProtocolError> {
    let (Some(&src), Some(&action)) = (frame.get(3), frame.get(4)) else {
        return Ok(None);
    };

    // Matches either a pump source address or action 0x64 in the next byte
    if !(PUMP_SOURCES.contains(&src) || action == 0x64) {
        return Ok(None);
    }

    let event = match action {
        0x01 => PumpEvent::ExternalProgram(byte_at(frame, 6)?),
        0x04 => match byte_at(frame, 6)? {
            0x00 => PumpEvent::LocalControl,
            0xFF => PumpEvent::RemoteControl,
            _ => return Ok(None),
        },
        0x05 => PumpEvent::LocalProgram(byte_at(frame, 7)?),
        0x07 => {
            let fields = frame.get(6..13).ok_or_else(|| {
                ProtocolError::MalformedPacket(format!(
                    "status frame of {} bytes is too short",
                    frame.len()
                ))
            })?;
            let run_code = fields[0];
            let running = match run_code {
                RUN_STOPPED => Some(false),
                RUN_RUNNING => Some(true),
                _ => None,
            };
            PumpEvent::Status(PumpStatus {
                run_code,
                running,
                power_watts: BigEndian::read_u16(&fields[3..5]),
                speed_rpm: BigEndian::read_u16(&fields[5..7]),
            })
        }
        _ => return Ok(None),
    };

    Ok(Some(event))
}

fn byte_at(frame: &[u8], index: usize) -> Result<u8, ProtocolError> {
    frame.get(index).copied().ok_or_else(|| {
        ProtocolError::MalformedPacket(format!(
            "frame of {} bytes has no byte {}",
            frame.len(),
            index
        ))
    })
}
