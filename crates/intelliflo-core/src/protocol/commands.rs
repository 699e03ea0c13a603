//! Protocol commands
//!
//! Defines the commands the controller can send to an IntelliFlo pump.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::command_builder::PayloadBuilder;

/// Action bytes used in outbound commands
pub mod action {
    /// Write a pump register (external programs)
    pub const SET_REGISTER: u8 = 0x01;
    /// Local/remote control
    pub const CONTROL_MODE: u8 = 0x04;
    /// Select a local program
    pub const LOCAL_PROGRAM: u8 = 0x05;
    /// Run or stop the motor
    pub const RUN_STATE: u8 = 0x06;
    /// Status request (and report)
    pub const STATUS: u8 = 0x07;
    /// Target flow
    pub const SET_FLOW: u8 = 0x09;
    /// Target speed
    pub const SET_SPEED: u8 = 0x0A;
}

const RUN_ON: u8 = 0x0A;
const RUN_OFF: u8 = 0x04;
const CONTROL_LOCAL: u8 = 0x00;
const CONTROL_REMOTE: u8 = 0xFF;
const EXTERNAL_PROGRAM_REGISTER: u8 = 0x21;
const PROGRAM_VALUE_REGISTER_BASE: u8 = 0x26;

/// Commands understood by the pump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Ask the pump for a status report
    RequestStatus,

    /// Hand control back to the pump's own panel
    ForceLocal,

    /// Take control away from the pump's panel
    ForceRemote,

    /// Start the motor
    Run,

    /// Stop the motor
    Stop,

    /// Select one of the pump's locally stored programs (zero-based)
    SelectLocalProgram(u8),

    /// Select an external program slot
    SelectExternalProgram(u8),

    /// Store a value into an external program slot
    SaveProgramValue {
        /// External program slot
        program: u8,
        /// Value to store (big-endian on the wire)
        value: u16,
    },

    /// Set target motor speed in RPM
    SetSpeed(u16),

    /// Set target flow in tenths of m³/h (single byte on the wire)
    SetFlow(u8),
}

impl Command {
    /// Build the payload for this command (pre-checksum, post-preamble)
    pub fn payload(&self) -> Vec<u8> {
        match *self {
            Command::RequestStatus => PayloadBuilder::new(action::STATUS).build(),
            Command::ForceLocal => PayloadBuilder::new(action::CONTROL_MODE)
                .byte(CONTROL_LOCAL)
                .build(),
            Command::ForceRemote => PayloadBuilder::new(action::CONTROL_MODE)
                .byte(CONTROL_REMOTE)
                .build(),
            Command::Run => PayloadBuilder::new(action::RUN_STATE).byte(RUN_ON).build(),
            Command::Stop => PayloadBuilder::new(action::RUN_STATE).byte(RUN_OFF).build(),
            Command::SelectLocalProgram(program) => PayloadBuilder::new(action::LOCAL_PROGRAM)
                .byte(program.wrapping_add(1))
                .build(),
            Command::SelectExternalProgram(program) => {
                PayloadBuilder::new(action::SET_REGISTER)
                    .byte(0x03)
                    .byte(EXTERNAL_PROGRAM_REGISTER)
                    .byte(0x00)
                    .byte(program.wrapping_mul(8))
                    .build()
            }
            Command::SaveProgramValue { program, value } => {
                PayloadBuilder::new(action::SET_REGISTER)
                    .byte(0x03)
                    .byte(PROGRAM_VALUE_REGISTER_BASE.wrapping_add(program))
                    .u16_be(value)
                    .build()
            }
            Command::SetSpeed(rpm) => PayloadBuilder::new(action::SET_SPEED)
                .byte(0x02)
                .byte(0xC4)
                .u16_be(rpm)
                .build(),
            Command::SetFlow(tenths) => PayloadBuilder::new(action::SET_FLOW)
                .byte(0x02)
                .byte(0xC4)
                .byte(0x00)
                .byte(tenths)
                .build(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::RequestStatus => write!(f, "Requesting pump status"),
            Command::ForceLocal => write!(f, "Requesting local control"),
            Command::ForceRemote => write!(f, "Requesting remote control"),
            Command::Run => write!(f, "Run pump"),
            Command::Stop => write!(f, "Stop pump"),
            Command::SelectLocalProgram(p) => write!(f, "Command local program {}", p),
            Command::SelectExternalProgram(p) => write!(f, "Command external program {}", p),
            Command::SaveProgramValue { program, value } => {
                write!(f, "Save value for program {}: {}", program, value)
            }
            Command::SetSpeed(rpm) => write!(f, "Command speed: {} rpm", rpm),
            Command::SetFlow(tenths) => {
                write!(f, "Command flow: {:.1} m3/h", f64::from(*tenths) / 10.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_payloads() {
        assert_eq!(
            Command::RequestStatus.payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x07, 0x00]
        );
        assert_eq!(
            Command::ForceLocal.payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x04, 0x01, 0x00]
        );
        assert_eq!(
            Command::ForceRemote.payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x04, 0x01, 0xFF]
        );
        assert_eq!(
            Command::Run.payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x06, 0x01, 0x0A]
        );
        assert_eq!(
            Command::Stop.payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x06, 0x01, 0x04]
        );
    }

    #[test]
    fn test_program_payloads() {
        assert_eq!(
            Command::SelectLocalProgram(2).payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x05, 0x01, 0x03]
        );
        assert_eq!(
            Command::SelectExternalProgram(3).payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x01, 0x04, 0x03, 0x21, 0x00, 0x18]
        );
        assert_eq!(
            Command::SaveProgramValue {
                program: 1,
                value: 2500
            }
            .payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x01, 0x04, 0x03, 0x27, 0x09, 0xC4]
        );
    }

    #[test]
    fn test_speed_and_flow_payloads() {
        assert_eq!(
            Command::SetSpeed(3450).payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x0A, 0x04, 0x02, 0xC4, 0x0D, 0x7A]
        );
        assert_eq!(
            Command::SetFlow(125).payload(),
            vec![0xA5, 0x00, 0x60, 0x10, 0x09, 0x04, 0x02, 0xC4, 0x00, 0x7D]
        );
    }

    #[test]
    fn test_parameter_wrapping() {
        assert_eq!(Command::SelectLocalProgram(255).payload()[6], 0x00);
        assert_eq!(Command::SelectExternalProgram(40).payload()[9], 0x40);
    }

    #[test]
    fn test_payloads_fit_ten_bytes() {
        let all = [
            Command::RequestStatus,
            Command::ForceLocal,
            Command::ForceRemote,
            Command::Run,
            Command::Stop,
            Command::SelectLocalProgram(0),
            Command::SelectExternalProgram(0),
            Command::SaveProgramValue {
                program: 0,
                value: 0,
            },
            Command::SetSpeed(0),
            Command::SetFlow(0),
        ];
        assert!(all.iter().all(|c| c.payload().len() <= 10));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::SetFlow(125).to_string(), "Command flow: 12.5 m3/h");
        assert_eq!(Command::SetSpeed(1800).to_string(), "Command speed: 1800 rpm");
    }
}
