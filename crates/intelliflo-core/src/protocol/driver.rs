//! Pump driver
//!
//! Owns the link and every piece of protocol state. The host calls
//! [`Intelliflo::tick`] periodically from a single context:
//!
//! 1. all available inbound bytes go through the frame validator, and each
//!    accepted frame through the interpreter;
//! 2. if the link has been quiet long enough, at most one queued frame is
//!    written.
//!
//! Frame rejections are absorbed and logged. Only transport I/O errors are
//! returned, as a [`TickError`] that still carries the work done before the
//! failure.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    packet::{encode, hex_pretty, verify},
    Clock, Command, FeedResult, FrameValidator, LinkState, PacketInterpreter, ProtocolError,
    PumpEvent, TransmitScheduler, Transport, DEFAULT_BAUD_RATE, DEFAULT_QUIET_WINDOW_MS,
    DEFAULT_UPDATE_INTERVAL_MS,
};
use crate::sensors::PumpSensors;

/// Local program selected on startup unless configured otherwise
const DEFAULT_STARTUP_PROGRAM: u8 = 2;

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Serial port name
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Silence required before transmitting, in milliseconds
    pub quiet_window_ms: u64,
    /// How often the host should call [`Intelliflo::update`]
    pub update_interval_ms: u64,
    /// Local program selected by [`Intelliflo::setup`]
    pub startup_program: Option<u8>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            quiet_window_ms: DEFAULT_QUIET_WINDOW_MS,
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            startup_program: Some(DEFAULT_STARTUP_PROGRAM),
        }
    }
}

impl DriverConfig {
    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::Config(e.to_string()))
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ProtocolError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Cumulative link counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounters {
    /// Bytes read from the link
    pub rx_bytes: u64,
    /// Frames that passed framing and checksum
    pub rx_frames: u64,
    /// Candidate frames dropped on checksum mismatch
    pub checksum_errors: u64,
    /// Bytes written to the link
    pub tx_bytes: u64,
    /// Frames written to the link
    pub tx_frames: u64,
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Inbound bytes consumed
    pub bytes_read: usize,
    /// Events decoded from accepted frames, in arrival order
    pub events: Vec<PumpEvent>,
    /// Candidate frames discarded (header or checksum mismatch)
    pub rejected: usize,
    /// The frame written to the link, if any
    pub sent: Option<Vec<u8>>,
}

/// A tick cut short by a transport failure
#[derive(Error, Debug)]
#[error("{source}")]
pub struct TickError {
    /// Work completed before the failure. Its events were already published.
    pub report: TickReport,
    /// The failure
    #[source]
    pub source: ProtocolError,
}

/// IntelliFlo pump driver
pub struct Intelliflo<T: Transport, C: Clock> {
    transport: T,
    clock: C,
    config: DriverConfig,
    validator: FrameValidator,
    interpreter: PacketInterpreter,
    scheduler: TransmitScheduler,
    sensors: PumpSensors,
    counters: LinkCounters,
}

impl<T: Transport, C: Clock> Intelliflo<T, C> {
    /// Create a driver with default configuration and no sensors
    pub fn new(transport: T, clock: C) -> Self {
        Self::with_config(transport, clock, DriverConfig::default())
    }

    /// Create a driver with the given configuration
    pub fn with_config(transport: T, clock: C, config: DriverConfig) -> Self {
        let scheduler = TransmitScheduler::with_quiet_window(clock.now_ms(), config.quiet_window_ms);
        Self {
            transport,
            clock,
            config,
            validator: FrameValidator::new(),
            interpreter: PacketInterpreter::new(),
            scheduler,
            sensors: PumpSensors::new(),
            counters: LinkCounters::default(),
        }
    }

    /// Attach the observables to publish to
    pub fn with_sensors(mut self, sensors: PumpSensors) -> Self {
        self.sensors = sensors;
        self
    }

    /// Mutable access to the published observables
    pub fn sensors_mut(&mut self) -> &mut PumpSensors {
        &mut self.sensors
    }

    /// Active configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Current link state
    pub fn link_state(&self) -> LinkState {
        self.scheduler.state()
    }

    /// Frames waiting to be sent, front first
    pub fn pending_frames(&self) -> impl Iterator<Item = &[u8]> {
        self.scheduler.pending()
    }

    /// Bytes of the partial frame currently being received
    pub fn rx_pending(&self) -> usize {
        self.validator.len()
    }

    /// Snapshot of the link counters
    pub fn counters(&self) -> LinkCounters {
        self.counters
    }

    /// Run one scheduling step. Never blocks.
    pub fn tick(&mut self) -> Result<TickReport, TickError> {
        let mut report = TickReport::default();
        match self.step(&mut report) {
            Ok(()) => Ok(report),
            Err(source) => Err(TickError { report, source }),
        }
    }

    fn step(&mut self, report: &mut TickReport) -> Result<(), ProtocolError> {
        while self.transport.available()? > 0 {
            let Some(byte) = self.transport.read_byte()? else {
                break;
            };
            self.scheduler.note_activity(self.clock.now_ms());
            self.counters.rx_bytes += 1;
            report.bytes_read += 1;

            match self.validator.feed(byte) {
                FeedResult::Incomplete => {}
                FeedResult::Accepted(frame) => {
                    self.counters.rx_frames += 1;
                    if let Some(event) = self.interpreter.interpret(&frame, &mut self.sensors) {
                        report.events.push(event);
                    }
                }
                FeedResult::Rejected(e) => {
                    if matches!(e, ProtocolError::ChecksumMismatch { .. }) {
                        self.counters.checksum_errors += 1;
                    }
                    debug!("Frame rejected: {}", e);
                    report.rejected += 1;
                }
            }
        }

        if let Some(frame) = self.scheduler.poll(self.clock.now_ms()) {
            self.transmit(&frame)?;
            report.sent = Some(frame);
        }

        Ok(())
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
        self.transport.flush()?;
        self.transport.write_bytes(frame)?;

        self.counters.tx_bytes += frame.len() as u64;
        self.counters.tx_frames += 1;
        info!("Sent: {}", hex_pretty(frame));
        Ok(())
    }

    /// Encode a payload and queue it.
    ///
    /// Returns false if the assembled packet failed its checksum self-check
    /// and was discarded.
    pub fn queue_packet(&mut self, payload: &[u8]) -> bool {
        debug!("Queueing payload of {} bytes", payload.len());
        self.enqueue_checked(encode(payload))
    }

    /// Queue an already encoded packet if its checksum trailer is right.
    ///
    /// Returns false, and logs a warning, if the packet was discarded.
    pub fn enqueue_checked(&mut self, packet: Vec<u8>) -> bool {
        match verify(&packet) {
            Ok(()) => {
                self.scheduler.enqueue(packet);
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Queue any command
    pub fn send(&mut self, command: Command) {
        info!("{}", command);
        self.queue_packet(&command.payload());
    }

    /// Ask the pump for a status report
    pub fn request_status(&mut self) {
        self.send(Command::RequestStatus);
    }

    /// Hand control back to the pump panel
    pub fn force_local(&mut self) {
        self.send(Command::ForceLocal);
    }

    /// Take control from the pump panel
    pub fn force_remote(&mut self) {
        self.send(Command::ForceRemote);
    }

    /// Start the motor
    pub fn run(&mut self) {
        self.send(Command::Run);
    }

    /// Stop the motor
    pub fn stop(&mut self) {
        self.send(Command::Stop);
    }

    /// Switch-style control: `true` runs the pump, `false` stops it
    pub fn set_running(&mut self, on: bool) {
        if on {
            self.run();
        } else {
            self.stop();
        }
    }

    /// Select a local program (zero-based)
    pub fn select_local_program(&mut self, program: u8) {
        self.send(Command::SelectLocalProgram(program));
    }

    /// Select an external program slot
    pub fn select_external_program(&mut self, program: u8) {
        self.send(Command::SelectExternalProgram(program));
    }

    /// Store a value into an external program slot
    pub fn save_program_value(&mut self, program: u8, value: u16) {
        self.send(Command::SaveProgramValue { program, value });
    }

    /// Target speed in RPM
    pub fn set_speed(&mut self, rpm: u16) {
        self.send(Command::SetSpeed(rpm));
    }

    /// Target flow in tenths of m³/h
    pub fn set_flow(&mut self, tenths: u8) {
        self.send(Command::SetFlow(tenths));
    }

    /// Startup hook: select the configured local program
    pub fn setup(&mut self) {
        if let Some(program) = self.config.startup_program {
            self.select_local_program(program);
        }
    }

    /// Polling hook: ask for status, then hand control back to the panel
    pub fn update(&mut self) {
        self.request_status();
        self.force_local();
    }

    /// Log the active configuration
    pub fn dump_config(&self) {
        info!("Pentair IntelliFlo");
        info!("  Port: {}", self.config.port_name);
        info!("  Baud rate: {}", self.config.baud_rate);
        info!("  Quiet window: {}ms", self.config.quiet_window_ms);
        info!("  Update interval: {}ms", self.config.update_interval_ms);
        match self.config.startup_program {
            Some(p) => info!("  Startup program: {}", p),
            None => info!("  Startup program: none"),
        }
    }
}
