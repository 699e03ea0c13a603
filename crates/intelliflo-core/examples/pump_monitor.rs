//! IntelliFlo Pump Monitor
//!
//! A standalone tool that polls a pump over RS-485 and prints its status.
//!
//! Usage:
//!   cargo run --example pump_monitor -- [OPTIONS]
//!
//! Options:
//!   --port PORT       Serial port (default: first USB adapter found)
//!   --config FILE     JSON driver configuration
//!   --speed RPM       Command a target speed once after startup
//!   --list            List serial ports and exit
//!
//! Set RUST_LOG=debug for frame-level output.

use anyhow::{bail, Context};
use intelliflo_core::prelude::*;
use intelliflo_core::protocol::{list_ports, open_port, SerialTransport};
use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_millis(10);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = DriverConfig::default();
    let mut port_override = None;
    let mut speed = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                i += 1;
                port_override = args.get(i).cloned();
            }
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).context("--config needs a file")?;
                config = DriverConfig::from_file(path)?;
            }
            "--speed" | "-s" => {
                i += 1;
                let rpm = args.get(i).context("--speed needs a value")?;
                speed = Some(rpm.parse::<u16>().context("invalid RPM")?);
            }
            "--list" | "-l" => {
                for port in list_ports() {
                    println!("{}  {}", port.name, port.product.unwrap_or_default());
                }
                return Ok(());
            }
            other => bail!("unknown argument: {}", other),
        }
        i += 1;
    }

    if let Some(port) = port_override {
        config.port_name = port;
    }
    if config.port_name.is_empty() {
        config.port_name = list_ports()
            .into_iter()
            .next()
            .map(|p| p.name)
            .context("no serial ports found")?;
    }

    let port = open_port(&config.port_name, Some(config.baud_rate))?;

    let running = SharedState::<bool>::new();
    let power = SharedState::<u16>::new();
    let rpm = SharedState::<u16>::new();
    let sensors = PumpSensors::new()
        .with_running(running.clone())
        .with_power(power.clone())
        .with_rpm(rpm.clone());

    let update_interval = Duration::from_millis(config.update_interval_ms);
    let mut pump = Intelliflo::with_config(SerialTransport::new(port), SystemClock::new(), config)
        .with_sensors(sensors);

    pump.dump_config();
    pump.setup();
    if let Some(rpm) = speed {
        pump.force_remote();
        pump.set_speed(rpm);
    }

    let mut last_update = Instant::now();
    pump.update();

    loop {
        let report = pump.tick()?;
        if report
            .events
            .iter()
            .any(|e| matches!(e, PumpEvent::Status(_)))
        {
            println!(
                "running={:?} power={:?}W speed={:?}rpm",
                running.get(),
                power.get(),
                rpm.get()
            );
        }

        if last_update.elapsed() >= update_interval {
            last_update = Instant::now();
            pump.update();
        }

        std::thread::sleep(TICK);
    }
}
