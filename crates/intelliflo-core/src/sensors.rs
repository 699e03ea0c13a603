//! Published pump observables
//!
//! The driver publishes run state, power draw and motor speed to optional
//! sinks. Any of them may be left unset when the value is not monitored.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A target that receives published values
pub trait StateSink<T> {
    /// Publish a new value. Fire-and-forget.
    fn publish_state(&mut self, value: T);
}

impl<T, F> StateSink<T> for F
where
    F: FnMut(T),
{
    fn publish_state(&mut self, value: T) {
        self(value)
    }
}

/// Cloneable in-memory sink holding the last published value
#[derive(Debug)]
pub struct SharedState<T> {
    inner: Arc<Mutex<SharedInner<T>>>,
}

#[derive(Debug)]
struct SharedInner<T> {
    value: Option<T>,
    publish_count: usize,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedState<T> {
    /// Create an empty shared state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedInner {
                value: None,
                publish_count: 0,
            })),
        }
    }

    /// Number of times a value has been published
    pub fn publish_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.publish_count)
            .unwrap_or_default()
    }
}

impl<T: Clone> SharedState<T> {
    /// Last published value, if any
    pub fn get(&self) -> Option<T> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.value.clone())
    }
}

impl<T> StateSink<T> for SharedState<T> {
    fn publish_state(&mut self, value: T) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.value = Some(value);
            inner.publish_count += 1;
        }
    }
}

/// The set of observables the driver can publish to
#[derive(Default)]
pub struct PumpSensors {
    /// Motor running (binary sensor)
    pub running: Option<Box<dyn StateSink<bool> + Send>>,
    /// Power draw in watts
    pub power: Option<Box<dyn StateSink<u16> + Send>>,
    /// Motor speed in RPM
    pub rpm: Option<Box<dyn StateSink<u16> + Send>>,
}

impl PumpSensors {
    /// No observables monitored
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a run-state sink
    pub fn with_running(mut self, sink: impl StateSink<bool> + Send + 'static) -> Self {
        self.running = Some(Box::new(sink));
        self
    }

    /// Attach a power sink
    pub fn with_power(mut self, sink: impl StateSink<u16> + Send + 'static) -> Self {
        self.power = Some(Box::new(sink));
        self
    }

    /// Attach a speed sink
    pub fn with_rpm(mut self, sink: impl StateSink<u16> + Send + 'static) -> Self {
        self.rpm = Some(Box::new(sink));
        self
    }

    /// Publish a decoded status report to whichever sinks are present
    pub fn publish(&mut self, status: &PumpStatus) {
        if let (Some(sink), Some(running)) = (self.running.as_mut(), status.running) {
            sink.publish_state(running);
        }
        if let Some(sink) = self.power.as_mut() {
            sink.publish_state(status.power_watts);
        }
        if let Some(sink) = self.rpm.as_mut() {
            sink.publish_state(status.speed_rpm);
        }
    }
}

/// A decoded status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpStatus {
    /// Raw run-state byte as received
    pub run_code: u8,
    /// Decoded run state, `None` if the code is not recognised
    pub running: Option<bool>,
    /// Power draw in watts
    pub power_watts: u16,
    /// Motor speed in RPM
    pub speed_rpm: u16,
}
