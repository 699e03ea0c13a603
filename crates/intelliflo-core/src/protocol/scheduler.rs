//! Transmit scheduler for the half-duplex link.
//!
//! Outbound frames wait in a FIFO until the link has been quiet for longer
//! than the quiet window. Any received byte, and every frame we send,
//! counts as link activity and puts the link back into [`LinkState::Busy`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use super::DEFAULT_QUIET_WINDOW_MS;

/// Link state as seen by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    /// Silent long enough to transmit
    Quiet,
    /// Recent activity, transmission suppressed
    Busy,
}

/// FIFO of encoded frames gated by the quiet window
#[derive(Debug)]
pub struct TransmitScheduler {
    queue: VecDeque<Vec<u8>>,
    state: LinkState,
    /// Timestamp of the last byte seen on the link, in either direction
    last_activity_ms: u64,
    quiet_window_ms: u64,
}

impl TransmitScheduler {
    /// Create a scheduler that starts Busy, with `now_ms` as the last activity
    pub fn new(now_ms: u64) -> Self {
        Self::with_quiet_window(now_ms, DEFAULT_QUIET_WINDOW_MS)
    }

    /// Create a scheduler with a custom quiet window
    pub fn with_quiet_window(now_ms: u64, quiet_window_ms: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            state: LinkState::Busy,
            last_activity_ms: now_ms,
            quiet_window_ms,
        }
    }

    /// Append an encoded frame to the back of the queue
    pub fn enqueue(&mut self, frame: Vec<u8>) {
        self.queue.push_back(frame);
    }

    /// Record a received byte.
    pub fn note_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
        self.state = LinkState::Busy;
    }

    /// Re-evaluate the link state and release at most one frame.
    ///
    /// A released frame counts as activity at `now_ms`, so the next one
    /// waits a full quiet window.
    pub fn poll(&mut self, now_ms: u64) -> Option<Vec<u8>> {
        if self.state == LinkState::Busy
            && now_ms.saturating_sub(self.last_activity_ms) > self.quiet_window_ms
        {
            self.state = LinkState::Quiet;
        }

        if self.state != LinkState::Quiet {
            return None;
        }

        let frame = self.queue.pop_front()?;
        debug!("Releasing frame, {} still queued", self.queue.len());
        self.note_activity(now_ms);
        Some(frame)
    }

    /// Current link state (as of the last poll or activity)
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Timestamp of the last link activity
    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    /// Quiet window in milliseconds
    pub fn quiet_window_ms(&self) -> u64 {
        self.quiet_window_ms
    }

    /// Number of frames waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Frames waiting, front first
    pub fn pending(&self) -> impl Iterator<Item = &[u8]> {
        self.queue.iter().map(|f| f.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_busy() {
        let mut scheduler = TransmitScheduler::new(0);
        scheduler.enqueue(vec![1]);
        assert_eq!(scheduler.poll(0), None);
        assert_eq!(scheduler.poll(100), None);
        assert_eq!(scheduler.state(), LinkState::Busy);
        assert_eq!(scheduler.poll(101), Some(vec![1]));
    }

    #[test]
    fn test_quiet_without_queue_stays_quiet() {
        let mut scheduler = TransmitScheduler::new(0);
        assert_eq!(scheduler.poll(500), None);
        assert_eq!(scheduler.state(), LinkState::Quiet);

        scheduler.enqueue(vec![7]);
        assert_eq!(scheduler.poll(501), Some(vec![7]));
        assert_eq!(scheduler.state(), LinkState::Busy);
        assert_eq!(scheduler.last_activity_ms(), 501);
    }

    #[test]
    fn test_one_frame_per_window_in_order() {
        let mut scheduler = TransmitScheduler::new(0);
        scheduler.enqueue(vec![1]);
        scheduler.enqueue(vec![2]);
        scheduler.enqueue(vec![3]);

        assert_eq!(scheduler.poll(200), Some(vec![1]));
        assert_eq!(scheduler.poll(200), None);
        assert_eq!(scheduler.poll(300), None);
        assert_eq!(scheduler.poll(301), Some(vec![2]));
        assert_eq!(scheduler.poll(402), Some(vec![3]));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_activity_returns_to_busy() {
        let mut scheduler = TransmitScheduler::new(0);
        assert_eq!(scheduler.poll(150), None);
        assert_eq!(scheduler.state(), LinkState::Quiet);

        scheduler.note_activity(160);
        scheduler.enqueue(vec![9]);
        assert_eq!(scheduler.state(), LinkState::Busy);
        assert_eq!(scheduler.poll(200), None);
        assert_eq!(scheduler.poll(261), Some(vec![9]));
    }

    #[test]
    fn test_custom_window() {
        let mut scheduler = TransmitScheduler::with_quiet_window(0, 10);
        scheduler.enqueue(vec![1]);
        assert_eq!(scheduler.poll(10), None);
        assert_eq!(scheduler.poll(11), Some(vec![1]));
        assert_eq!(scheduler.quiet_window_ms(), 10);
    }

    #[test]
    fn test_pending_front_first() {
        let mut scheduler = TransmitScheduler::new(0);
        scheduler.enqueue(vec![1, 2]);
        scheduler.enqueue(vec![3]);
        let pending: Vec<&[u8]> = scheduler.pending().collect();
        assert_eq!(pending, vec![&[1u8, 2][..], &[3u8][..]]);
        assert_eq!(scheduler.len(), 2);
    }
}
