//! Stream counters
//!
//! Updated by the pump and the on-demand capture path without taking any lock;
//! read as a point-in-time `StreamStats` snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::stream::StreamState;

/// Live counters for one device
#[derive(Debug)]
pub struct StreamCounters {
    created_at: Instant,
    frames_captured: AtomicU64,
    frames_delivered: AtomicU64,
    send_failures: AtomicU64,
    capture_failures: AtomicU64,
    sessions_started: AtomicU64,
}

impl StreamCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self {
            created_at: Instant::now(),
            frames_captured: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            capture_failures: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
        }
    }

    /// Record a successful capture
    pub fn record_capture(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed capture
    pub fn record_capture_failure(&self) {
        self.capture_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one frame delivered to `subscribers` channels
    pub fn record_delivered(&self, subscribers: u64) {
        self.frames_delivered.fetch_add(subscribers, Ordering::Relaxed);
    }

    /// Record a send that dropped its subscriber
    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a streaming session start
    pub fn record_session(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot
    pub fn snapshot(&self, state: StreamState, subscriber_count: usize) -> StreamStats {
        StreamStats {
            state,
            subscriber_count,
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            uptime: self.created_at.elapsed(),
        }
    }
}

impl Default for StreamCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time statistics for one device
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Controller state when the snapshot was taken
    pub state: StreamState,
    /// Currently registered subscribers
    pub subscriber_count: usize,
    /// Frames captured (on demand and streaming)
    pub frames_captured: u64,
    /// Successful sends, summed over subscribers
    pub frames_delivered: u64,
    /// Sends that failed and dropped their subscriber
    pub send_failures: u64,
    /// Failed captures
    pub capture_failures: u64,
    /// Streaming sessions started
    pub sessions_started: u64,
    /// Time since the device was created
    pub uptime: Duration,
}

impl StreamStats {
    /// Average capture rate over the device lifetime
    pub fn capture_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.frames_captured as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let stats = StreamCounters::new().snapshot(StreamState::Idle, 0);

        assert_eq!(stats.frames_captured, 0);
        assert_eq!(stats.frames_delivered, 0);
        assert_eq!(stats.send_failures, 0);
        assert_eq!(stats.capture_failures, 0);
        assert_eq!(stats.sessions_started, 0);
        assert_eq!(stats.state, StreamState::Idle);
    }

    #[test]
    fn test_counters_record() {
        let counters = StreamCounters::new();
        counters.record_session();
        counters.record_capture();
        counters.record_capture();
        counters.record_delivered(3);
        counters.record_send_failure();
        counters.record_capture_failure();

        let stats = counters.snapshot(StreamState::Running, 2);
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.frames_captured, 2);
        assert_eq!(stats.frames_delivered, 3);
        assert_eq!(stats.send_failures, 1);
        assert_eq!(stats.capture_failures, 1);
        assert_eq!(stats.subscriber_count, 2);
    }

    #[test]
    fn test_capture_rate_zero_uptime() {
        let stats = StreamStats {
            state: StreamState::Idle,
            subscriber_count: 0,
            frames_captured: 10,
            frames_delivered: 0,
            send_failures: 0,
            capture_failures: 0,
            sessions_started: 0,
            uptime: Duration::ZERO,
        };

        assert_eq!(stats.capture_rate(), 0.0);
    }

    #[test]
    fn test_capture_rate() {
        let stats = StreamStats {
            state: StreamState::Running,
            subscriber_count: 1,
            frames_captured: 40,
            frames_delivered: 40,
            send_failures: 0,
            capture_failures: 0,
            sessions_started: 1,
            uptime: Duration::from_secs(10),
        };

        assert_eq!(stats.capture_rate(), 4.0);
    }
}
