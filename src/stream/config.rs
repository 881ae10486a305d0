//! Streaming configuration

use std::time::Duration;

/// Default pause between two pump cycles (about 4 frames per second)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(250);

/// Default number of frames a pipe subscriber may fall behind
pub const DEFAULT_PIPE_CAPACITY: usize = 8;

/// Stream pump and pipe options
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// Sleep between the end of one fan-out and the next capture
    pub frame_interval: Duration,

    /// Queue depth of in-process pipe subscribers
    ///
    /// A subscriber whose queue is full when a frame arrives is dropped.
    pub pipe_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }
}

impl StreamConfig {
    /// Set the pause between pump cycles
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the pipe queue depth (at least 1)
    pub fn pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }
}
