//! Stream lifecycle types

use crate::error::CaptureError;

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No pump is running
    Idle,
    /// A pump is capturing and fanning out frames
    Running,
}

/// Observable controller status
///
/// Published on a watch channel; `Failed` is the notification that a streaming
/// session died on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    /// Never started, or stopped by a caller
    Idle,
    /// Streaming
    Running,
    /// The last session ended because capture failed
    Failed(CaptureError),
}

impl StreamStatus {
    /// State machine position this status corresponds to
    pub fn state(&self) -> StreamState {
        match self {
            StreamStatus::Running => StreamState::Running,
            StreamStatus::Idle | StreamStatus::Failed(_) => StreamState::Idle,
        }
    }
}

/// Why a streaming session ended, as told to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// A caller stopped the stream
    Stopped,
    /// The camera failed mid-stream
    CaptureFailed(CaptureError),
    /// The device was shut down
    Shutdown,
}

impl std::fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamEnd::Stopped => write!(f, "stream stopped"),
            StreamEnd::CaptureFailed(e) => write!(f, "stream failed: {}", e),
            StreamEnd::Shutdown => write!(f, "device shut down"),
        }
    }
}

/// How a pump task finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Exited after observing a stop
    Stopped,
    /// Exited on a capture failure
    CaptureFailed(CaptureError),
    /// The task panicked or was aborted
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_status_is_idle() {
        let status = StreamStatus::Failed(CaptureError::Timeout);

        assert_eq!(status.state(), StreamState::Idle);
        assert_eq!(StreamStatus::Running.state(), StreamState::Running);
    }
}
