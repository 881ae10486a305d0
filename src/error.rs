//! Error types
//!
//! `CaptureError` and `SendError` are raised by the collaborators the crate
//! drives (the camera driver and the per-subscriber transport). `Error` is what
//! callers of the device and host surfaces see.

use std::fmt;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`FrameSource`](crate::source::FrameSource)
///
/// Fatal to the streaming session it happens in, never to the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device handle is gone (unplugged or already closed)
    Disconnected,
    /// The device did not produce a frame in time
    Timeout,
    /// Driver-level failure
    Device(String),
    /// The driver produced a buffer that does not describe a valid frame
    InvalidFrame(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Disconnected => write!(f, "capture device disconnected"),
            CaptureError::Timeout => write!(f, "capture timed out"),
            CaptureError::Device(msg) => write!(f, "capture device error: {}", msg),
            CaptureError::InvalidFrame(msg) => write!(f, "invalid captured frame: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Failure delivering a frame to one subscriber
///
/// Always handled at the send site by dropping that subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The far side of the channel went away
    Closed,
    /// The channel's bounded queue is full (subscriber not keeping up)
    Full,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Closed => write!(f, "channel closed"),
            SendError::Full => write!(f, "channel full"),
        }
    }
}

impl std::error::Error for SendError {}

/// Errors returned to callers of the device and host surfaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// On-demand capture failed
    Capture(CaptureError),
    /// `start_streaming` called while a stream is running
    AlreadyStreaming,
    /// `stop_streaming` called while no stream is running
    NotStreaming,
    /// No device is registered under this id
    NotFound(i32),
    /// A device key could not be parsed as an id
    InvalidId(String),
    /// Frame dimensions do not match the pixel buffer
    InvalidFrame(String),
    /// Rejected configuration
    Config(String),
    /// The device has been shut down
    Shutdown,
    /// No tokio runtime to run the stream pump on
    NoRuntime,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capture(e) => write!(f, "{}", e),
            Error::AlreadyStreaming => write!(f, "Already streaming"),
            Error::NotStreaming => write!(f, "Not streaming"),
            Error::NotFound(id) => write!(f, "Device not found: {}", id),
            Error::InvalidId(key) => write!(f, "Invalid device id: {:?}", key),
            Error::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Shutdown => write!(f, "Device is shut down"),
            Error::NoRuntime => write!(f, "No async runtime to stream on"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Capture(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Error::Capture(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_error_converts() {
        let err: Error = CaptureError::Timeout.into();
        assert_eq!(err, Error::Capture(CaptureError::Timeout));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::NotFound(1).to_string(), "Device not found: 1");
        assert_eq!(Error::AlreadyStreaming.to_string(), "Already streaming");
        assert_eq!(
            Error::Capture(CaptureError::Device("EIO".into())).to_string(),
            "capture device error: EIO"
        );
    }
}
