//! Frame sources
//!
//! A `FrameSource` is the camera driver boundary. The crate never talks to
//! hardware itself; it serializes calls into one source per device and treats
//! any `CaptureError` as the end of the current streaming session.

pub mod pattern;

use std::future::Future;

use crate::error::CaptureError;
use crate::media::Frame;

pub use pattern::TestPatternSource;

/// Produces frames from a single capture device
///
/// Only one capture is ever in flight per source: callers hold the device's
/// capture lock around `capture`.
pub trait FrameSource: Send + 'static {
    /// Capture exactly one frame
    fn capture(&mut self) -> impl Future<Output = Result<Frame, CaptureError>> + Send;

    /// Release the driver handle
    ///
    /// Called once when the owning device shuts down.
    fn close(&mut self) {}
}
