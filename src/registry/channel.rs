//! Subscriber channel capability
//!
//! The transport layer hands the registry one `FrameChannel` per subscriber.

use crate::error::SendError;
use crate::media::Frame;
use crate::stream::StreamEnd;

/// Per-subscriber delivery endpoint
///
/// `send` must not block indefinitely: the pump calls it for every subscriber
/// in turn, so a channel that stalls would stall everyone behind it. Bounded
/// queues that fail with [`SendError::Full`] satisfy this.
pub trait FrameChannel: Send + Sync + 'static {
    /// Deliver one frame
    fn send(&self, frame: Frame) -> Result<(), SendError>;

    /// The streaming session this channel was fed by has ended
    ///
    /// Best effort; the channel stays registered and receives frames again if
    /// a new session starts.
    fn end_of_stream(&self, _reason: &StreamEnd) {}
}
