//! Camera device service with frame fan-out
//!
//! A camera exposed to remote callers can hand out single frames on demand or
//! stream continuously to any number of pipe subscribers. One background pump
//! per device captures frames and fans them out to the subscribers that are
//! connected at that moment; subscribers come and go while the pump runs.
//!
//! ```text
//!   WebcamHost ──► Webcam ──► StreamController ──spawns──► StreamPump
//!                    │                                        │
//!                    │ capture lock                           │ capture
//!                    ▼                                        ▼
//!               FrameSource ◄─────────────────────────────────┘
//!                                                             │ snapshot
//!                                                             ▼
//!                                      SubscriberRegistry { ChannelKey -> FrameChannel }
//! ```
//!
//! The transport that carries frames to remote processes is not part of this
//! crate. It plugs in through [`FrameChannel`] and the attach/detach methods of
//! [`FrameStream`]; an in-process bounded pipe is provided for local consumers
//! and tests.

pub mod device;
pub mod error;
pub mod media;
pub mod registry;
pub mod source;
pub mod stats;
pub mod stream;

pub use device::{CameraConfig, HostConfig, Webcam, WebcamHost};
pub use error::{CaptureError, Error, Result, SendError};
pub use media::Frame;
pub use registry::{ChannelKey, FrameChannel, SubscriberRegistry};
pub use source::{FrameSource, TestPatternSource};
pub use stream::{
    FrameStream, PipeEvent, PipeReceiver, PumpExit, PumpOutcome, StreamConfig, StreamController,
    StreamEnd, StreamState, StreamStatus,
};
