//! Device objects exposed to remote callers
//!
//! - `WebcamHost`: the root directory, resolving device ids to cameras
//! - `Webcam`: one camera with capture, start/stop and its frame pipe

pub mod config;
pub mod host;
pub mod webcam;

pub use config::{CameraConfig, HostConfig};
pub use host::WebcamHost;
pub use webcam::Webcam;
