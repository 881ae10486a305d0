//! Streaming: pump, controller and subscriber pipes
//!
//! This module provides:
//! - `StreamPump`, the capture-then-fan-out loop
//! - `StreamController`, the Idle/Running state machine that owns the pump
//! - `FrameStream` and in-process pipes for subscribers

pub mod config;
pub mod controller;
pub mod pipe;
pub mod pump;
pub mod status;

pub use config::StreamConfig;
pub use controller::{PumpExit, PumpSession, StreamController};
pub use pipe::{FrameStream, PipeEvent, PipeReceiver, PipeSender};
pub use pump::{FanOutReport, StreamPump};
pub use status::{PumpOutcome, StreamEnd, StreamState, StreamStatus};
