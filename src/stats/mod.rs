//! Statistics for streaming devices

pub mod metrics;

pub use metrics::{StreamCounters, StreamStats};
