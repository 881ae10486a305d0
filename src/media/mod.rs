//! Media types shared by capture and delivery
//!
//! This module provides:
//! - `Frame`, one captured image with its geometry and pixel bytes

pub mod frame;

pub use frame::Frame;
