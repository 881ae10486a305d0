//! Synthetic camera
//!
//! Produces packed BGR frames at the configured resolution, paced to the
//! configured framerate the way a sensor read-out would be. Every frame differs
//! from the previous one so consumers can tell frames apart.

use std::time::Duration;

use tokio::time::Instant;

use crate::device::CameraConfig;
use crate::error::CaptureError;
use crate::media::Frame;

use super::FrameSource;

/// Test-pattern camera driver
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    /// Time between two sensor frames (zero = unpaced)
    frame_period: Duration,
    next_frame_at: Option<Instant>,
    /// Frames produced so far
    counter: u64,
    /// Fail every capture after this many frames
    fail_after: Option<u64>,
    closed: bool,
}

impl TestPatternSource {
    /// Create a source matching a camera configuration
    pub fn new(config: &CameraConfig) -> Self {
        let frame_period = if config.framerate > 0.0 && config.framerate.is_finite() {
            Duration::from_secs_f64(1.0 / config.framerate)
        } else {
            Duration::ZERO
        };

        Self {
            width: config.width,
            height: config.height,
            frame_period,
            next_frame_at: None,
            counter: 0,
            fail_after: None,
            closed: false,
        }
    }

    /// Make every capture after the first `frames` fail with a device error
    pub fn fail_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Number of frames produced so far
    pub fn frames_produced(&self) -> u64 {
        self.counter
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Frame width, height and byte length, checked against the 32-bit
    /// frame geometry
    fn geometry(&self) -> Result<(i32, i32, usize), CaptureError> {
        let invalid = || {
            CaptureError::InvalidFrame(format!(
                "resolution {}x{} out of range",
                self.width, self.height
            ))
        };

        let width = i32::try_from(self.width).map_err(|_| invalid())?;
        let height = i32::try_from(self.height).map_err(|_| invalid())?;
        let len = width
            .checked_mul(3)
            .and_then(|stride| stride.checked_mul(height))
            .ok_or_else(invalid)?;

        Ok((width, height, len as usize))
    }

    fn render(&self, width: usize, height: usize, len: usize) -> Vec<u8> {
        let shift = self.counter as usize;
        let mut data = Vec::with_capacity(len);

        for y in 0..height {
            for x in 0..width {
                // Diagonal gradient scrolling by one pixel per frame
                data.push(x.wrapping_add(shift) as u8);
                data.push(y.wrapping_add(shift) as u8);
                data.push(x.wrapping_add(y).wrapping_add(shift) as u8);
            }
        }

        data
    }

    async fn wait_for_sensor(&mut self) {
        if self.frame_period.is_zero() {
            return;
        }

        let now = Instant::now();
        let due = self.next_frame_at.unwrap_or(now);
        if due > now {
            tokio::time::sleep_until(due).await;
        }
        self.next_frame_at = Some(due.max(now) + self.frame_period);
    }
}

impl FrameSource for TestPatternSource {
    async fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.closed {
            return Err(CaptureError::Disconnected);
        }
        if self.fail_after.is_some_and(|limit| self.counter >= limit) {
            return Err(CaptureError::Device("injected capture failure".into()));
        }

        let (width, height, len) = self.geometry()?;

        self.wait_for_sensor().await;

        let data = self.render(width as usize, height as usize, len);
        let frame = Frame::bgr(width, height, data)
            .map_err(|e| CaptureError::InvalidFrame(e.to_string()))?;
        self.counter += 1;

        Ok(frame)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_camera() -> CameraConfig {
        CameraConfig::new(0, "Test").resolution(4, 2).framerate(0.0)
    }

    #[tokio::test]
    async fn test_capture_geometry() {
        let mut source = TestPatternSource::new(&small_camera());
        let frame = source.capture().await.unwrap();

        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.stride(), 12);
        assert_eq!(frame.len(), 24);
        assert_eq!(source.frames_produced(), 1);
    }

    #[tokio::test]
    async fn test_frames_differ() {
        let mut source = TestPatternSource::new(&small_camera());
        let first = source.capture().await.unwrap();
        let second = source.capture().await.unwrap();

        assert_ne!(first.data(), second.data());
    }

    #[tokio::test]
    async fn test_closed_source_disconnected() {
        let mut source = TestPatternSource::new(&small_camera());
        source.close();

        assert!(source.is_closed());
        assert_eq!(source.capture().await, Err(CaptureError::Disconnected));
    }

    #[tokio::test]
    async fn test_fail_after() {
        let mut source = TestPatternSource::new(&small_camera()).fail_after(1);

        assert!(source.capture().await.is_ok());
        assert!(matches!(
            source.capture().await,
            Err(CaptureError::Device(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_resolution_rejected() {
        let camera = CameraConfig::new(0, "Big").resolution(u32::MAX, 2);
        let mut source = TestPatternSource::new(&camera);

        assert!(matches!(
            source.capture().await,
            Err(CaptureError::InvalidFrame(_))
        ));
        assert_eq!(source.frames_produced(), 0);
    }

    #[tokio::test]
    async fn test_frame_size_overflow_rejected() {
        // Each dimension fits in i32, the byte length does not
        let camera = CameraConfig::new(0, "Wide").resolution(100_000, 100_000);
        let mut source = TestPatternSource::new(&camera);

        assert!(matches!(
            source.capture().await,
            Err(CaptureError::InvalidFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_paced_capture() {
        let camera = small_camera().framerate(100.0);
        let mut source = TestPatternSource::new(&camera);

        let started = std::time::Instant::now();
        for _ in 0..3 {
            source.capture().await.unwrap();
        }

        // First frame is immediate, the next two wait one period each
        assert!(started.elapsed() >= Duration::from_millis(18));
    }
}
