//! Camera and host configuration

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::stream::StreamConfig;

/// One camera entry of the host configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Device id remote callers resolve the camera by
    pub id: i32,

    /// Human-readable name
    pub name: String,

    /// Capture width in pixels
    pub width: u32,

    /// Capture height in pixels
    pub height: u32,

    /// Sensor framerate (0 = as fast as the driver returns)
    pub framerate: f64,
}

impl CameraConfig {
    /// Create a camera entry with the default 640x480 @ 30fps mode
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            width: 640,
            height: 480,
            framerate: 30.0,
        }
    }

    /// Set the capture resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the sensor framerate
    pub fn framerate(mut self, fps: f64) -> Self {
        self.framerate = fps;
        self
    }
}

/// Host configuration: the static camera list plus streaming options
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Cameras to open at startup
    pub cameras: Vec<CameraConfig>,

    /// Options shared by every camera's stream
    pub stream: StreamConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cameras: vec![CameraConfig::new(0, "Cam1")],
            stream: StreamConfig::default(),
        }
    }
}

impl HostConfig {
    /// Create a configuration with no cameras
    pub fn empty() -> Self {
        Self {
            cameras: Vec::new(),
            stream: StreamConfig::default(),
        }
    }

    /// Add a camera in the default mode
    pub fn camera(self, id: i32, name: impl Into<String>) -> Self {
        self.with_camera(CameraConfig::new(id, name))
    }

    /// Add a fully specified camera
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.cameras.push(camera);
        self
    }

    /// Set the streaming options
    pub fn stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Check the camera list
    ///
    /// Ids must be unique, names non-empty and resolutions non-zero and small
    /// enough for a frame's 32-bit geometry.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for camera in &self.cameras {
            if !seen.insert(camera.id) {
                return Err(Error::Config(format!("duplicate camera id {}", camera.id)));
            }
            if camera.name.trim().is_empty() {
                return Err(Error::Config(format!("camera {} has no name", camera.id)));
            }
            if camera.width == 0 || camera.height == 0 {
                return Err(Error::Config(format!(
                    "camera {} has zero resolution",
                    camera.id
                )));
            }
            if camera.width > i32::MAX as u32 / 3 || camera.height > i32::MAX as u32 {
                return Err(Error::Config(format!(
                    "camera {} resolution {}x{} too large",
                    camera.id, camera.width, camera.height
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();

        assert_eq!(config.cameras, vec![CameraConfig::new(0, "Cam1")]);
        assert_eq!(config.cameras[0].width, 640);
        assert_eq!(config.cameras[0].height, 480);
        assert_eq!(config.cameras[0].framerate, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let config = HostConfig::empty()
            .camera(0, "Left")
            .with_camera(CameraConfig::new(1, "Right").resolution(1024, 768))
            .stream(StreamConfig::default().frame_interval(Duration::from_millis(100)));

        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.cameras[1].width, 1024);
        assert_eq!(config.stream.frame_interval, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let config = HostConfig::empty().camera(0, "Left").camera(0, "Right");

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_name_rejected() {
        let config = HostConfig::empty().camera(3, "  ");

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = HostConfig::empty().with_camera(CameraConfig::new(0, "Cam").resolution(0, 480));

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
