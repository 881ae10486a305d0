//! Webcam host
//!
//! Root object of the service: a fixed directory of cameras built once from
//! the host configuration. Cameras cannot be added or removed afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::source::{FrameSource, TestPatternSource};

use super::config::{CameraConfig, HostConfig};
use super::webcam::Webcam;

/// Directory of cameras by device id
pub struct WebcamHost<S: FrameSource> {
    webcams: BTreeMap<i32, Arc<Webcam<S>>>,
}

impl<S: FrameSource> WebcamHost<S> {
    /// Open every configured camera with `open`
    ///
    /// Fails on an invalid configuration or on the first camera that cannot
    /// be opened.
    pub fn new<F>(config: &HostConfig, mut open: F) -> Result<Self>
    where
        F: FnMut(&CameraConfig) -> Result<S>,
    {
        config.validate()?;

        let mut webcams = BTreeMap::new();
        for camera in &config.cameras {
            let source = open(camera).inspect_err(|e| {
                tracing::warn!(device = %camera.name, id = camera.id, error = %e, "Failed to open camera");
            })?;

            let webcam = Webcam::new(camera, source, config.stream.clone());
            webcams.insert(camera.id, Arc::new(webcam));

            tracing::debug!(
                device = %camera.name,
                id = camera.id,
                width = camera.width,
                height = camera.height,
                "Camera opened"
            );
        }

        tracing::info!(cameras = webcams.len(), "Webcam host ready");

        Ok(Self { webcams })
    }

    /// Names of all cameras by id
    pub fn webcam_names(&self) -> HashMap<i32, String> {
        self.webcams
            .iter()
            .map(|(id, webcam)| (*id, webcam.name().to_string()))
            .collect()
    }

    /// Camera registered under `id`
    pub fn resolve_device(&self, id: i32) -> Result<Arc<Webcam<S>>> {
        self.webcams
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }

    /// Camera registered under a textual id, as sent by some remote callers
    pub fn resolve_device_key(&self, key: &str) -> Result<Arc<Webcam<S>>> {
        let id = key
            .trim()
            .parse::<i32>()
            .map_err(|_| Error::InvalidId(key.to_string()))?;
        self.resolve_device(id)
    }

    /// Device ids in ascending order
    pub fn ids(&self) -> Vec<i32> {
        self.webcams.keys().copied().collect()
    }

    /// All cameras in id order
    pub fn webcams(&self) -> impl Iterator<Item = &Arc<Webcam<S>>> {
        self.webcams.values()
    }

    /// Number of cameras
    pub fn len(&self) -> usize {
        self.webcams.len()
    }

    /// Whether the host has no cameras
    pub fn is_empty(&self) -> bool {
        self.webcams.is_empty()
    }

    /// Shut down every camera
    pub async fn shutdown(&self) {
        for webcam in self.webcams.values() {
            webcam.shutdown().await;
        }

        tracing::info!(cameras = self.webcams.len(), "Webcam host shut down");
    }
}

impl WebcamHost<TestPatternSource> {
    /// Host whose cameras are synthetic test-pattern sources
    pub fn with_test_pattern(config: &HostConfig) -> Result<Self> {
        Self::new(config, |camera| Ok(TestPatternSource::new(camera)))
    }
}

impl<S: FrameSource> std::fmt::Debug for WebcamHost<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebcamHost")
            .field("webcams", &self.webcams.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registry::ChannelKey;
    use crate::stream::StreamConfig;

    fn fast_config() -> HostConfig {
        HostConfig::empty()
            .with_camera(CameraConfig::new(0, "Left").resolution(8, 6).framerate(0.0))
            .with_camera(CameraConfig::new(1, "Right").resolution(8, 6).framerate(0.0))
            .stream(StreamConfig::default().frame_interval(Duration::from_millis(1)))
    }

    #[test]
    fn test_webcam_names() {
        let host = WebcamHost::with_test_pattern(&HostConfig::default()).unwrap();

        let names = host.webcam_names();
        assert_eq!(names, HashMap::from([(0, "Cam1".to_string())]));
    }

    #[test]
    fn test_resolve_missing_device() {
        let host = WebcamHost::with_test_pattern(&HostConfig::default()).unwrap();

        assert!(matches!(host.resolve_device(1), Err(Error::NotFound(1))));
        assert_eq!(host.resolve_device(0).unwrap().name(), "Cam1");
    }

    #[test]
    fn test_resolve_device_key() {
        let host = WebcamHost::with_test_pattern(&fast_config()).unwrap();

        assert_eq!(host.resolve_device_key("1").unwrap().name(), "Right");
        assert_eq!(host.resolve_device_key(" 0 ").unwrap().name(), "Left");
        assert!(matches!(
            host.resolve_device_key("left"),
            Err(Error::InvalidId(_))
        ));
        assert!(matches!(
            host.resolve_device_key("7"),
            Err(Error::NotFound(7))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = HostConfig::empty().camera(0, "A").camera(0, "B");

        assert!(matches!(
            WebcamHost::with_test_pattern(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_open_failure_propagates() {
        let result = WebcamHost::<TestPatternSource>::new(&fast_config(), |camera| {
            if camera.id == 1 {
                Err(Error::NotFound(camera.id))
            } else {
                Ok(TestPatternSource::new(camera))
            }
        });

        assert!(matches!(result, Err(Error::NotFound(1))));
    }

    #[test]
    fn test_ids_ordered() {
        let config = HostConfig::empty().camera(5, "E").camera(2, "B").camera(9, "I");
        let host = WebcamHost::with_test_pattern(&config).unwrap();

        assert_eq!(host.ids(), vec![2, 5, 9]);
        assert_eq!(host.len(), 3);
    }

    #[tokio::test]
    async fn test_cameras_stream_independently() {
        let host = WebcamHost::with_test_pattern(&fast_config()).unwrap();
        let left = host.resolve_device(0).unwrap();
        let right = host.resolve_device(1).unwrap();

        let mut pipe = left.frame_stream().connect(ChannelKey::new(1, 0));
        left.start_streaming().unwrap();

        let frame = pipe.recv_frame().await.unwrap();
        assert_eq!((frame.width(), frame.height(), frame.stride()), (8, 6, 24));
        assert!(left.is_streaming());
        assert!(!right.is_streaming());

        host.shutdown().await;
        assert!(host.webcams().all(|w| w.is_shut_down()));
    }
}
