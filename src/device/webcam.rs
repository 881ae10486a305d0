//! Webcam device object
//!
//! The object remote callers operate on: on-demand capture, start/stop of the
//! stream, and the frame pipe subscribers connect to. On-demand captures and
//! the stream pump share one capture lock around the source, so the driver
//! only ever sees one capture at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};

use crate::error::{Error, Result};
use crate::media::Frame;
use crate::registry::SubscriberRegistry;
use crate::source::FrameSource;
use crate::stats::{StreamCounters, StreamStats};
use crate::stream::{
    FrameStream, PumpOutcome, StreamConfig, StreamController, StreamEnd, StreamPump, StreamState,
    StreamStatus,
};

use super::config::CameraConfig;

/// A single camera exposed to remote callers
pub struct Webcam<S: FrameSource> {
    id: i32,
    name: Arc<str>,
    /// The capture lock; the only handle to the driver
    source: Arc<Mutex<S>>,
    registry: Arc<SubscriberRegistry>,
    frame_stream: FrameStream,
    controller: StreamController,
    counters: Arc<StreamCounters>,
    config: StreamConfig,
    shut_down: AtomicBool,
}

impl<S: FrameSource> Webcam<S> {
    /// Wrap an opened source
    ///
    /// The stream pump runs on the tokio runtime current here, or failing
    /// that, on the one current when streaming starts.
    pub fn new(camera: &CameraConfig, source: S, config: StreamConfig) -> Self {
        Self::build(camera, source, config, StreamController::new())
    }

    /// Wrap an opened source, streaming on `runtime`
    ///
    /// Control calls may then come from threads outside any runtime.
    pub fn with_runtime(
        camera: &CameraConfig,
        source: S,
        config: StreamConfig,
        runtime: Handle,
    ) -> Self {
        Self::build(camera, source, config, StreamController::with_runtime(runtime))
    }

    fn build(
        camera: &CameraConfig,
        source: S,
        config: StreamConfig,
        controller: StreamController,
    ) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());

        Self {
            id: camera.id,
            name: Arc::from(camera.name.as_str()),
            source: Arc::new(Mutex::new(source)),
            frame_stream: FrameStream::new(Arc::clone(&registry), config.pipe_capacity),
            registry,
            controller,
            counters: Arc::new(StreamCounters::new()),
            config,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Device id
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Camera name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capture a single frame for the caller
    ///
    /// Waits for an in-flight streaming capture to finish first. A failure is
    /// returned to this caller only; a running stream is not affected.
    pub async fn capture_frame(&self) -> Result<Frame> {
        let mut source = self.source.lock().await;

        if self.is_shut_down() {
            return Err(Error::Shutdown);
        }

        match source.capture().await {
            Ok(frame) => {
                self.counters.record_capture();
                Ok(frame)
            }
            Err(e) => {
                self.counters.record_capture_failure();
                tracing::debug!(device = %self.name, error = %e, "On-demand capture failed");
                Err(e.into())
            }
        }
    }

    /// Start streaming to the frame pipe subscribers
    pub fn start_streaming(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::Shutdown);
        }

        let pump = StreamPump::new(
            Arc::clone(&self.name),
            Arc::clone(&self.source),
            Arc::clone(&self.registry),
            Arc::clone(&self.counters),
            &self.config,
        );

        let session = self.controller.start(|session| pump.run(session))?;
        self.counters.record_session();

        tracing::info!(
            device = %self.name,
            session = session,
            subscribers = self.registry.len(),
            "Streaming started"
        );

        Ok(())
    }

    /// Stop streaming
    ///
    /// Returns without waiting for the pump; use
    /// [`stop_streaming_and_wait`](Self::stop_streaming_and_wait) to join it.
    pub fn stop_streaming(&self) -> Result<()> {
        self.controller.stop()?;
        tracing::info!(device = %self.name, "Streaming stopped");
        Ok(())
    }

    /// Stop streaming and wait until the pump has exited
    pub async fn stop_streaming_and_wait(&self) -> Result<PumpOutcome> {
        let exit = self.controller.stop()?;
        tracing::info!(device = %self.name, "Streaming stopped");
        Ok(exit.wait().await)
    }

    /// Whether a stream is running
    pub fn is_streaming(&self) -> bool {
        self.controller.is_running()
    }

    /// Current stream state
    pub fn stream_state(&self) -> StreamState {
        self.controller.state()
    }

    /// Watch stream status, including sessions ended by capture failures
    pub fn status(&self) -> watch::Receiver<StreamStatus> {
        self.controller.status()
    }

    /// The pipe subscribers connect to
    pub fn frame_stream(&self) -> &FrameStream {
        &self.frame_stream
    }

    /// Statistics snapshot
    pub fn stats(&self) -> StreamStats {
        self.counters
            .snapshot(self.controller.state(), self.registry.len())
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop streaming, disconnect subscribers and release the driver
    ///
    /// Idempotent. Later captures and starts fail with [`Error::Shutdown`].
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Ok(exit) = self.controller.stop() {
            exit.wait().await;
        }
        // A pump stopped or failed earlier may still be finishing its cycle
        self.controller.exited().await;

        self.registry
            .for_each(|_, channel| channel.end_of_stream(&StreamEnd::Shutdown));
        let disconnected = self.registry.clear();

        self.source.lock().await.close();

        tracing::info!(
            device = %self.name,
            disconnected = disconnected,
            "Webcam shut down"
        );
    }
}

impl<S: FrameSource> std::fmt::Debug for Webcam<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webcam")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.controller.state())
            .field("subscribers", &self.registry.len())
            .finish()
    }
}
