//! Capture-then-fan-out loop
//!
//! One pump runs per streaming device. Each cycle captures a single frame
//! under the device's capture lock, takes a snapshot of the subscriber
//! registry and sends the frame to every channel in it. A channel whose send
//! fails is dropped from the registry; the others still get the frame.
//!
//! The loop is deliberately simple: fixed sleep between cycles, no frame-rate
//! control, capture continues even when nobody is subscribed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::CaptureError;
use crate::media::Frame;
use crate::registry::SubscriberRegistry;
use crate::source::FrameSource;
use crate::stats::StreamCounters;

use super::config::StreamConfig;
use super::controller::PumpSession;
use super::status::{PumpOutcome, StreamEnd};

/// Result of delivering one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Channels that accepted the frame
    pub delivered: usize,
    /// Channels that failed and were removed
    pub dropped: usize,
}

/// Background capture loop for one device
pub struct StreamPump<S: FrameSource> {
    device: Arc<str>,
    source: Arc<Mutex<S>>,
    registry: Arc<SubscriberRegistry>,
    counters: Arc<StreamCounters>,
    frame_interval: Duration,
}

impl<S: FrameSource> StreamPump<S> {
    /// Create a pump over a shared source and registry
    pub fn new(
        device: Arc<str>,
        source: Arc<Mutex<S>>,
        registry: Arc<SubscriberRegistry>,
        counters: Arc<StreamCounters>,
        config: &StreamConfig,
    ) -> Self {
        Self {
            device,
            source,
            registry,
            counters,
            frame_interval: config.frame_interval,
        }
    }

    /// Run until the session is stopped or a capture fails
    ///
    /// The first cycle always runs, so a stop racing right behind the start
    /// still yields one frame. After that, the stop is checked at the top of
    /// every cycle, after every capture and during the inter-frame sleep.
    pub async fn run(self, session: PumpSession) -> PumpOutcome {
        session.previous_exited().await;

        tracing::info!(
            device = %self.device,
            session = session.id(),
            interval_ms = self.frame_interval.as_millis() as u64,
            "Stream pump started"
        );

        let mut first_cycle = true;
        let outcome = loop {
            if !first_cycle && session.is_cancelled() {
                break PumpOutcome::Stopped;
            }

            let frame = match self.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(
                        device = %self.device,
                        session = session.id(),
                        error = %e,
                        "Capture failed, ending stream"
                    );
                    session.fail(e.clone());
                    break PumpOutcome::CaptureFailed(e);
                }
            };

            if !first_cycle && session.is_cancelled() {
                break PumpOutcome::Stopped;
            }
            first_cycle = false;

            let report = self.fan_out(&frame);
            tracing::trace!(
                device = %self.device,
                delivered = report.delivered,
                dropped = report.dropped,
                "Frame fanned out"
            );

            tokio::select! {
                _ = session.cancelled() => {}
                _ = tokio::time::sleep(self.frame_interval) => {}
            }
        };

        let end = match &outcome {
            PumpOutcome::CaptureFailed(e) => StreamEnd::CaptureFailed(e.clone()),
            _ => StreamEnd::Stopped,
        };
        self.notify_end(&end);

        tracing::info!(
            device = %self.device,
            session = session.id(),
            reason = %end,
            "Stream pump exited"
        );

        outcome
    }

    /// Capture one frame while holding the device's capture lock
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let result = {
            let mut source = self.source.lock().await;
            source.capture().await
        };

        match &result {
            Ok(_) => self.counters.record_capture(),
            Err(_) => self.counters.record_capture_failure(),
        }

        result
    }

    /// Send `frame` to every channel subscribed right now
    ///
    /// The registry lock is only held while taking the snapshot.
    pub fn fan_out(&self, frame: &Frame) -> FanOutReport {
        let mut report = FanOutReport::default();

        for (key, channel) in self.registry.snapshot() {
            match channel.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        device = %self.device,
                        channel = %key,
                        error = %e,
                        "Send failed, dropping subscriber"
                    );
                    self.registry.detach(&key, &channel);
                    self.counters.record_send_failure();
                    report.dropped += 1;
                }
            }
        }

        self.counters.record_delivered(report.delivered as u64);
        report
    }

    fn notify_end(&self, end: &StreamEnd) {
        self.registry.for_each(|_, channel| channel.end_of_stream(end));
    }
}
