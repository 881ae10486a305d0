//! Frame pipe endpoints
//!
//! `FrameStream` is the subscribe entry point of a device. A transport calls
//! `attach` when a remote pipe endpoint connects and `detach` when it closes.
//! Local consumers call `connect` and get a bounded in-process pipe.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::media::Frame;
use crate::registry::store::ChannelRef;
use crate::registry::{ChannelKey, FrameChannel, SubscriberRegistry};

use super::status::StreamEnd;

/// Item received on a pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeEvent {
    /// A captured frame
    Frame(Frame),
    /// The streaming session feeding this pipe ended
    StreamEnded(StreamEnd),
}

/// Sending half of an in-process pipe, held by the registry
#[derive(Debug)]
pub struct PipeSender {
    tx: mpsc::Sender<PipeEvent>,
}

impl FrameChannel for PipeSender {
    fn send(&self, frame: Frame) -> Result<(), SendError> {
        self.tx.try_send(PipeEvent::Frame(frame)).map_err(send_error)
    }

    /// Best effort: a full pipe misses the notice but still sees `recv`
    /// return `None` once the registry lets go of it
    fn end_of_stream(&self, reason: &StreamEnd) {
        if let Err(e) = self.tx.try_send(PipeEvent::StreamEnded(reason.clone())) {
            let error = send_error(e);
            tracing::debug!(reason = %reason, error = %error, "End-of-stream notice dropped");
        }
    }
}

fn send_error<T>(e: mpsc::error::TrySendError<T>) -> SendError {
    match e {
        mpsc::error::TrySendError::Full(_) => SendError::Full,
        mpsc::error::TrySendError::Closed(_) => SendError::Closed,
    }
}

/// Receiving half of an in-process pipe
///
/// Dropping it (or calling `close`) unregisters the pipe. `recv` returns
/// `None` once the pipe has been dropped from the registry, e.g. because it
/// fell too far behind.
#[derive(Debug)]
pub struct PipeReceiver {
    key: ChannelKey,
    rx: mpsc::Receiver<PipeEvent>,
    sender: Weak<dyn FrameChannel>,
    registry: Weak<SubscriberRegistry>,
}

impl PipeReceiver {
    /// Key this pipe is registered under
    pub fn key(&self) -> ChannelKey {
        self.key
    }

    /// Receive the next event
    pub async fn recv(&mut self) -> Option<PipeEvent> {
        self.rx.recv().await
    }

    /// Receive the next event without waiting
    pub fn try_recv(&mut self) -> Option<PipeEvent> {
        self.rx.try_recv().ok()
    }

    /// Receive the next frame, skipping end-of-stream notices
    pub async fn recv_frame(&mut self) -> Option<Frame> {
        loop {
            match self.rx.recv().await? {
                PipeEvent::Frame(frame) => return Some(frame),
                PipeEvent::StreamEnded(_) => continue,
            }
        }
    }

    /// Close the pipe and unregister it
    pub fn close(self) {}
}

impl Drop for PipeReceiver {
    fn drop(&mut self) {
        let (Some(registry), Some(sender)) = (self.registry.upgrade(), self.sender.upgrade())
        else {
            return;
        };
        registry.detach(&self.key, &sender);
    }
}

/// Subscribe entry point of one device's stream
#[derive(Debug, Clone)]
pub struct FrameStream {
    registry: Arc<SubscriberRegistry>,
    pipe_capacity: usize,
}

impl FrameStream {
    pub(crate) fn new(registry: Arc<SubscriberRegistry>, pipe_capacity: usize) -> Self {
        Self {
            registry,
            pipe_capacity: pipe_capacity.max(1),
        }
    }

    /// Open an in-process pipe under `key`
    ///
    /// A pipe already registered under the same key is replaced.
    pub fn connect(&self, key: ChannelKey) -> PipeReceiver {
        let (tx, rx) = mpsc::channel(self.pipe_capacity);
        let sender: ChannelRef = Arc::new(PipeSender { tx });
        let weak = Arc::downgrade(&sender);

        self.registry.add(key, sender);

        PipeReceiver {
            key,
            rx,
            sender: weak,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a transport-supplied channel (pipe endpoint connected)
    pub fn attach(&self, key: ChannelKey, channel: ChannelRef) -> Option<ChannelRef> {
        self.registry.add(key, channel)
    }

    /// Unregister a channel (pipe endpoint closed); absent keys are ignored
    pub fn detach(&self, key: &ChannelKey) -> bool {
        self.registry.remove(key).is_some()
    }

    /// Number of subscribed channels
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    /// The underlying registry
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fill: u8) -> Frame {
        Frame::bgr(2, 2, vec![fill; 12]).unwrap()
    }

    fn stream(capacity: usize) -> FrameStream {
        FrameStream::new(Arc::new(SubscriberRegistry::new()), capacity)
    }

    #[tokio::test]
    async fn test_connect_and_receive() {
        let stream = stream(4);
        let mut pipe = stream.connect(ChannelKey::new(1, 0));
        assert_eq!(stream.subscriber_count(), 1);

        stream.registry().for_each(|_, ch| {
            ch.send(frame(7)).unwrap();
            ch.end_of_stream(&StreamEnd::Stopped);
        });

        assert_eq!(pipe.recv().await, Some(PipeEvent::Frame(frame(7))));
        assert_eq!(
            pipe.recv().await,
            Some(PipeEvent::StreamEnded(StreamEnd::Stopped))
        );
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let stream = stream(4);
        let pipe = stream.connect(ChannelKey::new(1, 0));

        drop(pipe);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_keeps_replacement() {
        let stream = stream(4);
        let key = ChannelKey::new(1, 0);
        let old = stream.connect(key);
        let _new = stream.connect(key);

        old.close();
        assert!(stream.registry().contains(&key));
    }

    #[tokio::test]
    async fn test_full_pipe_reports_full() {
        let stream = stream(1);
        let _pipe = stream.connect(ChannelKey::new(1, 0));
        let (_, channel) = stream.registry().snapshot().remove(0);

        assert_eq!(channel.send(frame(1)), Ok(()));
        assert_eq!(channel.send(frame(2)), Err(SendError::Full));
    }

    #[tokio::test]
    async fn test_end_notice_on_full_pipe_dropped() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = PipeSender { tx };

        assert_eq!(sender.send(frame(1)), Ok(()));
        sender.end_of_stream(&StreamEnd::Stopped);
        drop(sender);

        assert_eq!(rx.recv().await, Some(PipeEvent::Frame(frame(1))));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_receiver_gone_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        let sender = PipeSender { tx };
        drop(rx);

        assert_eq!(sender.send(frame(1)), Err(SendError::Closed));
    }

    #[tokio::test]
    async fn test_recv_ends_after_removal() {
        let stream = stream(4);
        let key = ChannelKey::new(1, 0);
        let mut pipe = stream.connect(key);

        stream.registry().for_each(|_, ch| ch.send(frame(3)).unwrap());
        stream.detach(&key);

        assert_eq!(pipe.recv_frame().await, Some(frame(3)));
        assert_eq!(pipe.recv().await, None);
    }

    #[tokio::test]
    async fn test_attach_detach_external_channel() {
        let stream = stream(4);
        let key = ChannelKey::new(9, 2);
        let (tx, mut rx) = mpsc::channel(1);

        assert!(stream.attach(key, Arc::new(PipeSender { tx })).is_none());
        stream.registry().for_each(|_, ch| ch.send(frame(5)).unwrap());
        assert_eq!(rx.recv().await, Some(PipeEvent::Frame(frame(5))));

        assert!(stream.detach(&key));
        assert!(!stream.detach(&key));
    }
}
