//! Subscriber registry for frame fan-out
//!
//! The registry tracks the channels currently subscribed to one device's
//! stream. The pump never iterates the live map: it takes a snapshot under the
//! lock, releases the lock, and only then calls `send` on each channel.
//!
//! # Architecture
//!
//! ```text
//!          transport                         Arc<SubscriberRegistry>
//!   connect ──► add(key, ch) ──►  ┌─────────────────────────────────┐
//!   close   ──► remove(key)  ──►  │ Mutex<HashMap<ChannelKey,       │
//!                                 │         Arc<dyn FrameChannel>>> │
//!                                 └───────────────┬─────────────────┘
//!                                                 │ snapshot()
//!                                                 ▼
//!                                  StreamPump: for (key, ch) in snapshot
//!                                                ch.send(frame)
//!                                                   └─ Err ─► detach(key, ch)
//! ```

pub mod channel;
pub mod key;
pub mod store;

pub use channel::FrameChannel;
pub use key::ChannelKey;
pub use store::SubscriberRegistry;
