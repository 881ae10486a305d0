//! Start/stop state machine for a device's stream pump
//!
//! ```text
//!            start() ──► spawn pump
//!   Idle ─────────────────────────────► Running
//!    ▲                                     │
//!    ├──────── stop() (cancel token) ──────┤
//!    └──── pump fails capture (fail) ──────┘
//! ```
//!
//! Each start creates a new session with its own cancellation token, so a pump
//! from an earlier session can never observe a later `Running` and keep going.
//! A new session's pump waits for the previous pump to exit before capturing;
//! sessions never overlap.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{CaptureError, Error, Result};

use super::status::{PumpOutcome, StreamState, StreamStatus};

struct RunningSession {
    id: u64,
    cancel: CancellationToken,
    task: Option<JoinHandle<PumpOutcome>>,
}

struct ControllerState {
    running: Option<RunningSession>,
    /// Cancelled once the most recently spawned pump has exited
    last_exit: Option<CancellationToken>,
}

struct Shared {
    state: Mutex<ControllerState>,
    status: watch::Sender<StreamStatus>,
    next_session: AtomicU64,
}

/// Idle/Running state machine owning the pump task
pub struct StreamController {
    shared: Arc<Shared>,
    /// Runtime pumps are spawned on; falls back to the caller's runtime
    runtime: Option<Handle>,
}

impl StreamController {
    /// Create an idle controller
    ///
    /// Pumps are spawned on the runtime current at construction if there is
    /// one, otherwise on the runtime current when `start` is called.
    pub fn new() -> Self {
        Self::build(Handle::try_current().ok())
    }

    /// Create an idle controller that spawns pumps on `runtime`
    ///
    /// `start` can then be called from any thread.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self::build(Some(runtime))
    }

    fn build(runtime: Option<Handle>) -> Self {
        let (status, _) = watch::channel(StreamStatus::Idle);

        Self {
            runtime,
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    running: None,
                    last_exit: None,
                }),
                status,
                next_session: AtomicU64::new(1),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> StreamState {
        if self.shared.state.lock().running.is_some() {
            StreamState::Running
        } else {
            StreamState::Idle
        }
    }

    /// Whether a session is running
    pub fn is_running(&self) -> bool {
        self.state() == StreamState::Running
    }

    /// Watch status changes, including capture failures that end a session
    pub fn status(&self) -> watch::Receiver<StreamStatus> {
        self.shared.status.subscribe()
    }

    /// Start a session
    ///
    /// `pump` receives the session handle and returns the pump future, which
    /// is spawned on the controller's runtime. Fails with
    /// [`Error::AlreadyStreaming`] if a session is running and with
    /// [`Error::NoRuntime`] if there is no runtime to spawn on.
    pub fn start<F, Fut>(&self, pump: F) -> Result<u64>
    where
        F: FnOnce(PumpSession) -> Fut,
        Fut: Future<Output = PumpOutcome> + Send + 'static,
    {
        let mut state = self.shared.state.lock();

        if state.running.is_some() {
            return Err(Error::AlreadyStreaming);
        }

        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        let id = self.shared.next_session.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let exited = CancellationToken::new();

        let session = PumpSession {
            id,
            cancel: cancel.clone(),
            previous_exit: state.last_exit.replace(exited.clone()),
            _exit_guard: exited.drop_guard(),
            controller: Arc::downgrade(&self.shared),
        };

        let task = runtime.spawn(pump(session));

        state.running = Some(RunningSession {
            id,
            cancel,
            task: Some(task),
        });
        self.shared.status.send_replace(StreamStatus::Running);

        tracing::debug!(session = id, "Stream session started");

        Ok(id)
    }

    /// Stop the running session
    ///
    /// Returns immediately; the pump notices on its next loop check. Await the
    /// returned [`PumpExit`] to know when it has actually exited. Fails with
    /// [`Error::NotStreaming`] if idle.
    pub fn stop(&self) -> Result<PumpExit> {
        let running = {
            let mut state = self.shared.state.lock();
            state.running.take().ok_or(Error::NotStreaming)?
        };

        running.cancel.cancel();
        self.shared.status.send_replace(StreamStatus::Idle);

        tracing::debug!(session = running.id, "Stream session stop requested");

        Ok(PumpExit { task: running.task })
    }

    /// Wait until the most recently started pump has exited
    ///
    /// Covers pumps that were already stopped or failed, whose `PumpExit`
    /// the caller may not hold. Returns at once if no pump was ever started.
    pub async fn exited(&self) {
        let last_exit = self.shared.state.lock().last_exit.clone();
        if let Some(exited) = last_exit {
            exited.cancelled().await;
        }
    }
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        if let Some(running) = self.shared.state.lock().running.take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for StreamController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamController")
            .field("state", &self.state())
            .finish()
    }
}

/// Handle given to a pump for the lifetime of its session
pub struct PumpSession {
    id: u64,
    cancel: CancellationToken,
    previous_exit: Option<CancellationToken>,
    _exit_guard: DropGuard,
    controller: Weak<Shared>,
}

impl PumpSession {
    /// Session identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this session has been stopped
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once this session has been stopped
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Wait until the previous session's pump has exited
    pub async fn previous_exited(&self) {
        if let Some(previous) = &self.previous_exit {
            previous.cancelled().await;
        }
    }

    /// End this session after a capture failure
    ///
    /// Takes the same Idle transition as `stop`. Does nothing if the session
    /// was already stopped. Returns whether the transition happened.
    pub fn fail(&self, error: CaptureError) -> bool {
        let Some(shared) = self.controller.upgrade() else {
            return false;
        };

        let mut state = shared.state.lock();
        match &state.running {
            Some(running) if running.id == self.id => {
                // The task handle is dropped; the pump is already on its way out
                state.running = None;
                self.cancel.cancel();
                shared.status.send_replace(StreamStatus::Failed(error));
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for PumpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PumpSession")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Completion signal of a stopped pump
#[derive(Debug)]
pub struct PumpExit {
    task: Option<JoinHandle<PumpOutcome>>,
}

impl PumpExit {
    /// Wait for the pump task to exit
    pub async fn wait(self) -> PumpOutcome {
        match self.task {
            Some(task) => task.await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stream pump task did not complete");
                PumpOutcome::Aborted
            }),
            None => PumpOutcome::Stopped,
        }
    }
}
