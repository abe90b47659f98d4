//! One monitoring run: connect, poll, diff, emit, stop.
//!
//! A [`MonitorSession`] is built for a single file and a single set of
//! connection settings, driven to completion by [`MonitorSession::run`] and
//! then discarded. The caller keeps the [`SessionHandle`] returned alongside
//! it to pause, resume, stop and observe the session.
//!
//! States move `Connecting → Active ⇄ Paused → Stopping → Closed`. Pause and
//! stop are checked between ticks only; a fetch in progress always runs to
//! completion or to the transport timeout.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use monitor_core::config::{ConnectionConfig, LogFileReference};
use monitor_core::diff::ContentDiffEngine;
use monitor_core::error::{ErrorDisposition, MonitorError, Result};
use monitor_remote::transport::Connector;
use monitor_remote::ConnectionManager;
use tokio::sync::watch;
use tokio::task;

use crate::emitter::BatchEmitter;
use crate::output::OutputSink;

type Connection<C> = ConnectionManager<<C as Connector>::Transport>;

// ── Public types ──────────────────────────────────────────────────────────────

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Paused,
    Stopping,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Stopping => "stopping",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Latest observable progress of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Batches emitted so far.
    pub batches: u64,
}

/// Tunables shared by every session a controller starts.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub cache_dir: PathBuf,
    /// Upper bound on how long a stop request waits for the session.
    pub join_timeout: Duration,
}

// ── Stop signal ───────────────────────────────────────────────────────────────

/// Requests cancellation of a session.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn request(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes cancellation requests. Dropping the [`StopHandle`] counts as a
/// request.
#[derive(Debug)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Sleep for `period`, waking early on a stop request. Returns `true`
    /// when stopping was requested.
    pub async fn sleep(&mut self, period: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(period) => false,
            _ = stop_requested(&mut self.rx) => true,
        }
    }
}

/// Resolve once the flag is set or the sender is gone.
async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// Create a connected stop handle/signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

// ── SessionHandle ─────────────────────────────────────────────────────────────

/// Control and observation side of a running [`MonitorSession`].
#[derive(Debug)]
pub struct SessionHandle {
    paused: Arc<AtomicBool>,
    stop: StopHandle,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Pause or resume polling. Takes effect at the next tick.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Ask the session to stop at the next tick boundary.
    pub fn request_stop(&self) {
        self.stop.request();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        *self.snapshot.borrow()
    }

    /// A receiver that is notified on every state or batch change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }
}

// ── MonitorSession ────────────────────────────────────────────────────────────

/// The polling state machine for one remote log file.
pub struct MonitorSession<C: Connector> {
    connector: Arc<C>,
    config: ConnectionConfig,
    file: LogFileReference,
    poll_interval: Duration,
    diff: ContentDiffEngine,
    emitter: BatchEmitter,
    sink: OutputSink,
    paused: Arc<AtomicBool>,
    stop: StopSignal,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<C: Connector> MonitorSession<C> {
    /// Build a session for `file_name` and create the cache directory.
    ///
    /// Nothing touches the network until [`MonitorSession::run`].
    pub fn new(
        connector: Arc<C>,
        config: ConnectionConfig,
        file_name: &str,
        options: &SessionOptions,
        sink: OutputSink,
    ) -> Result<(Self, SessionHandle)> {
        config.validate()?;
        let file = LogFileReference::new(&config.remote_dir, file_name, &options.cache_dir)?;

        if !options.cache_dir.exists() {
            tracing::info!(dir = %options.cache_dir.display(), "creating local log cache directory");
        }
        std::fs::create_dir_all(&options.cache_dir)?;

        let paused = Arc::new(AtomicBool::new(false));
        let (stop_handle, stop) = stop_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            state: SessionState::Connecting,
            batches: 0,
        });

        tracing::debug!(
            remote_path = file.remote_path(),
            local_path = %file.local_path().display(),
            "session configured"
        );

        let session = Self {
            connector,
            config,
            file,
            poll_interval: options.poll_interval,
            diff: ContentDiffEngine::new(),
            emitter: BatchEmitter::new(sink.clone()),
            sink,
            paused: Arc::clone(&paused),
            stop,
            snapshot: snapshot_tx,
        };
        let handle = SessionHandle {
            paused,
            stop: stop_handle,
            snapshot: snapshot_rx,
        };
        Ok((session, handle))
    }

    pub fn file(&self) -> &LogFileReference {
        &self.file
    }

    /// Drive the session until it is stopped or fails fatally.
    ///
    /// Always ends in [`SessionState::Closed`] with a final
    /// "Monitoring stopped" message on the output queue.
    pub async fn run(mut self) {
        tracing::info!(remote_path = self.file.remote_path(), "starting monitoring");
        self.set_state(SessionState::Connecting);

        let mut conn = match self.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                self.report(&e);
                self.finish(None).await;
                return;
            }
        };
        self.sink
            .push_timestamped(&format!("Connected to {}", self.config.hostname));
        self.set_state(SessionState::Active);

        loop {
            if self.stop.is_requested() {
                tracing::debug!("stop requested");
                break;
            }

            if self.paused.load(Ordering::SeqCst) {
                self.set_state(SessionState::Paused);
            } else {
                self.set_state(SessionState::Active);
                if let Err(e) = self.tick(&mut conn).await {
                    self.report(&e);
                    if e.disposition() == ErrorDisposition::Terminate {
                        break;
                    }
                }
            }

            if self.stop.sleep(self.poll_interval).await {
                tracing::debug!("stop requested while sleeping");
                break;
            }
        }

        self.finish(conn).await;
    }

    // ── Private helpers ───────────────────────────────────────────────────

    async fn connect(&self) -> Result<Option<Connection<C>>> {
        let connector = Arc::clone(&self.connector);
        let config = self.config.clone();
        let file = self.file.clone();

        let conn = task::spawn_blocking(move || {
            ConnectionManager::connect(connector.as_ref(), &config, file)
        })
        .await
        .map_err(|e| MonitorError::Unexpected(format!("connect task failed: {e}")))??;
        Ok(Some(conn))
    }

    /// Fetch once and emit whatever changed.
    ///
    /// The connection is moved onto the blocking pool for the transfer and
    /// put back afterwards. A panic there loses it, which ends the session.
    async fn tick(&mut self, slot: &mut Option<Connection<C>>) -> Result<()> {
        let mut conn = slot
            .take()
            .ok_or_else(|| MonitorError::Unexpected("connection lost".to_string()))?;

        let (conn, fetched) = task::spawn_blocking(move || {
            let fetched = conn.fetch();
            (conn, fetched)
        })
        .await
        .map_err(|e| MonitorError::Unexpected(format!("fetch task failed: {e}")))?;
        *slot = Some(conn);

        let content = fetched?;
        let result = self.diff.observe(Some(&content));
        if self.emitter.emit(result) {
            let batches = self.emitter.batch_count();
            self.snapshot.send_modify(|s| s.batches = batches);
        }
        Ok(())
    }

    fn report(&self, e: &MonitorError) {
        match e.disposition() {
            ErrorDisposition::Continue => {
                tracing::warn!(error = %e, remote_path = self.file.remote_path(), "fetch failed")
            }
            ErrorDisposition::Terminate => {
                tracing::error!(error = ?e, remote_path = self.file.remote_path(), "monitoring error")
            }
        }
        self.sink.push_timestamped(&format!("Error: {e}"));
    }

    async fn finish(&mut self, conn: Option<Connection<C>>) {
        if let Some(mut conn) = conn {
            self.set_state(SessionState::Stopping);
            if let Err(e) = task::spawn_blocking(move || conn.close()).await {
                tracing::warn!(error = %e, "closing connection failed");
            }
        }
        self.sink.push_timestamped("Monitoring stopped");
        self.set_state(SessionState::Closed);
        tracing::info!(
            remote_path = self.file.remote_path(),
            batches = self.emitter.batch_count(),
            "monitoring stopped"
        );
    }

    fn set_state(&self, state: SessionState) {
        self.snapshot.send_if_modified(|s| {
            if s.state == state {
                return false;
            }
            tracing::debug!(from = %s.state, to = %state, "session state change");
            s.state = state;
            true
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
