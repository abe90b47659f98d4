//! Start/stop/pause control over at most one monitoring session.
//!
//! [`MonitorController`] owns the output queue and the currently running
//! session, if any. Each [`MonitorController::start`] reads the connection
//! settings afresh and spawns a new [`MonitorSession`] on the tokio runtime;
//! nothing is reused between sessions except the output queue.

use std::sync::Arc;

use monitor_core::config::SettingsStore;
use monitor_core::error::{MonitorError, Result};
use monitor_remote::transport::Connector;
use tokio::task::JoinHandle;

use crate::output::{output_channel, OutputDrain, OutputSink};
use crate::session::{MonitorSession, SessionHandle, SessionOptions, SessionState};

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStatus {
    Started,
    AlreadyRunning,
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    Stopped,
    NotRunning,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
    pub running: bool,
    pub file_name: Option<String>,
    pub state: Option<SessionState>,
    pub paused: bool,
    pub batches: u64,
}

struct ActiveSession {
    file_name: String,
    handle: SessionHandle,
    task: JoinHandle<()>,
}

impl ActiveSession {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

// ── MonitorController ─────────────────────────────────────────────────────────

/// Owner of the monitoring worker and its output queue.
///
/// [`start`](Self::start) spawns onto the current tokio runtime and must be
/// called from within one.
pub struct MonitorController<C: Connector, S: SettingsStore> {
    connector: Arc<C>,
    store: S,
    options: SessionOptions,
    sink: OutputSink,
    drain: OutputDrain,
    active: Option<ActiveSession>,
}

impl<C: Connector, S: SettingsStore> MonitorController<C, S> {
    pub fn new(connector: C, store: S, options: SessionOptions) -> Self {
        let (sink, drain) = output_channel();
        Self {
            connector: Arc::new(connector),
            store,
            options,
            sink,
            drain,
            active: None,
        }
    }

    /// Start monitoring `log_file` unless a session is already alive.
    ///
    /// Fails when the name is empty or not a bare file name, when no
    /// connection settings are stored, or when the cache directory cannot be
    /// created.
    pub fn start(&mut self, log_file: &str) -> Result<StartStatus> {
        if self.is_running() {
            tracing::debug!("start ignored; a session is already running");
            return Ok(StartStatus::AlreadyRunning);
        }

        let file_name = log_file.trim();
        if file_name.is_empty() {
            return Err(MonitorError::Validation("Log file is required".to_string()));
        }

        let config = self.store.require()?;
        let (session, handle) = MonitorSession::new(
            Arc::clone(&self.connector),
            config,
            file_name,
            &self.options,
            self.sink.clone(),
        )?;

        self.sink
            .push(format!("Starting monitoring for log file: {file_name}"));
        tracing::info!(file = file_name, "monitoring session started");

        let task = tokio::spawn(session.run());
        self.active = Some(ActiveSession {
            file_name: file_name.to_string(),
            handle,
            task,
        });
        Ok(StartStatus::Started)
    }

    /// Ask the running session to stop and wait up to the join timeout.
    ///
    /// A session that does not finish in time is left running in the
    /// background and still counts as running.
    pub async fn stop(&mut self) -> StopStatus {
        let Some(mut active) = self.active.take() else {
            return StopStatus::NotRunning;
        };
        if !active.is_alive() {
            return StopStatus::NotRunning;
        }

        self.sink.push("Stopping monitoring...");
        active.handle.request_stop();

        match tokio::time::timeout(self.options.join_timeout, &mut active.task).await {
            Ok(Ok(())) => tracing::info!(file = %active.file_name, "monitoring session finished"),
            Ok(Err(e)) => tracing::error!(error = %e, "monitoring task failed"),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.options.join_timeout.as_secs_f64(),
                    "monitoring task did not finish in time; leaving it running"
                );
                self.active = Some(active);
            }
        }
        StopStatus::Stopped
    }

    /// Pause or resume the running session. Returns `false` when there is
    /// none.
    pub fn set_paused(&self, paused: bool) -> bool {
        match self.active.as_ref().filter(|a| a.is_alive()) {
            Some(active) => {
                active.handle.set_paused(paused);
                tracing::info!(paused, "pause toggled");
                true
            }
            None => false,
        }
    }

    /// Remove and return every message queued since the last drain.
    pub fn drain(&mut self) -> Vec<String> {
        self.drain.drain()
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(ActiveSession::is_alive)
    }

    pub fn status(&self) -> MonitorStatus {
        match &self.active {
            Some(active) => {
                let snapshot = active.handle.snapshot();
                MonitorStatus {
                    running: active.is_alive(),
                    file_name: Some(active.file_name.clone()),
                    state: Some(snapshot.state),
                    paused: active.handle.is_paused(),
                    batches: snapshot.batches,
                }
            }
            None => MonitorStatus {
                running: false,
                file_name: None,
                state: None,
                paused: false,
                batches: 0,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::config::{ConnectionConfig, Secret};
    use monitor_core::error::{ConnectionError, TransferError};
    use monitor_remote::local::LocalConnector;
    use monitor_remote::transport::Transport;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    struct StaticStore(Option<ConnectionConfig>);

    impl SettingsStore for StaticStore {
        fn load(&self) -> Result<Option<ConnectionConfig>> {
            Ok(self.0.clone())
        }

        fn location(&self) -> PathBuf {
            PathBuf::from("memory")
        }
    }

    fn config(remote: &Path) -> ConnectionConfig {
        ConnectionConfig {
            hostname: "localhost".to_string(),
            port: 22,
            username: "tester".to_string(),
            password: Secret::new("unused"),
            remote_dir: remote.to_string_lossy().to_string(),
        }
    }

    fn options(tmp: &TempDir) -> SessionOptions {
        SessionOptions {
            poll_interval: Duration::from_millis(20),
            cache_dir: tmp.path().join("cache"),
            join_timeout: Duration::from_secs(5),
        }
    }

    /// Controller over a temp `remote/` directory containing `app.log`.
    fn controller(tmp: &TempDir) -> MonitorController<LocalConnector, StaticStore> {
        let remote = tmp.path().join("remote");
        std::fs::create_dir_all(&remote).expect("remote dir");
        std::fs::write(remote.join("app.log"), "A\nB\n").expect("write log");
        MonitorController::new(
            LocalConnector,
            StaticStore(Some(config(&remote))),
            options(tmp),
        )
    }

    /// Drain until `pred` holds for everything collected so far.
    async fn drain_until<C, S>(
        ctl: &mut MonitorController<C, S>,
        pred: impl Fn(&[String]) -> bool,
    ) -> Vec<String>
    where
        C: Connector,
        S: SettingsStore,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        loop {
            seen.extend(ctl.drain());
            if pred(&seen) {
                return seen;
            }
            assert!(Instant::now() < deadline, "timed out; got {seen:?}");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // ── start ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_start_without_settings_fails() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = MonitorController::new(LocalConnector, StaticStore(None), options(&tmp));

        let err = ctl.start("app.log").unwrap_err();
        assert!(matches!(err, MonitorError::NoSettings(_)));
        assert!(!ctl.is_running());
        assert!(ctl.drain().is_empty());
    }

    #[tokio::test]
    async fn test_start_requires_log_file() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = controller(&tmp);

        let err = ctl.start("  ").unwrap_err();
        assert!(matches!(err, MonitorError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: Log file is required");
        assert!(!ctl.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_reports_already_running() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = controller(&tmp);

        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::Started);
        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::AlreadyRunning);
        // Even an invalid name is not looked at while a session runs.
        assert_eq!(ctl.start("").unwrap(), StartStatus::AlreadyRunning);

        assert_eq!(ctl.stop().await, StopStatus::Stopped);
    }

    // ── stop / pause without a session ────────────────────────────────────

    #[tokio::test]
    async fn test_stop_and_pause_without_session() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = controller(&tmp);

        assert_eq!(ctl.stop().await, StopStatus::NotRunning);
        assert!(!ctl.set_paused(true));
        assert_eq!(
            ctl.status(),
            MonitorStatus {
                running: false,
                file_name: None,
                state: None,
                paused: false,
                batches: 0,
            }
        );
    }

    // ── full lifecycle ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_start_output_pause_stop() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = controller(&tmp);

        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::Started);
        let seen = drain_until(&mut ctl, |m| m.iter().any(|s| s == "B")).await;
        assert_eq!(seen[0], "Starting monitoring for log file: app.log");
        assert!(seen[1].ends_with("> Connected to localhost"));
        assert!(seen[2].ends_with("> Printing batch 1"));
        assert_eq!(&seen[3..], ["A", "B"]);

        assert!(ctl.set_paused(true));
        let status = ctl.status();
        assert!(status.running);
        assert!(status.paused);
        assert_eq!(status.file_name.as_deref(), Some("app.log"));
        assert_eq!(status.batches, 1);

        assert!(ctl.set_paused(false));
        assert_eq!(ctl.stop().await, StopStatus::Stopped);
        assert!(!ctl.is_running());

        let rest = ctl.drain();
        assert_eq!(rest.first().map(String::as_str), Some("Stopping monitoring..."));
        assert_eq!(
            rest.iter().filter(|m| m.ends_with("> Monitoring stopped")).count(),
            1,
            "messages: {rest:?}"
        );

        // A fresh session starts from batch 1 again.
        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::Started);
        drain_until(&mut ctl, |m| m.iter().any(|s| s.ends_with("> Printing batch 1"))).await;
        assert_eq!(ctl.stop().await, StopStatus::Stopped);
    }

    #[tokio::test]
    async fn test_session_that_died_is_not_running() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("missing");
        let mut ctl = MonitorController::new(
            LocalConnector,
            StaticStore(Some(config(&missing))),
            options(&tmp),
        );

        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::Started);
        drain_until(&mut ctl, |m| m.iter().any(|s| s.ends_with("> Monitoring stopped"))).await;

        let deadline = Instant::now() + Duration::from_secs(5);
        while ctl.is_running() {
            assert!(Instant::now() < deadline, "task should finish after connect failure");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(ctl.status().state, Some(SessionState::Closed));
        assert_eq!(ctl.stop().await, StopStatus::NotRunning);
        assert!(!ctl.set_paused(true));
    }

    // ── join timeout ──────────────────────────────────────────────────────

    /// A transport whose reads block far longer than the join timeout.
    struct StallingConnector;

    struct StallingTransport;

    impl Connector for StallingConnector {
        type Transport = StallingTransport;

        fn connect(
            &self,
            _config: &ConnectionConfig,
        ) -> std::result::Result<StallingTransport, ConnectionError> {
            Ok(StallingTransport)
        }
    }

    impl Transport for StallingTransport {
        fn read_file(
            &mut self,
            _remote_path: &str,
        ) -> std::result::Result<Vec<u8>, TransferError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(b"slow\n".to_vec())
        }

        fn close(&mut self) {}
    }

    #[tokio::test]
    async fn test_stop_times_out_and_session_stays_running() {
        let tmp = TempDir::new().expect("tempdir");
        let mut ctl = MonitorController::new(
            StallingConnector,
            StaticStore(Some(config(tmp.path()))),
            SessionOptions {
                join_timeout: Duration::from_millis(50),
                ..options(&tmp)
            },
        );

        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::Started);
        drain_until(&mut ctl, |m| m.iter().any(|s| s.ends_with("> Connected to localhost"))).await;

        // The first fetch is still blocked when stop gives up waiting.
        assert_eq!(ctl.stop().await, StopStatus::Stopped);
        assert!(ctl.is_running());
        assert_eq!(ctl.start("app.log").unwrap(), StartStatus::AlreadyRunning);

        // The stop request is honoured once the fetch returns.
        drain_until(&mut ctl, |m| m.iter().any(|s| s.ends_with("> Monitoring stopped"))).await;
    }
}
