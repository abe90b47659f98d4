//! Runtime layer for the SFTP log monitor.
//!
//! Runs the polling session on a tokio task, numbers and queues its output,
//! and exposes start/stop/pause control over a single active session.

pub mod controller;
pub mod emitter;
pub mod output;
pub mod session;

pub use controller::{MonitorController, MonitorStatus, StartStatus, StopStatus};
pub use monitor_core as core;
pub use monitor_remote as remote;
