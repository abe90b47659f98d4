//! Remote access layer for the log monitor.
//!
//! Defines the [`transport::Connector`]/[`transport::Transport`] seam, an
//! SFTP implementation built on `ssh2`, a local-filesystem implementation,
//! and the [`connection::ConnectionManager`] that owns one session and keeps
//! the local cache copy of the monitored file.

pub mod connection;
pub mod local;
pub mod sftp;
pub mod transport;

pub use connection::ConnectionManager;
pub use monitor_core as core;
