//! Core types for the SFTP log monitor.
//!
//! Errors, connection settings, CLI settings, message formatting and the
//! append-only diff engine. Nothing in this crate performs network I/O.

pub mod config;
pub mod diff;
pub mod error;
pub mod formatting;
pub mod settings;

pub use error::{MonitorError, Result};
