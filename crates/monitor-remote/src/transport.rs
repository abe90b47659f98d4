//! Transport seam between the connection manager and the wire protocol.

use monitor_core::config::ConnectionConfig;
use monitor_core::error::{ConnectionError, TransferError};

/// Opens authenticated sessions to the host holding the log file.
///
/// Implementations block; callers run them off the async executor.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Connect and authenticate. No retries happen at this layer.
    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Transport, ConnectionError>;
}

/// An open session able to read whole remote files.
pub trait Transport: Send + 'static {
    /// Download the full content of `remote_path`.
    fn read_file(&mut self, remote_path: &str) -> Result<Vec<u8>, TransferError>;

    /// Release the session. Must tolerate being called more than once.
    fn close(&mut self);
}
