//! Filesystem transport: the "remote" directory is a local one.
//!
//! Handy for dry runs against a file on the same machine and used by the
//! runtime tests as a stand-in for an SFTP server.

use std::io::ErrorKind;
use std::path::Path;

use monitor_core::config::ConnectionConfig;
use monitor_core::error::{ConnectionError, TransferError};

use crate::transport::{Connector, Transport};

#[derive(Debug, Clone, Default)]
pub struct LocalConnector;

impl Connector for LocalConnector {
    type Transport = LocalTransport;

    fn connect(&self, config: &ConnectionConfig) -> Result<LocalTransport, ConnectionError> {
        if !Path::new(&config.remote_dir).is_dir() {
            return Err(ConnectionError::RemoteDirectory(config.remote_dir.clone()));
        }
        tracing::debug!(dir = %config.remote_dir, "local transport opened");
        Ok(LocalTransport { open: true })
    }
}

#[derive(Debug)]
pub struct LocalTransport {
    open: bool,
}

impl Transport for LocalTransport {
    fn read_file(&mut self, remote_path: &str) -> Result<Vec<u8>, TransferError> {
        if !self.open {
            return Err(TransferError::Closed);
        }
        std::fs::read(remote_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransferError::NotFound(remote_path.to_string()),
            _ => TransferError::Remote {
                path: remote_path.to_string(),
                message: e.to_string(),
            },
        })
    }

    fn close(&mut self) {
        self.open = false;
    }
}
