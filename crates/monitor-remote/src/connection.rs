//! Lifecycle of the remote session used by one monitoring run.
//!
//! [`ConnectionManager`] connects once, fetches the monitored file on demand
//! into its local cache, and closes the transport exactly once however many
//! times [`ConnectionManager::close`] is called.

use std::io::Write;
use std::path::{Path, PathBuf};

use monitor_core::config::{ConnectionConfig, LogFileReference};
use monitor_core::error::{ConnectionError, TransferError};

use crate::transport::{Connector, Transport};

pub struct ConnectionManager<T: Transport> {
    transport: Option<T>,
    file: LogFileReference,
}

impl<T: Transport> ConnectionManager<T> {
    /// Open a session through `connector`. Failures are returned as-is; the
    /// caller decides whether a session can continue without one.
    pub fn connect<C>(
        connector: &C,
        config: &ConnectionConfig,
        file: LogFileReference,
    ) -> Result<Self, ConnectionError>
    where
        C: Connector<Transport = T>,
    {
        tracing::info!(
            host = %config.hostname,
            port = config.port,
            remote_path = file.remote_path(),
            "connecting"
        );
        let transport = connector.connect(config)?;
        Ok(Self {
            transport: Some(transport),
            file,
        })
    }

    /// Download the monitored file, replace the local cache with it and
    /// return its text.
    ///
    /// The cache is only replaced once the whole file has been received, so
    /// a failed transfer leaves the previous copy untouched. Invalid UTF-8 is
    /// decoded lossily.
    pub fn fetch(&mut self) -> Result<String, TransferError> {
        let transport = self.transport.as_mut().ok_or(TransferError::Closed)?;
        let bytes = transport.read_file(self.file.remote_path())?;

        write_cache(self.file.local_path(), &bytes)?;
        tracing::debug!(
            remote_path = self.file.remote_path(),
            bytes = bytes.len(),
            "fetched remote file"
        );

        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "remote file is not valid utf-8");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })
    }

    /// Release the transport. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            tracing::debug!(remote_path = self.file.remote_path(), "connection closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }
}

impl<T: Transport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), TransferError> {
    let cache_err = |source: std::io::Error| TransferError::Cache {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(cache_err)?;
    }

    let tmp = part_path(path);
    let staged = std::fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = staged.and_then(|()| std::fs::rename(&tmp, path)) {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            tracing::debug!(path = %tmp.display(), error = %cleanup, "could not remove partial cache file");
        }
        return Err(cache_err(e));
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
