use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the log monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The settings store holds no connection settings.
    #[error("No settings found in {0}")]
    NoSettings(PathBuf),

    /// A start request was rejected before any session was created.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Opening or authenticating the remote session failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Downloading the monitored file failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A failure the monitoring loop has no recovery path for.
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// A settings document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure while establishing the remote session. Always fatal to a session.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The host name could not be resolved to any socket address.
    #[error("Could not resolve host {host}:{port}: {reason}")]
    Resolve {
        host: String,
        port: u16,
        reason: String,
    },

    /// TCP connect failed or timed out.
    #[error("Failed to connect to {host}:{port}: {source}")]
    Unreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The SSH handshake did not complete.
    #[error("Handshake with {host} failed: {message}")]
    Handshake { host: String, message: String },

    /// The server rejected the supplied credentials.
    #[error("Authentication failed for user {username}: {message}")]
    Authentication { username: String, message: String },

    /// The file-transfer subsystem could not be opened on the session.
    #[error("Could not open file-transfer channel: {0}")]
    Channel(String),

    /// The configured remote directory is not usable.
    #[error("Remote directory not found: {0}")]
    RemoteDirectory(String),
}

/// Failure while fetching the monitored file. Never fatal to a session.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The remote file does not exist.
    #[error("Remote file not found: {0}")]
    NotFound(String),

    /// Reading the remote file failed part-way.
    #[error("Failed to download {path}: {message}")]
    Remote { path: String, message: String },

    /// The downloaded bytes could not be written to the local cache.
    #[error("Failed to write cache file {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `fetch` was called after the connection was closed.
    #[error("Connection is closed")]
    Closed,
}

/// What the monitoring loop does after an error surfaced inside a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Report the error and keep polling.
    Continue,
    /// Report the error and shut the session down.
    Terminate,
}

impl MonitorError {
    /// Classify this error for the monitoring loop.
    ///
    /// Only transfer failures are recoverable; everything else ends the
    /// session.
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            MonitorError::Transfer(_) => ErrorDisposition::Continue,
            _ => ErrorDisposition::Terminate,
        }
    }
}

/// Convenience alias used throughout the monitor crates.
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = MonitorError::Config("port must be between 1 and 65535".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: port must be between 1 and 65535"
        );
    }

    #[test]
    fn test_error_display_no_settings() {
        let err = MonitorError::NoSettings(PathBuf::from("/etc/monitor/settings.json"));
        assert_eq!(
            err.to_string(),
            "No settings found in /etc/monitor/settings.json"
        );
    }

    #[test]
    fn test_error_display_unreachable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = MonitorError::from(ConnectionError::Unreachable {
            host: "logs.example.com".to_string(),
            port: 22,
            source: io_err,
        });
        let msg = err.to_string();
        assert!(msg.contains("logs.example.com:22"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn test_error_display_authentication() {
        let err = ConnectionError::Authentication {
            username: "deploy".to_string(),
            message: "bad password".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Authentication failed for user deploy: bad password"
        );
    }

    #[test]
    fn test_error_display_transfer_not_found() {
        let err = MonitorError::from(TransferError::NotFound("/var/log/app.log".to_string()));
        assert_eq!(err.to_string(), "Remote file not found: /var/log/app.log");
    }

    #[test]
    fn test_error_display_cache() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TransferError::Cache {
            path: PathBuf::from("logs/app.log"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("logs/app.log"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_transfer_errors_continue() {
        let err = MonitorError::from(TransferError::Closed);
        assert_eq!(err.disposition(), ErrorDisposition::Continue);
    }

    #[test]
    fn test_connection_and_unexpected_errors_terminate() {
        let conn = MonitorError::from(ConnectionError::Channel("no sftp".to_string()));
        assert_eq!(conn.disposition(), ErrorDisposition::Terminate);

        let unexpected = MonitorError::Unexpected("worker panicked".to_string());
        assert_eq!(unexpected.disposition(), ErrorDisposition::Terminate);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: MonitorError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: MonitorError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
