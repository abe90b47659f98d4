//! Connection settings and the file reference a session is bound to.
//!
//! [`ConnectionConfig`] is read once from a [`SettingsStore`] when a session
//! is created and never changes afterwards. [`LogFileReference`] pairs the
//! remote path of the monitored file with its local cache location.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

// ── Secret ────────────────────────────────────────────────────────────────────

/// An opaque credential. `Debug` and `Display` never reveal the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The plaintext value. Only transports should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

// ── ConnectionConfig ──────────────────────────────────────────────────────────

/// Parameters needed to open a remote session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    pub remote_dir: String,
}

impl ConnectionConfig {
    /// Check the invariants a transport relies on.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(MonitorError::Config("hostname must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(MonitorError::Config(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(MonitorError::Config("username must not be empty".to_string()));
        }
        Ok(())
    }
}

// ── LogFileReference ──────────────────────────────────────────────────────────

/// Where the monitored file lives remotely and where its copy is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileReference {
    file_name: String,
    remote_path: String,
    local_path: PathBuf,
}

impl LogFileReference {
    /// Build a reference for `file_name` inside `remote_dir`, cached under
    /// `cache_dir`.
    ///
    /// `file_name` must be a bare file name: empty names and names containing
    /// path separators or `..` are rejected so the cache path cannot escape
    /// `cache_dir`.
    pub fn new(remote_dir: &str, file_name: &str, cache_dir: &Path) -> Result<Self> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(MonitorError::Validation("Log file is required".to_string()));
        }
        if file_name.contains(['/', '\\']) || matches!(file_name, "." | "..") {
            return Err(MonitorError::Validation(format!(
                "Log file must be a plain file name: {file_name}"
            )));
        }

        let dir = remote_dir.trim_end_matches('/');
        let remote_path = if dir.is_empty() && remote_dir.starts_with('/') {
            format!("/{file_name}")
        } else if dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{dir}/{file_name}")
        };

        Ok(Self {
            file_name: file_name.to_string(),
            remote_path,
            local_path: cache_dir.join(file_name),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

// ── SettingsStore ─────────────────────────────────────────────────────────────

/// Source of connection settings, queried once per session start.
pub trait SettingsStore: Send + Sync {
    /// Return the stored settings, or `None` when nothing has been saved.
    fn load(&self) -> Result<Option<ConnectionConfig>>;

    /// Human-readable location used in "no settings" errors.
    fn location(&self) -> PathBuf;

    /// Load settings, turning absence into [`MonitorError::NoSettings`] and
    /// rejecting invalid values.
    fn require(&self) -> Result<ConnectionConfig> {
        let config = self
            .load()?
            .ok_or_else(|| MonitorError::NoSettings(self.location()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings persisted as a JSON document, by default
/// `~/.sftp-monitor/settings.json`.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Return the default path to the settings file.
    pub fn default_path() -> PathBuf {
        Self::default_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the settings path rooted at `base_dir` (used for testing).
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".sftp-monitor").join("settings.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonSettingsStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Option<ConnectionConfig>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "settings file absent");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let config: ConnectionConfig = serde_json::from_str(&content)?;
        tracing::debug!(
            host = %config.hostname,
            port = config.port,
            user = %config.username,
            "loaded connection settings"
        );
        Ok(Some(config))
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
