use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use monitor_core::config::JsonSettingsStore;
use monitor_core::settings::Settings;
use monitor_runtime::session::SessionOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.sftp-monitor/` exists so the settings file has a home.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Same as [`ensure_directories`] rooted at `base_dir`.
pub fn ensure_directories_in(base_dir: &Path) -> anyhow::Result<()> {
    let monitor_dir = base_dir.join(".sftp-monitor");
    std::fs::create_dir_all(&monitor_dir)?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name to a tracing filter directive.
///
/// Unknown names are passed through so `EnvFilter` syntax such as
/// `monitor_runtime=debug` still works.
pub fn normalise_level(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Everything goes to stderr so stdout carries only monitor output. When
/// `log_file` is given, the same events are also appended to that file
/// without ANSI colours.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(normalise_level(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Runtime wiring ─────────────────────────────────────────────────────────────

/// Settings store selected by `--settings`, or the default location.
pub fn settings_store(settings: &Settings) -> JsonSettingsStore {
    match &settings.settings {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::default(),
    }
}

/// Session tunables taken from the command line.
pub fn session_options(settings: &Settings) -> SessionOptions {
    SessionOptions {
        poll_interval: settings.poll_interval(),
        cache_dir: settings.cache_dir.clone(),
        join_timeout: settings.join_timeout(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_in() {
        let tmp = TempDir::new().expect("tempdir");
        ensure_directories_in(tmp.path()).expect("ensure_directories should succeed");
        assert!(tmp.path().join(".sftp-monitor").is_dir());

        // Running twice is fine.
        ensure_directories_in(tmp.path()).expect("second run");
    }

    #[test]
    fn test_normalise_level() {
        assert_eq!(normalise_level("DEBUG"), "debug");
        assert_eq!(normalise_level("info"), "info");
        assert_eq!(normalise_level("WARNING"), "warn");
        assert_eq!(normalise_level("CRITICAL"), "error");
        assert_eq!(normalise_level("monitor_runtime=trace"), "monitor_runtime=trace");
    }

    #[test]
    fn test_session_options_from_settings() {
        let settings = Settings::parse_from([
            "sftp-monitor",
            "app.log",
            "--poll-interval",
            "9",
            "--join-timeout",
            "3",
            "--cache-dir",
            "/tmp/cache",
        ]);
        let options = session_options(&settings);
        assert_eq!(options.poll_interval, Duration::from_secs(9));
        assert_eq!(options.join_timeout, Duration::from_secs(3));
        assert_eq!(options.cache_dir, PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_settings_store_override() {
        let settings =
            Settings::parse_from(["sftp-monitor", "app.log", "--settings", "/etc/mon.json"]);
        assert_eq!(settings_store(&settings).path(), Path::new("/etc/mon.json"));
    }
}
