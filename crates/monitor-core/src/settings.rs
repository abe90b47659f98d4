use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Which transport the monitor uses to reach the log file.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// SFTP over SSH using the stored connection settings.
    Sftp,
    /// Treat the configured remote directory as a local directory.
    Local,
}

/// Tail a remote log file over SFTP
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sftp-monitor",
    about = "Tail a remote log file over SFTP and print new lines in batches",
    version
)]
pub struct Settings {
    /// Name of the log file inside the configured remote directory
    pub log_file: String,

    /// Seconds to wait between two checks of the log file (1-3600)
    #[arg(
        long,
        env = "SLEEP_BETWEEN_LOG_CHECKS",
        default_value = "5",
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub poll_interval: u64,

    /// Network timeout in seconds for connecting and transferring
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Seconds to wait for the monitor to finish after a stop request
    #[arg(long, default_value = "5")]
    pub join_timeout: u64,

    /// Connection settings file (defaults to ~/.sftp-monitor/settings.json)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Directory holding the local copy of the monitored file
    #[arg(long, default_value = "logs")]
    pub cache_dir: PathBuf,

    /// Transport used to fetch the file
    #[arg(long, value_enum, default_value = "sftp")]
    pub transport: TransportKind,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse CLI arguments (and `SLEEP_BETWEEN_LOG_CHECKS`) and apply the
    /// `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
