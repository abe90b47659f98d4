mod bootstrap;
mod console;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use monitor_core::config::SettingsStore;
use monitor_core::settings::{Settings, TransportKind};
use monitor_remote::local::LocalConnector;
use monitor_remote::sftp::SftpConnector;
use monitor_remote::transport::Connector;
use monitor_runtime::MonitorController;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::console::Command;

/// How often queued output is flushed to stdout.
const DRAIN_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file_path.as_ref())?;

    tracing::info!("SFTP Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "File: {}, poll interval: {}s, transport: {:?}",
        settings.log_file,
        settings.poll_interval,
        settings.transport
    );

    let store = bootstrap::settings_store(&settings);
    let options = bootstrap::session_options(&settings);

    let stdin = BufReader::new(tokio::io::stdin());
    match settings.transport {
        TransportKind::Sftp => {
            let connector = SftpConnector::new(settings.transfer_timeout());
            let controller = MonitorController::new(connector, store, options);
            run(controller, &settings.log_file, stdin).await
        }
        TransportKind::Local => {
            let controller = MonitorController::new(LocalConnector, store, options);
            run(controller, &settings.log_file, stdin).await
        }
    }
}

/// Start monitoring and relay output until stopped by a command, Ctrl+C, or
/// the session ending on its own. The last case is an error: sessions only
/// end by themselves after a fatal failure.
async fn run<C, S, R>(
    mut controller: MonitorController<C, S>,
    log_file: &str,
    commands: R,
) -> Result<()>
where
    C: Connector,
    S: SettingsStore,
    R: AsyncBufRead + Unpin,
{
    controller
        .start(log_file)
        .with_context(|| format!("failed to start monitoring {log_file}"))?;

    let mut ticker = tokio::time::interval(DRAIN_INTERVAL);
    let mut lines = commands.lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let running = controller.is_running();
                print_messages(controller.drain());
                if !running {
                    bail!("monitoring of {log_file} ended after an error");
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Command::parse(&line) {
                    Some(Command::Pause) => {
                        controller.set_paused(true);
                    }
                    Some(Command::Resume) => {
                        controller.set_paused(false);
                    }
                    Some(Command::Status) => {
                        println!("{}", console::describe(&controller.status()));
                    }
                    Some(Command::Stop) => break,
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command: {} (pause, resume, status, stop)", line.trim()),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => {
                tracing::info!("Ctrl+C received; stopping monitoring");
                break;
            }
        }
    }

    controller.stop().await;
    print_messages(controller.drain());
    Ok(())
}

fn print_messages(messages: Vec<String>) {
    for message in messages {
        println!("{message}");
    }
}
