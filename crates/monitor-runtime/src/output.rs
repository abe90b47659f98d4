//! Unbounded FIFO between a monitoring session and whoever displays it.
//!
//! The sink side is cheap to clone and never blocks. The drain side hands out
//! everything queued so far; each message is delivered at most once.

use monitor_core::formatting::format_message;
use tokio::sync::mpsc;

/// Create a connected sink/drain pair.
pub fn output_channel() -> (OutputSink, OutputDrain) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OutputSink { tx }, OutputDrain { rx })
}

/// Producer half of the output queue.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::UnboundedSender<String>,
}

impl OutputSink {
    /// Queue `message` verbatim.
    pub fn push(&self, message: impl Into<String>) {
        if self.tx.send(message.into()).is_err() {
            tracing::debug!("output drain dropped; message discarded");
        }
    }

    /// Queue `message` prefixed with the current local time.
    pub fn push_timestamped(&self, message: &str) {
        self.push(format_message(message));
    }
}

/// Consumer half of the output queue.
#[derive(Debug)]
pub struct OutputDrain {
    rx: mpsc::UnboundedReceiver<String>,
}

impl OutputDrain {
    /// Remove and return every queued message without waiting.
    pub fn drain(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Wait for the next message. `None` once every sink is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}
