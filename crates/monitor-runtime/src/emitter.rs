//! Turns diff results into numbered batches on the output queue.

use monitor_core::diff::DiffResult;
use monitor_core::formatting::batch_header;

use crate::output::OutputSink;

/// Numbers batches and writes them to an [`OutputSink`].
///
/// Each batch is a timestamped `"Printing batch N"` header followed by the
/// content with trailing whitespace removed. The counter starts at zero and
/// goes up by one per batch.
#[derive(Debug)]
pub struct BatchEmitter {
    sink: OutputSink,
    batch_counter: u64,
}

impl BatchEmitter {
    pub fn new(sink: OutputSink) -> Self {
        Self {
            sink,
            batch_counter: 0,
        }
    }

    /// Emit `result`. Returns `true` when a batch was written.
    pub fn emit(&mut self, result: DiffResult) -> bool {
        match result {
            DiffResult::NoChange => false,
            DiffResult::InitialBatch(lines) => {
                self.push_header();
                tracing::debug!(batch = self.batch_counter, lines = lines.len(), "initial batch");
                for line in lines {
                    self.sink.push(line.trim_end().to_string());
                }
                true
            }
            DiffResult::Delta(text) => {
                self.push_header();
                tracing::debug!(batch = self.batch_counter, bytes = text.len(), "delta batch");
                self.sink.push(text.trim_end().to_string());
                true
            }
        }
    }

    /// Number of batches emitted so far.
    pub fn batch_count(&self) -> u64 {
        self.batch_counter
    }

    fn push_header(&mut self) {
        self.batch_counter += 1;
        self.sink.push_timestamped(&batch_header(self.batch_counter));
    }
}
