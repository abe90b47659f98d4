//! Incremental change detection for a file that grows by appending.
//!
//! [`ContentDiffEngine`] remembers the full text of the last successful fetch
//! and reports only what was added since. The first observation always
//! yields the tail of the file so a consumer sees some context on start.
//!
//! The delta is the suffix of the new content starting at the byte length of
//! the previous content. It does not search for a common prefix, so a file
//! that is truncated, rotated or rewritten produces a wrong or empty delta.

use crate::formatting::tail_lines;

/// Number of lines carried by the initial batch.
pub const INITIAL_TAIL_LINES: usize = 100;

/// Outcome of one [`ContentDiffEngine::observe`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResult {
    /// First observation of the session: the last lines of the file.
    InitialBatch(Vec<String>),
    /// Content appended since the previous observation.
    Delta(String),
    /// Nothing worth emitting.
    NoChange,
}

/// Holds the last observed content and computes the unseen suffix.
#[derive(Debug, Clone)]
pub struct ContentDiffEngine {
    last_content: Option<String>,
    initial_load: bool,
}

impl ContentDiffEngine {
    pub fn new() -> Self {
        Self {
            last_content: None,
            initial_load: true,
        }
    }

    /// Feed the result of a fetch into the engine.
    ///
    /// `None` stands for a failed fetch and never touches the stored state.
    pub fn observe(&mut self, current: Option<&str>) -> DiffResult {
        let Some(current) = current else {
            return DiffResult::NoChange;
        };

        if self.initial_load {
            self.initial_load = false;
            self.last_content = Some(current.to_string());
            return DiffResult::InitialBatch(tail_lines(current, INITIAL_TAIL_LINES));
        }

        let previous = self.last_content.as_deref().unwrap_or("");
        if current == previous {
            return DiffResult::NoChange;
        }

        let delta = suffix_after(current, previous.len()).to_string();
        self.last_content = Some(current.to_string());

        if delta.trim().is_empty() {
            tracing::debug!(bytes = delta.len(), "content changed without visible delta");
            DiffResult::NoChange
        } else {
            DiffResult::Delta(delta)
        }
    }

    /// Full text of the most recent successful fetch.
    pub fn last_content(&self) -> Option<&str> {
        self.last_content.as_deref()
    }

    /// `true` until the first successful observation.
    pub fn is_initial_load(&self) -> bool {
        self.initial_load
    }
}

impl Default for ContentDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Slice `content` from byte `offset`, moving forward to the next character
/// boundary when `offset` lands inside a multi-byte character.
fn suffix_after(content: &str, offset: usize) -> &str {
    if offset >= content.len() {
        return "";
    }
    let mut start = offset;
    while !content.is_char_boundary(start) {
        start += 1;
    }
    &content[start..]
}
