use std::collections::VecDeque;

use tracing::debug;

use crate::graph::Graph;

/// Default number of retained snapshots.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Linear undo/redo log of full-graph snapshots.
///
/// Entries are owned deep copies; restoring one hands out another copy so
/// the log can never be mutated through a restored graph.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Graph>,
    cursor: usize,
    limit: usize,
    saved: bool,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.max(1),
            saved: true,
        }
    }

    /// Append a snapshot, discarding any redo branch past the cursor.
    pub fn record(&mut self, graph: &Graph) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(graph.snapshot());
        if self.entries.len() > self.limit {
            self.entries.pop_front();
            debug!(limit = self.limit, "History full, oldest snapshot evicted");
        }
        self.cursor = self.entries.len() - 1;
        self.saved = false;
    }

    /// Step back one entry. `None` when already at the oldest entry.
    pub fn undo(&mut self) -> Option<Graph> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.saved = false;
        self.current()
    }

    /// Step forward one entry. `None` when already at the newest entry.
    pub fn redo(&mut self) -> Option<Graph> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.saved = false;
        self.current()
    }

    /// Collapse the log to a single clean entry, e.g. after a save or load.
    pub fn reset(&mut self, graph: &Graph) {
        self.entries.clear();
        self.entries.push_back(graph.snapshot());
        self.cursor = 0;
        self.saved = true;
    }

    pub fn current(&self) -> Option<Graph> {
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// True when nothing changed since the last reset.
    pub fn is_saved(&self) -> bool {
        self.saved
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
