use chrono::Utc;

use crate::model::{Coordinate, HistoryEntry};

/// History keeps only the most recent selections; older entries are
/// evicted silently.
pub const HISTORY_CAP: usize = 3;

/// Token handed out per coordinate change. Asynchronous completions carry
/// it back so stale results can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub coordinate: Coordinate,
    pub generation: u64,
}

/// Holds the current selected coordinate and a small bounded history of
/// past selections. Absent until the first resolution.
#[derive(Debug, Default)]
pub struct PositionStore {
    current: Option<Coordinate>,
    history: Vec<HistoryEntry>,
    generation: u64,
    next_entry_id: u64,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Coordinate> {
        self.current
    }

    /// Most-recent-first, at most [`HISTORY_CAP`] entries.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sets the current coordinate and prepends exactly one history entry,
    /// truncating to the cap. Bumps the generation so in-flight enrichment
    /// for the previous coordinate becomes stale.
    pub fn select(&mut self, coordinate: Coordinate, label: impl Into<String>) -> Selection {
        self.generation += 1;
        self.next_entry_id += 1;

        self.current = Some(coordinate);
        self.history.insert(
            0,
            HistoryEntry {
                id: self.next_entry_id,
                coordinate,
                label: label.into(),
                selected_at: Utc::now(),
            },
        );
        self.history.truncate(HISTORY_CAP);

        Selection { coordinate, generation: self.generation }
    }

    /// Re-selects a coordinate from the history list: updates the current
    /// coordinate and generation without recording a new entry.
    pub fn revisit(&mut self, coordinate: Coordinate) -> Selection {
        self.generation += 1;
        self.current = Some(coordinate);
        Selection { coordinate, generation: self.generation }
    }

    /// Whether `selection` still refers to the latest coordinate change.
    pub fn is_current(&self, selection: &Selection) -> bool {
        selection.generation == self.generation
    }
}
