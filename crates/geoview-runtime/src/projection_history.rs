#![forbid(unsafe_code)]

//! Recently used projections, most recent first.
//!
//! Entries are unique by projection value. Re-adding a value that is already
//! present moves the existing entry to the front and keeps its label, so the
//! name the user first saw for a projection stays stable.

use geoview_core::Projection;

/// A labeled history entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct HistoryEntry {
    pub label: String,
    pub projection: Projection,
}

/// Most-recent-first projection list.
#[derive(Debug, Clone, Default)]
pub struct ProjectionHistory {
    entries: Vec<HistoryEntry>,
}

impl ProjectionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `projection` at the front.
    ///
    /// Returns `true` when a new entry was created, `false` when an existing
    /// value-equal entry was moved.
    pub fn add(&mut self, projection: Projection, label: impl Into<String>) -> bool {
        match self.position(&projection) {
            Some(idx) => {
                let entry = self.entries.remove(idx);
                self.entries.insert(0, entry);
                false
            }
            None => {
                self.entries.insert(
                    0,
                    HistoryEntry {
                        label: label.into(),
                        projection,
                    },
                );
                true
            }
        }
    }

    #[must_use]
    pub fn position(&self, projection: &Projection) -> Option<usize> {
        self.entries.iter().position(|e| e.projection == *projection)
    }

    #[must_use]
    pub fn contains(&self, projection: &Projection) -> bool {
        self.position(projection).is_some()
    }

    #[must_use]
    pub fn most_recent(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// Label recorded for a projection value.
    #[must_use]
    pub fn label_of(&self, projection: &Projection) -> Option<&str> {
        self.position(projection)
            .map(|idx| self.entries[idx].label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
