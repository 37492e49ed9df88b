//! Coordinates and identities
//!
//! `FieldPos` addresses one field by (record, column). Columns are only
//! meaningful on the line they came from; anything that needs "the same
//! spine" on another line goes through `TrackId`.

use serde::{Deserialize, Serialize};

/// A field position (line, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPos {
    pub line: usize,
    pub col: usize,
}

impl FieldPos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl std::fmt::Display for FieldPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Persistent identity of a spine lineage.
///
/// Ordinals are assigned in creation order, so a lower id always means an
/// earlier track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub usize);

impl TrackId {
    pub fn ordinal(self) -> usize {
        self.0
    }
}
