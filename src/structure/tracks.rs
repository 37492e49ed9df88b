//! Track table
//!
//! Arena of every spine lineage created while parsing one file. Tracks are
//! never removed; a terminated spine simply stops being bound to a column.

use serde::{Deserialize, Serialize};

use crate::models::TrackId;

/// Persistent identity of one spine lineage
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// 1-based number of the top-level spine this lineage descends from
    pub primary: usize,
    /// Track that split to produce this one
    pub parent: Option<TrackId>,
    /// `**name`, unset between `*+` and the following exclusive interpretation
    pub exinterp: Option<String>,
    /// 0 for unsplit tracks, 1 for the left child of a split, 2 for the right
    pub layer: u32,
    /// Lineage string: `1`, `(1)a`, `((1)a)b`
    pub info: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TrackTable {
    tracks: Vec<Track>,
    primary_count: usize,
}

impl TrackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of top-level spines ever started
    pub fn primary_count(&self) -> usize {
        self.primary_count
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn primary_of(&self, id: TrackId) -> Option<usize> {
        self.get(id).map(|t| t.primary)
    }

    pub fn exinterp_of(&self, id: TrackId) -> Option<&str> {
        self.get(id).and_then(|t| t.exinterp.as_deref())
    }

    /// Start a new top-level spine
    pub fn create_primary(&mut self, exinterp: Option<String>) -> TrackId {
        self.primary_count += 1;
        let id = TrackId(self.tracks.len());
        self.tracks.push(Track {
            id,
            primary: self.primary_count,
            parent: None,
            exinterp,
            layer: 0,
            info: self.primary_count.to_string(),
        });
        id
    }

    pub fn set_exinterp(&mut self, id: TrackId, exinterp: &str) {
        if let Some(track) = self.tracks.get_mut(id.0) {
            track.exinterp = Some(exinterp.to_string());
        }
    }

    /// Split a track into left and right children
    pub fn split(&mut self, id: TrackId) -> (TrackId, TrackId) {
        let Some(parent) = self.get(id).cloned() else {
            return (id, id);
        };
        let left = self.push_child(&parent, 1, 'a');
        let right = self.push_child(&parent, 2, 'b');
        (left, right)
    }

    fn push_child(&mut self, parent: &Track, layer: u32, tag: char) -> TrackId {
        let id = TrackId(self.tracks.len());
        self.tracks.push(Track {
            id,
            primary: parent.primary,
            parent: Some(parent.id),
            exinterp: parent.exinterp.clone(),
            layer,
            info: format!("({}){}", parent.info, tag),
        });
        id
    }

    /// Identity that a run of merged tracks collapses into.
    ///
    /// Each source proposes its parent (or itself when unsplit); the
    /// lowest-ordinal proposal wins, leftmost first on ties. Two children of
    /// one split therefore merge back into the track that split.
    pub fn merge(&self, ids: &[TrackId]) -> Option<TrackId> {
        ids.iter()
            .map(|&id| self.get(id).and_then(|t| t.parent).unwrap_or(id))
            .min_by_key(|id| id.ordinal())
    }

    /// Top-level tracks with the given exclusive interpretation, by primary number
    pub fn primaries_by_exinterp(&self, name: &str) -> Vec<usize> {
        let mut primaries: Vec<usize> = self
            .tracks
            .iter()
            .filter(|t| t.parent.is_none() && t.exinterp.as_deref() == Some(name))
            .map(|t| t.primary)
            .collect();
        primaries.sort_unstable();
        primaries.dedup();
        primaries
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.primary_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_merge_back() {
        let mut table = TrackTable::new();
        let root = table.create_primary(Some("**kern".to_string()));
        let (a, b) = table.split(root);

        assert_eq!(table.get(a).unwrap().info, "(1)a");
        assert_eq!(table.get(b).unwrap().info, "(1)b");
        assert_eq!(table.get(a).unwrap().layer, 1);
        assert_eq!(table.get(b).unwrap().layer, 2);
        assert_eq!(table.exinterp_of(b), Some("**kern"));
        assert_eq!(table.merge(&[a, b]), Some(root));
    }

    #[test]
    fn test_nested_merge_prefers_lowest_ordinal() {
        let mut table = TrackTable::new();
        let root = table.create_primary(Some("**kern".to_string()));
        let (a, b) = table.split(root);
        let (aa, ab) = table.split(a);
        assert_eq!(table.get(ab).unwrap().info, "((1)a)b");

        // aa and ab propose `a`, b proposes `root`
        assert_eq!(table.merge(&[aa, ab, b]), Some(root));
        assert_eq!(table.merge(&[aa, ab]), Some(a));
    }

    #[test]
    fn test_primaries_by_exinterp() {
        let mut table = TrackTable::new();
        table.create_primary(Some("**kern".to_string()));
        table.create_primary(Some("**dynam".to_string()));
        let third = table.create_primary(Some("**kern".to_string()));
        table.split(third);

        assert_eq!(table.primaries_by_exinterp("**kern"), vec![1, 3]);
        assert_eq!(table.primaries_by_exinterp("**dynam"), vec![2]);
        assert!(table.primaries_by_exinterp("**text").is_empty());
    }
}
