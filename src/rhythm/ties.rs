//! Tie chains
//!
//! Notes joined by `[`, `_` and `]` form one sustained sound. Open chains
//! are kept per primary track and matched by pitch, so chords and split
//! layers of the same part can carry several chains at once.

use std::collections::{HashMap, HashSet};

use crate::error::RhythmError;
use crate::models::{Pitch, Rational};

/// (line, column, sub-token)
pub type NoteKey = (usize, usize, usize);

#[derive(Debug, Clone)]
struct OpenTie {
    pitch: Option<Pitch>,
    start: NoteKey,
    links: usize,
    total: Rational,
}

/// Tie bookkeeping for one rhythm pass
#[derive(Debug, Clone, Default)]
pub struct TieTracker {
    open: HashMap<usize, Vec<OpenTie>>,
    totals: HashMap<NoteKey, Rational>,
    members: HashSet<NoteKey>,
}

impl TieTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[`: open a chain
    pub fn start(&mut self, primary: usize, key: NoteKey, pitch: Option<Pitch>, duration: Rational) {
        self.open.entry(primary).or_default().push(OpenTie {
            pitch,
            start: key,
            links: 1,
            total: duration,
        });
    }

    /// `_` or `]`: extend the matching chain, closing it on `]`
    pub fn extend(
        &mut self,
        primary: usize,
        key: NoteKey,
        pitch: Option<Pitch>,
        duration: Rational,
        close: bool,
        max_links: usize,
    ) -> Result<(), RhythmError> {
        self.members.insert(key);
        let chains = self.open.entry(primary).or_default();
        let index = chains
            .iter()
            .position(|c| c.pitch.is_some() && c.pitch == pitch)
            .or_else(|| if chains.len() == 1 { Some(0) } else { None });

        let Some(index) = index else {
            log::warn!(
                "tie continuation at line {}, column {} has no open chain",
                key.0 + 1,
                key.1 + 1
            );
            return Ok(());
        };

        let chain = &mut chains[index];
        chain.links += 1;
        chain.total += duration;
        if chain.links > max_links {
            return Err(RhythmError::TieChainOverflow {
                line: chain.start.0,
                column: chain.start.1,
                limit: max_links,
            });
        }
        if close {
            let chain = chains.remove(index);
            self.totals.insert(chain.start, chain.total);
        }
        Ok(())
    }

    /// Close whatever is still open at end of input
    pub fn finish(&mut self) {
        for (_, chains) in self.open.drain() {
            for chain in chains {
                log::warn!(
                    "tie starting at line {}, column {} is never closed",
                    chain.start.0 + 1,
                    chain.start.1 + 1
                );
                self.totals.insert(chain.start, chain.total);
            }
        }
    }

    /// Total duration of the chain that starts at `key`
    pub fn total(&self, key: NoteKey) -> Option<Rational> {
        self.totals.get(&key).copied()
    }

    /// Whether `key` continues or ends a chain
    pub fn is_member(&self, key: NoteKey) -> bool {
        self.members.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rational;

    #[test]
    fn test_chain_total() {
        let mut ties = TieTracker::new();
        let c = Pitch::parse("4c");
        ties.start(1, (1, 0, 0), c, rational(1));
        ties.extend(1, (2, 0, 0), c, rational(1), false, 64).unwrap();
        ties.extend(1, (3, 0, 0), c, rational(1), true, 64).unwrap();
        assert_eq!(ties.total((1, 0, 0)), Some(rational(3)));
        assert!(ties.is_member((2, 0, 0)));
        assert!(ties.is_member((3, 0, 0)));
        assert!(!ties.is_member((1, 0, 0)));
    }

    #[test]
    fn test_chord_chains_match_by_pitch() {
        let mut ties = TieTracker::new();
        let c = Pitch::parse("4c");
        let e = Pitch::parse("4e");
        ties.start(1, (1, 0, 0), c, rational(1));
        ties.start(1, (1, 0, 1), e, rational(1));
        ties.extend(1, (2, 0, 0), e, rational(2), true, 64).unwrap();
        ties.extend(1, (2, 0, 1), c, Rational::new(1, 2), true, 64).unwrap();
        assert_eq!(ties.total((1, 0, 0)), Some(Rational::new(3, 2)));
        assert_eq!(ties.total((1, 0, 1)), Some(rational(3)));
    }

    #[test]
    fn test_overflow() {
        let mut ties = TieTracker::new();
        let c = Pitch::parse("4c");
        ties.start(1, (0, 0, 0), c, rational(1));
        ties.extend(1, (1, 0, 0), c, rational(1), false, 2).unwrap();
        let err = ties.extend(1, (2, 0, 0), c, rational(1), false, 2).unwrap_err();
        assert_eq!(err, RhythmError::TieChainOverflow { line: 0, column: 0, limit: 2 });
    }

    #[test]
    fn test_unclosed_chain_is_totalled_at_finish() {
        let mut ties = TieTracker::new();
        ties.start(2, (4, 1, 0), Pitch::parse("2g"), rational(2));
        ties.finish();
        assert_eq!(ties.total((4, 1, 0)), Some(rational(2)));
    }
}
