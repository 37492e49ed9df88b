//! Spine-path tracker
//!
//! Consumes records in file order and keeps the live mapping from column
//! position to track. Manipulators on an interpretation line take effect on
//! the next spined line, so the binding stored for line *i* is always the
//! state produced by the lines before it.
//!
//! Every spined line also records, per column, which column of the previous
//! spined line it continues (`from`). Null resolution and the rhythm pass
//! walk these links instead of trusting raw column numbers.

use serde::{Deserialize, Serialize};

use super::tracks::TrackTable;
use crate::diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
use crate::error::StructuralError;
use crate::models::{Record, RecordKind, TrackId};
use crate::parse::Manipulator;

/// One column of a spined line
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnBinding {
    pub track: TrackId,
    /// Column of the previous spined line this one continues
    pub from: Option<usize>,
}

/// Column bindings of one spined line, linked to its neighbours
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LineBinding {
    pub prev_line: Option<usize>,
    pub next_line: Option<usize>,
    pub columns: Vec<ColumnBinding>,
}

impl LineBinding {
    pub fn track(&self, col: usize) -> Option<TrackId> {
        self.columns.get(col).map(|c| c.track)
    }
}

/// Bindings for every record; `None` for lines without fields
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PathHistory {
    lines: Vec<Option<LineBinding>>,
}

impl PathHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, line: usize) -> Option<&LineBinding> {
        self.lines.get(line).and_then(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn push(&mut self, binding: Option<LineBinding>) {
        self.lines.push(binding);
    }

    fn link_next(&mut self, prev: usize, next: usize) {
        if let Some(Some(binding)) = self.lines.get_mut(prev) {
            binding.next_line = Some(next);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Working state of the tracker
#[derive(Debug, Default)]
pub struct SpinePathTracker {
    /// Bindings the next spined line will receive
    pending: Vec<ColumnBinding>,
    last_spined: Option<usize>,
    terminated: bool,
}

impl SpinePathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks currently live, in column order
    pub fn state(&self) -> Vec<TrackId> {
        self.pending.iter().map(|c| c.track).collect()
    }

    /// Whether every spine has been terminated
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Process one record. Stamps each token with its track and appends the
    /// line's binding to `history`.
    pub fn advance(
        &mut self,
        record: &mut Record,
        tracks: &mut TrackTable,
        history: &mut PathHistory,
        diagnostics: &mut Diagnostics,
    ) {
        let line = record.index;
        if !record.kind().has_fields() {
            history.push(None);
            return;
        }

        let mut columns = std::mem::take(&mut self.pending);
        if columns.is_empty() && self.terminated {
            diagnostics.add(Diagnostic::new(
                line,
                DiagnosticSeverity::Warning,
                StructuralError::ContentAfterTermination,
            ));
            self.terminated = false;
        }

        if record.kind() == RecordKind::ExclusiveInterpretation {
            self.bind_exclusive(record, &mut columns, tracks, diagnostics);
        }

        let found = record.field_count();
        if columns.len() != found {
            // An orphan line with nothing open yet was already reported above
            // or is the start of malformed input; either way, keep going.
            diagnostics.add(Diagnostic::new(
                line,
                DiagnosticSeverity::Error,
                StructuralError::FieldCountMismatch {
                    expected: columns.len(),
                    found,
                },
            ));
            if found > columns.len() {
                for _ in columns.len()..found {
                    let track = tracks.create_primary(None);
                    columns.push(ColumnBinding { track, from: None });
                }
            } else {
                columns.truncate(found);
            }
        }

        for (token, binding) in record.tokens_mut().iter_mut().zip(&columns) {
            token.set_track(binding.track);
        }

        let next = if record.kind().is_interpretation() {
            self.apply_manipulators(record, &columns, tracks, diagnostics)
        } else {
            continuation(&columns)
        };

        if next.is_empty() && !columns.is_empty() {
            self.terminated = true;
        }

        if let Some(prev) = self.last_spined {
            history.link_next(prev, line);
        }
        history.push(Some(LineBinding {
            prev_line: self.last_spined,
            next_line: None,
            columns,
        }));
        self.pending = next;
        self.last_spined = Some(line);
    }

    /// Report spines left open at end of input
    pub fn finish(&self, last_line: usize, diagnostics: &mut Diagnostics) {
        if !self.pending.is_empty() {
            diagnostics.add(Diagnostic::new(
                last_line,
                DiagnosticSeverity::Warning,
                StructuralError::UnterminatedSpines {
                    count: self.pending.len(),
                },
            ));
        }
    }

    fn bind_exclusive(
        &mut self,
        record: &Record,
        columns: &mut Vec<ColumnBinding>,
        tracks: &mut TrackTable,
        diagnostics: &mut Diagnostics,
    ) {
        for (col, token) in record.tokens().iter().enumerate() {
            let name = token.exclusive_interpretation();
            if col >= columns.len() {
                let track = tracks.create_primary(name.map(str::to_string));
                columns.push(ColumnBinding { track, from: None });
                continue;
            }
            let Some(name) = name else { continue };
            let track = columns[col].track;
            match tracks.exinterp_of(track) {
                None => tracks.set_exinterp(track, name),
                Some(_) => {
                    diagnostics.add(
                        Diagnostic::new(
                            record.index,
                            DiagnosticSeverity::Error,
                            StructuralError::ActiveExclusiveInterpretation {
                                name: name.to_string(),
                            },
                        )
                        .at_column(col),
                    );
                    let fresh = tracks.create_primary(Some(name.to_string()));
                    columns[col] = ColumnBinding {
                        track: fresh,
                        from: None,
                    };
                }
            }
        }
    }

    fn apply_manipulators(
        &self,
        record: &Record,
        columns: &[ColumnBinding],
        tracks: &mut TrackTable,
        diagnostics: &mut Diagnostics,
    ) -> Vec<ColumnBinding> {
        let tokens = record.tokens();
        let manips: Vec<Option<Manipulator>> = tokens.iter().map(|t| t.manipulator()).collect();
        let n = columns.len();
        let mut next = Vec::with_capacity(n + 1);
        let keep = |i: usize| ColumnBinding {
            track: columns[i].track,
            from: Some(i),
        };

        let mut i = 0;
        while i < n {
            match manips[i] {
                Some(Manipulator::Split) => {
                    let (left, right) = tracks.split(columns[i].track);
                    next.push(ColumnBinding { track: left, from: Some(i) });
                    next.push(ColumnBinding { track: right, from: Some(i) });
                    i += 1;
                }
                Some(Manipulator::Merge) => {
                    let mut j = i + 1;
                    while j < n && manips[j] == Some(Manipulator::Merge) {
                        j += 1;
                    }
                    if j - i < 2 {
                        diagnostics.add(
                            Diagnostic::new(
                                record.index,
                                DiagnosticSeverity::Error,
                                StructuralError::UnpairedMerge,
                            )
                            .at_column(i),
                        );
                        next.push(keep(i));
                    } else {
                        let sources: Vec<TrackId> = columns[i..j].iter().map(|c| c.track).collect();
                        let merged = tracks.merge(&sources).unwrap_or(columns[i].track);
                        next.push(ColumnBinding { track: merged, from: Some(i) });
                    }
                    i = j;
                }
                Some(Manipulator::Exchange) => {
                    if i + 1 < n && manips[i + 1] == Some(Manipulator::Exchange) {
                        next.push(keep(i + 1));
                        next.push(keep(i));
                        i += 2;
                    } else {
                        diagnostics.add(
                            Diagnostic::new(
                                record.index,
                                DiagnosticSeverity::Error,
                                StructuralError::UnpairedExchange,
                            )
                            .at_column(i),
                        );
                        next.push(keep(i));
                        i += 1;
                    }
                }
                Some(Manipulator::Add) => {
                    next.push(keep(i));
                    let added = tracks.create_primary(None);
                    next.push(ColumnBinding { track: added, from: None });
                    i += 1;
                }
                Some(Manipulator::Terminate) => {
                    i += 1;
                }
                None => {
                    next.push(keep(i));
                    i += 1;
                }
            }
        }
        next
    }
}

/// Bindings for the line after a non-manipulating line
fn continuation(columns: &[ColumnBinding]) -> Vec<ColumnBinding> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| ColumnBinding {
            track: c.track,
            from: Some(i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::classify;

    fn track_lines(lines: &[&str]) -> (Vec<Record>, TrackTable, PathHistory, Diagnostics) {
        let mut tracker = SpinePathTracker::new();
        let mut tracks = TrackTable::new();
        let mut history = PathHistory::new();
        let mut diagnostics = Diagnostics::new();
        let mut records = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let mut record = classify(line, i);
            tracker.advance(&mut record, &mut tracks, &mut history, &mut diagnostics);
            records.push(record);
        }
        tracker.finish(lines.len().saturating_sub(1), &mut diagnostics);
        (records, tracks, history, diagnostics)
    }

    #[test]
    fn test_split_then_merge_restores_identity() {
        let (_, _, history, diags) = track_lines(&[
            "**kern",
            "4c",
            "*^",
            "4c\t4e",
            "*v\t*v",
            "4d",
            "*-",
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
        let before = history.get(1).unwrap().track(0);
        assert_eq!(history.get(3).unwrap().columns.len(), 2);
        assert_eq!(history.get(5).unwrap().track(0), before);
    }

    #[test]
    fn test_exchange_swaps_columns() {
        let (_, tracks, history, diags) = track_lines(&[
            "**kern\t**text",
            "*x\t*x",
            "la\t4c",
            "*-\t*-",
        ]);
        assert!(diags.is_empty());
        let swapped = history.get(2).unwrap();
        assert_eq!(tracks.exinterp_of(swapped.track(0).unwrap()), Some("**text"));
        assert_eq!(tracks.exinterp_of(swapped.track(1).unwrap()), Some("**kern"));
        assert_eq!(swapped.columns[0].from, Some(1));
    }

    #[test]
    fn test_add_spine_gets_exclusive_interpretation() {
        let (_, tracks, history, diags) = track_lines(&[
            "**kern",
            "*+",
            "*\t**dynam",
            "4c\tp",
            "*-\t*-",
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
        let binding = history.get(3).unwrap();
        assert_eq!(tracks.primary_of(binding.track(1).unwrap()), Some(2));
        assert_eq!(tracks.exinterp_of(binding.track(1).unwrap()), Some("**dynam"));
    }

    #[test]
    fn test_field_count_mismatch_is_recovered() {
        let (records, _, history, diags) = track_lines(&["**kern", "4c\t4d", "4e", "*-"]);
        assert_eq!(diags.len(), 2);
        assert!(matches!(
            diags.iter().next().unwrap().error,
            StructuralError::FieldCountMismatch { expected: 1, found: 2 }
        ));
        assert!(records[1].token(1).unwrap().track().is_some());
        assert_eq!(history.get(3).unwrap().columns.len(), 1);
    }

    #[test]
    fn test_unpaired_merge_and_unterminated() {
        let (_, _, _, diags) = track_lines(&["**kern\t**kern", "*v\t*", "4c\t4d"]);
        let errors: Vec<_> = diags.iter().map(|d| d.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                StructuralError::UnpairedMerge,
                StructuralError::UnterminatedSpines { count: 2 },
            ]
        );
    }

    #[test]
    fn test_merge_joins_separate_primary_tracks() {
        let (_, tracks, history, diags) =
            track_lines(&["**kern\t**kern", "4c\t4e", "*v\t*v", "4d", "*-"]);
        assert!(diags.is_empty(), "{:?}", diags);
        let merged = history.get(3).unwrap();
        assert_eq!(merged.columns.len(), 1);
        // the lower ordinal wins
        assert_eq!(tracks.primary_of(merged.track(0).unwrap()), Some(1));
    }
}
