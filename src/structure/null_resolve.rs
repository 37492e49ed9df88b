//! Null-token resolver
//!
//! A `.` on a data line means "the event above is still sounding". These
//! functions find the real token a null refers to, or the next real token in
//! the same lineage, by following the per-line column links from the spine
//! tracker. Line indices strictly decrease (or increase) at every step, so
//! both walks terminate.

use super::spine_path::PathHistory;
use crate::models::{FieldPos, Record};
use crate::parse::Manipulator;

fn is_datum(records: &[Record], pos: FieldPos) -> bool {
    records
        .get(pos.line)
        .filter(|r| r.is_data())
        .and_then(|r| r.token(pos.col))
        .map_or(false, |t| !t.is_null())
}

/// First column of the `*v` run containing `pos`, or `pos.col` itself
fn merge_run_start(records: &[Record], pos: FieldPos) -> usize {
    let is_merge = |col: usize| {
        records
            .get(pos.line)
            .and_then(|r| r.token(col))
            .and_then(|t| t.manipulator())
            == Some(Manipulator::Merge)
    };
    if !is_merge(pos.col) {
        return pos.col;
    }
    let mut col = pos.col;
    while col > 0 && is_merge(col - 1) {
        col -= 1;
    }
    col
}

/// Resolve a coordinate to the data token that produced it.
///
/// A non-null data token resolves to itself. `None` means the lineage has no
/// earlier real token, which only happens with malformed input.
pub fn resolve_backward(records: &[Record], history: &PathHistory, pos: FieldPos) -> Option<FieldPos> {
    records.get(pos.line)?.token(pos.col)?;
    if is_datum(records, pos) {
        return Some(pos);
    }

    let mut current = pos;
    loop {
        let binding = history.get(current.line)?;
        let from = binding.columns.get(current.col)?.from?;
        let prev_line = binding.prev_line?;
        current = FieldPos::new(prev_line, from);
        if is_datum(records, current) {
            return Some(current);
        }
    }
}

/// Find the next real data token after `pos` in the same lineage.
///
/// Through a split the walk continues in the leftmost child; through a
/// merge every source continues in the merged column.
pub fn resolve_forward(records: &[Record], history: &PathHistory, pos: FieldPos) -> Option<FieldPos> {
    records.get(pos.line)?.token(pos.col)?;

    let mut current = pos;
    loop {
        let next_line = history.get(current.line)?.next_line?;
        let next = history.get(next_line)?;
        // Merged columns link back to the leftmost `*v` of their run
        let source = merge_run_start(records, current);
        let col = next.columns.iter().position(|c| c.from == Some(source))?;
        current = FieldPos::new(next_line, col);
        if is_datum(records, current) {
            return Some(current);
        }
    }
}
