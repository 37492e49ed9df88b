//! Parsing module
//!
//! Line-level parsing with no cross-line state: record classification and
//! token recognition. Spine tracking lives in `structure`.

pub mod classify;
pub mod tokens;

pub use classify::{classify, line_kind, parse_segment_marker, SegmentMarker};
pub use tokens::Manipulator;
