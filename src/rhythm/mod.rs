//! Rhythm analysis
//!
//! - `meter`: `*M` and `*beat:` interpretations
//! - `ties`: tie chain accumulation
//! - `analyzer`: the forward pass producing durations and positions

pub mod analyzer;
pub mod meter;
pub mod ties;

pub use analyzer::{analyze, RhythmAnalysis};
pub use meter::{Meter, MeterTracker};
pub use ties::{NoteKey, TieTracker};
