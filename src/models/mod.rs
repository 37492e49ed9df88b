//! Data model for Humdrum files
//!
//! Records (lines), tokens (fields), positions, barlines and the kern token
//! syntax that the rhythm analyzer reads durations, ties and pitches from.

pub mod barlines;
pub mod kern;
pub mod position;
pub mod record;

pub use barlines::{Barline, BarlineStyle};
pub use kern::{AccidentalState, DiatonicLetter, Pitch, TieMark};
pub use position::{FieldPos, TrackId};
pub use record::{Record, RecordKind, Token};

/// Exact rational number used for all durations and positions, in quarter notes
pub type Rational = num_rational::Rational64;

/// Shorthand for an integral rational
pub fn rational(n: i64) -> Rational {
    Rational::from_integer(n)
}

/// Floating approximation for display or export
pub fn to_f64(value: Rational) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}
