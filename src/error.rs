//! Error types for Humdrum parsing and analysis
//!
//! Three tiers, matching how far a problem propagates:
//! - `StructuralError`: spine-path anomalies. Recoverable; recorded as
//!   diagnostics while parsing continues with best-effort state.
//! - `RhythmError`: violations that invalidate every time-dependent query.
//!   Fatal for the rhythm pass only.
//! - `HumdrumError`: what fallible public operations return.

use crate::models::Rational;
use thiserror::Error;

/// Crate-level error type
#[derive(Debug, Error)]
pub enum HumdrumError {
    /// Reading from the underlying byte source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A rhythm query was made on a file whose rhythm pass failed
    #[error("rhythm analysis failed: {0}")]
    Rhythm(#[from] RhythmError),

    /// Line or column does not exist
    #[error("no field at line {line}, column {column}")]
    OutOfRange { line: usize, column: usize },

    /// The coordinate is not a data token carrying rhythm
    #[error("line {line}, column {column} is not a rhythmic data token")]
    NotData { line: usize, column: usize },

    /// Tied durations may only be queried at the start of a chain
    #[error("line {line}, column {column} is in the middle of a tie chain")]
    MidTieChain { line: usize, column: usize },

    /// Options could not be deserialized
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Options deserialized but hold unusable values
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

/// Fatal rhythm-pass failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RhythmError {
    /// Cumulative duration at a barline does not land on the tick grid
    #[error("position {position} at barline on line {line} is not a multiple of 1/{time_base} quarter note")]
    NonIntegralBarline {
        line: usize,
        position: Rational,
        time_base: i64,
    },

    /// Durations have no common tick resolution representable in 64 bits
    #[error("time base overflows at line {line}, column {column} (denominator {denominator})")]
    TimeBaseOverflow {
        line: usize,
        column: usize,
        denominator: i64,
    },

    /// A tie chain grew past the configured link bound
    #[error("tie chain starting at line {line}, column {column} exceeds {limit} links")]
    TieChainOverflow {
        line: usize,
        column: usize,
        limit: usize,
    },
}

/// Recoverable spine-structure anomalies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Field count differs from the number of live spines
    #[error("expected {expected} fields, found {found}")]
    FieldCountMismatch { expected: usize, found: usize },

    /// A `*v` with no adjacent partner in the same track
    #[error("merge manipulator without a partner")]
    UnpairedMerge,

    /// A `*x` with no adjacent partner
    #[error("exchange manipulator without a partner")]
    UnpairedExchange,

    /// A `**` token on a spine that already has an exclusive interpretation
    #[error("exclusive interpretation {name} on an already active spine")]
    ActiveExclusiveInterpretation { name: String },

    /// Spined content after every spine was terminated
    #[error("content after all spines terminated")]
    ContentAfterTermination,

    /// End of input with spines still active
    #[error("{count} spine(s) not terminated at end of file")]
    UnterminatedSpines { count: usize },
}

pub type Result<T> = std::result::Result<T, HumdrumError>;
