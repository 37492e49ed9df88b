//! Humdrum parsing core
//!
//! Reads Humdrum text (tab-separated spines of symbolic music) into typed
//! records, tracks spine identity through splits, merges and exchanges,
//! resolves null tokens along a spine's lineage, and computes exact
//! rational rhythm positions. Multi-file streams are cut into segments by
//! `HumdrumStream`.
//!
//! ```no_run
//! use humdrum_core::HumdrumFile;
//!
//! let file = HumdrumFile::parse("**kern\n*M4/4\n4c\n=1\n1d\n*-\n");
//! assert_eq!(file.pickup_duration().unwrap(), humdrum_core::rational(3));
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod file;
pub mod models;
pub mod parse;
pub mod rhythm;
pub mod stream;
pub mod structure;

// Re-export commonly used types
pub use config::{HumdrumOptions, ReaderOptions, RhythmOptions};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use error::{HumdrumError, Result, RhythmError, StructuralError};
pub use file::HumdrumFile;
pub use models::{rational, to_f64, FieldPos, Rational, Record, RecordKind, Token, TrackId};
pub use parse::{classify, SegmentMarker};
pub use stream::HumdrumStream;
