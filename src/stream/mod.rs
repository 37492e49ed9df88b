//! Stream input
//!
//! `source` abstracts where lines come from; `reader` cuts them into
//! segments and hands each one to `HumdrumFile`.

pub mod reader;
pub mod source;

pub use reader::{HumdrumStream, ReaderState};
pub use source::{open_file, LineSource, MemorySource, ReaderSource};
