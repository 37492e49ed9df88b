//! Line sources
//!
//! The segment reader pulls lines one at a time from a `LineSource`. Any
//! buffered reader works (file, stdin, socket); in-memory text is split up
//! front.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Something that yields lines without their terminators
pub trait LineSource {
    /// Next line, or `None` at end of input
    fn next_line(&mut self) -> std::io::Result<Option<String>>;

    /// Name used for the files read from this source
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Lines from any `BufRead`
pub struct ReaderSource<R: BufRead> {
    reader: R,
    name: Option<String>,
    buf: String,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            name: None,
            buf: String::new(),
        }
    }

    pub fn with_name(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: Some(name.into()),
            buf: String::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        let line = self.buf.trim_end_matches(['\n', '\r']);
        Ok(Some(line.to_string()))
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Lines of an owned string
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lines: VecDeque<String>,
}

impl MemorySource {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(|l| l.to_string()).collect(),
        }
    }
}

impl LineSource for MemorySource {
    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// Open a file as a line source named after its path
pub fn open_file(path: &Path) -> std::io::Result<Box<dyn LineSource>> {
    let file = File::open(path)?;
    log::debug!("opened {}", path.display());
    Ok(Box::new(ReaderSource::with_name(
        BufReader::new(file),
        path.display().to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_source_strips_terminators() {
        let mut source = ReaderSource::new(Cursor::new("**kern\r\n4c\n*-"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("**kern"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("4c"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("*-"));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new("a\n\nb\n");
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(source.next_line().unwrap(), None);
        assert!(source.name().is_none());
    }
}
