//! Segment stream reader
//!
//! Slices a line stream into segments, one logical Humdrum file each. A
//! segment starts at its `**` line and runs until the next `**` line, the
//! next `!!!!SEGMENT` marker, or the end of input. Lines that start the
//! following segment are carried over to the next read.
//!
//! Universal comments (`!!!!key: value`) are demoted to `!!` and prepended to
//! every following segment until a new block replaces them.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::PathBuf;

use crate::config::HumdrumOptions;
use crate::error::Result;
use crate::file::HumdrumFile;
use crate::models::RecordKind;
use crate::parse::{line_kind, parse_segment_marker};

use super::source::{open_file, LineSource, MemorySource, ReaderSource};

/// Reader state between lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Before the current segment's `**` line
    AwaitingContent,
    /// After the `**` line
    InSegment,
    /// A line starting the next segment was carried over; emit the current one
    SegmentBoundaryPending,
    /// No more sources
    Eof,
}

/// Lines gathered for one segment
#[derive(Debug, Default)]
struct PendingSegment {
    marker: Option<String>,
    lines: Vec<String>,
    found_exinterp: bool,
    /// Name of the source the `**` line came from
    source_name: Option<String>,
    /// A universal block has started in this lookahead
    fresh_universals: bool,
}

pub struct HumdrumStream {
    source: Option<Box<dyn LineSource>>,
    queue: VecDeque<PathBuf>,
    carry: Option<String>,
    universals: Vec<String>,
    deferred_universals: Vec<String>,
    state: ReaderState,
    options: HumdrumOptions,
}

impl HumdrumStream {
    /// Read from any line source
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Self::with_options(source, HumdrumOptions::default())
    }

    pub fn with_options(source: Box<dyn LineSource>, options: HumdrumOptions) -> Self {
        Self {
            source: Some(source),
            queue: VecDeque::new(),
            carry: None,
            universals: Vec::new(),
            deferred_universals: Vec::new(),
            state: ReaderState::AwaitingContent,
            options,
        }
    }

    /// Read segments out of in-memory text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::new(Box::new(MemorySource::new(text)))
    }

    /// Read segments from a buffered reader such as stdin
    pub fn from_reader<R: BufRead + 'static>(reader: R) -> Self {
        Self::new(Box::new(ReaderSource::new(reader)))
    }

    /// Read each file in turn
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            source: None,
            queue: paths.into_iter().map(Into::into).collect(),
            carry: None,
            universals: Vec::new(),
            deferred_universals: Vec::new(),
            state: ReaderState::AwaitingContent,
            options: HumdrumOptions::default(),
        }
    }

    /// Replace the options used for files read from here on
    pub fn set_options(&mut self, options: HumdrumOptions) {
        self.options = options;
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Universal comments that will be prepended to the next segment
    pub fn universals(&self) -> &[String] {
        &self.universals
    }

    /// Sources still waiting to be read
    pub fn queued(&self) -> impl Iterator<Item = &PathBuf> {
        self.queue.iter()
    }

    /// Next segment holding at least one data record
    pub fn read_segment(&mut self) -> Result<Option<HumdrumFile>> {
        loop {
            let Some(segment) = self.collect_segment()? else {
                return Ok(None);
            };
            let lines = segment
                .marker
                .iter()
                .chain(self.universals.iter())
                .chain(segment.lines.iter());
            let mut file = HumdrumFile::from_lines(lines, self.options.rhythm.clone());
            file.set_filename(segment.source_name.clone());

            if file.data_count() == 0 {
                log::warn!(
                    "skipping segment without data records{}",
                    file.segment().map(|s| format!(" ({})", s.name)).unwrap_or_default()
                );
                continue;
            }
            return Ok(Some(file));
        }
    }

    /// Refill `file` with the next segment; `false` (and an empty file) at end
    pub fn read(&mut self, file: &mut HumdrumFile) -> Result<bool> {
        match self.read_segment()? {
            Some(next) => {
                *file = next;
                Ok(true)
            }
            None => {
                file.clear();
                Ok(false)
            }
        }
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.carry.take() {
            return Ok(Some(line));
        }
        match self.source.as_mut() {
            Some(source) => Ok(source.next_line()?),
            None => Ok(None),
        }
    }

    /// Switch to the next queued file; `false` when the queue is empty
    fn open_next_source(&mut self) -> Result<bool> {
        match self.queue.pop_front() {
            Some(path) => {
                self.source = Some(open_file(&path)?);
                Ok(true)
            }
            None => {
                self.source = None;
                Ok(false)
            }
        }
    }

    fn collect_segment(&mut self) -> Result<Option<PendingSegment>> {
        let mut segment = PendingSegment::default();
        if !self.deferred_universals.is_empty() {
            self.universals = std::mem::take(&mut self.deferred_universals);
            segment.fresh_universals = true;
        }
        if self.state == ReaderState::InSegment {
            self.state = ReaderState::AwaitingContent;
        }

        loop {
            match self.state {
                ReaderState::Eof => {
                    return Ok(segment.found_exinterp.then_some(segment));
                }
                ReaderState::SegmentBoundaryPending => {
                    log::debug!("segment boundary");
                    self.state = ReaderState::AwaitingContent;
                    return Ok(Some(segment));
                }
                ReaderState::AwaitingContent | ReaderState::InSegment => {
                    match self.next_line()? {
                        Some(line) => self.accept(line, &mut segment),
                        None => self.end_of_source(&mut segment)?,
                    }
                }
            }
        }
    }

    fn end_of_source(&mut self, segment: &mut PendingSegment) -> Result<()> {
        if !self.open_next_source()? {
            log::debug!("end of stream");
            self.state = ReaderState::Eof;
        } else if segment.found_exinterp {
            // A new file always starts a new segment
            self.state = ReaderState::SegmentBoundaryPending;
        } else {
            segment.lines.clear();
        }
        Ok(())
    }

    fn accept(&mut self, line: String, segment: &mut PendingSegment) {
        if parse_segment_marker(&line).is_some() {
            if segment.found_exinterp {
                self.carry = Some(line);
                self.state = ReaderState::SegmentBoundaryPending;
            } else {
                segment.marker = Some(line);
            }
            return;
        }

        let kind = line_kind(&line);
        match kind {
            RecordKind::Universal => {
                let demoted = format!("!!{}", &line[4..]);
                if segment.found_exinterp {
                    // Applies from the next segment on
                    self.deferred_universals.push(demoted);
                } else {
                    if !segment.fresh_universals {
                        self.universals.clear();
                        segment.fresh_universals = true;
                    }
                    self.universals.push(demoted);
                }
            }
            RecordKind::ExclusiveInterpretation if line.starts_with("**") => {
                if segment.found_exinterp {
                    self.carry = Some(line);
                    self.state = ReaderState::SegmentBoundaryPending;
                } else {
                    segment.found_exinterp = true;
                    segment.source_name = self.source.as_ref().and_then(|s| s.name()).map(str::to_string);
                    segment.lines.push(line);
                    self.state = ReaderState::InSegment;
                }
            }
            RecordKind::Data
                if self.state == ReaderState::AwaitingContent && self.options.reader.resolve_filenames =>
            {
                let path = line.trim();
                log::debug!("queueing {}", path);
                self.queue.push_back(PathBuf::from(path));
            }
            _ => segment.lines.push(line),
        }
    }
}

impl Iterator for HumdrumStream {
    type Item = Result<HumdrumFile>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_segment() {
            Ok(file) => file.map(Ok),
            Err(e) => {
                self.state = ReaderState::Eof;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_segment() {
        let mut stream = HumdrumStream::from_str("**kern\n4c\n*-\n");
        let file = stream.read_segment().unwrap().unwrap();
        assert_eq!(file.line_count(), 3);
        assert!(stream.read_segment().unwrap().is_none());
        assert_eq!(stream.state(), ReaderState::Eof);
    }

    #[test]
    fn test_trailing_comments_stay_with_segment() {
        let mut stream = HumdrumStream::from_str("**kern\n4c\n*-\n!!!RDF: x\n**kern\n4d\n*-\n");
        let first = stream.read_segment().unwrap().unwrap();
        assert_eq!(first.line_count(), 4);
        assert_eq!(first.reference("RDF"), Some("x"));
        let second = stream.read_segment().unwrap().unwrap();
        assert_eq!(second.token(1, 0), Some("4d"));
    }

    #[test]
    fn test_empty_segment_is_skipped() {
        let mut stream = HumdrumStream::from_str("**kern\n*-\n**kern\n4e\n*-\n");
        let file = stream.read_segment().unwrap().unwrap();
        assert_eq!(file.token(1, 0), Some("4e"));
        assert!(stream.read_segment().unwrap().is_none());
    }

    #[test]
    fn test_marker_names_following_segment() {
        let text = "!!!!SEGMENT: one.krn\n**kern\n4c\n*-\n!!!!SEGMENT 2: two.krn\n**kern\n4d\n*-\n";
        let names: Vec<String> = HumdrumStream::from_str(text)
            .map(|f| f.unwrap().segment().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["one.krn", "two.krn"]);
    }

    #[test]
    fn test_filename_lines_disabled() {
        let mut stream = HumdrumStream::from_str("notes.krn\n**kern\n4c\n*-\n");
        stream.set_options(HumdrumOptions {
            reader: crate::config::ReaderOptions {
                resolve_filenames: false,
            },
            ..HumdrumOptions::default()
        });
        let file = stream.read_segment().unwrap().unwrap();
        // kept as a stray data line
        assert_eq!(file.token(0, 0), Some("notes.krn"));
        assert_eq!(stream.queued().count(), 0);
    }
}
