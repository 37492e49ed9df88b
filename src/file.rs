//! HumdrumFile
//!
//! One parsed segment: its records, the track table and path history built
//! by the spine tracker, recoverable diagnostics, and the result of the
//! rhythm pass. This is the query and mutation surface tools work against.
//!
//! Rhythm queries return `HumdrumError::Rhythm` when the rhythm pass failed;
//! everything else (record access, tracks, null resolution, `Display`)
//! stays usable on such a file.

use std::fmt;
use std::ops::Index;

use crate::config::RhythmOptions;
use crate::diagnostics::Diagnostics;
use crate::error::{HumdrumError, Result, RhythmError};
use crate::models::kern;
use crate::models::{FieldPos, Rational, Record, RecordKind, TrackId};
use crate::parse::{classify, parse_segment_marker, SegmentMarker};
use crate::rhythm::{analyze, RhythmAnalysis};
use crate::structure::{resolve_backward, resolve_forward, PathHistory, SpinePathTracker, TrackTable};

#[derive(Debug, Clone)]
pub struct HumdrumFile {
    filename: Option<String>,
    segment: Option<SegmentMarker>,
    records: Vec<Record>,
    tracks: TrackTable,
    paths: PathHistory,
    diagnostics: Diagnostics,
    rhythm: std::result::Result<RhythmAnalysis, RhythmError>,
    options: RhythmOptions,
}

impl Default for HumdrumFile {
    fn default() -> Self {
        Self::new()
    }
}

impl HumdrumFile {
    /// Empty file with default rhythm options
    pub fn new() -> Self {
        Self::with_options(RhythmOptions::default())
    }

    pub fn with_options(options: RhythmOptions) -> Self {
        Self {
            filename: None,
            segment: None,
            records: Vec::new(),
            tracks: TrackTable::new(),
            paths: PathHistory::new(),
            diagnostics: Diagnostics::new(),
            rhythm: Ok(RhythmAnalysis::default()),
            options,
        }
    }

    /// Parse text holding a single segment
    pub fn parse(text: &str) -> Self {
        Self::parse_with(text, RhythmOptions::default())
    }

    pub fn parse_with(text: &str, options: RhythmOptions) -> Self {
        Self::from_lines(text.lines(), options)
    }

    /// Build a file from already-split lines
    pub fn from_lines<I, S>(lines: I, options: RhythmOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut file = Self::with_options(options);
        file.load(lines);
        file
    }

    fn load<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tracker = SpinePathTracker::new();
        for (index, line) in lines.into_iter().enumerate() {
            let mut record = classify(line.as_ref(), index);
            if record.kind() == RecordKind::Universal && self.segment.is_none() {
                self.segment = parse_segment_marker(record.text());
            }
            tracker.advance(&mut record, &mut self.tracks, &mut self.paths, &mut self.diagnostics);
            self.records.push(record);
        }
        if let Some(last) = self.records.len().checked_sub(1) {
            tracker.finish(last, &mut self.diagnostics);
        }
        self.reanalyze_rhythm();
    }

    /// Drop all records and derived state, keeping the options
    pub fn clear(&mut self) {
        let options = std::mem::take(&mut self.options);
        *self = Self::with_options(options);
    }

    /// Rerun the rhythm pass, e.g. after `set_token` changed durations
    pub fn reanalyze_rhythm(&mut self) {
        self.rhythm = analyze(&self.records, &self.paths, &self.tracks, &self.options);
        if let Err(e) = &self.rhythm {
            log::warn!("{}: {}", self.filename.as_deref().unwrap_or("<input>"), e);
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn set_filename(&mut self, name: Option<String>) {
        self.filename = name;
    }

    /// Name and level from a `!!!!SEGMENT` marker, if the segment had one
    pub fn segment(&self) -> Option<&SegmentMarker> {
        self.segment.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn options(&self) -> &RhythmOptions {
        &self.options
    }

    // ---- records ----

    pub fn line_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, line: usize) -> Option<&Record> {
        self.records.get(line)
    }

    pub fn field_count(&self, line: usize) -> Option<usize> {
        self.record(line).map(|r| r.field_count())
    }

    pub fn token(&self, line: usize, col: usize) -> Option<&str> {
        self.record(line)?.token(col).map(|t| t.text())
    }

    /// Space-separated parts of one field
    pub fn subtokens(&self, line: usize, col: usize) -> Option<Vec<&str>> {
        self.record(line)?.token(col).map(|t| t.subtokens().collect())
    }

    /// Number of data records
    pub fn data_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_data()).count()
    }

    /// Value of the first `!!!key: value` record
    pub fn reference(&self, key: &str) -> Option<&str> {
        self.records
            .iter()
            .filter_map(|r| r.reference())
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Replace one field's text.
    ///
    /// Spine paths and tracks are not touched, so the caller must keep
    /// manipulators intact. Call `reanalyze_rhythm` if durations changed.
    pub fn set_token(&mut self, line: usize, col: usize, text: &str) -> Result<()> {
        let replaced = self
            .records
            .get_mut(line)
            .map_or(false, |r| r.replace_token(col, text));
        if replaced {
            Ok(())
        } else {
            Err(HumdrumError::OutOfRange { line, column: col })
        }
    }

    // ---- tracks ----

    pub fn tracks(&self) -> &TrackTable {
        &self.tracks
    }

    pub fn paths(&self) -> &PathHistory {
        &self.paths
    }

    pub fn track(&self, line: usize, col: usize) -> Option<TrackId> {
        self.record(line)?.token(col)?.track()
    }

    /// 1-based top-level spine number of a field
    pub fn primary_track(&self, line: usize, col: usize) -> Option<usize> {
        self.track(line, col).and_then(|t| self.tracks.primary_of(t))
    }

    /// Lineage string of a field's track, like `(1)a`
    pub fn spine_info(&self, line: usize, col: usize) -> Option<&str> {
        let track = self.track(line, col)?;
        self.tracks.get(track).map(|t| t.info.as_str())
    }

    pub fn exclusive_interpretation(&self, line: usize, col: usize) -> Option<&str> {
        self.track(line, col).and_then(|t| self.tracks.exinterp_of(t))
    }

    /// Primary spines of one type, left to right
    pub fn tracks_by_exinterp(&self, name: &str) -> Vec<usize> {
        self.tracks.primaries_by_exinterp(name)
    }

    /// Number of top-level spines
    pub fn max_tracks(&self) -> usize {
        self.tracks.primary_count()
    }

    // ---- null resolution ----

    /// Data token a field refers to; itself unless it is a null
    pub fn last_datum(&self, line: usize, col: usize) -> Option<FieldPos> {
        resolve_backward(&self.records, &self.paths, FieldPos::new(line, col))
    }

    /// Next real data token after a field in the same lineage
    pub fn next_datum(&self, line: usize, col: usize) -> Option<FieldPos> {
        resolve_forward(&self.records, &self.paths, FieldPos::new(line, col))
    }

    // ---- rhythm ----

    /// Outcome of the rhythm pass
    pub fn rhythm(&self) -> std::result::Result<&RhythmAnalysis, &RhythmError> {
        self.rhythm.as_ref()
    }

    fn analysis(&self) -> Result<&RhythmAnalysis> {
        self.rhythm.as_ref().map_err(|e| HumdrumError::Rhythm(e.clone()))
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line < self.records.len() {
            Ok(())
        } else {
            Err(HumdrumError::OutOfRange { line, column: 0 })
        }
    }

    /// Start of a line in quarter notes from the beginning
    pub fn abs_beat(&self, line: usize) -> Result<Rational> {
        self.check_line(line)?;
        let analysis = self.analysis()?;
        analysis
            .abs_beat(line)
            .ok_or(HumdrumError::OutOfRange { line, column: 0 })
    }

    /// 1-based position in the measure, in beats
    pub fn beat(&self, line: usize) -> Result<Rational> {
        self.check_line(line)?;
        self.analysis()?
            .beat(line)
            .ok_or(HumdrumError::OutOfRange { line, column: 0 })
    }

    pub fn beat_duration(&self, line: usize) -> Result<Rational> {
        self.check_line(line)?;
        self.analysis()?
            .beat_duration(line)
            .ok_or(HumdrumError::OutOfRange { line, column: 0 })
    }

    /// Time from this line to the next data line
    pub fn duration(&self, line: usize) -> Result<Rational> {
        self.check_line(line)?;
        self.analysis()?
            .duration(line)
            .ok_or(HumdrumError::OutOfRange { line, column: 0 })
    }

    /// Written duration of a field; `None` for nulls and non-rhythmic spines
    pub fn token_duration(&self, line: usize, col: usize) -> Result<Option<Rational>> {
        self.record(line)
            .and_then(|r| r.token(col))
            .ok_or(HumdrumError::OutOfRange { line, column: col })?;
        Ok(self.analysis()?.token_duration(line, col))
    }

    /// Sounding duration of the first note of a field, through its tie chain
    pub fn tied_duration(&self, line: usize, col: usize) -> Result<Rational> {
        self.tied_duration_at(line, col, 0)
    }

    /// Sounding duration of one sub-token of a field.
    ///
    /// Must be queried at a chain start or an untied note; a `_` or `]`
    /// note is `MidTieChain`. Nulls and fields of non-rhythmic spines have
    /// no duration of their own and are `NotData`.
    pub fn tied_duration_at(&self, line: usize, col: usize, sub: usize) -> Result<Rational> {
        let record = self
            .record(line)
            .ok_or(HumdrumError::OutOfRange { line, column: col })?;
        let token = record
            .token(col)
            .ok_or(HumdrumError::OutOfRange { line, column: col })?;
        if !record.is_data() || token.is_null() {
            return Err(HumdrumError::NotData { line, column: col });
        }
        let analysis = self.analysis()?;
        let Some(duration) = analysis.token_duration(line, col) else {
            return Err(HumdrumError::NotData { line, column: col });
        };
        let key = (line, col, sub);
        if analysis.is_tie_member(key) {
            return Err(HumdrumError::MidTieChain { line, column: col });
        }
        if let Some(total) = analysis.tie_total(key) {
            return Ok(total);
        }
        Ok(token
            .subtokens()
            .nth(sub)
            .and_then(kern::recip_duration)
            .unwrap_or(duration))
    }

    /// Length of the incomplete first measure; zero when there is none
    pub fn pickup_duration(&self) -> Result<Rational> {
        Ok(self.analysis()?.pickup_duration())
    }

    pub fn total_duration(&self) -> Result<Rational> {
        Ok(self.analysis()?.total_duration())
    }

    /// Ticks per quarter note that make every duration integral
    pub fn minimum_time_base(&self) -> Result<i64> {
        Ok(self.analysis()?.minimum_time_base())
    }

    /// Measure a line falls in; lines before the first numbered barline get
    /// that number minus one
    pub fn measure_number(&self, line: usize) -> Result<Option<i32>> {
        self.check_line(line)?;
        Ok(self.analysis()?.measure_number(line))
    }
}

impl Index<usize> for HumdrumFile {
    type Output = Record;

    fn index(&self, line: usize) -> &Record {
        &self.records[line]
    }
}

impl fmt::Display for HumdrumFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}", record)?;
        }
        Ok(())
    }
}
