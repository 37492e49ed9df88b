//! Record/Token classifier
//!
//! Turns one raw line into a typed `Record`. Pure function of the text:
//! the kind comes from fixed leading-character rules, fields come from
//! splitting on tabs. Unknown leading characters fall through to `Data`.

use crate::models::{Barline, Record, RecordKind, Token};

/// Marker naming a segment inside a multi-file stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMarker {
    pub level: i32,
    pub name: String,
}

/// Decide the kind of a line without building tokens
pub fn line_kind(text: &str) -> RecordKind {
    if text.trim().is_empty() {
        RecordKind::Blank
    } else if text.starts_with("!!!!") {
        RecordKind::Universal
    } else if text.starts_with("!!!") {
        RecordKind::Bibliographic
    } else if text.starts_with("!!") {
        RecordKind::GlobalComment
    } else if text.starts_with('!') {
        RecordKind::LocalComment
    } else if text.starts_with("**") {
        RecordKind::ExclusiveInterpretation
    } else if text.starts_with('*') {
        // `*+` is followed by a line mixing `*` and `**name` fields
        if text.split('\t').any(|field| field.starts_with("**")) {
            RecordKind::ExclusiveInterpretation
        } else {
            RecordKind::Interpretation
        }
    } else if text.starts_with('=') {
        RecordKind::Barline
    } else {
        RecordKind::Data
    }
}

/// Classify one line into a record at position `index`
pub fn classify(raw: &str, index: usize) -> Record {
    let text = raw.trim_end_matches(['\n', '\r']);
    let kind = line_kind(text);

    let tokens: Vec<Token> = if kind.has_fields() {
        text.split('\t').map(Token::new).collect()
    } else {
        Vec::new()
    };

    let barline = match kind {
        RecordKind::Barline => tokens.first().and_then(|t| Barline::parse(t.text())),
        _ => None,
    };

    Record::new(index, text.to_string(), kind, tokens, barline)
}

/// Parse `!!!!SEGMENT[level]: name`
pub fn parse_segment_marker(text: &str) -> Option<SegmentMarker> {
    let rest = text.strip_prefix("!!!!SEGMENT")?;
    let colon = rest.find(':')?;
    let level_text = rest[..colon].trim();
    let level = if level_text.is_empty() {
        0
    } else {
        level_text.parse::<i32>().ok()?
    };
    Some(SegmentMarker {
        level,
        name: rest[colon + 1..].trim().to_string(),
    })
}
