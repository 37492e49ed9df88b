//! Records (lines) and tokens (tab-delimited fields)

use serde::{Deserialize, Serialize};

use super::barlines::Barline;
use super::position::TrackId;
use crate::parse::tokens::{self, Manipulator};

/// Line classification, decided by fixed leading-character rules
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Empty or whitespace-only line
    Blank,
    /// `!!` comment spanning all spines
    GlobalComment,
    /// `!!!key: value` reference record
    Bibliographic,
    /// `!!!!` line: universal comment or segment marker
    Universal,
    /// `!` comment, one field per spine
    LocalComment,
    /// Interpretation line carrying at least one `**name` token
    ExclusiveInterpretation,
    /// `*` line, including spine manipulators
    Interpretation,
    /// `=` measure line
    Barline,
    /// Anything else
    Data,
}

impl RecordKind {
    /// Whether lines of this kind have one field per active spine
    pub fn has_fields(self) -> bool {
        matches!(
            self,
            RecordKind::LocalComment
                | RecordKind::ExclusiveInterpretation
                | RecordKind::Interpretation
                | RecordKind::Barline
                | RecordKind::Data
        )
    }

    pub fn is_interpretation(self) -> bool {
        matches!(self, RecordKind::Interpretation | RecordKind::ExclusiveInterpretation)
    }

    /// Comments that span the whole line rather than one spine
    pub fn is_global(self) -> bool {
        matches!(
            self,
            RecordKind::GlobalComment | RecordKind::Bibliographic | RecordKind::Universal
        )
    }
}

/// One field of a spined record
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Token {
    text: String,
    track: Option<TrackId>,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            track: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Track this token belongs to, once the spine tracker has stamped it
    pub fn track(&self) -> Option<TrackId> {
        self.track
    }

    pub(crate) fn set_track(&mut self, track: TrackId) {
        self.track = Some(track);
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The null placeholder `.`
    pub fn is_null(&self) -> bool {
        tokens::is_null(&self.text)
    }

    /// Space-delimited sub-tokens (chord notes)
    pub fn subtokens(&self) -> impl Iterator<Item = &str> {
        tokens::subtokens(&self.text)
    }

    pub fn subtoken_count(&self) -> usize {
        self.subtokens().count()
    }

    /// Spine manipulator carried by this token, if any
    pub fn manipulator(&self) -> Option<Manipulator> {
        Manipulator::parse(&self.text)
    }

    /// `**name` exclusive interpretation carried by this token
    pub fn exclusive_interpretation(&self) -> Option<&str> {
        if self.text.starts_with("**") {
            Some(&self.text)
        } else {
            None
        }
    }
}

/// One line of a Humdrum file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Record {
    /// Ordinal position in the file
    pub index: usize,
    text: String,
    kind: RecordKind,
    tokens: Vec<Token>,
    barline: Option<Barline>,
}

impl Record {
    pub(crate) fn new(
        index: usize,
        text: String,
        kind: RecordKind,
        tokens: Vec<Token>,
        barline: Option<Barline>,
    ) -> Self {
        Self {
            index,
            text,
            kind,
            tokens,
            barline,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn token(&self, col: usize) -> Option<&Token> {
        self.tokens.get(col)
    }

    pub fn field_count(&self) -> usize {
        self.tokens.len()
    }

    /// Parsed barline, for `=` lines
    pub fn barline(&self) -> Option<&Barline> {
        self.barline.as_ref()
    }

    pub fn is_data(&self) -> bool {
        self.kind == RecordKind::Data
    }

    pub fn is_barline(&self) -> bool {
        self.kind == RecordKind::Barline
    }

    pub fn is_interpretation(&self) -> bool {
        self.kind.is_interpretation()
    }

    pub fn is_exclusive_interpretation(&self) -> bool {
        self.kind == RecordKind::ExclusiveInterpretation
    }

    pub fn is_local_comment(&self) -> bool {
        self.kind == RecordKind::LocalComment
    }

    /// `!!` comments, including reference records and universal lines
    pub fn is_global_comment(&self) -> bool {
        self.kind.is_global()
    }

    pub fn is_bibliographic(&self) -> bool {
        self.kind == RecordKind::Bibliographic
    }

    pub fn is_blank(&self) -> bool {
        self.kind == RecordKind::Blank
    }

    /// Key and value of a `!!!key: value` record
    pub fn reference(&self) -> Option<(&str, &str)> {
        match self.kind {
            RecordKind::Bibliographic => tokens::parse_reference(&self.text),
            _ => None,
        }
    }

    /// Replace one field and rebuild the line text.
    ///
    /// Spine and track bookkeeping is left untouched.
    pub(crate) fn replace_token(&mut self, col: usize, text: &str) -> bool {
        match self.tokens.get_mut(col) {
            Some(token) => {
                token.set_text(text);
                self.rebuild_text();
                true
            }
            None => false,
        }
    }

    fn rebuild_text(&mut self) {
        let len = self.tokens.iter().map(|t| t.text.len()).sum::<usize>()
            + self.tokens.len().saturating_sub(1);
        let mut text = String::with_capacity(len);
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                text.push('\t');
            }
            text.push_str(&token.text);
        }
        self.text = text;
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
