//! Parsing and analysis options
//!
//! Everything that changes parser behavior is passed in explicitly through
//! these structs. They deserialize from JSON with per-field defaults, so a
//! partial document like `{"rhythm": {"time_base": 12}}` is valid.

use serde::{Deserialize, Serialize};

use crate::error::{HumdrumError, Result};

/// Exclusive interpretations whose tokens carry durations by default
pub const DEFAULT_RHYTHM_INTERPRETATIONS: [&str; 2] = ["**kern", "**recip"];

/// Default bound on tokens in one tie chain
pub const DEFAULT_MAX_TIE_LINKS: usize = 64;

/// Rhythm analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmOptions {
    /// Ticks per quarter note used for the barline grid check.
    /// `None` uses the file's minimum time base.
    pub time_base: Option<i64>,

    /// Maximum number of tokens in a tie chain
    pub max_tie_links: usize,

    /// Spine types whose tokens have durations
    pub rhythm_interpretations: Vec<String>,
}

impl Default for RhythmOptions {
    fn default() -> Self {
        Self {
            time_base: None,
            max_tie_links: DEFAULT_MAX_TIE_LINKS,
            rhythm_interpretations: DEFAULT_RHYTHM_INTERPRETATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RhythmOptions {
    /// Whether a spine with this exclusive interpretation carries durations
    pub fn is_rhythmic(&self, exinterp: &str) -> bool {
        self.rhythm_interpretations.iter().any(|name| name == exinterp)
    }
}

/// Segment stream reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Treat bare lines before the first `**` as filenames to read next
    pub resolve_filenames: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            resolve_filenames: true,
        }
    }
}

/// Top-level options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumdrumOptions {
    pub rhythm: RhythmOptions,
    pub reader: ReaderOptions,
}

impl HumdrumOptions {
    /// Load options from a JSON document and validate them
    pub fn from_json(json: &str) -> Result<Self> {
        let options: HumdrumOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the analyzers cannot work with
    pub fn validate(&self) -> Result<()> {
        if let Some(tb) = self.rhythm.time_base {
            if tb <= 0 {
                return Err(HumdrumError::InvalidOption(format!(
                    "time_base must be positive, got {}",
                    tb
                )));
            }
        }
        if self.rhythm.max_tie_links == 0 {
            return Err(HumdrumError::InvalidOption(
                "max_tie_links must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = HumdrumOptions::default();
        assert_eq!(options.rhythm.time_base, None);
        assert!(options.rhythm.is_rhythmic("**kern"));
        assert!(options.rhythm.is_rhythmic("**recip"));
        assert!(!options.rhythm.is_rhythmic("**text"));
        assert!(options.reader.resolve_filenames);
    }

    #[test]
    fn test_partial_json() {
        let options = HumdrumOptions::from_json(r#"{"rhythm": {"time_base": 12}}"#).unwrap();
        assert_eq!(options.rhythm.time_base, Some(12));
        assert_eq!(options.rhythm.max_tie_links, DEFAULT_MAX_TIE_LINKS);
        assert!(options.reader.resolve_filenames);
    }

    #[test]
    fn test_invalid_time_base() {
        let err = HumdrumOptions::from_json(r#"{"rhythm": {"time_base": 0}}"#).unwrap_err();
        assert!(matches!(err, HumdrumError::InvalidOption(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = HumdrumOptions::from_json("{rhythm").unwrap_err();
        assert!(matches!(err, HumdrumError::Config(_)));
    }
}
