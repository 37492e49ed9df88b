//! Barline (measure) records
//!
//! A barline token is `=` followed by an optional measure number, an
//! optional lowercase variant suffix (`=12a`) and a style string.
//! `==` at the start marks a final double bar.

use serde::{Deserialize, Serialize};

/// Barline styles
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum BarlineStyle {
    Single,      // =
    Double,      // =||
    Final,       // == or =|!
    StartRepeat, // =!|:
    EndRepeat,   // =:|!
    BothRepeat,  // =:|!|: or =:!!:
    Invisible,   // =-
    Other(String),
}

impl BarlineStyle {
    /// Parse the style part of a barline token (after the number)
    pub fn parse(style: &str, leading_equals: usize) -> Self {
        if leading_equals >= 2 {
            return BarlineStyle::Final;
        }
        match style {
            "" => BarlineStyle::Single,
            "-" => BarlineStyle::Invisible,
            "||" => BarlineStyle::Double,
            "|!" => BarlineStyle::Final,
            s if s.contains(":|!|:") || s.contains(":!!:") || s.contains(":||:") => {
                BarlineStyle::BothRepeat
            }
            s if s.starts_with(":|") || s.starts_with(":!") => BarlineStyle::EndRepeat,
            s if s.ends_with("|:") || s.ends_with("!:") => BarlineStyle::StartRepeat,
            s => BarlineStyle::Other(s.to_string()),
        }
    }
}

/// Parsed barline
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Barline {
    /// Explicit measure number, if present
    pub number: Option<i32>,
    /// Variant letter after the number (`=12a`)
    pub suffix: Option<char>,
    pub style: BarlineStyle,
}

impl Barline {
    /// Parse from the first field of an `=` line
    pub fn parse(token: &str) -> Option<Self> {
        if !token.starts_with('=') {
            return None;
        }
        let leading_equals = token.chars().take_while(|&c| c == '=').count();
        let rest = &token[leading_equals..];

        let digits_end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let number = if digits_end > 0 {
            rest[..digits_end].parse::<i32>().ok()
        } else {
            None
        };
        let mut rest = &rest[digits_end..];

        let mut suffix = None;
        if number.is_some() {
            if let Some(c) = rest.chars().next().filter(|c| c.is_ascii_lowercase()) {
                suffix = Some(c);
                rest = &rest[c.len_utf8()..];
            }
        }

        Some(Self {
            number,
            suffix,
            style: BarlineStyle::parse(rest, leading_equals),
        })
    }

    pub fn is_numbered(&self) -> bool {
        self.number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbered() {
        let bar = Barline::parse("=12").unwrap();
        assert_eq!(bar.number, Some(12));
        assert_eq!(bar.suffix, None);
        assert_eq!(bar.style, BarlineStyle::Single);
    }

    #[test]
    fn test_styles() {
        assert_eq!(Barline::parse("=").unwrap().style, BarlineStyle::Single);
        assert_eq!(Barline::parse("==").unwrap().style, BarlineStyle::Final);
        assert_eq!(Barline::parse("=||").unwrap().style, BarlineStyle::Double);
        assert_eq!(Barline::parse("=8:|!").unwrap().style, BarlineStyle::EndRepeat);
        assert_eq!(Barline::parse("=9!|:").unwrap().style, BarlineStyle::StartRepeat);
        assert_eq!(Barline::parse("=4:|!|:").unwrap().style, BarlineStyle::BothRepeat);
        assert_eq!(Barline::parse("=1-").unwrap().style, BarlineStyle::Invisible);
    }

    #[test]
    fn test_suffix_and_unnumbered() {
        let bar = Barline::parse("=3b||").unwrap();
        assert_eq!(bar.number, Some(3));
        assert_eq!(bar.suffix, Some('b'));
        assert_eq!(bar.style, BarlineStyle::Double);

        let bar = Barline::parse("=||").unwrap();
        assert!(!bar.is_numbered());
        assert!(Barline::parse("4c").is_none());
    }
}
