//! Token recognition
//!
//! Field-level syntax that needs no cross-line state: null placeholders,
//! spine manipulators, sub-token splitting and `key: value` records.

use serde::{Deserialize, Serialize};

/// Spine manipulators, interpreted left to right on an interpretation line
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Manipulator {
    /// `*^`
    Split,
    /// `*v`
    Merge,
    /// `*x`
    Exchange,
    /// `*+`
    Add,
    /// `*-`
    Terminate,
}

impl Manipulator {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "*^" => Some(Manipulator::Split),
            "*v" => Some(Manipulator::Merge),
            "*x" => Some(Manipulator::Exchange),
            "*+" => Some(Manipulator::Add),
            "*-" => Some(Manipulator::Terminate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Manipulator::Split => "*^",
            Manipulator::Merge => "*v",
            Manipulator::Exchange => "*x",
            Manipulator::Add => "*+",
            Manipulator::Terminate => "*-",
        }
    }
}

/// The data null token
pub fn is_null(text: &str) -> bool {
    text == "."
}

/// Space-delimited sub-tokens, skipping empty runs
pub fn subtokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|s| !s.is_empty())
}

/// Split `!!!key: value` (any number of leading `!`) into key and value
pub fn parse_reference(text: &str) -> Option<(&str, &str)> {
    let body = text.trim_start_matches('!');
    let colon = body.find(':')?;
    let key = body[..colon].trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, body[colon + 1..].trim()))
}
