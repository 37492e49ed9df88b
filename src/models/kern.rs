//! Kern token syntax
//!
//! Durations are recip values: `4` is a quarter note, `8.` a dotted eighth,
//! `12` a triplet eighth, `0` a breve, `00` a long and `3%2` two thirds of a
//! whole note. All durations are returned in quarter notes as exact rationals.
//!
//! Pitches are spelled by letter repetition: `c` is middle C (octave 4),
//! `cc` one octave higher, `C` one octave lower, `CC` two lower. `#` raises,
//! `-` lowers, `n` marks an explicit natural.

use serde::{Deserialize, Serialize};

use super::Rational;

/// Dots past this count are ignored
const MAX_DOTS: u32 = 10;

/// Duration of one recip-bearing sub-token, in quarter notes.
///
/// Grace notes (`q`, `Q`) have zero duration. Returns `None` when the
/// sub-token carries no rhythm.
pub fn recip_duration(subtoken: &str) -> Option<Rational> {
    if subtoken.contains(['q', 'Q']) {
        return Some(Rational::from_integer(0));
    }

    let bytes = subtoken.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let digits = &subtoken[start..end];

    let mut base = if digits.bytes().all(|b| b == b'0') {
        // 0 = breve, 00 = long, 000 = maxima
        let zeros = u32::try_from(digits.len()).ok().filter(|&z| z <= 20)?;
        Rational::from_integer(4 * (1i64 << zeros))
    } else {
        let n: i64 = digits.parse().ok()?;
        Rational::new(4, n)
    };

    // Rational recip: n%m is m/n of a whole note
    if bytes.get(end) == Some(&b'%') {
        let num_start = end + 1;
        let mut num_end = num_start;
        while num_end < bytes.len() && bytes[num_end].is_ascii_digit() {
            num_end += 1;
        }
        if num_end > num_start {
            let m: i64 = subtoken[num_start..num_end].parse().ok()?;
            base *= m;
            end = num_end;
        }
    }

    let dots = subtoken[end..].bytes().take_while(|&b| b == b'.').count() as u32;
    if dots > 0 {
        let dots = dots.min(MAX_DOTS);
        // dotted note = base * (2 - 1/2^dots)
        let dot_multiplier = Rational::new((1 << (dots + 1)) - 1, 1 << dots);
        base *= dot_multiplier;
    }

    Some(base)
}

/// Duration of a whole token: the first sub-token that carries rhythm
pub fn token_duration(token: &str) -> Option<Rational> {
    token.split(' ').filter(|s| !s.is_empty()).find_map(recip_duration)
}

/// Rest marker
pub fn is_rest(subtoken: &str) -> bool {
    subtoken.contains('r')
}

/// Tie role of a note
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TieMark {
    /// `[`
    Start,
    /// `_`
    Continue,
    /// `]`
    End,
}

impl TieMark {
    pub fn parse(subtoken: &str) -> Option<Self> {
        if subtoken.contains('_') {
            Some(TieMark::Continue)
        } else if subtoken.contains('[') {
            Some(TieMark::Start)
        } else if subtoken.contains(']') {
            Some(TieMark::End)
        } else {
            None
        }
    }
}

/// The seven diatonic letters
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiatonicLetter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl DiatonicLetter {
    pub const ALL: [DiatonicLetter; 7] = [
        DiatonicLetter::C,
        DiatonicLetter::D,
        DiatonicLetter::E,
        DiatonicLetter::F,
        DiatonicLetter::G,
        DiatonicLetter::A,
        DiatonicLetter::B,
    ];

    /// Case-insensitive letter lookup
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'c' => Some(DiatonicLetter::C),
            'd' => Some(DiatonicLetter::D),
            'e' => Some(DiatonicLetter::E),
            'f' => Some(DiatonicLetter::F),
            'g' => Some(DiatonicLetter::G),
            'a' => Some(DiatonicLetter::A),
            'b' => Some(DiatonicLetter::B),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A spelled kern pitch
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub letter: DiatonicLetter,
    /// Scientific octave (`c` = 4)
    pub octave: i32,
    /// Chromatic alteration in semitones
    pub accidental: i32,
    /// An `n` was written
    pub explicit_natural: bool,
}

impl Pitch {
    /// Parse the pitch of a kern sub-token; rests and unpitched tokens give `None`
    pub fn parse(subtoken: &str) -> Option<Self> {
        if is_rest(subtoken) {
            return None;
        }
        let chars: Vec<char> = subtoken.chars().collect();
        let start = chars.iter().position(|&c| DiatonicLetter::from_char(c).is_some())?;
        let first = chars[start];
        let letter = DiatonicLetter::from_char(first)?;
        let repeats = chars[start..].iter().take_while(|&&c| c == first).count() as i32;
        let octave = if first.is_ascii_lowercase() {
            3 + repeats
        } else {
            4 - repeats
        };

        let mut accidental = 0;
        let mut explicit_natural = false;
        for &c in &chars[start + repeats as usize..] {
            match c {
                '#' => accidental += 1,
                '-' => accidental -= 1,
                'n' => explicit_natural = true,
                _ => break,
            }
        }

        Some(Self {
            letter,
            octave,
            accidental,
            explicit_natural,
        })
    }
}

/// Per-letter accidental memory within a measure.
///
/// Writer tools use this to decide whether a note needs a printed accidental.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AccidentalState {
    alterations: [Option<i32>; 7],
}

impl AccidentalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alteration currently in force for a letter (0 if none written)
    pub fn get(&self, letter: DiatonicLetter) -> i32 {
        self.alterations[letter.index()].unwrap_or(0)
    }

    pub fn set(&mut self, letter: DiatonicLetter, alteration: i32) {
        self.alterations[letter.index()] = Some(alteration);
    }

    /// Forget everything, as at a barline
    pub fn reset(&mut self) {
        self.alterations = [None; 7];
    }

    /// Whether `pitch` needs a printed accidental; updates the state
    pub fn needs_accidental(&mut self, pitch: &Pitch) -> bool {
        let needed = pitch.explicit_natural || self.get(pitch.letter) != pitch.accidental;
        self.set(pitch.letter, pitch.accidental);
        needed
    }
}
