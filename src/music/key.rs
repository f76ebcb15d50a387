// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Harmonic key wheel.
//!
//! Keys are placed on a 24-slot wheel: 12 positions around the circle of
//! fifths, each in a minor (`A`) and a major (`B`) flavour. Adjacent
//! positions share all but one note, so mixing between them sounds smooth.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pitch classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    C,
    Cs, // C# / Db
    D,
    Ds, // D# / Eb
    E,
    F,
    Fs, // F# / Gb
    G,
    Gs, // G# / Ab
    A,
    As, // A# / Bb
    B,
}

impl Note {
    /// All notes in chromatic order
    pub const ALL: [Note; 12] = [
        Note::C,
        Note::Cs,
        Note::D,
        Note::Ds,
        Note::E,
        Note::F,
        Note::Fs,
        Note::G,
        Note::Gs,
        Note::A,
        Note::As,
        Note::B,
    ];

    /// Get the pitch class (0-11) for this note
    pub fn pitch_class(self) -> u8 {
        Note::ALL.iter().position(|n| *n == self).unwrap_or(0) as u8
    }

    /// Get note from pitch class
    pub fn from_pitch_class(pc: u8) -> Self {
        Note::ALL[(pc % 12) as usize]
    }

    /// Parse a note name ("C", "C#", "Db", "F♯")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s
            .trim()
            .replace('\u{266F}', "#")
            .replace('\u{266D}', "b")
            .to_uppercase();
        match s.as_str() {
            "C" | "B#" => Some(Note::C),
            "C#" | "DB" => Some(Note::Cs),
            "D" => Some(Note::D),
            "D#" | "EB" => Some(Note::Ds),
            "E" | "FB" => Some(Note::E),
            "F" | "E#" => Some(Note::F),
            "F#" | "GB" => Some(Note::Fs),
            "G" => Some(Note::G),
            "G#" | "AB" => Some(Note::Gs),
            "A" => Some(Note::A),
            "A#" | "BB" => Some(Note::As),
            "B" | "CB" => Some(Note::B),
            _ => None,
        }
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    fn letter(self) -> char {
        match self {
            Mode::Minor => 'A',
            Mode::Major => 'B',
        }
    }
}

/// A position on the harmonic wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HarmonicKey {
    /// Wheel number, 1-12
    number: u8,
    mode: Mode,
}

impl HarmonicKey {
    /// Number of slots on the wheel
    pub const SLOTS: u8 = 24;

    /// Build a key from a wheel number (1-12) and mode
    pub fn new(number: u8, mode: Mode) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self { number, mode })
    }

    /// Build a key from its 0..24 code
    pub fn from_code(code: u8) -> Option<Self> {
        if code >= Self::SLOTS {
            return None;
        }
        let mode = if code % 2 == 0 { Mode::Minor } else { Mode::Major };
        Self::new(code / 2 + 1, mode)
    }

    /// Build a key from a tonic and mode
    pub fn from_note(tonic: Note, mode: Mode) -> Self {
        // Minor keys sit at the same wheel number as their relative major.
        let major_root = match mode {
            Mode::Major => tonic.pitch_class(),
            Mode::Minor => (tonic.pitch_class() + 3) % 12,
        };
        // C major is 8B; each fifth up moves one step clockwise.
        let number = ((major_root as u16 * 7) % 12 + 7) % 12 + 1;
        Self {
            number: number as u8,
            mode,
        }
    }

    /// Parse Camelot ("8A"), Open Key ("1m", "6d") or standard notation
    /// ("Am", "F#m", "Ebmaj", "C", "D minor").
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Self::parse_camelot(trimmed)
            .or_else(|| Self::parse_open_key(trimmed))
            .or_else(|| Self::parse_standard(trimmed))
    }

    fn parse_camelot(raw: &str) -> Option<Self> {
        if !raw.is_ascii() {
            return None;
        }
        let upper = raw.to_ascii_uppercase();
        let (number, letter) = upper.split_at(upper.len().checked_sub(1)?);
        let mode = match letter {
            "A" => Mode::Minor,
            "B" => Mode::Major,
            _ => return None,
        };
        Self::new(number.parse().ok()?, mode)
    }

    fn parse_open_key(raw: &str) -> Option<Self> {
        if !raw.is_ascii() {
            return None;
        }
        let lower = raw.to_ascii_lowercase();
        let (number, letter) = lower.split_at(lower.len().checked_sub(1)?);
        let mode = match letter {
            "m" => Mode::Minor,
            "d" => Mode::Major,
            _ => return None,
        };
        let open: u8 = number.parse().ok()?;
        if !(1..=12).contains(&open) {
            return None;
        }
        // Open Key 1 is Camelot 8.
        Self::new((open + 6) % 12 + 1, mode)
    }

    fn parse_standard(raw: &str) -> Option<Self> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let lower = compact.to_lowercase();

        let (root, mode) = if let Some(root) = strip_suffix_ci(&compact, &lower, "minor") {
            (root, Mode::Minor)
        } else if let Some(root) = strip_suffix_ci(&compact, &lower, "major") {
            (root, Mode::Major)
        } else if let Some(root) = strip_suffix_ci(&compact, &lower, "min") {
            (root, Mode::Minor)
        } else if let Some(root) = strip_suffix_ci(&compact, &lower, "maj") {
            (root, Mode::Major)
        } else if compact.len() > 1 && compact.ends_with('m') {
            (&compact[..compact.len() - 1], Mode::Minor)
        } else {
            (compact.as_str(), Mode::Major)
        };

        Note::parse(root).map(|tonic| Self::from_note(tonic, mode))
    }

    /// Wheel number (1-12)
    pub fn number(self) -> u8 {
        self.number
    }

    /// Key mode
    pub fn mode(self) -> Mode {
        self.mode
    }

    /// Slot code in 0..24
    pub fn code(self) -> u8 {
        (self.number - 1) * 2
            + match self.mode {
                Mode::Minor => 0,
                Mode::Major => 1,
            }
    }

    /// Two keys mix if they are equal, share a wheel number across modes,
    /// or sit one step apart in the same mode.
    pub fn is_compatible(self, other: HarmonicKey) -> bool {
        if self.number == other.number {
            return true;
        }
        let clockwise = (other.number + 12 - self.number) % 12;
        self.mode == other.mode && (clockwise == 1 || clockwise == 11)
    }

    /// All keys compatible with this one (including itself)
    pub fn neighbours(self) -> Vec<HarmonicKey> {
        (0..Self::SLOTS)
            .filter_map(HarmonicKey::from_code)
            .filter(|k| self.is_compatible(*k))
            .collect()
    }
}

fn strip_suffix_ci<'a>(original: &'a str, lower: &str, suffix: &str) -> Option<&'a str> {
    let cut = original.len().checked_sub(suffix.len())?;
    if lower.len() > suffix.len() && lower.ends_with(suffix) && original.is_char_boundary(cut) {
        Some(&original[..cut])
    } else {
        None
    }
}

impl fmt::Display for HarmonicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.mode.letter())
    }
}
