//! Pitch classes and note-name spelling

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CadenzaError, Result};

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Flat spellings and the names they collapse to for internal lookups
const ENHARMONIC_FLATS: [(&str, &str); 7] = [
    ("Bb", "A#"),
    ("Eb", "D#"),
    ("Ab", "G#"),
    ("Db", "C#"),
    ("Gb", "F#"),
    ("Cb", "B"),
    ("Fb", "E"),
];

/// Tonics conventionally written with a flat key signature
const FLAT_KEY_TONICS: [&str; 7] = ["F", "Bb", "Eb", "Ab", "Db", "Gb", "Cb"];

/// A note identity independent of octave, always in 0..12
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Reduce any integer modulo 12
    pub fn new(value: i32) -> Self {
        Self(value.rem_euclid(12) as u8)
    }

    /// Reduce a raw MIDI note number
    pub fn from_midi(note: u8) -> Self {
        Self(note % 12)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }

    /// Ascending interval in semitones from `root` up to this pitch class
    pub fn interval_from(self, root: PitchClass) -> u8 {
        (self.0 + 12 - root.0) % 12
    }

    /// Name in the given spelling, e.g. "A#" or "Bb"
    pub fn name(self, spelling: Spelling) -> &'static str {
        pitch_name(self, spelling)
    }
}

impl TryFrom<u8> for PitchClass {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        if value < 12 {
            Ok(Self(value))
        } else {
            Err(format!("pitch class out of range: {value}"))
        }
    }
}

impl From<PitchClass> for u8 {
    fn from(pc: PitchClass) -> u8 {
        pc.0
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(pitch_name(*self, Spelling::Sharps))
    }
}

/// Accidental preference for displayed note names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spelling {
    #[default]
    Sharps,
    Flats,
}

impl Spelling {
    pub fn from_prefer_flats(prefer_flats: bool) -> Self {
        if prefer_flats { Self::Flats } else { Self::Sharps }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Sharps => Self::Flats,
            Self::Flats => Self::Sharps,
        }
    }

    /// Spelling implied by a tonic as the user wrote it ("Bb" and "F" read in flats)
    pub fn for_tonic_name(name: &str) -> Self {
        let spelled = canonical_spelling(name);
        let flat = FLAT_KEY_TONICS.contains(&spelled.as_str())
            || spelled.get(1..).is_some_and(|accidentals| accidentals.contains('b'));
        Self::from_prefer_flats(flat)
    }

    /// Conventional spelling for a bare pitch-class tonic
    pub fn for_tonic(tonic: PitchClass) -> Self {
        Self::from_prefer_flats(matches!(tonic.value(), 1 | 3 | 5 | 6 | 8 | 10))
    }
}

/// Canonical spelling of a pitch class from the sharp or flat table
pub fn pitch_name(pc: PitchClass, spelling: Spelling) -> &'static str {
    match spelling {
        Spelling::Sharps => SHARP_NAMES[pc.0 as usize],
        Spelling::Flats => FLAT_NAMES[pc.0 as usize],
    }
}

/// Collapse flat spellings (Bb, Eb, Ab, Db, Gb, Cb, Fb) onto their sharp/natural equivalents
pub fn normalize_enharmonic(name: &str) -> &str {
    ENHARMONIC_FLATS
        .iter()
        .find(|(flat, _)| *flat == name)
        .map(|(_, sharp)| *sharp)
        .unwrap_or(name)
}

/// Parse a note name such as "C", "f#", "Bb" or "E♭" into a pitch class
pub fn parse_pitch_name(name: &str) -> Result<PitchClass> {
    let spelled = canonical_spelling(name);
    let canonical = normalize_enharmonic(&spelled);

    SHARP_NAMES
        .iter()
        .position(|n| *n == canonical)
        .map(|idx| PitchClass(idx as u8))
        .or(match canonical {
            "E#" => Some(PitchClass(5)),
            "B#" => Some(PitchClass(0)),
            _ => None,
        })
        .ok_or_else(|| CadenzaError::UnknownPitchName(name.to_string()))
}

/// Upper-case letter followed by ASCII accidentals
fn canonical_spelling(name: &str) -> String {
    let mut chars = name.trim().chars();
    let Some(letter) = chars.next() else { return String::new() };

    let mut spelled = letter.to_ascii_uppercase().to_string();
    for c in chars {
        match c {
            '♭' => spelled.push('b'),
            '♯' => spelled.push('#'),
            other => spelled.push(other.to_ascii_lowercase()),
        }
    }
    spelled
}
