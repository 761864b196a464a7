//! Chord identification from sounding pitch classes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CadenzaError, Result};
use crate::pitch::{parse_pitch_name, PitchClass, Spelling};
use crate::theory::{scale_degree, Degree, Key};

/// Label used when no signature matches
pub const UNRECOGNIZED_LABEL: &str = "Unrecognized chord";

/// Fewest distinct pitch classes that count as a chord
pub const MIN_CHORD_PITCHES: usize = 3;

// ============================================================================
// Chord quality
// ============================================================================

/// Chord quality recognised by the identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Minor9,
    Minor11,
    Major9,
    Dominant7Flat9,
    Dominant7Sharp9,
    Major7Sharp11,
    Dominant13,
}

impl ChordQuality {
    /// Suffix appended to the root name in a chord symbol
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Dominant7 => "7",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::HalfDiminished7 => "m7♭5",
            Self::Minor9 => "m9",
            Self::Minor11 => "m11",
            Self::Major9 => "maj9",
            Self::Dominant7Flat9 => "7♭9",
            Self::Dominant7Sharp9 => "7♯9",
            Self::Major7Sharp11 => "maj7♯11",
            Self::Dominant13 => "13",
        }
    }

    /// Word spelled out after a triad that has no scale degree
    fn triad_word(&self) -> Option<&'static str> {
        match self {
            Self::Major => Some("major"),
            Self::Minor => Some("minor"),
            Self::Diminished => Some("diminished"),
            _ => None,
        }
    }

    /// Major triads and dominant-seventh shapes, the chords that can act as a dominant
    pub fn is_dominant_shaped(&self) -> bool {
        matches!(
            self,
            Self::Major
                | Self::Dominant7
                | Self::Dominant7Flat9
                | Self::Dominant7Sharp9
                | Self::Dominant13
        )
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        let ascii = suffix.replace('♭', "b").replace('♯', "#");
        let quality = match ascii.as_str() {
            "" | "maj" | "major" | "M" => Self::Major,
            "m" | "min" | "minor" | "-" => Self::Minor,
            "dim" | "diminished" | "°" => Self::Diminished,
            "7" | "dom7" => Self::Dominant7,
            "maj7" | "M7" => Self::Major7,
            "m7" | "min7" | "-7" => Self::Minor7,
            "m7b5" | "ø" | "ø7" => Self::HalfDiminished7,
            "m9" | "min9" => Self::Minor9,
            "m11" | "min11" => Self::Minor11,
            "maj9" | "M9" => Self::Major9,
            "7b9" => Self::Dominant7Flat9,
            "7#9" => Self::Dominant7Sharp9,
            "maj7#11" => Self::Major7Sharp11,
            "13" => Self::Dominant13,
            _ => return None,
        };
        Some(quality)
    }
}

/// How an interval set is compared against a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchKind {
    /// Every signature interval present, extra tones allowed
    Superset,
    /// Interval set equal to the signature
    Exact,
}

/// A chord signature: quality plus interval bitmask (bit i set means interval i present)
struct ChordSignature {
    quality: ChordQuality,
    mask: u16,
    kind: MatchKind,
}

impl ChordSignature {
    const fn new(quality: ChordQuality, intervals: &[u8], kind: MatchKind) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self { quality, mask, kind }
    }

    fn matches(&self, intervals: u16) -> bool {
        match self.kind {
            MatchKind::Superset => intervals & self.mask == self.mask,
            MatchKind::Exact => intervals == self.mask,
        }
    }
}

/// Signatures in strict descending specificity; the first hit wins
static SIGNATURES: &[ChordSignature] = &[
    // Extended chords, matched as supersets
    ChordSignature::new(ChordQuality::Minor9, &[0, 2, 3, 7, 10], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Minor11, &[0, 3, 5, 7, 10], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Major9, &[0, 2, 4, 7, 11], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Dominant7Flat9, &[0, 1, 4, 7, 10], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Dominant7Sharp9, &[0, 3, 4, 7, 10], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Major7Sharp11, &[0, 4, 6, 7, 11], MatchKind::Superset),
    ChordSignature::new(ChordQuality::Dominant13, &[0, 4, 7, 9, 10], MatchKind::Superset),
    // Sevenths
    ChordSignature::new(ChordQuality::Dominant7, &[0, 4, 7, 10], MatchKind::Exact),
    ChordSignature::new(ChordQuality::Major7, &[0, 4, 7, 11], MatchKind::Exact),
    ChordSignature::new(ChordQuality::Minor7, &[0, 3, 7, 10], MatchKind::Exact),
    ChordSignature::new(ChordQuality::HalfDiminished7, &[0, 3, 6, 10], MatchKind::Exact),
    // Triads
    ChordSignature::new(ChordQuality::Major, &[0, 4, 7], MatchKind::Exact),
    ChordSignature::new(ChordQuality::Minor, &[0, 3, 7], MatchKind::Exact),
    ChordSignature::new(ChordQuality::Diminished, &[0, 3, 6], MatchKind::Exact),
];

// ============================================================================
// Chord
// ============================================================================

/// An identified chord: root, quality and scale-degree role within the session key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub degree: Option<Degree>,
    pub spelling: Spelling,
}

impl Chord {
    pub fn new(root: PitchClass, quality: ChordQuality, key: &Key) -> Self {
        Self {
            root,
            quality,
            degree: scale_degree(root, key.tonic, key.mode),
            spelling: key.spelling,
        }
    }

    pub fn root_name(&self) -> &'static str {
        self.root.name(self.spelling)
    }

    /// Compact symbol without the degree, e.g. "Dm7" or "Bb"
    pub fn symbol(&self) -> String {
        format!("{}{}", self.root_name(), self.quality.suffix())
    }

    /// Parse a chord symbol such as "D7", "Bbmaj7", "F#m7b5" or "C major (I)"
    pub fn from_symbol(symbol: &str, key: &Key) -> Result<Self> {
        let unknown = || CadenzaError::UnknownChordSymbol(symbol.to_string());

        let body = symbol.split(" (").next().unwrap_or_default().trim();
        let mut chars = body.char_indices();
        chars.next().ok_or_else(unknown)?;
        let root_end = match chars.next() {
            Some((idx, c)) if matches!(c, '#' | 'b' | '♯' | '♭') => idx + c.len_utf8(),
            Some((idx, _)) => idx,
            None => body.len(),
        };

        let root = parse_pitch_name(&body[..root_end]).map_err(|_| unknown())?;
        let quality = ChordQuality::from_suffix(body[root_end..].trim()).ok_or_else(unknown)?;
        Ok(Self::new(root, quality, key))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.degree, self.quality.triad_word()) {
            (Some(degree), _) => write!(f, "{} ({})", self.symbol_for_display(), degree),
            (None, Some(word)) => write!(f, "{} {}", self.root_name(), word),
            (None, None) => f.write_str(&self.symbol()),
        }
    }
}

impl Chord {
    /// Triads show only the root next to their degree; the numeral carries the quality
    fn symbol_for_display(&self) -> String {
        match self.quality.triad_word() {
            Some(_) => self.root_name().to_string(),
            None => self.symbol(),
        }
    }
}

/// Outcome of identifying three or more sounding pitch classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detection {
    Chord(Chord),
    Unrecognized,
}

impl Detection {
    pub fn chord(&self) -> Option<&Chord> {
        match self {
            Self::Chord(chord) => Some(chord),
            Self::Unrecognized => None,
        }
    }

    /// Display string; two detections are the same chord iff their labels match
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chord(chord) => fmt::Display::fmt(chord, f),
            Self::Unrecognized => f.write_str(UNRECOGNIZED_LABEL),
        }
    }
}

/// Bitmask over the 12 pitch classes
fn pitch_mask<I: IntoIterator<Item = PitchClass>>(pitches: I) -> u16 {
    pitches.into_iter().fold(0u16, |mask, pc| mask | 1 << pc.value())
}

/// Rotate a pitch mask so that `root` lands on bit 0
fn intervals_from(mask: u16, root: u8) -> u16 {
    ((mask >> root) | (mask << (12 - root))) & 0x0fff
}

/// Identify the chord formed by `pitches` (duplicates collapse)
///
/// Returns `None` below three distinct pitch classes. Candidate roots are tried in ascending
/// pitch-class order and, per root, signatures in descending specificity; the first match wins.
pub fn identify<I: IntoIterator<Item = PitchClass>>(pitches: I, key: &Key) -> Option<Detection> {
    let mask = pitch_mask(pitches);
    if (mask.count_ones() as usize) < MIN_CHORD_PITCHES {
        return None;
    }

    let hit = (0..12u8).filter(|root| mask & (1 << root) != 0).find_map(|root| {
        let intervals = intervals_from(mask, root);
        SIGNATURES
            .iter()
            .find(|sig| sig.matches(intervals))
            .map(|sig| (PitchClass::new(root as i32), sig.quality))
    });

    Some(match hit {
        Some((root, quality)) => Detection::Chord(Chord::new(root, quality, key)),
        None => Detection::Unrecognized,
    })
}
