//! Modal theory tables: scale intervals, triad qualities, degree labels, cadences and
//! functional progression rules

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CadenzaError;
use crate::pitch::{PitchClass, Spelling};

// ============================================================================
// Triad quality and degree
// ============================================================================

/// Quality of the triad built on a scale degree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriadQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl TriadQuality {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Diminished => "diminished",
            Self::Augmented => "augmented",
        }
    }

    /// Plain triad suffix used when spelling a chord symbol
    pub fn triad_suffix(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
        }
    }
}

/// Chromatic alteration of a degree relative to the major scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alteration {
    Flat,
    Sharp,
}

/// A scale degree: numeral 1..=7, triad quality and optional alteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Degree {
    pub numeral: u8,
    pub quality: TriadQuality,
    pub alteration: Option<Alteration>,
}

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

impl Degree {
    /// Zero-based position in the mode's tables
    pub fn index(&self) -> usize {
        (self.numeral - 1) as usize
    }

    /// Roman-numeral label, e.g. "I", "ii°", "♭III+", "#iv°"
    pub fn label(&self) -> String {
        let mut label = String::new();
        match self.alteration {
            Some(Alteration::Flat) => label.push('♭'),
            Some(Alteration::Sharp) => label.push('#'),
            None => {}
        }

        let numeral = NUMERALS[self.index()];
        match self.quality {
            TriadQuality::Major | TriadQuality::Augmented => label.push_str(numeral),
            TriadQuality::Minor | TriadQuality::Diminished => {
                label.push_str(&numeral.to_lowercase())
            }
        }

        match self.quality {
            TriadQuality::Diminished => label.push('°'),
            TriadQuality::Augmented => label.push('+'),
            _ => {}
        }
        label
    }

    /// V and ♭VII major triads carry altered-dominant extensions in jazz voicings
    pub fn takes_altered_dominant(&self) -> bool {
        self.quality == TriadQuality::Major
            && matches!(
                (self.numeral, self.alteration),
                (5, None) | (7, Some(Alteration::Flat))
            )
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// Modes
// ============================================================================

/// The supported seven-note modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    #[serde(alias = "aeolian_h")]
    AeolianHarmonic,
    #[serde(alias = "aeolian_m")]
    AeolianMelodic,
    Locrian,
}

use Alteration::{Flat, Sharp};
use TriadQuality::{Augmented as Aug, Diminished as Dim, Major as Maj, Minor as Min};

impl Mode {
    pub const ALL: [Mode; 9] = [
        Self::Ionian,
        Self::Dorian,
        Self::Phrygian,
        Self::Lydian,
        Self::Mixolydian,
        Self::Aeolian,
        Self::AeolianHarmonic,
        Self::AeolianMelodic,
        Self::Locrian,
    ];

    /// Semitone offsets of each degree from the tonic
    pub fn intervals(&self) -> [u8; 7] {
        match self {
            Self::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Self::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Self::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Self::AeolianHarmonic => [0, 2, 3, 5, 7, 8, 11],
            Self::AeolianMelodic => [0, 2, 3, 5, 7, 9, 11],
            Self::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// Triad quality on each degree, index-aligned with `intervals`
    pub fn qualities(&self) -> [TriadQuality; 7] {
        match self {
            Self::Ionian => [Maj, Min, Min, Maj, Maj, Min, Dim],
            Self::Dorian => [Min, Min, Maj, Maj, Min, Dim, Maj],
            Self::Phrygian => [Min, Maj, Maj, Min, Dim, Maj, Min],
            Self::Lydian => [Maj, Maj, Min, Dim, Maj, Min, Min],
            Self::Mixolydian => [Maj, Min, Dim, Maj, Min, Min, Maj],
            Self::Aeolian => [Min, Dim, Maj, Min, Min, Maj, Maj],
            Self::AeolianHarmonic => [Min, Dim, Aug, Min, Maj, Maj, Dim],
            Self::AeolianMelodic => [Min, Min, Aug, Maj, Maj, Dim, Dim],
            Self::Locrian => [Dim, Maj, Min, Min, Maj, Maj, Min],
        }
    }

    fn alterations(&self) -> [Option<Alteration>; 7] {
        match self {
            Self::Ionian => [None; 7],
            Self::Dorian => [None, None, Some(Flat), None, None, None, Some(Flat)],
            Self::Phrygian => [None, Some(Flat), Some(Flat), None, None, Some(Flat), Some(Flat)],
            Self::Lydian => [None, None, None, Some(Sharp), None, None, None],
            Self::Mixolydian => [None, None, None, None, None, None, Some(Flat)],
            Self::Aeolian => [None, None, Some(Flat), None, None, Some(Flat), Some(Flat)],
            Self::AeolianHarmonic | Self::AeolianMelodic => {
                [None, None, Some(Flat), None, None, None, None]
            }
            Self::Locrian => [
                None,
                Some(Flat),
                Some(Flat),
                None,
                Some(Flat),
                Some(Flat),
                Some(Flat),
            ],
        }
    }

    /// Typed degree for each scale step
    pub fn degrees(&self) -> [Degree; 7] {
        let qualities = self.qualities();
        let alterations = self.alterations();
        std::array::from_fn(|i| Degree {
            numeral: i as u8 + 1,
            quality: qualities[i],
            alteration: alterations[i],
        })
    }

    /// Rendered Roman-numeral labels for each degree
    pub fn degree_labels(&self) -> [String; 7] {
        self.degrees().map(|d| d.label())
    }

    /// Strong modal resolutions as (from, to) degree indices
    pub fn cadences(&self) -> &'static [(usize, usize)] {
        match self {
            Self::Ionian => &[],
            Self::Dorian => &[(0, 3), (3, 4), (4, 0)],
            Self::Phrygian => &[(0, 1), (1, 6), (6, 0)],
            Self::Lydian => &[(0, 1), (1, 4), (4, 0)],
            Self::Mixolydian => &[(0, 6), (6, 3), (3, 0)],
            Self::Aeolian => &[(0, 3), (3, 6), (6, 0)],
            Self::AeolianHarmonic => &[(0, 4), (4, 0)],
            Self::AeolianMelodic => &[(0, 3), (3, 4), (4, 0)],
            Self::Locrian => &[(0, 1), (1, 6), (6, 0)],
        }
    }

    /// Functional successors of every degree, indexed by degree
    pub fn progression_rules(&self) -> &'static [&'static [usize]; 7] {
        match self {
            Self::Ionian => &[&[3, 4, 5], &[4], &[5], &[0, 4], &[0], &[1, 3], &[0]],
            Self::Dorian => &[&[3, 4, 6], &[4], &[5], &[0, 6], &[6, 0], &[1], &[0]],
            Self::Phrygian => &[&[1, 5, 6], &[6], &[5], &[], &[], &[6, 0], &[0]],
            Self::Lydian => &[&[1, 4, 5], &[4], &[5], &[4], &[0], &[1, 2], &[]],
            Self::Mixolydian => &[&[3, 4, 6], &[4], &[5], &[0, 4], &[0], &[1], &[0]],
            Self::Aeolian => &[&[3, 5, 6], &[3], &[5], &[6, 0], &[5, 0], &[6, 0], &[0]],
            Self::AeolianHarmonic => &[&[3, 4, 5], &[4], &[5], &[4], &[0], &[1], &[0]],
            Self::AeolianMelodic => &[&[3, 4], &[4], &[], &[4], &[0], &[1], &[0]],
            Self::Locrian => &[&[2, 3], &[4], &[5], &[6], &[0], &[6], &[0]],
        }
    }

    /// Functional successors of one degree
    pub fn successors(&self, degree: usize) -> &'static [usize] {
        self.progression_rules().get(degree).copied().unwrap_or(&[])
    }

    /// Stable identifier, as accepted by `FromStr`
    pub fn key(&self) -> &'static str {
        match self {
            Self::Ionian => "ionian",
            Self::Dorian => "dorian",
            Self::Phrygian => "phrygian",
            Self::Lydian => "lydian",
            Self::Mixolydian => "mixolydian",
            Self::Aeolian => "aeolian",
            Self::AeolianHarmonic => "aeolian_harmonic",
            Self::AeolianMelodic => "aeolian_melodic",
            Self::Locrian => "locrian",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ionian => "Ionian",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::Aeolian => "Aeolian",
            Self::AeolianHarmonic => "Aeolian Harmonic",
            Self::AeolianMelodic => "Aeolian Melodic",
            Self::Locrian => "Locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = CadenzaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        let mode = match normalized.as_str() {
            "ionian" | "major" => Self::Ionian,
            "dorian" => Self::Dorian,
            "phrygian" => Self::Phrygian,
            "lydian" => Self::Lydian,
            "mixolydian" => Self::Mixolydian,
            "aeolian" | "minor" | "natural_minor" => Self::Aeolian,
            "aeolian_harmonic" | "aeolian_h" | "harmonic_minor" => Self::AeolianHarmonic,
            "aeolian_melodic" | "aeolian_m" | "melodic_minor" => Self::AeolianMelodic,
            "locrian" => Self::Locrian,
            _ => return Err(CadenzaError::UnknownMode(s.to_string())),
        };
        Ok(mode)
    }
}

/// Degree of `candidate_root` within `mode` on `tonic`, or `None` when it is chromatic
pub fn scale_degree(candidate_root: PitchClass, tonic: PitchClass, mode: Mode) -> Option<Degree> {
    let interval = candidate_root.interval_from(tonic);
    mode.intervals()
        .iter()
        .position(|&offset| offset == interval)
        .map(|idx| mode.degrees()[idx])
}

// ============================================================================
// Key
// ============================================================================

/// Tonal center for a session: tonic, mode and fixed spelling preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub tonic: PitchClass,
    pub mode: Mode,
    pub spelling: Spelling,
}

/// A triad on one degree of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiatonicChord {
    pub root: PitchClass,
    pub name: &'static str,
    pub degree: Degree,
}

impl fmt::Display for DiatonicChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.name, self.degree, self.degree.quality.name())
    }
}

impl Key {
    /// Key with the conventional spelling for its tonic
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode, spelling: Spelling::for_tonic(tonic) }
    }

    pub fn with_spelling(mut self, spelling: Spelling) -> Self {
        self.spelling = spelling;
        self
    }

    /// Root pitch class of each degree
    pub fn roots(&self) -> [PitchClass; 7] {
        self.mode.intervals().map(|offset| self.tonic.transpose(offset as i32))
    }

    /// Degree index of a pitch class, if diatonic
    pub fn degree_index(&self, root: PitchClass) -> Option<usize> {
        scale_degree(root, self.tonic, self.mode).map(|d| d.index())
    }

    pub fn name_of(&self, pc: PitchClass) -> &'static str {
        pc.name(self.spelling)
    }

    pub fn diatonic_chords(&self) -> Vec<DiatonicChord> {
        self.roots()
            .into_iter()
            .zip(self.mode.degrees())
            .map(|(root, degree)| DiatonicChord { root, name: self.name_of(root), degree })
            .collect()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name_of(self.tonic), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(mode: Mode) -> Vec<String> {
        mode.degree_labels().to_vec()
    }

    #[test]
    fn test_mode_tables_aligned() {
        for mode in Mode::ALL {
            let intervals = mode.intervals();
            assert_eq!(intervals[0], 0, "{mode} must start on the tonic");
            assert!(intervals.windows(2).all(|w| w[0] < w[1]), "{mode} intervals ascend");
            assert_eq!(mode.qualities().len(), 7);
            assert_eq!(mode.degree_labels().len(), 7);
            for (i, degree) in mode.degrees().iter().enumerate() {
                assert_eq!(degree.index(), i);
                assert_eq!(degree.quality, mode.qualities()[i]);
            }
        }
    }

    #[test]
    fn test_cadence_and_rule_indices_in_range() {
        for mode in Mode::ALL {
            for &(from, to) in mode.cadences() {
                assert!(from < 7 && to < 7);
            }
            for successors in mode.progression_rules() {
                assert!(successors.iter().all(|&d| d < 7));
            }
        }
    }

    #[test]
    fn test_degree_labels() {
        assert_eq!(labels(Mode::Ionian), ["I", "ii", "iii", "IV", "V", "vi", "vii°"]);
        assert_eq!(labels(Mode::Dorian), ["i", "ii", "♭III", "IV", "v", "vi°", "♭VII"]);
        assert_eq!(labels(Mode::Lydian), ["I", "II", "iii", "#iv°", "V", "vi", "vii"]);
        assert_eq!(labels(Mode::AeolianHarmonic), ["i", "ii°", "♭III+", "iv", "V", "VI", "vii°"]);
        assert_eq!(labels(Mode::AeolianMelodic), ["i", "ii", "♭III+", "IV", "V", "vi°", "vii°"]);
    }

    #[test]
    fn test_labels_follow_quality() {
        // Phrygian iv and ♭vii are minor triads, v is diminished
        assert_eq!(labels(Mode::Phrygian), ["i", "♭II", "♭III", "iv", "v°", "♭VI", "♭vii"]);
        assert_eq!(labels(Mode::Locrian), ["i°", "♭II", "♭iii", "iv", "♭V", "♭VI", "♭vii"]);
    }

    #[test]
    fn test_scale_degree_lookup() {
        let c = PitchClass::new(0);
        let g = PitchClass::new(7);
        assert_eq!(scale_degree(g, c, Mode::Ionian).map(|d| d.label()), Some("V".to_string()));
        assert_eq!(scale_degree(PitchClass::new(1), c, Mode::Ionian), None);

        let d = PitchClass::new(2);
        assert_eq!(scale_degree(c, d, Mode::Dorian).map(|d| d.label()), Some("♭VII".to_string()));
    }

    #[test]
    fn test_altered_dominant_slots() {
        let ionian = Mode::Ionian.degrees();
        assert!(ionian[4].takes_altered_dominant());
        assert!(!ionian[0].takes_altered_dominant());

        let dorian = Mode::Dorian.degrees();
        assert!(dorian[6].takes_altered_dominant());
        assert!(!dorian[4].takes_altered_dominant());

        // Minor ♭vii in phrygian and locrian is not a dominant
        assert!(!Mode::Phrygian.degrees()[6].takes_altered_dominant());
        assert!(!Mode::Locrian.degrees()[6].takes_altered_dominant());
        assert!(Mode::Mixolydian.degrees()[6].takes_altered_dominant());
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Dorian".parse::<Mode>().unwrap(), Mode::Dorian);
        assert_eq!("aeolian_h".parse::<Mode>().unwrap(), Mode::AeolianHarmonic);
        assert_eq!("harmonic minor".parse::<Mode>().unwrap(), Mode::AeolianHarmonic);
        assert_eq!("major".parse::<Mode>().unwrap(), Mode::Ionian);
        assert_eq!(
            "bebop".parse::<Mode>(),
            Err(CadenzaError::UnknownMode("bebop".to_string()))
        );
        for mode in Mode::ALL {
            assert_eq!(mode.key().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_diatonic_chords() {
        let key = Key::new(PitchClass::new(2), Mode::Dorian);
        let chords: Vec<String> = key.diatonic_chords().iter().map(|c| c.to_string()).collect();
        assert_eq!(chords[0], "D (i) [minor]");
        assert_eq!(chords[3], "G (IV) [major]");
        assert_eq!(chords[6], "C (♭VII) [major]");

        let f = Key::new(PitchClass::new(5), Mode::Ionian);
        assert_eq!(f.diatonic_chords()[3].name, "Bb");
    }
}
