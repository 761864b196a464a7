//! Next-chord suggestions from modal cadences, functional rules and secondary dominants

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chord::{Chord, Detection};
use crate::pitch::{parse_pitch_name, pitch_name, PitchClass, Spelling};
use crate::random::{choose, RandomSource};
use crate::theory::{Degree, Key, TriadQuality};

pub const MAX_SUGGESTIONS: usize = 3;

const SPICY_EXTENSION_CHANCE: f64 = 0.2;
const ALTERED_DOMINANT_CHANCE: f64 = 0.5;
const CADENCE_SECONDARY_CHANCE: f64 = 0.5;
const SECONDARY_SPICE_CHANCE: f64 = 0.3;
const WILDCARD_CHANCE: f64 = 0.2;

/// Degrees whose secondary dominant may be prepended for color
const SPICE_TARGETS: [usize; 3] = [1, 4, 5];

/// ♭7, ♭3 and ♭6 above the tonic
const WILDCARD_INTERVALS: [i32; 3] = [10, 3, 8];

/// Dominant root name to the key it tonicizes
const SECONDARY_DOMINANTS: [(&str, &str); 14] = [
    ("D", "G"),
    ("A", "D"),
    ("E", "A"),
    ("B", "E"),
    ("F#", "B"),
    ("C#", "F#"),
    ("G#", "C#"),
    ("Db", "Gb"),
    ("Ab", "Db"),
    ("Eb", "Ab"),
    ("Bb", "Eb"),
    ("F", "Bb"),
    ("C", "F"),
    ("G", "C"),
];

// ============================================================================
// Style
// ============================================================================

/// Stylistic idiom that shapes voicings and fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Pop,
    Jazz,
    Classical,
    Other,
}

impl Style {
    /// Degrees offered when no cadence or rule applies
    pub fn fallback_degrees(&self) -> &'static [usize] {
        match self {
            Self::Pop => &[0, 5, 3, 4],
            Self::Jazz => &[1, 4, 0, 2, 5],
            Self::Classical => &[0, 4, 0, 3, 1],
            Self::Other => &[0, 1, 2, 3, 4, 5, 6],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pop => "pop",
            Self::Jazz => "jazz",
            Self::Classical => "classical",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = Infallible;

    /// Unrecognised names fall back to `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "pop" => Self::Pop,
            "jazz" => Self::Jazz,
            "classical" => Self::Classical,
            _ => Self::Other,
        })
    }
}

// ============================================================================
// Suggestion
// ============================================================================

/// A suggested next chord, already spelled for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub root: PitchClass,
    pub symbol: String,
}

impl Suggestion {
    fn new(root: PitchClass, suffix: &str, spelling: Spelling) -> Self {
        Self { root, symbol: format!("{}{}", pitch_name(root, spelling), suffix) }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

fn push_unique(list: &mut Vec<Suggestion>, suggestion: Suggestion) {
    if !list.iter().any(|s| s.symbol == suggestion.symbol) {
        list.push(suggestion);
    }
}

/// Put `suggestion` first, dropping any later copy
fn prepend(list: &mut Vec<Suggestion>, suggestion: Suggestion) {
    list.retain(|s| s.symbol != suggestion.symbol);
    list.insert(0, suggestion);
}

// ============================================================================
// Voicings
// ============================================================================

fn jazz_suffix<R: RandomSource + ?Sized>(degree: &Degree, rng: &mut R) -> &'static str {
    let mut suffix = match degree.quality {
        TriadQuality::Major => *choose(rng, &["maj7", "maj9"]),
        TriadQuality::Minor => *choose(rng, &["m7", "m9"]),
        TriadQuality::Diminished => *choose(rng, &["m7♭5", "dim7"]),
        TriadQuality::Augmented => "aug7",
    };

    if rng.chance(SPICY_EXTENSION_CHANCE) {
        suffix = match degree.quality {
            TriadQuality::Major => *choose(rng, &["maj7♯11", "maj13"]),
            TriadQuality::Minor => "m11",
            TriadQuality::Diminished => "dim9",
            TriadQuality::Augmented => "aug9",
        };
    }

    if degree.takes_altered_dominant() && rng.chance(ALTERED_DOMINANT_CHANCE) {
        suffix = *choose(rng, &["7♭9", "7♯9", "13", "7♯5♭9"]);
    }
    suffix
}

/// The seven diatonic chords of `key`, voiced for `style`
pub fn diatonic_voicings<R: RandomSource + ?Sized>(
    key: &Key,
    style: Style,
    rng: &mut R,
) -> Vec<Suggestion> {
    key.roots()
        .into_iter()
        .zip(key.mode.degrees())
        .map(|(root, degree)| {
            let suffix = match style {
                Style::Jazz => jazz_suffix(&degree, rng),
                _ => degree.quality.triad_suffix(),
            };
            Suggestion::new(root, suffix, key.spelling)
        })
        .collect()
}

fn dominant_seventh_of(target: PitchClass, spelling: Spelling) -> Suggestion {
    Suggestion::new(target.transpose(7), "7", spelling)
}

// ============================================================================
// Secondary dominants
// ============================================================================

/// Key tonicized by `chord` when it acts as a secondary dominant in `key`
///
/// Only dominant-shaped chords qualify, and a chord resolving to the session tonic is
/// an ordinary dominant rather than a secondary one.
pub fn secondary_dominant_target(chord: &Chord, key: &Key) -> Option<PitchClass> {
    if !chord.quality.is_dominant_shaped() {
        return None;
    }

    let lookup = |spelling: Spelling| {
        let name = pitch_name(chord.root, spelling);
        SECONDARY_DOMINANTS.iter().find(|(dominant, _)| *dominant == name)
    };
    let (_, tonicized) = lookup(chord.spelling).or_else(|| lookup(chord.spelling.other()))?;

    let tonicized = parse_pitch_name(tonicized).ok()?;
    (tonicized != key.tonic).then_some(tonicized)
}

// ============================================================================
// Suggestion engine
// ============================================================================

/// Suggest up to three next chords after `current`
///
/// Cadence and functional-rule targets come first; secondary dominants, their resolutions
/// and a chromatic wildcard are layered on top at random. Never returns an empty list.
pub fn suggest<R: RandomSource + ?Sized>(
    current: &Detection,
    key: &Key,
    style: Style,
    rng: &mut R,
) -> Vec<Suggestion> {
    let chords = diatonic_voicings(key, style, rng);
    let roots = key.roots();
    let current_root = current.chord().map(|c| c.root);
    let degree = current_root.and_then(|root| key.degree_index(root));

    let mut cadence_suggestions = Vec::new();
    let mut rule_suggestions = Vec::new();
    if let Some(degree) = degree {
        for &(_, to) in key.mode.cadences().iter().filter(|(from, _)| *from == degree) {
            if style == Style::Jazz && rng.chance(CADENCE_SECONDARY_CHANCE) {
                cadence_suggestions.push(dominant_seventh_of(roots[to], key.spelling));
            }
            cadence_suggestions.push(chords[to].clone());
        }
        rule_suggestions.extend(key.mode.successors(degree).iter().map(|&d| chords[d].clone()));
    }

    let mut suggestions = Vec::new();
    for s in cadence_suggestions.into_iter().take(2).chain(rule_suggestions.into_iter().take(2)) {
        push_unique(&mut suggestions, s);
    }

    if suggestions.is_empty() {
        for &d in style.fallback_degrees() {
            if Some(chords[d].root) != current_root {
                push_unique(&mut suggestions, chords[d].clone());
            }
        }
    }

    if rng.chance(SECONDARY_SPICE_CHANCE) {
        let target = *choose(rng, &SPICE_TARGETS);
        prepend(&mut suggestions, dominant_seventh_of(roots[target], key.spelling));
    }

    if let Some(tonicized) = current.chord().and_then(|c| secondary_dominant_target(c, key)) {
        let suffix = match style {
            Style::Jazz => *choose(rng, &["m7", "m9", "m11"]),
            _ => "m",
        };
        let resolution = Suggestion::new(tonicized, suffix, key.spelling);
        if !suggestions.iter().any(|s| s.symbol == resolution.symbol) {
            suggestions.insert(0, resolution);
        }
    }

    if rng.chance(WILDCARD_CHANCE) {
        let interval = *choose(rng, &WILDCARD_INTERVALS);
        prepend(&mut suggestions, Suggestion::new(key.tonic.transpose(interval), "", key.spelling));
    }

    if suggestions.is_empty() {
        suggestions.extend(chords.into_iter().take(MAX_SUGGESTIONS));
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{identify, ChordQuality};
    use crate::random::scripted::ScriptedRandom;
    use crate::theory::Mode;

    fn symbols(suggestions: &[Suggestion]) -> Vec<String> {
        suggestions.iter().map(|s| s.symbol.clone()).collect()
    }

    fn detect(values: &[i32], key: &Key) -> Detection {
        identify(values.iter().map(|&v| PitchClass::new(v)), key).unwrap()
    }

    #[test]
    fn test_style_from_str() {
        assert_eq!("Jazz".parse::<Style>().unwrap(), Style::Jazz);
        assert_eq!("classical".parse::<Style>().unwrap(), Style::Classical);
        assert_eq!("bossa".parse::<Style>().unwrap(), Style::Other);
    }

    #[test]
    fn test_plain_voicings() {
        let key = Key::new(PitchClass::C, Mode::AeolianHarmonic);
        let chords = diatonic_voicings(&key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&chords), ["Cm", "Ddim", "D#aug", "Fm", "G", "G#", "Bdim"]);
    }

    #[test]
    fn test_jazz_voicings_with_altered_dominant() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        // Only V's altered-dominant roll succeeds, then picks "7♯9"
        let mut rng = ScriptedRandom::new(
            &[false, false, false, false, false, true],
            &[0, 0, 0, 0, 0, 1],
        );
        let chords = diatonic_voicings(&key, Style::Jazz, &mut rng);
        assert_eq!(
            symbols(&chords),
            ["Cmaj7", "Dm7", "Em7", "Fmaj7", "G7♯9", "Am7", "Bm7♭5"]
        );
    }

    #[test]
    fn test_jazz_spicy_extension() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let mut rng = ScriptedRandom::new(&[true], &[1, 1]);
        let chords = diatonic_voicings(&key, Style::Jazz, &mut rng);
        assert_eq!(chords[0].symbol, "Cmaj13");
        assert_eq!(rng.probabilities[0], SPICY_EXTENSION_CHANCE);
    }

    #[test]
    fn test_secondary_dominant_resolution() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let d7 = Chord::from_symbol("D7", &key).unwrap();
        assert_eq!(secondary_dominant_target(&d7, &key), Some(PitchClass::new(7)));

        let current = Detection::Chord(d7);
        let suggestions = suggest(&current, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&suggestions), ["Gm", "G"]);
    }

    #[test]
    fn test_secondary_dominant_detection_rules() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let chord = |symbol: &str| Chord::from_symbol(symbol, &key).unwrap();

        // Resolving to the tonic is not secondary
        assert_eq!(secondary_dominant_target(&chord("G7"), &key), None);
        // Minor and major-seventh chords never act as dominants
        assert_eq!(secondary_dominant_target(&chord("Dm"), &key), None);
        assert_eq!(secondary_dominant_target(&chord("Dmaj7"), &key), None);
        // Every pitch class is covered, whichever way it is spelled
        assert_eq!(secondary_dominant_target(&chord("B7"), &key), Some(PitchClass::new(4)));
        assert_eq!(secondary_dominant_target(&chord("A#7"), &key), Some(PitchClass::new(3)));
        assert_eq!(secondary_dominant_target(&chord("Gb"), &key), Some(PitchClass::new(11)));
    }

    #[test]
    fn test_jazz_resolution_quality() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let current = Detection::Chord(Chord::from_symbol("E7", &key).unwrap());
        // E7 sits on iii: the functional target Am7, with the Am9 resolution ahead of it
        let mut rng = ScriptedRandom::new(&[], &[0, 0, 0, 0, 0, 0, 0, 1]);
        let suggestions = suggest(&current, &key, Style::Jazz, &mut rng);
        assert_eq!(symbols(&suggestions), ["Am9", "Am7"]);
    }

    #[test]
    fn test_dorian_cadence_scenario() {
        let key = Key::new(PitchClass::new(2), Mode::Dorian);
        let current = detect(&[2, 5, 9], &key);
        assert_eq!(current.label(), "D (i)");

        let calm = suggest(&current, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&calm), ["G", "Am"]);

        // A secondary dominant prepended for spice still leaves IV second
        let mut rng = ScriptedRandom::new(&[true, false], &[0]);
        let spiced = suggest(&current, &key, Style::Pop, &mut rng);
        assert_eq!(symbols(&spiced), ["B7", "G", "Am"]);
    }

    #[test]
    fn test_jazz_cadence_secondary_dominant() {
        let key = Key::new(PitchClass::new(2), Mode::Dorian);
        let current = detect(&[2, 5, 9], &key);
        // Eight voicing rolls, then the cadence roll succeeds
        let mut chances = vec![false; 8];
        chances.push(true);
        let mut rng = ScriptedRandom::new(&chances, &[]);
        let suggestions = suggest(&current, &key, Style::Jazz, &mut rng);
        assert_eq!(symbols(&suggestions), ["D7", "Gmaj7", "Am7"]);
        assert_eq!(rng.probabilities[8], CADENCE_SECONDARY_CHANCE);
    }

    #[test]
    fn test_fallback_for_chromatic_and_unrecognized() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let unrecognized = suggest(&Detection::Unrecognized, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&unrecognized), ["C", "Am", "F"]);

        let classical = suggest(&Detection::Unrecognized, &key, Style::Classical, &mut ScriptedRandom::never());
        assert_eq!(symbols(&classical), ["C", "G", "F"]);

        let c_sharp = detect(&[1, 5, 8], &key);
        let suggestions = suggest(&c_sharp, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&suggestions), ["F#m", "C", "Am"]);
    }

    #[test]
    fn test_fallback_skips_current_root() {
        // Phrygian iv has neither cadence nor functional rule
        let key = Key::new(PitchClass::new(4), Mode::Phrygian);
        let current = detect(&[9, 0, 4], &key);
        assert_eq!(current.chord().map(|c| c.quality), Some(ChordQuality::Minor));
        let suggestions = suggest(&current, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&suggestions), ["Em", "C", "Bdim"]);
    }

    #[test]
    fn test_melodic_minor_mediant_falls_back() {
        // ♭III+ in melodic minor has no functional successor
        let key = Key::new(PitchClass::C, Mode::AeolianMelodic);
        let current = detect(&[3, 6, 10], &key);
        assert_eq!(current.label(), "D# (♭III+)");
        let suggestions = suggest(&current, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&suggestions), ["Cm", "Adim", "F"]);
    }

    #[test]
    fn test_tonic_major_triad_tonicizes_subdominant() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let current = detect(&[0, 4, 7], &key);
        assert_eq!(current.label(), "C (I)");
        let suggestions = suggest(&current, &key, Style::Pop, &mut ScriptedRandom::never());
        assert_eq!(symbols(&suggestions), ["Fm", "F", "G"]);
    }

    #[test]
    fn test_wildcard_prepends_bare_root() {
        let key = Key::new(PitchClass::C, Mode::Ionian);
        let current = detect(&[7, 11, 2], &key);
        let mut rng = ScriptedRandom::new(&[false, true], &[1]);
        let suggestions = suggest(&current, &key, Style::Pop, &mut rng);
        assert_eq!(symbols(&suggestions), ["D#", "C"]);
    }

    #[test]
    fn test_suggestions_never_empty() {
        let styles = [Style::Pop, Style::Jazz, Style::Classical, Style::Other];
        let qualities = [
            ChordQuality::Major,
            ChordQuality::Minor,
            ChordQuality::Diminished,
            ChordQuality::Dominant7,
            ChordQuality::Minor9,
        ];
        let mut rng = fastrand::Rng::with_seed(2024);

        for mode in Mode::ALL {
            for tonic in 0..12 {
                let key = Key::new(PitchClass::new(tonic), mode);
                for style in styles {
                    let unrecognized = suggest(&Detection::Unrecognized, &key, style, &mut rng);
                    assert!(!unrecognized.is_empty());

                    for root in 0..12 {
                        for quality in qualities {
                            let current = Detection::Chord(Chord::new(PitchClass::new(root), quality, &key));
                            let suggestions = suggest(&current, &key, style, &mut rng);
                            assert!(!suggestions.is_empty(), "{key} {style} {current}");
                            assert!(suggestions.len() <= MAX_SUGGESTIONS);
                        }
                    }
                }
            }
        }
    }
}
