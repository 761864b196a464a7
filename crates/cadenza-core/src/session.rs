//! Session state machine: tracks held notes and announces each distinct chord once

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chord::{identify, MIN_CHORD_PITCHES};
use crate::error::{CadenzaError, Result};
use crate::pitch::PitchClass;
use crate::progression::{suggest, Style};
use crate::random::RandomSource;
use crate::theory::{Key, Mode};

const MAX_MIDI_VALUE: u8 = 127;

/// An inbound note message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoteEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

impl NoteEvent {
    /// Note-on from untrusted input, validated to the MIDI 0..=127 range
    pub fn on(note: u8, velocity: u8) -> Result<Self> {
        if note > MAX_MIDI_VALUE || velocity > MAX_MIDI_VALUE {
            return Err(CadenzaError::InvalidNoteEvent { note, velocity });
        }
        Ok(Self::NoteOn { note, velocity })
    }

    pub fn off(note: u8) -> Result<Self> {
        if note > MAX_MIDI_VALUE {
            return Err(CadenzaError::InvalidNoteEvent { note, velocity: 0 });
        }
        Ok(Self::NoteOff { note })
    }

    pub fn note(&self) -> u8 {
        match self {
            Self::NoteOn { note, .. } | Self::NoteOff { note } => *note,
        }
    }

    /// Note-off, or note-on with zero velocity
    pub fn is_release(&self) -> bool {
        matches!(self, Self::NoteOff { .. } | Self::NoteOn { velocity: 0, .. })
    }
}

/// Output device that receives every accepted note unmodified
pub trait NoteSink {
    fn note_on(&mut self, note: u8, velocity: u8);
    fn note_off(&mut self, note: u8);
}

impl<S: NoteSink + ?Sized> NoteSink for &mut S {
    fn note_on(&mut self, note: u8, velocity: u8) {
        (**self).note_on(note, velocity)
    }

    fn note_off(&mut self, note: u8) {
        (**self).note_off(note)
    }
}

/// Records forwarded notes in order
impl NoteSink for Vec<NoteEvent> {
    fn note_on(&mut self, note: u8, velocity: u8) {
        self.push(NoteEvent::NoteOn { note, velocity });
    }

    fn note_off(&mut self, note: u8) {
        self.push(NoteEvent::NoteOff { note });
    }
}

/// Validated session setup: key and style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub key: Key,
    pub style: Style,
}

impl SessionConfig {
    pub fn new(tonic: PitchClass, mode: Mode, style: Style) -> Self {
        Self { key: Key::new(tonic, mode), style }
    }
}

/// Emitted once per distinct chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordReport {
    pub chord: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for ChordReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chord: {} -> Suggested next chords: {}", self.chord, self.suggestions.join(", "))
    }
}

/// Mutable per-session state: held notes and the last announced chord label
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Raw note numbers, so note-offs match their note-ons
    active_notes: BTreeSet<u8>,
    last_chord: Option<String>,
}

impl SessionState {
    pub fn active_notes(&self) -> &BTreeSet<u8> {
        &self.active_notes
    }

    /// Held notes reduced to distinct pitch classes
    pub fn pitch_classes(&self) -> BTreeSet<PitchClass> {
        self.active_notes.iter().map(|&n| PitchClass::from_midi(n)).collect()
    }

    pub fn last_chord(&self) -> Option<&str> {
        self.last_chord.as_deref()
    }
}

/// A listening session owning its config and state
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config, state: SessionState::default() }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply one note event: forward it to `sink`, update the held set, and report when the
    /// held pitch classes form a chord whose label differs from the last one announced
    pub fn handle<S, R>(&mut self, event: NoteEvent, sink: &mut S, rng: &mut R) -> Option<ChordReport>
    where
        S: NoteSink + ?Sized,
        R: RandomSource + ?Sized,
    {
        match event {
            NoteEvent::NoteOn { note, velocity } if velocity > 0 => {
                self.state.active_notes.insert(note);
                sink.note_on(note, velocity);
            }
            _ => {
                self.state.active_notes.remove(&event.note());
                sink.note_off(event.note());
            }
        }

        let pitch_classes = self.state.pitch_classes();
        if pitch_classes.len() < MIN_CHORD_PITCHES {
            return None;
        }

        let detection = identify(pitch_classes, &self.config.key)?;
        let label = detection.label();
        if self.state.last_chord.as_deref() == Some(label.as_str()) {
            return None;
        }

        let suggestions = suggest(&detection, &self.config.key, self.config.style, rng)
            .into_iter()
            .map(|s| s.symbol)
            .collect();
        self.state.last_chord = Some(label.clone());
        Some(ChordReport { chord: label, suggestions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::UNRECOGNIZED_LABEL;
    use crate::random::scripted::ScriptedRandom;

    fn c_major_session() -> Session {
        Session::new(SessionConfig::new(PitchClass::C, Mode::Ionian, Style::Pop))
    }

    fn on(note: u8) -> NoteEvent {
        NoteEvent::NoteOn { note, velocity: 100 }
    }

    fn off(note: u8) -> NoteEvent {
        NoteEvent::NoteOff { note }
    }

    /// Feed events and collect the chord labels reported
    fn play(session: &mut Session, events: &[NoteEvent]) -> Vec<String> {
        let mut sink = Vec::new();
        let mut rng = ScriptedRandom::never();
        events
            .iter()
            .filter_map(|&e| session.handle(e, &mut sink, &mut rng))
            .map(|r| r.chord)
            .collect()
    }

    #[test]
    fn test_note_event_validation() {
        assert!(NoteEvent::on(60, 100).is_ok());
        assert_eq!(
            NoteEvent::on(128, 1),
            Err(CadenzaError::InvalidNoteEvent { note: 128, velocity: 1 })
        );
        assert!(NoteEvent::on(60, 200).is_err());
        assert!(NoteEvent::off(200).is_err());
        assert!(NoteEvent::NoteOn { note: 60, velocity: 0 }.is_release());
        assert!(!on(60).is_release());
    }

    #[test]
    fn test_chord_reported_once_third_note_arrives() {
        let mut session = c_major_session();
        let mut sink = Vec::new();
        let mut rng = ScriptedRandom::never();

        assert!(session.handle(on(60), &mut sink, &mut rng).is_none());
        assert!(session.handle(on(64), &mut sink, &mut rng).is_none());
        let report = session.handle(on(67), &mut sink, &mut rng).unwrap();
        assert_eq!(report.chord, "C (I)");
        assert_eq!(report.suggestions, ["Fm", "F", "G"]);
        assert_eq!(session.state().last_chord(), Some("C (I)"));
    }

    #[test]
    fn test_restriking_same_chord_is_debounced() {
        let mut session = c_major_session();
        let reports = play(
            &mut session,
            &[on(60), on(64), on(67), off(60), on(60), on(64), on(72)],
        );
        assert_eq!(reports, ["C (I)"]);
    }

    #[test]
    fn test_chord_changes_are_reported() {
        let mut session = c_major_session();
        let reports = play(&mut session, &[on(60), on(64), on(67), on(71), off(71)]);
        assert_eq!(reports, ["C (I)", "Cmaj7 (I)", "C (I)"]);
    }

    #[test]
    fn test_octave_doublings_do_not_count() {
        let mut session = c_major_session();
        let reports = play(&mut session, &[on(48), on(60), on(64)]);
        assert!(reports.is_empty());
        assert_eq!(session.state().active_notes().len(), 3);
        assert_eq!(session.state().pitch_classes().len(), 2);

        let reports = play(&mut session, &[on(55)]);
        assert_eq!(reports, ["C (I)"]);
    }

    #[test]
    fn test_unrecognized_sets_share_one_label() {
        let mut session = c_major_session();
        // C C# D, then C C# D#: both unrecognized
        let reports = play(&mut session, &[on(60), on(61), on(62), off(62), on(63)]);
        assert_eq!(reports, [UNRECOGNIZED_LABEL]);
    }

    #[test]
    fn test_every_event_is_forwarded() {
        let mut session = c_major_session();
        let mut sink = Vec::new();
        let mut rng = ScriptedRandom::never();
        let events = [on(60), NoteEvent::NoteOn { note: 60, velocity: 0 }, off(61)];
        for event in events {
            session.handle(event, &mut sink, &mut rng);
        }
        assert_eq!(sink, [on(60), off(60), off(61)]);
        assert!(session.state().active_notes().is_empty());
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut first = c_major_session();
        let mut second = c_major_session();
        assert_eq!(play(&mut first, &[on(60), on(64), on(67)]), ["C (I)"]);
        assert_eq!(play(&mut second, &[on(60), on(64), on(67)]), ["C (I)"]);
        assert!(second.state().last_chord().is_some());
    }

    #[test]
    fn test_report_display() {
        let report = ChordReport { chord: "G7 (V)".into(), suggestions: vec!["C".into(), "Am".into()] };
        assert_eq!(report.to_string(), "Chord: G7 (V) -> Suggested next chords: C, Am");
    }
}
