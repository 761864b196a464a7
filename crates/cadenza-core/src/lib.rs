//! cadenza-core: Modal harmony, chord identification and next-chord suggestions

pub mod chord;
mod error;
pub mod pitch;
pub mod progression;
pub mod random;
pub mod session;
pub mod theory;

pub use chord::{identify, Chord, ChordQuality, Detection, MIN_CHORD_PITCHES, UNRECOGNIZED_LABEL};
pub use error::{CadenzaError, Result};
pub use pitch::{normalize_enharmonic, parse_pitch_name, pitch_name, PitchClass, Spelling};
pub use progression::{diatonic_voicings, secondary_dominant_target, suggest, Style, Suggestion, MAX_SUGGESTIONS};
pub use random::RandomSource;
pub use session::{ChordReport, NoteEvent, NoteSink, Session, SessionConfig, SessionState};
pub use theory::{scale_degree, Degree, DiatonicChord, Key, Mode, TriadQuality};
