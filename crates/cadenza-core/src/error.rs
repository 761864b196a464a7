//! Error types for cadenza

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CadenzaError {
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Unknown pitch name: {0}")]
    UnknownPitchName(String),
    #[error("Unknown chord symbol: {0}")]
    UnknownChordSymbol(String),
    #[error("Invalid note event: note {note}, velocity {velocity}")]
    InvalidNoteEvent { note: u8, velocity: u8 },
}

pub type Result<T> = std::result::Result<T, CadenzaError>;
