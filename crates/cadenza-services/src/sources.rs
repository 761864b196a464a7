//! Inbound note event sources: text event streams and Standard MIDI Files

use std::io::BufRead;
use std::path::Path;
use std::thread::{self, JoinHandle};

use cadenza_core::{CadenzaError, NoteEvent};
use crossbeam_channel::Sender;
use midly::{MidiMessage, Smf, TrackEventKind};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Line {line}: {message}")]
    BadLine { line: usize, message: String },
    #[error("Line {line}: {source}")]
    BadEvent {
        line: usize,
        #[source]
        source: CadenzaError,
    },
    #[error("Failed to read events: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse MIDI file: {0}")]
    Midi(#[from] midly::Error),
}

// ============================================================================
// Text events
// ============================================================================

fn parse_number(token: Option<&str>, what: &str, line: usize) -> Result<u8, SourceError> {
    let token = token.ok_or_else(|| SourceError::BadLine {
        line,
        message: format!("missing {what}"),
    })?;
    token.parse().map_err(|_| SourceError::BadLine {
        line,
        message: format!("invalid {what} '{token}'"),
    })
}

/// Parse one text event line: `on <note> <velocity>` or `off <note>`
///
/// Blank lines and `#` comments yield `Ok(None)`. `line` is 1-based and only used in errors.
pub fn parse_event_line(text: &str, line: usize) -> Result<Option<NoteEvent>, SourceError> {
    let text = text.split('#').next().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(None);
    }

    let mut tokens = text.split_whitespace();
    let command = tokens.next().unwrap_or_default().to_lowercase();
    let event = match command.as_str() {
        "on" => {
            let note = parse_number(tokens.next(), "note", line)?;
            let velocity = parse_number(tokens.next(), "velocity", line)?;
            NoteEvent::on(note, velocity)
        }
        "off" => NoteEvent::off(parse_number(tokens.next(), "note", line)?),
        other => {
            return Err(SourceError::BadLine {
                line,
                message: format!("unknown command '{other}'"),
            });
        }
    }
    .map_err(|source| SourceError::BadEvent { line, source })?;

    if let Some(extra) = tokens.next() {
        return Err(SourceError::BadLine {
            line,
            message: format!("unexpected '{extra}'"),
        });
    }
    Ok(Some(event))
}

/// Parse a whole text event script, failing on the first bad line
pub fn parse_events(text: &str) -> Result<Vec<NoteEvent>, SourceError> {
    let mut events = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(event) = parse_event_line(line, idx + 1)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Read text events from `reader` on a background thread and feed them into `tx`
///
/// Bad lines are logged and skipped so a live stream keeps going. The thread ends when the
/// reader is exhausted or the receiver goes away, dropping `tx` and closing the channel.
/// Returns the number of events sent.
pub fn spawn_text_reader<R>(reader: R, tx: Sender<NoteEvent>) -> JoinHandle<Result<usize, SourceError>>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let mut sent = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_event_line(&line, idx + 1) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                    sent += 1;
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping event: {}", e),
            }
        }
        info!(events = sent, "Event input closed");
        Ok(sent)
    })
}

// ============================================================================
// MIDI files
// ============================================================================

/// Note events of every track, merged in absolute tick order
///
/// Events on the same tick keep track order, then file order.
pub fn parse_midi(bytes: &[u8]) -> Result<Vec<NoteEvent>, SourceError> {
    let smf = Smf::parse(bytes)?;

    let mut timed = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            if let TrackEventKind::Midi { message, .. } = event.kind {
                let note_event = match message {
                    MidiMessage::NoteOn { key, vel } => NoteEvent::NoteOn {
                        note: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOff { key, .. } => NoteEvent::NoteOff { note: key.as_int() },
                    _ => continue,
                };
                timed.push((tick, note_event));
            }
        }
    }

    timed.sort_by_key(|(tick, _)| *tick);
    Ok(timed.into_iter().map(|(_, event)| event).collect())
}

pub fn load_midi_file(path: &Path) -> Result<Vec<NoteEvent>, SourceError> {
    let bytes = std::fs::read(path)?;
    let events = parse_midi(&bytes)?;
    info!(path = %path.display(), events = events.len(), "Loaded MIDI file");
    Ok(events)
}
