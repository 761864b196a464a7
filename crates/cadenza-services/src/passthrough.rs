//! Note sinks standing in for the monitoring output device

use cadenza_core::{NoteEvent, NoteSink};
use crossbeam_channel::Sender;
use tracing::debug;

/// Discards every note
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NoteSink for NullSink {
    fn note_on(&mut self, _note: u8, _velocity: u8) {}

    fn note_off(&mut self, _note: u8) {}
}

/// Logs each forwarded note at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NoteSink for LogSink {
    fn note_on(&mut self, note: u8, velocity: u8) {
        debug!(note, velocity, "Passthrough note on");
    }

    fn note_off(&mut self, note: u8) {
        debug!(note, "Passthrough note off");
    }
}

/// Forwards notes over a channel; a disconnected receiver drops them silently
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<NoteEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<NoteEvent>) -> Self {
        Self { tx }
    }
}

impl NoteSink for ChannelSink {
    fn note_on(&mut self, note: u8, velocity: u8) {
        let _ = self.tx.try_send(NoteEvent::NoteOn { note, velocity });
    }

    fn note_off(&mut self, note: u8) {
        let _ = self.tx.try_send(NoteEvent::NoteOff { note });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (tx, rx) = unbounded();
        let mut sink = ChannelSink::new(tx);
        sink.note_on(60, 90);
        sink.note_off(60);
        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, [NoteEvent::NoteOn { note: 60, velocity: 90 }, NoteEvent::NoteOff { note: 60 }]);
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        sink.note_on(60, 90);
        sink.note_off(60);
    }
}
