//! Session runner: one processing thread per listening session

use std::thread::{self, JoinHandle};

use cadenza_core::{ChordReport, NoteEvent, NoteSink, RandomSource, Session, SessionConfig};
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Session not running")]
    NotRunning,
    #[error("Session thread panicked")]
    Panicked,
}

/// Why a session's processing loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `stop()` was called
    Stopped,
    /// The event stream closed
    InputClosed,
}

/// A running listening session
///
/// Owns the processing thread. Chord reports are delivered on [`SessionRunner::reports`].
pub struct SessionRunner {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<SessionEnd>>,
    reports: Receiver<ChordReport>,
}

impl SessionRunner {
    /// Spawn the processing thread with a fresh session for `config`
    pub fn start<S, R>(config: SessionConfig, events: Receiver<NoteEvent>, sink: S, rng: R) -> Self
    where
        S: NoteSink + Send + 'static,
        R: RandomSource + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (report_tx, report_rx) = unbounded::<ChordReport>();

        info!(
            key = %config.key,
            style = %config.style,
            "Session started"
        );

        let handle = thread::spawn(move || {
            Self::process_loop(Session::new(config), events, stop_rx, report_tx, sink, rng)
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            reports: report_rx,
        }
    }

    pub fn reports(&self) -> &Receiver<ChordReport> {
        &self.reports
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the session to stop and wait for its thread
    ///
    /// Reports already produced stay readable on [`SessionRunner::reports`].
    pub fn stop(&mut self) -> Result<SessionEnd, ListenerError> {
        let handle = self.handle.take().ok_or(ListenerError::NotRunning)?;
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.try_send(());
        }
        handle.join().map_err(|_| ListenerError::Panicked)
    }

    /// Wait for the event stream to close on its own
    pub fn wait(mut self) -> Result<SessionEnd, ListenerError> {
        let handle = self.handle.take().ok_or(ListenerError::NotRunning)?;
        handle.join().map_err(|_| ListenerError::Panicked)
    }

    /// Hand every report to `emit` until the input closes or `interrupt` fires
    ///
    /// An interrupt stops the session; reports already produced are still delivered.
    /// A disconnected `interrupt` is ignored.
    pub fn run_until<F>(mut self, interrupt: &Receiver<()>, mut emit: F) -> Result<SessionEnd, ListenerError>
    where
        F: FnMut(ChordReport),
    {
        let reports = self.reports.clone();
        let idle = never::<()>();
        let mut armed = true;
        loop {
            let interrupt = if armed { interrupt } else { &idle };
            select! {
                recv(reports) -> msg => match msg {
                    Ok(report) => emit(report),
                    Err(_) => return self.wait(),
                },
                recv(interrupt) -> msg => match msg {
                    Ok(()) => {
                        info!("Interrupted, stopping session");
                        let end = self.stop()?;
                        reports.try_iter().for_each(&mut emit);
                        return Ok(end);
                    }
                    Err(_) => armed = false,
                },
            }
        }
    }

    fn process_loop<S: NoteSink, R: RandomSource>(
        mut session: Session,
        events: Receiver<NoteEvent>,
        stop_rx: Receiver<()>,
        reports: Sender<ChordReport>,
        mut sink: S,
        mut rng: R,
    ) -> SessionEnd {
        let end = loop {
            select! {
                recv(stop_rx) -> _ => break SessionEnd::Stopped,
                recv(events) -> msg => {
                    let Ok(event) = msg else { break SessionEnd::InputClosed };
                    debug!(?event, "Note event");
                    if let Some(report) = session.handle(event, &mut sink, &mut rng) {
                        info!(chord = %report.chord, suggestions = ?report.suggestions, "Chord detected");
                        let _ = reports.send(report);
                    }
                }
            }
        };
        info!(reason = ?end, "Session ended");
        end
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
