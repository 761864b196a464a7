//! Subcommand implementations

use std::io::BufReader;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use cadenza_core::{
    identify as identify_chord, suggest as suggest_next, Chord, ChordReport, Detection, PitchClass,
    SessionConfig,
};
use cadenza_services::{
    config_path, load_config, load_midi_file, save_config, spawn_text_reader, CadenzaConfig, LogSink,
    SessionEnd, SessionRunner, SessionSetup,
};
use crossbeam_channel::{bounded, unbounded, Receiver};
use serde_json::json;
use tracing::{info, warn};

use crate::SessionArgs;

/// Effective setup: config file values overridden by flags
fn resolve(args: SessionArgs) -> Result<(SessionSetup, SessionConfig)> {
    let file = load_config().context("Failed to load config")?;
    let setup = args.merge(file.session);
    let config = setup.validate().context("Invalid session settings")?;
    Ok((setup, config))
}

pub fn listen(args: SessionArgs, midi_file: Option<PathBuf>, json: bool) -> Result<()> {
    let (setup, config) = resolve(args)?;
    let (tx, rx) = unbounded();

    let reader = match midi_file {
        Some(path) => {
            let events = load_midi_file(&path)
                .with_context(|| format!("Failed to load MIDI file {}", path.display()))?;
            for event in events {
                let _ = tx.send(event);
            }
            drop(tx);
            None
        }
        None => {
            info!("Reading note events from stdin");
            Some(spawn_text_reader(BufReader::new(std::io::stdin()), tx))
        }
    };

    let runner = SessionRunner::start(config, rx, LogSink, setup.rng());
    let end = runner.run_until(&interrupt_signal(), |report| print_report(&report, json))?;

    // An interrupted reader is still blocked on stdin; leave it to process exit
    if let (SessionEnd::InputClosed, Some(reader)) = (end, reader) {
        reader
            .join()
            .map_err(|_| anyhow::anyhow!("Event reader panicked"))?
            .context("Failed to read events")?;
    }
    Ok(())
}

/// Fires once on Ctrl-C; disconnects if the handler cannot be installed
fn interrupt_signal() -> Receiver<()> {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to start signal handler: {}", e);
                return;
            }
        };
        match runtime.block_on(tokio::signal::ctrl_c()) {
            Ok(()) => {
                info!("Received SIGINT, shutting down...");
                let _ = tx.send(());
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
    rx
}

fn print_report(report: &ChordReport, json: bool) {
    if !json {
        println!("{report}");
        return;
    }
    match serde_json::to_string(report) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!("Failed to encode report: {}", e),
    }
}

pub fn identify(args: SessionArgs, notes: &[u8], json: bool) -> Result<()> {
    let (_, config) = resolve(args)?;
    let pitches = notes.iter().map(|&n| PitchClass::from_midi(n));

    let label = identify_chord(pitches, &config.key).map(|d| d.label());
    if json {
        println!("{}", json!({ "key": config.key.to_string(), "chord": label }));
        return Ok(());
    }
    match label {
        Some(label) => println!("{label}"),
        None => println!("Not enough distinct pitch classes for a chord"),
    }
    Ok(())
}

pub fn suggest(args: SessionArgs, symbol: &str, json: bool) -> Result<()> {
    let (setup, config) = resolve(args)?;
    let chord = Chord::from_symbol(symbol, &config.key)?;
    let current = Detection::Chord(chord);

    let suggestions: Vec<String> = suggest_next(&current, &config.key, config.style, &mut setup.rng())
        .into_iter()
        .map(|s| s.symbol)
        .collect();

    if json {
        println!("{}", json!({ "chord": current.label(), "suggestions": suggestions }));
    } else {
        println!("{} -> {}", current, suggestions.join(", "));
    }
    Ok(())
}

pub fn degrees(args: SessionArgs, json: bool) -> Result<()> {
    let (_, config) = resolve(args)?;
    let chords = config.key.diatonic_chords();

    if json {
        let rows: Vec<_> = chords
            .iter()
            .map(|c| json!({ "root": c.name, "degree": c.degree.label(), "quality": c.degree.quality.name() }))
            .collect();
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }

    println!("{}", config.key);
    for chord in chords {
        println!("  {chord}");
    }
    Ok(())
}

pub fn config(args: SessionArgs, save: bool) -> Result<()> {
    let (setup, _) = resolve(args)?;
    let config = CadenzaConfig { session: setup };

    if save {
        save_config(&config).context("Failed to save config")?;
    }
    println!("# {}", config_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}
