//! cadenza: Live chord identification and next-chord suggestions
//!
//! Subcommands:
//! - `cadenza listen` - Run a session over text events on stdin or a MIDI file
//! - `cadenza identify <notes>...` - Name the chord formed by MIDI note numbers
//! - `cadenza suggest <chord>` - Suggest what could follow a chord symbol
//! - `cadenza degrees` - List the diatonic chords of a key
//! - `cadenza config` - Show or save the session defaults

use std::path::PathBuf;

use anyhow::Result;
use cadenza_services::SessionSetup;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(about = "Modal chord identification and progression suggestions")]
#[command(version)]
struct Cli {
    /// Print results as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for note events and report each new chord
    Listen {
        #[command(flatten)]
        session: SessionArgs,

        /// Play a Standard MIDI File instead of reading text events from stdin
        #[arg(long)]
        midi_file: Option<PathBuf>,
    },

    /// Identify the chord formed by MIDI note numbers
    Identify {
        #[command(flatten)]
        session: SessionArgs,

        /// MIDI note numbers (0-127)
        #[arg(required = true, value_parser = clap::value_parser!(u8).range(0..=127))]
        notes: Vec<u8>,
    },

    /// Suggest next chords after a chord symbol such as D7 or Bbmaj7
    Suggest {
        #[command(flatten)]
        session: SessionArgs,

        /// Chord symbol
        chord: String,
    },

    /// List the diatonic chords of a key
    Degrees {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Show the effective session defaults
    Config {
        #[command(flatten)]
        session: SessionArgs,

        /// Persist the effective settings to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Session overrides; unset values come from the config file
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Tonic, e.g. C, F#, Bb
    #[arg(short, long)]
    tonic: Option<String>,

    /// Mode: ionian, dorian, phrygian, lydian, mixolydian, aeolian, aeolian_h, aeolian_m, locrian
    #[arg(short, long)]
    mode: Option<String>,

    /// Style: pop, jazz, classical or other
    #[arg(short, long)]
    style: Option<String>,

    /// Seed for reproducible embellishments
    #[arg(long)]
    seed: Option<u64>,
}

impl SessionArgs {
    /// Apply these overrides on top of `base`
    pub fn merge(self, base: SessionSetup) -> SessionSetup {
        SessionSetup {
            tonic: self.tonic.unwrap_or(base.tonic),
            mode: self.mode.unwrap_or(base.mode),
            style: self.style.unwrap_or(base.style),
            seed: self.seed.or(base.seed),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("cadenza=info".parse()?))
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::Listen { session, midi_file } => commands::listen(session, midi_file, json),
        Commands::Identify { session, notes } => commands::identify(session, &notes, json),
        Commands::Suggest { session, chord } => commands::suggest(session, &chord, json),
        Commands::Degrees { session } => commands::degrees(session, json),
        Commands::Config { session, save } => commands::config(session, save),
    }
}
