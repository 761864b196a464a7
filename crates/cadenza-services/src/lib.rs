//! cadenza-services: Session runner, note sources and sinks, and configuration

pub mod config;
pub mod listener;
pub mod passthrough;
pub mod sources;

pub use config::{config_path, load_config, save_config, CadenzaConfig, ConfigError, SessionSetup};
pub use listener::{ListenerError, SessionEnd, SessionRunner};
pub use passthrough::{ChannelSink, LogSink, NullSink};
pub use sources::{load_midi_file, parse_event_line, parse_events, parse_midi, spawn_text_reader, SourceError};
