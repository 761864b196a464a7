//! Session setup validation and the on-disk config file

use std::path::{Path, PathBuf};

use cadenza_core::{parse_pitch_name, CadenzaError, Key, Mode, SessionConfig, Spelling, Style};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid session setup: {0}")]
    Invalid(#[from] CadenzaError),
}

/// User-facing session parameters, as typed on the command line or in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSetup {
    pub tonic: String,
    pub mode: String,
    pub style: String,
    pub seed: Option<u64>,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            tonic: "C".to_string(),
            mode: Mode::Ionian.key().to_string(),
            style: Style::Pop.name().to_string(),
            seed: None,
        }
    }
}

impl SessionSetup {
    /// Validate into the typed config the core consumes
    ///
    /// The spelling preference is fixed here from the tonic as written, so "A#" and "Bb"
    /// name the same key but spell its chords differently.
    pub fn validate(&self) -> Result<SessionConfig, ConfigError> {
        let tonic = parse_pitch_name(&self.tonic)?;
        let mode: Mode = self.mode.parse()?;
        let style = self.style.parse::<Style>().unwrap_or_default();
        let key = Key::new(tonic, mode).with_spelling(Spelling::for_tonic_name(&self.tonic));
        Ok(SessionConfig { key, style })
    }

    /// Random source for embellishments; seeded when a seed is configured
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenzaConfig {
    #[serde(default)]
    pub session: SessionSetup,
}

impl CadenzaConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Load the config at `path`; a missing file yields the defaults
pub fn load_config_from(path: &Path) -> Result<CadenzaConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(s) => {
            let config = CadenzaConfig::from_toml(&s)?;
            info!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(CadenzaConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn load_config() -> Result<CadenzaConfig, ConfigError> {
    load_config_from(&config_path())
}

pub fn save_config_to(path: &Path, config: &CadenzaConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml()?)?;
    info!(path = %path.display(), "Saved config");
    Ok(())
}

pub fn save_config(config: &CadenzaConfig) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}
