//! Defines all configuration structures for the Overlayclock server.
//!
//! These structs are deserialized with `serde` through the `config` crate, so
//! the bind address, message defaults and speech backend can be set from a
//! TOML file or from `OVERLAY__*` environment variables without touching code.
//! Every field has a default; an empty configuration is valid.

use crate::components::banner::DEFAULT_MESSAGE_COLOR;
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// The top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Where the HTTP control API listens.
    pub server: ServerConfig,

    /// Values used when a command leaves an optional field out.
    pub defaults: DefaultsConfig,

    /// The text-to-speech side-channel fed by new messages.
    pub speech: SpeechConfig,
}

/// Bind address of the HTTP control API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Fallbacks for optional command fields.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub message_color: String,
    /// Seconds a message stays up when no duration is given.
    pub message_duration: f64,
    /// Seconds an event stays active when no duration is given.
    pub event_duration: f64,
}

/// How message text is spoken.
///
/// `args` are passed to `command` after substituting `{language}` and `{text}`.
/// Keep a `--` before `{text}` so a message starting with `-` is not read as
/// an option.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
    /// Voice used when detection is off or unsure.
    pub language: String,
    /// Pick the voice per message from the detected language.
    pub detect_language: bool,
}

// --- Default values ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            message_color: DEFAULT_MESSAGE_COLOR.to_string(),
            message_duration: 5.0,
            event_duration: 5.0,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "espeak-ng".to_string(),
            args: vec![
                "-v".to_string(),
                "{language}".to_string(),
                "--".to_string(),
                "{text}".to_string(),
            ],
            language: "fr".to_string(),
            detect_language: true,
        }
    }
}

impl ServerConfig {
    /// The `host:port` string handed to the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl OverlayConfig {
    /// Loads defaults, then the optional TOML file, then `OVERLAY__` environment
    /// variables (e.g. `OVERLAY__SERVER__PORT=9000`), later sources winning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix("OVERLAY")
                .separator("__")
                .try_parsing(true),
        );
        let loaded: Self = builder
            .build()
            .context("Failed to read overlay configuration")?
            .try_deserialize()
            .context("Invalid overlay configuration")?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml(source: &str) -> Result<Self> {
        let parsed: Self = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .context("Failed to parse overlay configuration")?
            .try_deserialize()
            .context("Invalid overlay configuration")?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Rejects defaults that would make every command without an explicit
    /// value fail.
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("defaults.message_duration", self.defaults.message_duration),
            ("defaults.event_duration", self.defaults.event_duration),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Invalid overlay configuration: {key} must be a non-negative number, got {value}"
            );
        }
        Ok(())
    }
}
