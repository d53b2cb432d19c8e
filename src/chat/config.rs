//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, the resolved
//! session configuration, and the small settings file that persists the
//! engine URL between runs.

use std::env;
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::default_engine_url;
use crate::error::{Error, Result};

/// Command-line arguments for the omnimind-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Engine base URL, overriding the persisted setting.
    #[arrrg(optional, "Engine URL (default: http://localhost:8000)", "URL")]
    pub engine_url: Option<String>,

    /// Transcript auto-save path.
    #[arrrg(optional, "Persist the transcript to this file", "PATH")]
    pub transcript: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Skip the startup connectivity probe.
    #[arrrg(flag, "Skip the startup engine health probe")]
    pub no_health_check: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after merging
/// command-line arguments, persisted settings, and defaults. Precedence
/// is flags, then the settings file, then built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Base URL of the engine.
    pub engine_url: String,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to probe the engine at startup.
    pub health_check: bool,

    /// Path to persist transcripts automatically after each assistant turn.
    pub transcript_path: Option<PathBuf>,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Engine URL: http://localhost:8000
    /// - Color: enabled
    /// - Health check: enabled
    pub fn new() -> Self {
        Self {
            engine_url: default_engine_url().to_string(),
            use_color: true,
            health_check: true,
            transcript_path: None,
        }
    }

    /// Sets the engine URL.
    pub fn with_engine_url(mut self, url: impl Into<String>) -> Self {
        self.engine_url = url.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Disables the startup health probe.
    pub fn without_health_check(mut self) -> Self {
        self.health_check = false;
        self
    }

    /// Sets the transcript auto-save path.
    pub fn with_transcript_path(mut self, path: Option<PathBuf>) -> Self {
        self.transcript_path = path;
        self
    }

    /// Resolves a config from args plus persisted settings.
    pub fn resolve(args: ChatArgs, settings: &Settings) -> Self {
        let engine_url = args
            .engine_url
            .or_else(|| settings.engine_url.clone())
            .unwrap_or_else(|| default_engine_url().to_string());
        ChatConfig {
            engine_url,
            use_color: !args.no_color,
            health_check: !args.no_health_check,
            transcript_path: args.transcript.map(PathBuf::from),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::resolve(args, &Settings::default())
    }
}

/// Settings persisted between runs.
///
/// Stored as JSON at the path named by the OMNIMIND_SETTINGS environment
/// variable, or `~/.omnimind/settings.json` by default. Today this only
/// carries the engine URL the user last selected with `/engine`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Engine base URL the user last selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,
}

impl Settings {
    /// The settings file location for this process.
    pub fn path() -> Option<PathBuf> {
        if let Ok(path) = env::var("OMNIMIND_SETTINGS") {
            return Some(PathBuf::from(path));
        }
        env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".omnimind").join("settings.json"))
    }

    /// Loads settings from disk. A missing or unreadable file yields the
    /// defaults; a corrupt file is an error the caller can report.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return Ok(Self::default()),
        };
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::serialization(
                format!("failed to parse settings at {}", path.display()),
                Some(Box::new(e)),
            )
        })
    }

    /// Saves settings to disk, creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::path() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            create_dir_all(parent)
                .map_err(|e| Error::io("failed to create settings directory", e))?;
        }
        let file = File::create(&path).map_err(|e| Error::io("failed to create settings file", e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| Error::serialization("failed to serialize settings", Some(Box::new(e))))
    }
}
