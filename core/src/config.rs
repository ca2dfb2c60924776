//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for movie settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::movie::MovieFormat;

/// File name inside the configuration directory
pub const CONFIG_FILE: &str = "config.toml";

/// Movie configuration.
///
/// Serialized to/from TOML; every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MovieConfig {
    /// On-screen status settings
    #[serde(default)]
    pub display: DisplayConfig,
    /// Recording settings
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Script sandbox settings
    #[serde(default)]
    pub script: ScriptConfig,
}

/// What the status text shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show the frame counter (default: true)
    #[serde(default = "default_true")]
    pub frame_counter: bool,
    /// Show the lag counter (default: false)
    #[serde(default)]
    pub lag_counter: bool,
    /// Show per-peripheral input (default: false)
    #[serde(default)]
    pub input_display: bool,
}

/// Recording configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Profile used when the destination has no known extension (default: binary)
    #[serde(default = "default_format")]
    pub default_format: MovieFormat,
    /// LZ4-compress binary movies (default: true)
    #[serde(default = "default_true")]
    pub compress: bool,
    /// Author stamped into new movies
    #[serde(default)]
    pub author: Option<String>,
    /// Where the start snapshot of a mid-session recording is written
    /// (default: system temp directory)
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pause the host when a movie ends (default: false)
    #[serde(default)]
    pub pause_on_playback: bool,
    /// Duration of on-screen notifications in milliseconds (default: 2000)
    #[serde(default = "default_message_duration")]
    pub message_duration_ms: u32,
}

/// Script sandbox configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Instructions a script may run before yielding; 0 disables (default: 10M)
    #[serde(default = "default_instruction_budget")]
    pub instruction_budget: u32,
}

fn default_true() -> bool {
    true
}
fn default_format() -> MovieFormat {
    MovieFormat::Binary
}
fn default_message_duration() -> u32 {
    2000
}
fn default_instruction_budget() -> u32 {
    10_000_000
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_counter: default_true(),
            lag_counter: false,
            input_display: false,
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            compress: default_true(),
            author: None,
            snapshot_dir: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            pause_on_playback: false,
            message_duration_ms: default_message_duration(),
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            instruction_budget: default_instruction_budget(),
        }
    }
}

impl RecordingConfig {
    /// Snapshot written when recording starts mid-session
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join("inputreel-start.sav")
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\inputreel\config`
/// On macOS: `~/Library/Application Support/io.inputreel.inputreel`
/// On Linux: `~/.config/inputreel`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.inputreel", "", "inputreel")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> MovieConfig {
    config_dir()
        .map(|dir| load_from(&dir.join(CONFIG_FILE)))
        .unwrap_or_default()
}

/// Loads a configuration file, falling back to defaults.
pub fn load_from(path: &Path) -> MovieConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "invalid config, using defaults: {e}");
            MovieConfig::default()
        }),
        Err(_) => MovieConfig::default(),
    }
}

/// Saves the configuration to disk.
///
/// Creates the directory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &MovieConfig) -> anyhow::Result<()> {
    if let Some(dir) = config_dir() {
        save_to(config, &dir.join(CONFIG_FILE))?;
    }
    Ok(())
}

/// Saves a configuration to an explicit path.
pub fn save_to(config: &MovieConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MovieConfig = toml::from_str(
            r#"
            [recording]
            author = "tas"
            default_format = "text"

            [playback]
            pause_on_playback = true
            "#,
        )
        .unwrap();

        assert_eq!(config.recording.author.as_deref(), Some("tas"));
        assert_eq!(config.recording.default_format, MovieFormat::Text);
        assert!(config.recording.compress);
        assert!(config.playback.pause_on_playback);
        assert_eq!(config.playback.message_duration_ms, 2000);
        assert_eq!(config.script, ScriptConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = MovieConfig::default();
        config.display.lag_counter = true;
        config.script.instruction_budget = 42;
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "display = 3").unwrap();
        assert_eq!(load_from(&path), MovieConfig::default());
        assert_eq!(load_from(&dir.path().join("missing.toml")), MovieConfig::default());
    }
}
