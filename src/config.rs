//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `--config <path>` on the command line
//! 2. `$SPAMBEGONE_CONFIG` (environment variable)
//! 3. `~/.config/spambegone/config.toml` (Linux/macOS)
//!    `%APPDATA%\spambegone\config.toml` (Windows)
//! 4. Built-in defaults
//!
//! A missing file means defaults. A file that exists but cannot be read or
//! parsed is a startup failure: the sweep never runs on a half-understood
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Rule list and metrics file locations.
    pub rules: RulesConfig,
    /// Mail store and folder settings.
    pub mailbox: MailboxConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override directory for the log file.
    pub log_dir: Option<PathBuf>,
}

/// Rule list and metrics file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Newline-delimited blacklist phrases.
    pub blacklist: PathBuf,
    /// Newline-delimited whitelist entries.
    pub whitelist: PathBuf,
    /// Append-only metrics log.
    pub metrics: PathBuf,
}

/// Mail store and folder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Directory holding one mbox file per folder.
    pub root: Option<PathBuf>,
    /// Folder to sweep.
    pub select_folder: String,
    /// Folder that receives trashed messages.
    pub trash_folder: String,
    /// Actually relocate matches (false = report only).
    pub move_to_trash: bool,
    /// List available folders at the start of a scan.
    pub show_folders: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            blacklist: PathBuf::from("Blacklist.txt"),
            whitelist: PathBuf::from("Whitelist.txt"),
            metrics: PathBuf::from("TrashMetrics.txt"),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            root: None,
            select_folder: "INBOX".to_string(),
            trash_folder: "Trash".to_string(),
            move_to_trash: true,
            show_folders: true,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `explicit` or the standard locations.
///
/// Returns the default configuration when no file exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(SpamError::FileNotFound(p.to_path_buf()));
            }
            p.to_path_buf()
        }
        None => match config_file_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No config file found, using defaults");
                return Ok(Config::default());
            }
        },
    };
    load_config_from(&path)
}

/// Read and parse one configuration file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| SpamError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let cfg = toml::from_str::<Config>(&contents).map_err(|e| SpamError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SPAMBEGONE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("spambegone").join("config.toml"))
}

/// Return the directory for the log file.
pub fn log_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.log_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("spambegone")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.rules.blacklist, PathBuf::from("Blacklist.txt"));
        assert_eq!(cfg.rules.metrics, PathBuf::from("TrashMetrics.txt"));
        assert_eq!(cfg.mailbox.select_folder, "INBOX");
        assert_eq!(cfg.mailbox.trash_folder, "Trash");
        assert!(cfg.mailbox.move_to_trash);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[mailbox]
trash_folder = "Bulk Mail"
move_to_trash = false
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.mailbox.trash_folder, "Bulk Mail");
        assert!(!cfg.mailbox.move_to_trash);
        // Other fields use defaults
        assert_eq!(cfg.mailbox.select_folder, "INBOX");
        assert_eq!(cfg.rules.whitelist, PathBuf::from("Whitelist.txt"));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[mailbox\nroot = 3").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, SpamError::Config { .. }));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, SpamError::FileNotFound(_)));
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[rules]\nblacklist = \"/etc/spam/black.txt\"\n[general]\nlog_level = \"debug\"\n",
        )
        .unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.rules.blacklist, PathBuf::from("/etc/spam/black.txt"));
        assert_eq!(cfg.general.log_level, "debug");
    }
}
