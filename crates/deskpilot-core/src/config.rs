use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for Deskpilot.
///
/// Loaded from `~/.deskpilot/config.toml` by default. Every section falls
/// back to its defaults when missing, so a partial file is always valid.
///
/// The kill switch is intentionally not part of the persisted configuration:
/// it is an in-memory emergency stop and starts disengaged on every launch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskpilotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub adapter: AdapterConfig,
}

impl DeskpilotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DeskpilotConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Directory for assistant state.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "~/.deskpilot".to_string(),
        }
    }
}

/// Safety policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Minimum seconds between two accepted commands.
    pub cooldown_seconds: f64,
    /// Start with safe mode enabled (safe-tier actions only).
    pub safe_mode: bool,
    /// Maximum accepted commands in any 60-second window.
    pub max_commands_per_minute: u32,
    /// Per-action confirmation overrides keyed by action name.
    ///
    /// An override can only add a confirmation step, never remove one the
    /// action catalog already requires.
    pub confirmation_required: BTreeMap<String, bool>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        let confirmation_required = [("shutdown", true), ("restart", true)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self {
            cooldown_seconds: 1.0,
            safe_mode: false,
            max_commands_per_minute: 30,
            confirmation_required,
        }
    }
}

/// Conversation session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of conversation turns kept in history.
    pub max_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_history: 10 }
    }
}

/// Settings for the OS command adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Where screenshots land when no explicit path is given.
    pub screenshot_dir: String,
    /// Extra app aliases (spoken name -> executable), merged over the
    /// built-in table.
    pub app_aliases: BTreeMap<String, String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            screenshot_dir: "~/Pictures/Screenshots".to_string(),
            app_aliases: BTreeMap::new(),
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };
    match (rest, home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}
