//! CLI argument definitions for the Deskpilot binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Deskpilot: a local desktop assistant driven by typed commands.
#[derive(Parser, Debug)]
#[command(name = "deskpilot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Start in safe mode (read-only commands only).
    #[arg(short = 's', long = "safe-mode")]
    pub safe_mode: bool,

    /// Run a single command and exit.
    #[arg(short = 'e', long = "command")]
    pub command: Option<String>,

    /// Hide the banner.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Report what would run instead of touching the system.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Start with the kill switch engaged.
    #[arg(long = "kill-switch")]
    pub kill_switch: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > DESKPILOT_CONFIG env var > ~/.deskpilot/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        resolve_config_path(self.config.as_ref(), std::env::var("DESKPILOT_CONFIG").ok())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn resolve_config_path(flag: Option<&PathBuf>, env: Option<String>) -> PathBuf {
    if let Some(p) = flag {
        return p.clone();
    }
    if let Some(p) = env.filter(|p| !p.is_empty()) {
        return PathBuf::from(p);
    }
    default_config_path()
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    deskpilot_core::config::expand_home("~/.deskpilot/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "deskpilot", "-s", "-q", "--dry-run", "-e", "open chrome", "-l", "debug",
        ]);
        assert!(args.safe_mode);
        assert!(args.quiet);
        assert!(args.dry_run);
        assert!(!args.kill_switch);
        assert_eq!(args.command.as_deref(), Some("open chrome"));
        assert_eq!(args.resolve_log_level("info"), "debug");
    }

    #[test]
    fn test_log_level_falls_back_to_config() {
        let args = CliArgs::parse_from(["deskpilot"]);
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }

    #[test]
    fn test_config_path_priority() {
        let flag = PathBuf::from("/etc/deskpilot.toml");
        assert_eq!(
            resolve_config_path(Some(&flag), Some("/tmp/env.toml".to_string())),
            flag
        );
        assert_eq!(
            resolve_config_path(None, Some("/tmp/env.toml".to_string())),
            PathBuf::from("/tmp/env.toml")
        );
        assert!(resolve_config_path(None, Some(String::new())).ends_with(".deskpilot/config.toml"));
        assert!(resolve_config_path(None, None).ends_with(".deskpilot/config.toml"));
    }
}
