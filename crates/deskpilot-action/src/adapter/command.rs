//! Adapter that drives the desktop through platform command-line tools.
//!
//! Each operation maps to a list of candidate commands for the current
//! platform; the first one that succeeds wins. Process execution goes
//! through a [`CommandRunner`] so command selection can be tested without
//! touching the machine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use chrono::Local;
use deskpilot_core::config::{expand_home, AdapterConfig};
use deskpilot_core::error::DeskpilotError;
use regex::Regex;
use serde_json::json;

use super::SystemAdapter;
use crate::error::ActionError;
use crate::types::ActionResult;

// =============================================================================
// Platform
// =============================================================================

/// Desktop platforms with a command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Detect the platform this binary runs on.
    pub fn current() -> Result<Self, DeskpilotError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform.
    pub fn from_os(os: &str) -> Result<Self, DeskpilotError> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            "windows" => Ok(Platform::Windows),
            other => Err(DeskpilotError::UnsupportedPlatform(other.to_string())),
        }
    }

    fn builtin_aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Platform::Linux => &[
                ("chrome", "google-chrome"),
                ("chromium", "chromium-browser"),
                ("firefox", "firefox"),
                ("terminal", "gnome-terminal"),
                ("files", "nautilus"),
                ("file manager", "nautilus"),
                ("calculator", "gnome-calculator"),
                ("settings", "gnome-control-center"),
                ("text editor", "gedit"),
                ("code", "code"),
                ("vscode", "code"),
            ],
            Platform::MacOs => &[
                ("chrome", "Google Chrome"),
                ("firefox", "Firefox"),
                ("safari", "Safari"),
                ("terminal", "Terminal"),
                ("files", "Finder"),
                ("finder", "Finder"),
                ("calculator", "Calculator"),
                ("settings", "System Settings"),
                ("notes", "Notes"),
                ("code", "Visual Studio Code"),
                ("vscode", "Visual Studio Code"),
            ],
            Platform::Windows => &[
                ("chrome", "chrome"),
                ("firefox", "firefox"),
                ("edge", "msedge"),
                ("notepad", "notepad"),
                ("calculator", "calc"),
                ("terminal", "cmd"),
                ("files", "explorer"),
                ("explorer", "explorer"),
                ("settings", "ms-settings:"),
                ("code", "code"),
                ("vscode", "code"),
            ],
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

// =============================================================================
// Command execution
// =============================================================================

/// A program invocation without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes [`CommandSpec`]s.
pub trait CommandRunner: Send + Sync {
    /// Run to completion; a non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<(), ActionError>;
    /// Start detached and return immediately.
    fn spawn(&self, spec: &CommandSpec) -> Result<(), ActionError>;
    /// Run to completion and capture stdout.
    fn output(&self, spec: &CommandSpec) -> Result<String, ActionError>;
}

/// Runs commands with `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<(), ActionError> {
        let status = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(ActionError::CommandFailed {
                program: spec.program.clone(),
                reason: status.to_string(),
            })
        }
    }

    fn spawn(&self, spec: &CommandSpec) -> Result<(), ActionError> {
        Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }

    fn output(&self, spec: &CommandSpec) -> Result<String, ActionError> {
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(ActionError::CommandFailed {
                program: spec.program.clone(),
                reason: output.status.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// =============================================================================
// CommandAdapter
// =============================================================================

/// [`SystemAdapter`] backed by the platform's command-line tools.
pub struct CommandAdapter<R: CommandRunner = SystemRunner> {
    platform: Platform,
    runner: R,
    aliases: BTreeMap<String, String>,
    screenshot_dir: PathBuf,
    power_supply_dir: PathBuf,
}

impl CommandAdapter<SystemRunner> {
    /// Create an adapter for the platform this binary runs on.
    pub fn for_current_platform(config: &AdapterConfig) -> Result<Self, DeskpilotError> {
        Ok(Self::new(Platform::current()?, config))
    }

    pub fn new(platform: Platform, config: &AdapterConfig) -> Self {
        Self::with_runner(platform, config, SystemRunner)
    }
}

impl<R: CommandRunner> CommandAdapter<R> {
    /// Create an adapter that executes through `runner`.
    pub fn with_runner(platform: Platform, config: &AdapterConfig, runner: R) -> Self {
        let mut aliases: BTreeMap<String, String> = platform
            .builtin_aliases()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (name, target) in &config.app_aliases {
            aliases.insert(name.to_lowercase(), target.clone());
        }
        Self {
            platform,
            runner,
            aliases,
            screenshot_dir: expand_home(&config.screenshot_dir),
            power_supply_dir: PathBuf::from("/sys/class/power_supply"),
        }
    }

    /// Read battery state from a different sysfs root (Linux only).
    pub fn with_power_supply_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.power_supply_dir = dir.into();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve a spoken app name through the alias table.
    pub fn resolve_app(&self, app_name: &str) -> String {
        let key = app_name.trim().to_lowercase();
        self.aliases.get(&key).cloned().unwrap_or(key)
    }

    /// Run candidates in order until one succeeds.
    fn run_first(&self, candidates: Vec<CommandSpec>) -> Result<(), ActionError> {
        let mut last_err = None;
        for spec in candidates {
            match self.runner.run(&spec) {
                Ok(()) => {
                    tracing::debug!(command = %spec, "Command succeeded");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(command = %spec, error = %e, "Command failed, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            ActionError::HandlerFailed(format!("no command available on {}", self.platform))
        }))
    }

    /// Hand a URL or path to the desktop's default handler.
    ///
    /// Never routed through `cmd.exe`: `start` would interpret `&`, `|` and
    /// `^` inside the target.
    fn opener(&self, target: &str) -> CommandSpec {
        match self.platform {
            Platform::Linux => CommandSpec::new("xdg-open", &[target]),
            Platform::MacOs => CommandSpec::new("open", &[target]),
            Platform::Windows => {
                CommandSpec::new("rundll32", &["url.dll,FileProtocolHandler", target])
            }
        }
    }

    fn app_launcher(&self, app: &str) -> CommandSpec {
        match self.platform {
            Platform::Linux => {
                let mut parts = app.split_whitespace();
                let program = parts.next().unwrap_or(app);
                let args: Vec<&str> = parts.collect();
                CommandSpec::new(program, &args)
            }
            Platform::MacOs => CommandSpec::new("open", &["-a", app]),
            // Start-Process resolves App Paths entries like `start` does.
            Platform::Windows => CommandSpec::new("powershell", &["-NoProfile", "-Command"])
                .arg(format!("Start-Process -FilePath {}", powershell_quote(app))),
        }
    }

    fn volume_commands(&self, level: u8) -> Vec<CommandSpec> {
        match self.platform {
            Platform::Linux => vec![
                CommandSpec::new("pactl", &["set-sink-volume", "@DEFAULT_SINK@"])
                    .arg(format!("{}%", level)),
                CommandSpec::new("amixer", &["set", "Master"]).arg(format!("{}%", level)),
            ],
            Platform::MacOs => vec![CommandSpec::new("osascript", &["-e"])
                .arg(format!("set volume output volume {}", level))],
            Platform::Windows => {
                // Each volume-up key press moves the mixer by 2%.
                let script = format!(
                    "$w = New-Object -ComObject WScript.Shell; \
                     for ($i = 0; $i -lt 50; $i++) {{ $w.SendKeys([char]174) }}; \
                     for ($i = 0; $i -lt {}; $i++) {{ $w.SendKeys([char]175) }}",
                    level / 2
                );
                vec![CommandSpec::new("powershell", &["-Command"]).arg(script)]
            }
        }
    }

    fn mute_commands(&self, mute: bool) -> Vec<CommandSpec> {
        match self.platform {
            Platform::Linux => vec![
                CommandSpec::new(
                    "pactl",
                    &["set-sink-mute", "@DEFAULT_SINK@", if mute { "1" } else { "0" }],
                ),
                CommandSpec::new("amixer", &["set", "Master", if mute { "mute" } else { "unmute" }]),
            ],
            Platform::MacOs => vec![CommandSpec::new("osascript", &["-e"])
                .arg(format!("set volume output muted {}", mute))],
            // The mute key toggles; Windows has no separate unmute key.
            Platform::Windows => vec![CommandSpec::new(
                "powershell",
                &["-Command", "(New-Object -ComObject WScript.Shell).SendKeys([char]173)"],
            )],
        }
    }

    fn screenshot_commands(&self, path: &str) -> Vec<CommandSpec> {
        match self.platform {
            Platform::Linux => vec![
                CommandSpec::new("gnome-screenshot", &["-f", path]),
                CommandSpec::new("scrot", &[path]),
                CommandSpec::new("grim", &[path]),
            ],
            Platform::MacOs => vec![CommandSpec::new("screencapture", &["-x", path])],
            Platform::Windows => {
                let script = format!(
                    "Add-Type -AssemblyName System.Windows.Forms,System.Drawing; \
                     $b = [System.Windows.Forms.Screen]::PrimaryScreen.Bounds; \
                     $bmp = New-Object System.Drawing.Bitmap $b.Width, $b.Height; \
                     $g = [System.Drawing.Graphics]::FromImage($bmp); \
                     $g.CopyFromScreen($b.Location, [System.Drawing.Point]::Empty, $b.Size); \
                     $bmp.Save({})",
                    powershell_quote(path)
                );
                vec![CommandSpec::new("powershell", &["-Command"]).arg(script)]
            }
        }
    }

    fn power_commands(&self, reboot: bool) -> Vec<CommandSpec> {
        match (self.platform, reboot) {
            (Platform::Linux, false) => vec![CommandSpec::new("systemctl", &["poweroff"])],
            (Platform::Linux, true) => vec![CommandSpec::new("systemctl", &["reboot"])],
            (Platform::MacOs, false) => vec![CommandSpec::new(
                "osascript",
                &["-e", "tell app \"System Events\" to shut down"],
            )],
            (Platform::MacOs, true) => vec![CommandSpec::new(
                "osascript",
                &["-e", "tell app \"System Events\" to restart"],
            )],
            (Platform::Windows, false) => vec![CommandSpec::new("shutdown", &["/s", "/t", "5"])],
            (Platform::Windows, true) => vec![CommandSpec::new("shutdown", &["/r", "/t", "5"])],
        }
    }

    fn lock_commands(&self) -> Vec<CommandSpec> {
        match self.platform {
            Platform::Linux => vec![
                CommandSpec::new("loginctl", &["lock-session"]),
                CommandSpec::new("gnome-screensaver-command", &["-l"]),
                CommandSpec::new("xdg-screensaver", &["lock"]),
            ],
            Platform::MacOs => vec![CommandSpec::new("pmset", &["displaysleepnow"])],
            Platform::Windows => vec![CommandSpec::new(
                "rundll32.exe",
                &["user32.dll,LockWorkStation"],
            )],
        }
    }

    fn default_screenshot_path(&self) -> Result<PathBuf, ActionError> {
        std::fs::create_dir_all(&self.screenshot_dir)?;
        let name = format!("screenshot_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        Ok(self.screenshot_dir.join(name))
    }

    fn linux_battery(&self) -> Result<ActionResult, ActionError> {
        let Some(battery) = find_battery_dir(&self.power_supply_dir) else {
            return Ok(ActionResult::failure("Could not read battery status"));
        };
        let capacity = std::fs::read_to_string(battery.join("capacity"))?;
        let Ok(percentage) = capacity.trim().parse::<u8>() else {
            return Ok(ActionResult::failure(format!(
                "Unexpected battery capacity: {}",
                capacity.trim()
            )));
        };
        let status = std::fs::read_to_string(battery.join("status"))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "Unknown".to_string());
        Ok(battery_result(percentage, &status))
    }
}

impl<R: CommandRunner> SystemAdapter for CommandAdapter<R> {
    fn name(&self) -> &str {
        "command"
    }

    fn open_app(&self, app_name: &str) -> Result<ActionResult, ActionError> {
        if app_name.trim().is_empty() {
            return Err(ActionError::InvalidParameter(
                "app name must not be empty".to_string(),
            ));
        }
        let app = self.resolve_app(app_name);
        self.runner.spawn(&self.app_launcher(&app))?;
        tracing::info!(app = %app, "Launched application");
        Ok(ActionResult::success(format!("Opening {}", app_name)))
    }

    fn open_file(&self, path: &str) -> Result<ActionResult, ActionError> {
        if path.trim().is_empty() {
            return Err(ActionError::InvalidParameter("path must not be empty".to_string()));
        }
        let expanded = expand_home(path);
        if !expanded.exists() {
            return Ok(ActionResult::failure(format!("File not found: {}", path)));
        }
        let target = expanded.to_string_lossy();
        let spec = match self.platform {
            Platform::Windows => CommandSpec::new("explorer", &[&target]),
            _ => self.opener(&target),
        };
        self.runner.spawn(&spec)?;
        Ok(ActionResult::success(format!("Opening file: {}", path)))
    }

    fn open_folder(&self, path: &str) -> Result<ActionResult, ActionError> {
        if path.trim().is_empty() {
            return Err(ActionError::InvalidParameter("path must not be empty".to_string()));
        }
        let expanded = expand_home(path);
        if !expanded.is_dir() {
            return Ok(ActionResult::failure(format!("Folder not found: {}", path)));
        }
        let target = expanded.to_string_lossy();
        let spec = match self.platform {
            Platform::Windows => CommandSpec::new("explorer", &[&target]),
            _ => self.opener(&target),
        };
        self.runner.spawn(&spec)?;
        Ok(ActionResult::success(format!("Opening folder: {}", path)))
    }

    fn open_url(&self, url: &str) -> Result<ActionResult, ActionError> {
        if url.trim().is_empty() {
            return Err(ActionError::InvalidParameter("URL must not be empty".to_string()));
        }
        let url = normalize_url(url);
        self.runner.spawn(&self.opener(&url))?;
        tracing::info!(url = %url, "Opened URL");
        Ok(ActionResult::success(format!("Opening URL: {}", url)))
    }

    fn adjust_volume(&self, level: u8) -> Result<ActionResult, ActionError> {
        let level = level.min(100);
        self.run_first(self.volume_commands(level))?;
        Ok(ActionResult::success(format!("Volume set to {}%", level)))
    }

    fn mute_volume(&self) -> Result<ActionResult, ActionError> {
        self.run_first(self.mute_commands(true))?;
        Ok(ActionResult::success("Volume muted"))
    }

    fn unmute_volume(&self) -> Result<ActionResult, ActionError> {
        self.run_first(self.mute_commands(false))?;
        Ok(ActionResult::success("Volume unmuted"))
    }

    fn take_screenshot(&self, path: &str) -> Result<ActionResult, ActionError> {
        let target = if path.trim().is_empty() {
            self.default_screenshot_path()?
        } else {
            expand_home(path.trim())
        };
        let target = target.to_string_lossy().into_owned();
        self.run_first(self.screenshot_commands(&target))?;
        Ok(ActionResult::success_with_data(
            format!("Screenshot saved to {}", target),
            json!({ "path": target }),
        ))
    }

    fn shutdown(&self) -> Result<ActionResult, ActionError> {
        self.run_first(self.power_commands(false))?;
        Ok(ActionResult::success("Shutting down..."))
    }

    fn restart(&self) -> Result<ActionResult, ActionError> {
        self.run_first(self.power_commands(true))?;
        Ok(ActionResult::success("Restarting..."))
    }

    fn lock_screen(&self) -> Result<ActionResult, ActionError> {
        self.run_first(self.lock_commands())?;
        Ok(ActionResult::success("Screen locked"))
    }

    fn get_battery(&self) -> Result<ActionResult, ActionError> {
        match self.platform {
            Platform::Linux => self.linux_battery(),
            Platform::MacOs => {
                let out = self.runner.output(&CommandSpec::new("pmset", &["-g", "batt"]))?;
                Ok(match parse_pmset_battery(&out) {
                    Some((pct, status)) => battery_result(pct, &status),
                    None => ActionResult::failure("Could not read battery status"),
                })
            }
            Platform::Windows => {
                let script = "$b = Get-CimInstance Win32_Battery; \
                              \"$($b.EstimatedChargeRemaining);$($b.BatteryStatus)\"";
                let out = self
                    .runner
                    .output(&CommandSpec::new("powershell", &["-Command", script]))?;
                Ok(match parse_windows_battery(&out) {
                    Some((pct, status)) => battery_result(pct, status),
                    None => ActionResult::failure("Could not read battery status"),
                })
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Single-quote `value` for PowerShell, where nothing inside is expanded.
fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Prefix `https://` when the URL has no http(s) scheme.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn battery_result(percentage: u8, status: &str) -> ActionResult {
    ActionResult::success_with_data(
        format!("Battery: {}% ({})", percentage, status),
        json!({ "percentage": percentage, "status": status }),
    )
}

fn find_battery_dir(root: &Path) -> Option<PathBuf> {
    let mut batteries: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("BAT"))
        .map(|entry| entry.path())
        .collect();
    batteries.sort();
    batteries.into_iter().next()
}

/// Parse `pmset -g batt` output into percentage and charge state.
fn parse_pmset_battery(output: &str) -> Option<(u8, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(\d{1,3})%;\s*([^;]+)").expect("Invalid pmset battery regex")
    });
    let caps = re.captures(output)?;
    let percentage = caps.get(1)?.as_str().parse().ok()?;
    let status = caps.get(2)?.as_str().trim().to_string();
    Some((percentage, status))
}

/// Parse `<charge>;<BatteryStatus>` as printed by the Win32_Battery query.
fn parse_windows_battery(output: &str) -> Option<(u8, &'static str)> {
    let (charge, status) = output.trim().split_once(';')?;
    let percentage = charge.trim().parse().ok()?;
    let status = match status.trim() {
        "1" => "Discharging",
        "2" => "AC Power",
        "3" => "Fully Charged",
        "6" | "7" | "8" | "9" => "Charging",
        _ => "Unknown",
    };
    Some((percentage, status))
}
