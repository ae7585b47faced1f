//! Core types and value objects for the action catalog.
//!
//! Defines action kinds, permission tiers, concrete actions and the
//! results every stage of the pipeline reports back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Enums
// =============================================================================

/// Every operation the assistant knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    OpenApp,
    OpenFile,
    OpenFolder,
    OpenUrl,
    AdjustVolume,
    MuteVolume,
    UnmuteVolume,
    TakeScreenshot,
    Shutdown,
    Restart,
    LockScreen,
    GetTime,
    GetDate,
    GetBattery,
    Help,
    Exit,
    EnableSafeMode,
    DisableSafeMode,
    Status,
    Unknown,
}

impl ActionKind {
    /// All kinds with a catalog entry, in catalog order.
    pub const REGISTERED: [ActionKind; 19] = [
        ActionKind::OpenApp,
        ActionKind::OpenFile,
        ActionKind::OpenFolder,
        ActionKind::OpenUrl,
        ActionKind::AdjustVolume,
        ActionKind::MuteVolume,
        ActionKind::UnmuteVolume,
        ActionKind::TakeScreenshot,
        ActionKind::Shutdown,
        ActionKind::Restart,
        ActionKind::LockScreen,
        ActionKind::GetTime,
        ActionKind::GetDate,
        ActionKind::GetBattery,
        ActionKind::Help,
        ActionKind::Exit,
        ActionKind::EnableSafeMode,
        ActionKind::DisableSafeMode,
        ActionKind::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenApp => "open_app",
            ActionKind::OpenFile => "open_file",
            ActionKind::OpenFolder => "open_folder",
            ActionKind::OpenUrl => "open_url",
            ActionKind::AdjustVolume => "adjust_volume",
            ActionKind::MuteVolume => "mute_volume",
            ActionKind::UnmuteVolume => "unmute_volume",
            ActionKind::TakeScreenshot => "take_screenshot",
            ActionKind::Shutdown => "shutdown",
            ActionKind::Restart => "restart",
            ActionKind::LockScreen => "lock_screen",
            ActionKind::GetTime => "get_time",
            ActionKind::GetDate => "get_date",
            ActionKind::GetBattery => "get_battery",
            ActionKind::Help => "help",
            ActionKind::Exit => "exit",
            ActionKind::EnableSafeMode => "enable_safe_mode",
            ActionKind::DisableSafeMode => "disable_safe_mode",
            ActionKind::Status => "status",
            ActionKind::Unknown => "unknown",
        }
    }

    /// Kinds the router answers itself without touching the OS.
    pub fn is_router_local(&self) -> bool {
        matches!(
            self,
            ActionKind::Exit
                | ActionKind::Help
                | ActionKind::GetTime
                | ActionKind::GetDate
                | ActionKind::Status
                | ActionKind::EnableSafeMode
                | ActionKind::DisableSafeMode
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::REGISTERED
            .iter()
            .chain(std::iter::once(&ActionKind::Unknown))
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown action kind: {}", s))
    }
}

/// Permission classification used by safe mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    Safe,
    Restricted,
    Critical,
}

impl fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionTier::Safe => write!(f, "safe"),
            PermissionTier::Restricted => write!(f, "restricted"),
            PermissionTier::Critical => write!(f, "critical"),
        }
    }
}

/// Outcome classification of a processed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Failure,
    PendingConfirmation,
    Cancelled,
    BlockedSafeMode,
    BlockedCooldown,
    BlockedRateLimit,
    BlockedKillSwitch,
}

impl ActionStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            ActionStatus::BlockedSafeMode
                | ActionStatus::BlockedCooldown
                | ActionStatus::BlockedRateLimit
                | ActionStatus::BlockedKillSwitch
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Success => write!(f, "success"),
            ActionStatus::Failure => write!(f, "failure"),
            ActionStatus::PendingConfirmation => write!(f, "pending_confirmation"),
            ActionStatus::Cancelled => write!(f, "cancelled"),
            ActionStatus::BlockedSafeMode => write!(f, "blocked_safe_mode"),
            ActionStatus::BlockedCooldown => write!(f, "blocked_cooldown"),
            ActionStatus::BlockedRateLimit => write!(f, "blocked_rate_limit"),
            ActionStatus::BlockedKillSwitch => write!(f, "blocked_kill_switch"),
        }
    }
}

// =============================================================================
// Domain Structs
// =============================================================================

/// Static catalog entry describing one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionMetadata {
    pub permission_tier: PermissionTier,
    pub requires_confirmation: bool,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

/// A concrete, parameterized operation ready for dispatch.
///
/// `requires_confirmation` and `description` are copied from the catalog by
/// [`crate::registry::build`]; the fields are private so they cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    kind: ActionKind,
    parameters: BTreeMap<String, serde_json::Value>,
    requires_confirmation: bool,
    description: String,
}

impl Action {
    pub(crate) fn from_metadata(
        kind: ActionKind,
        parameters: BTreeMap<String, serde_json::Value>,
        metadata: &ActionMetadata,
    ) -> Self {
        Self {
            kind,
            parameters,
            requires_confirmation: metadata.requires_confirmation,
            description: metadata.description.to_string(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn parameters(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.parameters
    }

    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// String parameter by name, empty when absent or not a string.
    pub fn str_param(&self, name: &str) -> &str {
        self.parameters
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    /// Integer parameter by name, or `default` when absent or not an integer.
    pub fn int_param(&self, name: &str, default: i64) -> i64 {
        self.parameters
            .get(name)
            .and_then(|v| v.as_i64())
            .unwrap_or(default)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parameters.is_empty() {
            return write!(f, "{}", self.kind);
        }
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{}={}", k, s),
                None => format!("{}={}", k, v),
            })
            .collect();
        write!(f, "{}({})", self.kind, params.join(", "))
    }
}

/// Result of processing one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            data: None,
        }
    }

    pub fn success_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: ActionStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failure,
            message: message.into(),
            data: None,
        }
    }

    pub fn pending_confirmation(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::PendingConfirmation,
            message: message.into(),
            data: None,
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Cancelled,
            message: message.into(),
            data: None,
        }
    }

    pub fn blocked(status: ActionStatus, message: impl Into<String>) -> Self {
        debug_assert!(status.is_blocked());
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ActionStatus::Success
    }

    /// Whether the caller should end the session.
    pub fn is_exit(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("exit"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_kind_display() {
        assert_eq!(ActionKind::OpenApp.to_string(), "open_app");
        assert_eq!(ActionKind::TakeScreenshot.to_string(), "take_screenshot");
        assert_eq!(ActionKind::DisableSafeMode.to_string(), "disable_safe_mode");
        assert_eq!(ActionKind::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_action_kind_from_str() {
        for kind in ActionKind::REGISTERED {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert_eq!("unknown".parse::<ActionKind>().unwrap(), ActionKind::Unknown);
        assert!("format_disk".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_action_kind_serde_matches_display() {
        for kind in ActionKind::REGISTERED {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_router_local_kinds() {
        assert!(ActionKind::Exit.is_router_local());
        assert!(ActionKind::Status.is_router_local());
        assert!(ActionKind::EnableSafeMode.is_router_local());
        assert!(!ActionKind::GetBattery.is_router_local());
        assert!(!ActionKind::Shutdown.is_router_local());
        assert!(!ActionKind::Unknown.is_router_local());
    }

    #[test]
    fn test_status_is_blocked() {
        assert!(ActionStatus::BlockedCooldown.is_blocked());
        assert!(ActionStatus::BlockedKillSwitch.is_blocked());
        assert!(!ActionStatus::Failure.is_blocked());
        assert!(!ActionStatus::PendingConfirmation.is_blocked());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ActionStatus::BlockedRateLimit).unwrap();
        assert_eq!(json, "\"blocked_rate_limit\"");
    }

    #[test]
    fn test_result_constructors() {
        let r = ActionResult::success("done");
        assert!(r.is_success());
        assert!(r.data.is_none());

        let r = ActionResult::success_with_data("battery", json!({"percentage": 80}));
        assert_eq!(r.data.unwrap()["percentage"], 80);

        assert_eq!(ActionResult::failure("x").status, ActionStatus::Failure);
        assert_eq!(ActionResult::cancelled("x").status, ActionStatus::Cancelled);
        assert_eq!(
            ActionResult::pending_confirmation("x").status,
            ActionStatus::PendingConfirmation
        );
        assert_eq!(
            ActionResult::blocked(ActionStatus::BlockedCooldown, "x").status,
            ActionStatus::BlockedCooldown
        );
    }

    #[test]
    fn test_result_is_exit() {
        assert!(ActionResult::success_with_data("bye", json!({"exit": true})).is_exit());
        assert!(!ActionResult::success_with_data("x", json!({"exit": false})).is_exit());
        assert!(!ActionResult::success("x").is_exit());
    }

    #[test]
    fn test_action_display() {
        let meta = ActionMetadata {
            permission_tier: PermissionTier::Restricted,
            requires_confirmation: false,
            description: "Adjusts system volume",
            parameters: &["level"],
        };
        let mut params = BTreeMap::new();
        params.insert("level".to_string(), json!(30));
        let action = Action::from_metadata(ActionKind::AdjustVolume, params, &meta);
        assert_eq!(action.to_string(), "adjust_volume(level=30)");
        assert_eq!(action.int_param("level", 50), 30);
        assert_eq!(action.str_param("level"), "");

        let bare = Action::from_metadata(ActionKind::MuteVolume, BTreeMap::new(), &meta);
        assert_eq!(bare.to_string(), "mute_volume");
        assert_eq!(bare.int_param("level", 50), 50);
    }

    #[test]
    fn test_action_display_string_params_unquoted() {
        let meta = ActionMetadata {
            permission_tier: PermissionTier::Restricted,
            requires_confirmation: false,
            description: "Opens an application by name",
            parameters: &["app_name"],
        };
        let mut params = BTreeMap::new();
        params.insert("app_name".to_string(), json!("chrome"));
        let action = Action::from_metadata(ActionKind::OpenApp, params, &meta);
        assert_eq!(action.to_string(), "open_app(app_name=chrome)");
        assert_eq!(action.str_param("app_name"), "chrome");
    }
}
