//! Static action catalog.
//!
//! Maps every [`ActionKind`] to its permission tier, confirmation
//! requirement, description and expected parameters, and builds concrete
//! [`Action`] values from it.

use std::collections::BTreeMap;

use crate::types::{Action, ActionKind, ActionMetadata, PermissionTier};

/// Fallback entry for kinds with no catalog record.
const UNKNOWN_METADATA: ActionMetadata = ActionMetadata {
    permission_tier: PermissionTier::Safe,
    requires_confirmation: false,
    description: "",
    parameters: &[],
};

const fn entry(
    permission_tier: PermissionTier,
    requires_confirmation: bool,
    description: &'static str,
    parameters: &'static [&'static str],
) -> ActionMetadata {
    ActionMetadata {
        permission_tier,
        requires_confirmation,
        description,
        parameters,
    }
}

/// Look up the catalog entry for `kind`.
///
/// Total: `Unknown` gets a safe-tier default with no confirmation.
#[rustfmt::skip]
pub fn metadata(kind: ActionKind) -> ActionMetadata {
    use PermissionTier::{Critical, Restricted, Safe};

    match kind {
        ActionKind::OpenApp => entry(Restricted, false, "Opens an application by name", &["app_name"]),
        ActionKind::OpenFile => entry(Restricted, false, "Opens a file with its default application", &["path"]),
        ActionKind::OpenFolder => entry(Safe, false, "Opens a folder in the file manager", &["path"]),
        ActionKind::OpenUrl => entry(Safe, false, "Opens a URL in the default browser", &["url"]),
        ActionKind::AdjustVolume => entry(Restricted, false, "Adjusts system volume to a specified level (0-100)", &["level"]),
        ActionKind::MuteVolume => entry(Restricted, false, "Mutes system volume", &[]),
        ActionKind::UnmuteVolume => entry(Restricted, false, "Unmutes system volume", &[]),
        ActionKind::TakeScreenshot => entry(Restricted, false, "Takes a screenshot and saves it", &["path"]),
        ActionKind::Shutdown => entry(Critical, true, "Shuts down the system", &[]),
        ActionKind::Restart => entry(Critical, true, "Restarts the system", &[]),
        ActionKind::LockScreen => entry(Safe, false, "Locks the screen", &[]),
        ActionKind::GetTime => entry(Safe, false, "Gets the current time", &[]),
        ActionKind::GetDate => entry(Safe, false, "Gets the current date", &[]),
        ActionKind::GetBattery => entry(Safe, false, "Gets battery status", &[]),
        ActionKind::Help => entry(Safe, false, "Shows available commands", &[]),
        ActionKind::Exit => entry(Safe, false, "Exits the assistant", &[]),
        ActionKind::EnableSafeMode => entry(Safe, false, "Enables safe mode (listen-only)", &[]),
        ActionKind::DisableSafeMode => entry(Safe, false, "Disables safe mode", &[]),
        ActionKind::Status => entry(Safe, false, "Shows assistant status", &[]),
        ActionKind::Unknown => UNKNOWN_METADATA,
    }
}

/// Build an [`Action`], taking the confirmation flag and description from
/// the catalog.
pub fn build(kind: ActionKind, parameters: BTreeMap<String, serde_json::Value>) -> Action {
    Action::from_metadata(kind, parameters, &metadata(kind))
}

/// Iterate over every kind with a catalog entry.
pub fn all_kinds() -> impl Iterator<Item = ActionKind> {
    ActionKind::REGISTERED.into_iter()
}
