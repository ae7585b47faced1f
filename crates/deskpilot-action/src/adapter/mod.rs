//! OS adapter trait and implementations.
//!
//! An adapter implements one handler per action kind that touches the
//! operating system. [`SystemAdapter::dispatch`] is the single entrypoint the
//! router calls; kinds the router answers itself fall through to an explicit
//! "unsupported" arm.

pub mod command;
pub mod dry_run;

use crate::error::ActionError;
use crate::types::{Action, ActionKind, ActionResult};

pub use command::{CommandAdapter, CommandRunner, CommandSpec, Platform, SystemRunner};
pub use dry_run::DryRunAdapter;

/// Default volume level when an action carries none.
pub const DEFAULT_VOLUME_LEVEL: i64 = 50;

/// Platform bridge for the privileged operations.
///
/// Handlers return `Ok` with a failure result for expected problems (a
/// missing file, no battery) and `Err` for faults; the router maps both to
/// a failure result.
pub trait SystemAdapter: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn open_app(&self, app_name: &str) -> Result<ActionResult, ActionError>;
    fn open_file(&self, path: &str) -> Result<ActionResult, ActionError>;
    fn open_folder(&self, path: &str) -> Result<ActionResult, ActionError>;
    fn open_url(&self, url: &str) -> Result<ActionResult, ActionError>;
    fn adjust_volume(&self, level: u8) -> Result<ActionResult, ActionError>;
    fn mute_volume(&self) -> Result<ActionResult, ActionError>;
    fn unmute_volume(&self) -> Result<ActionResult, ActionError>;
    /// Capture the screen to `path`, or to a generated path when empty.
    fn take_screenshot(&self, path: &str) -> Result<ActionResult, ActionError>;
    fn shutdown(&self) -> Result<ActionResult, ActionError>;
    fn restart(&self) -> Result<ActionResult, ActionError>;
    fn lock_screen(&self) -> Result<ActionResult, ActionError>;
    fn get_battery(&self) -> Result<ActionResult, ActionError>;

    /// Route an action to its handler.
    fn dispatch(&self, action: &Action) -> Result<ActionResult, ActionError> {
        match action.kind() {
            ActionKind::OpenApp => self.open_app(action.str_param("app_name")),
            ActionKind::OpenFile => self.open_file(action.str_param("path")),
            ActionKind::OpenFolder => self.open_folder(action.str_param("path")),
            ActionKind::OpenUrl => self.open_url(action.str_param("url")),
            ActionKind::AdjustVolume => {
                let level = action.int_param("level", DEFAULT_VOLUME_LEVEL).clamp(0, 100);
                self.adjust_volume(level as u8)
            }
            ActionKind::MuteVolume => self.mute_volume(),
            ActionKind::UnmuteVolume => self.unmute_volume(),
            ActionKind::TakeScreenshot => self.take_screenshot(action.str_param("path")),
            ActionKind::Shutdown => self.shutdown(),
            ActionKind::Restart => self.restart(),
            ActionKind::LockScreen => self.lock_screen(),
            ActionKind::GetBattery => self.get_battery(),
            other => Ok(ActionResult::failure(format!("Unsupported action: {}", other))),
        }
    }
}
