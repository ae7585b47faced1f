//! Adapter that reports what it would do without touching the system.

use serde_json::json;

use super::SystemAdapter;
use crate::error::ActionError;
use crate::types::ActionResult;

/// [`SystemAdapter`] that only logs.
///
/// Used by `--dry-run` and by tests that exercise the router end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunAdapter;

impl DryRunAdapter {
    pub fn new() -> Self {
        Self
    }

    fn report(&self, operation: &str, detail: String) -> Result<ActionResult, ActionError> {
        tracing::info!(operation, detail = %detail, "Dry run");
        Ok(ActionResult::success_with_data(
            format!("[dry run] Would {}", detail),
            json!({ "dry_run": true, "operation": operation }),
        ))
    }
}

impl SystemAdapter for DryRunAdapter {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn open_app(&self, app_name: &str) -> Result<ActionResult, ActionError> {
        self.report("open_app", format!("open {}", app_name))
    }

    fn open_file(&self, path: &str) -> Result<ActionResult, ActionError> {
        self.report("open_file", format!("open file {}", path))
    }

    fn open_folder(&self, path: &str) -> Result<ActionResult, ActionError> {
        self.report("open_folder", format!("open folder {}", path))
    }

    fn open_url(&self, url: &str) -> Result<ActionResult, ActionError> {
        self.report("open_url", format!("open URL {}", super::command::normalize_url(url)))
    }

    fn adjust_volume(&self, level: u8) -> Result<ActionResult, ActionError> {
        self.report("adjust_volume", format!("set volume to {}%", level.min(100)))
    }

    fn mute_volume(&self) -> Result<ActionResult, ActionError> {
        self.report("mute_volume", "mute volume".to_string())
    }

    fn unmute_volume(&self) -> Result<ActionResult, ActionError> {
        self.report("unmute_volume", "unmute volume".to_string())
    }

    fn take_screenshot(&self, path: &str) -> Result<ActionResult, ActionError> {
        let detail = if path.trim().is_empty() {
            "take a screenshot".to_string()
        } else {
            format!("take a screenshot to {}", path.trim())
        };
        self.report("take_screenshot", detail)
    }

    fn shutdown(&self) -> Result<ActionResult, ActionError> {
        self.report("shutdown", "shut down the system".to_string())
    }

    fn restart(&self) -> Result<ActionResult, ActionError> {
        self.report("restart", "restart the system".to_string())
    }

    fn lock_screen(&self) -> Result<ActionResult, ActionError> {
        self.report("lock_screen", "lock the screen".to_string())
    }

    fn get_battery(&self) -> Result<ActionResult, ActionError> {
        self.report("get_battery", "read battery status".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::types::ActionKind;
    use std::collections::BTreeMap;

    #[test]
    fn test_dry_run_messages() {
        let adapter = DryRunAdapter::new();
        assert_eq!(
            adapter.open_app("chrome").unwrap().message,
            "[dry run] Would open chrome"
        );
        assert_eq!(
            adapter.open_url("docs.rs").unwrap().message,
            "[dry run] Would open URL https://docs.rs"
        );
        assert_eq!(
            adapter.adjust_volume(70).unwrap().message,
            "[dry run] Would set volume to 70%"
        );
        assert_eq!(
            adapter.take_screenshot("").unwrap().message,
            "[dry run] Would take a screenshot"
        );
    }

    #[test]
    fn test_dry_run_data_marks_operation() {
        let result = DryRunAdapter.shutdown().unwrap();
        assert!(result.is_success());
        let data = result.data.unwrap();
        assert_eq!(data["dry_run"], true);
        assert_eq!(data["operation"], "shutdown");
    }

    #[test]
    fn test_dry_run_dispatch_covers_adapter_kinds() {
        let adapter = DryRunAdapter;
        for kind in registry::all_kinds().filter(|k| !k.is_router_local()) {
            let result = adapter.dispatch(&registry::build(kind, BTreeMap::new())).unwrap();
            assert!(result.is_success(), "{} was not handled", kind);
            assert_eq!(result.data.unwrap()["operation"], kind.as_str());
        }
        assert!(!adapter
            .dispatch(&registry::build(ActionKind::Unknown, BTreeMap::new()))
            .unwrap()
            .is_success());
    }
}
