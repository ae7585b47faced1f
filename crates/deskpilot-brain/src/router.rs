//! Command router.
//!
//! Turns one line of user input into one [`ActionResult`], applying the
//! safety gates in a fixed order:
//!
//! 1. kill switch
//! 2. pending confirmation reply
//! 3. cooldown
//! 4. rate limit
//! 5. classification and router-local intents
//! 6. safe mode
//! 7. confirmation request
//! 8. adapter dispatch
//!
//! The router never returns an error: adapter failures and panics become
//! failure results.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use chrono::Local;
use deskpilot_action::{Action, ActionKind, ActionResult, ActionStatus, SystemAdapter};
use deskpilot_core::DeskpilotConfig;
use serde_json::json;

use crate::context::SessionContext;
use crate::intent::{IntentClassifier, ParsedIntent};
use crate::safety::SafetyPolicy;

/// Replies accepted as "yes" to a confirmation prompt.
const AFFIRMATIVE: &[&str] = &["yes", "y", "confirm", "ok", "sure"];

const HELP_TEXT: &str = "Available Commands:

Applications:
  open <app>          - Open an application
  launch <app>        - Same as open

Files & Folders:
  open file <path>    - Open a file
  open folder <path>  - Open a folder

Web:
  open url <url>      - Open a URL in browser

Volume:
  volume <0-100>      - Set volume level
  mute                - Mute volume
  unmute              - Unmute volume

Screenshot:
  screenshot          - Take a screenshot

System:
  shutdown            - Shutdown computer (requires confirmation)
  restart             - Restart computer (requires confirmation)
  lock                - Lock the screen
  battery             - Show battery status

Info:
  time                - Current time
  date                - Current date
  status              - Assistant status

Safety:
  safe mode           - Enable safe mode
  disable safe mode   - Disable safe mode

Exit:
  exit / quit         - Close assistant";

/// Owns one session's classifier, context, policy and adapter.
pub struct CommandRouter {
    classifier: IntentClassifier,
    context: SessionContext,
    safety: SafetyPolicy,
    adapter: Box<dyn SystemAdapter>,
}

impl CommandRouter {
    /// Build a router from configuration with the built-in rules.
    pub fn new(config: &DeskpilotConfig, adapter: Box<dyn SystemAdapter>) -> Self {
        Self::with_parts(
            IntentClassifier::new(),
            SessionContext::new(config.session.max_history),
            SafetyPolicy::from_config(&config.safety),
            adapter,
        )
    }

    /// Build a router from pre-assembled parts.
    pub fn with_parts(
        classifier: IntentClassifier,
        context: SessionContext,
        safety: SafetyPolicy,
        adapter: Box<dyn SystemAdapter>,
    ) -> Self {
        tracing::debug!(adapter = adapter.name(), "Command router ready");
        Self {
            classifier,
            context,
            safety,
            adapter,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn safety(&self) -> &SafetyPolicy {
        &self.safety
    }

    pub fn safety_mut(&mut self) -> &mut SafetyPolicy {
        &mut self.safety
    }

    pub fn classifier_mut(&mut self) -> &mut IntentClassifier {
        &mut self.classifier
    }

    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// Process one line of user input.
    pub fn process(&mut self, input: &str) -> ActionResult {
        if self.safety.is_kill_switch_active() {
            tracing::warn!("Command rejected: kill switch active");
            return ActionResult::blocked(
                ActionStatus::BlockedKillSwitch,
                "Kill switch is active. All commands are disabled.",
            );
        }

        if let Some(action) = self.context.take_pending_confirmation() {
            return self.resolve_confirmation(action, input);
        }

        if !self.safety.check_cooldown() {
            tracing::warn!("Command rejected: cooldown");
            return ActionResult::blocked(
                ActionStatus::BlockedCooldown,
                "Please wait a moment before the next command.",
            );
        }

        if !self.safety.check_rate_limit() {
            tracing::warn!("Command rejected: rate limit");
            return ActionResult::blocked(
                ActionStatus::BlockedRateLimit,
                "Too many commands. Please slow down.",
            );
        }

        self.safety.record_command();

        let intent = self.classifier.classify(input);
        if intent.kind == ActionKind::Unknown {
            return ActionResult::failure(format!(
                "I didn't understand: '{}'. Type 'help' for available commands.",
                intent.raw_input
            ));
        }

        if intent.kind.is_router_local() {
            return self.handle_local(intent.kind);
        }

        self.route_action(&intent)
    }

    fn route_action(&mut self, intent: &ParsedIntent) -> ActionResult {
        if !self.safety.is_permitted(intent.kind) {
            tracing::warn!(kind = %intent.kind, "Command rejected: safe mode");
            return ActionResult::blocked(
                ActionStatus::BlockedSafeMode,
                format!("Cannot execute '{}' in safe mode.", intent.kind),
            );
        }

        let action = self.classifier.build_action(intent);

        if action.requires_confirmation() || self.safety.requires_confirmation(action.kind()) {
            let prompt = format!(
                "This will {}. Are you sure? (yes/no)",
                action.description().to_lowercase()
            );
            tracing::info!(action = %action, "Awaiting confirmation");
            self.context.set_pending_confirmation(action);
            return ActionResult::pending_confirmation(prompt);
        }

        self.execute(action)
    }

    fn resolve_confirmation(&mut self, action: Action, reply: &str) -> ActionResult {
        let reply = reply.trim().to_lowercase();
        if AFFIRMATIVE.contains(&reply.as_str()) {
            tracing::info!(action = %action, "Confirmed");
            self.execute(action)
        } else {
            tracing::info!(action = %action, "Cancelled");
            ActionResult::cancelled("Action cancelled.")
        }
    }

    fn execute(&mut self, action: Action) -> ActionResult {
        let adapter = &self.adapter;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| adapter.dispatch(&action)));
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(action = %action, error = %e, "Action failed");
                ActionResult::failure(format!("Execution error: {}", e))
            }
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                tracing::warn!(action = %action, reason = %reason, "Adapter panicked");
                ActionResult::failure(format!("Execution error: {}", reason))
            }
        };
        tracing::info!(action = %action, status = %result.status, "Action executed");
        self.context.add_turn(
            action.to_string(),
            result.message.clone(),
            Some(action.kind()),
            result.is_success(),
        );
        result
    }

    fn handle_local(&mut self, kind: ActionKind) -> ActionResult {
        match kind {
            ActionKind::Exit => ActionResult::success_with_data("Goodbye!", json!({ "exit": true })),
            ActionKind::Help => ActionResult::success(HELP_TEXT),
            ActionKind::GetTime => {
                ActionResult::success(format!("The time is {}", Local::now().format("%I:%M %p")))
            }
            ActionKind::GetDate => {
                ActionResult::success(format!("Today is {}", Local::now().format("%A, %B %d, %Y")))
            }
            ActionKind::Status => ActionResult::success(self.status_text()),
            ActionKind::EnableSafeMode => {
                self.safety.enable_safe_mode();
                ActionResult::success("Safe mode enabled. Only read-only commands will work.")
            }
            ActionKind::DisableSafeMode => {
                self.safety.disable_safe_mode();
                ActionResult::success("Safe mode disabled. All commands are now available.")
            }
            other => ActionResult::failure(format!("Unsupported action: {}", other)),
        }
    }

    fn status_text(&self) -> String {
        let stats = self.context.stats();
        format!(
            "Assistant Status:\n\
             - Platform: {} {}\n\
             - Safe Mode: {}\n\
             - Kill Switch: {}\n\
             - Session Commands: {}\n\
             - Success Rate: {:.1}%",
            std::env::consts::OS,
            std::env::consts::ARCH,
            if self.safety.is_safe_mode() { "ON" } else { "OFF" },
            if self.safety.is_kill_switch_active() { "ACTIVE" } else { "INACTIVE" },
            stats.total_commands,
            stats.success_rate,
        )
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "adapter panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_action::DryRunAdapter;
    use deskpilot_core::config::SafetyConfig;

    fn router() -> CommandRouter {
        let config = SafetyConfig {
            cooldown_seconds: 0.0,
            ..SafetyConfig::default()
        };
        CommandRouter::with_parts(
            IntentClassifier::new(),
            SessionContext::default(),
            SafetyPolicy::from_config(&config),
            Box::new(DryRunAdapter),
        )
    }

    #[test]
    fn test_unknown_quotes_raw_input() {
        let result = router().process("  dance ");
        assert_eq!(result.status, ActionStatus::Failure);
        assert_eq!(
            result.message,
            "I didn't understand: '  dance '. Type 'help' for available commands."
        );
    }

    #[test]
    fn test_exit() {
        let result = router().process("quit");
        assert!(result.is_success());
        assert!(result.is_exit());
        assert_eq!(result.message, "Goodbye!");
    }

    #[test]
    fn test_help_lists_commands() {
        let result = router().process("help");
        assert!(result.message.starts_with("Available Commands:"));
        assert!(result.message.contains("shutdown            - Shutdown computer (requires confirmation)"));
    }

    #[test]
    fn test_time_and_date_format() {
        let mut r = router();
        let time = r.process("time").message;
        let rest = time.strip_prefix("The time is ").unwrap();
        assert!(rest.ends_with("AM") || rest.ends_with("PM"), "{}", rest);
        assert_eq!(rest.len(), "12:00 PM".len());

        let date = r.process("date").message;
        assert!(date.starts_with("Today is "));
        assert!(date.contains(&Local::now().format("%Y").to_string()));
    }

    #[test]
    fn test_status_text() {
        let mut r = router();
        r.process("open chrome");
        let status = r.process("status").message;
        assert!(status.starts_with("Assistant Status:\n- Platform: "));
        assert!(status.contains("- Safe Mode: OFF"));
        assert!(status.contains("- Kill Switch: INACTIVE"));
        assert!(status.contains("- Session Commands: 1"));
        assert!(status.contains("- Success Rate: 100.0%"));
    }

    #[test]
    fn test_local_intents_do_not_record_turns() {
        let mut r = router();
        r.process("help");
        r.process("time");
        assert!(r.context().history().is_empty());
    }

    #[test]
    fn test_confirmation_prompt_text() {
        let result = router().process("restart");
        assert_eq!(result.status, ActionStatus::PendingConfirmation);
        assert_eq!(result.message, "This will restarts the system. Are you sure? (yes/no)");
    }

    #[test]
    fn test_executed_turn_uses_action_display() {
        let mut r = router();
        r.process("open chrome");
        let turn = r.context().last_turn().unwrap();
        assert_eq!(turn.user_input, "open_app(app_name=chrome)");
        assert_eq!(turn.response, "[dry run] Would open chrome");
        assert_eq!(turn.action_kind, Some(ActionKind::OpenApp));
    }

    #[test]
    fn test_custom_rule_takes_priority() {
        let mut r = router();
        let rule = crate::intent::IntentRule::new(ActionKind::LockScreen, &[r"^brb$"], &[]).unwrap();
        r.classifier_mut().add_rule(rule);
        let result = r.process("brb");
        assert!(result.is_success());
        assert_eq!(r.context().last_turn().unwrap().action_kind, Some(ActionKind::LockScreen));
    }

    #[test]
    fn test_panic_reason() {
        assert_eq!(panic_reason(&"boom"), "boom");
        assert_eq!(panic_reason(&"boom".to_string()), "boom");
        assert_eq!(panic_reason(&42u8), "adapter panicked");
    }
}
