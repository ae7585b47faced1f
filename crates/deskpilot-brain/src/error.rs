//! Error types for the decision pipeline.

use deskpilot_action::ActionKind;

/// Errors raised while building intent rules.
///
/// Classification itself never fails; only user-supplied rules can be
/// rejected.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("rule for {0} has no patterns")]
    EmptyRule(ActionKind),
}
