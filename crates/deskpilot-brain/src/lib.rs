//! Decision pipeline for Deskpilot.
//!
//! Classifies free-text commands, tracks the conversation session, and
//! gates every action through the safety policy before handing it to a
//! [`deskpilot_action::SystemAdapter`].

pub mod context;
pub mod error;
pub mod intent;
pub mod router;
pub mod safety;

pub use context::{ConversationTurn, SessionContext, SessionStats};
pub use error::IntentError;
pub use intent::{IntentClassifier, IntentRule, ParsedIntent};
pub use router::CommandRouter;
pub use safety::{Clock, KillSwitch, ManualClock, SafetyPolicy, SystemClock};
