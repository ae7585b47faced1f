//! Conversation session state.
//!
//! Keeps a bounded window of recent turns, the single pending confirmation
//! slot, per-session counters and a small preference store.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Local};
use deskpilot_action::{Action, ActionKind};
use serde::Serialize;
use uuid::Uuid;

/// Turns kept when no explicit size is configured.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Turns rendered by [`SessionContext::summary`].
const SUMMARY_TURNS: usize = 3;
/// Characters of each response kept in the summary.
const SUMMARY_RESPONSE_CHARS: usize = 100;

/// One executed command and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub user_input: String,
    pub response: String,
    pub timestamp: DateTime<Local>,
    pub action_kind: Option<ActionKind>,
    pub success: bool,
}

/// Point-in-time session counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    pub session_start: DateTime<Local>,
    pub total_commands: u64,
    pub successful_commands: u64,
    /// Percentage in 0..=100.
    pub success_rate: f64,
    pub history_size: usize,
}

/// State for one interactive session.
#[derive(Debug)]
pub struct SessionContext {
    session_id: Uuid,
    session_start: DateTime<Local>,
    max_history: usize,
    history: VecDeque<ConversationTurn>,
    pending: Option<Action>,
    preferences: BTreeMap<String, serde_json::Value>,
    total_commands: u64,
    successful_commands: u64,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionContext {
    /// Create an empty session keeping at most `max_history` turns.
    pub fn new(max_history: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            session_start: Local::now(),
            max_history,
            history: VecDeque::with_capacity(max_history),
            pending: None,
            preferences: BTreeMap::new(),
            total_commands: 0,
            successful_commands: 0,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// Record a turn, evicting the oldest when the window is full.
    pub fn add_turn(
        &mut self,
        user_input: impl Into<String>,
        response: impl Into<String>,
        action_kind: Option<ActionKind>,
        success: bool,
    ) {
        self.total_commands += 1;
        if success {
            self.successful_commands += 1;
        }
        if self.max_history == 0 {
            return;
        }
        while self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(ConversationTurn {
            user_input: user_input.into(),
            response: response.into(),
            timestamp: Local::now(),
            action_kind,
            success,
        });
    }

    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.history.back()
    }

    /// All retained turns, oldest first.
    pub fn history(&self) -> &VecDeque<ConversationTurn> {
        &self.history
    }

    /// The newest `count` turns, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ConversationTurn> {
        self.history
            .iter()
            .skip(self.history.len().saturating_sub(count))
    }

    // -------------------------------------------------------------------------
    // Pending confirmation
    // -------------------------------------------------------------------------

    /// Store an action awaiting a yes/no reply, replacing any earlier one.
    pub fn set_pending_confirmation(&mut self, action: Action) {
        if let Some(previous) = self.pending.replace(action) {
            tracing::debug!(action = %previous, "Replaced pending confirmation");
        }
    }

    pub fn pending_confirmation(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    /// Remove and return the pending action.
    pub fn take_pending_confirmation(&mut self) -> Option<Action> {
        self.pending.take()
    }

    pub fn clear_pending_confirmation(&mut self) {
        self.pending = None;
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    // -------------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------------

    pub fn set_preference(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.preferences.insert(key.into(), value);
    }

    pub fn preference(&self, key: &str) -> Option<&serde_json::Value> {
        self.preferences.get(key)
    }

    pub fn preference_or(&self, key: &str, default: serde_json::Value) -> serde_json::Value {
        self.preferences.get(key).cloned().unwrap_or(default)
    }

    // -------------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id,
            session_start: self.session_start,
            total_commands: self.total_commands,
            successful_commands: self.successful_commands,
            success_rate: self.successful_commands as f64 / self.total_commands.max(1) as f64
                * 100.0,
            history_size: self.history.len(),
        }
    }

    /// Short transcript of the last few turns.
    pub fn summary(&self) -> String {
        if self.history.is_empty() {
            return "No previous context.".to_string();
        }
        let mut lines = Vec::with_capacity(SUMMARY_TURNS * 2);
        for turn in self.recent(SUMMARY_TURNS) {
            lines.push(format!("User: {}", turn.user_input));
            let response: String = turn.response.chars().take(SUMMARY_RESPONSE_CHARS).collect();
            if turn.response.chars().count() > SUMMARY_RESPONSE_CHARS {
                lines.push(format!("Assistant: {}...", response));
            } else {
                lines.push(format!("Assistant: {}", response));
            }
        }
        lines.join("\n")
    }

    /// Forget history, the pending confirmation and counters.
    ///
    /// Preferences, the session id and the start time are kept.
    pub fn clear(&mut self) {
        self.history.clear();
        self.pending = None;
        self.total_commands = 0;
        self.successful_commands = 0;
    }
}
