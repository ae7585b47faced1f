//! Intent classification from free text.
//!
//! A deterministic cascade of regex rules. Each rule maps to one
//! [`ActionKind`]; the best-scoring rule wins and registration order breaks
//! ties.

pub mod patterns;

use std::collections::BTreeMap;

use deskpilot_action::{registry, Action, ActionKind};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::json;

use crate::error::IntentError;

/// Confidence when a pattern matches the whole trimmed input.
pub const FULL_MATCH_CONFIDENCE: f32 = 0.9;
/// Confidence when a pattern matches only part of the input.
pub const PARTIAL_MATCH_CONFIDENCE: f32 = 0.7;

/// Volume used when a volume command carries no usable level.
const DEFAULT_LEVEL: i64 = 50;

/// The classifier's verdict for one input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedIntent {
    pub kind: ActionKind,
    pub entities: BTreeMap<String, String>,
    pub confidence: f32,
    /// The input exactly as received, before trimming.
    pub raw_input: String,
}

impl ParsedIntent {
    fn unknown(raw_input: &str) -> Self {
        Self {
            kind: ActionKind::Unknown,
            entities: BTreeMap::new(),
            confidence: 0.0,
            raw_input: raw_input.to_string(),
        }
    }
}

/// A set of case-insensitive patterns that all classify as one kind.
#[derive(Debug, Clone)]
pub struct IntentRule {
    kind: ActionKind,
    patterns: Vec<Regex>,
    /// (entity name, capture group name)
    entities: Vec<(String, String)>,
}

impl IntentRule {
    /// Compile a rule.
    ///
    /// `entities` maps each entity name to the named capture group it is
    /// read from. A group missing from a pattern simply yields no entity.
    pub fn new(
        kind: ActionKind,
        patterns: &[&str],
        entities: &[(&str, &str)],
    ) -> Result<Self, IntentError> {
        if patterns.is_empty() {
            return Err(IntentError::EmptyRule(kind));
        }
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| IntentError::InvalidPattern {
                        pattern: p.to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            kind,
            patterns,
            entities: entities
                .iter()
                .map(|(name, group)| (name.to_string(), group.to_string()))
                .collect(),
        })
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Best match of this rule's patterns against already-trimmed text.
    fn best_match(&self, text: &str) -> Option<(f32, BTreeMap<String, String>)> {
        let mut best: Option<(f32, BTreeMap<String, String>)> = None;
        for pattern in &self.patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let confidence = match caps.get(0) {
                Some(m) if m.as_str() == text => FULL_MATCH_CONFIDENCE,
                _ => PARTIAL_MATCH_CONFIDENCE,
            };
            if best.as_ref().is_some_and(|(c, _)| confidence <= *c) {
                continue;
            }
            let entities = self
                .entities
                .iter()
                .filter_map(|(name, group)| {
                    let value = caps.name(group)?.as_str().trim();
                    (!value.is_empty()).then(|| (name.clone(), value.to_string()))
                })
                .collect();
            best = Some((confidence, entities));
        }
        best
    }
}

/// Ordered rule cascade.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a classifier with the built-in rule table.
    pub fn new() -> Self {
        Self {
            rules: patterns::default_rules().to_vec(),
        }
    }

    /// Create a classifier from an explicit rule list, in priority order.
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Insert a rule ahead of every existing rule.
    pub fn add_rule(&mut self, rule: IntentRule) {
        self.rules.insert(0, rule);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Classify one line of input.
    pub fn classify(&self, input: &str) -> ParsedIntent {
        let text = input.trim();
        if text.is_empty() {
            return ParsedIntent::unknown(input);
        }

        let mut best: Option<(ActionKind, f32, BTreeMap<String, String>)> = None;
        for rule in &self.rules {
            if let Some((confidence, entities)) = rule.best_match(text) {
                // Strict comparison: the earlier rule keeps a tie.
                if best.as_ref().map_or(true, |(_, c, _)| confidence > *c) {
                    best = Some((rule.kind, confidence, entities));
                }
            }
        }

        match best {
            Some((kind, confidence, entities)) => {
                tracing::debug!(kind = %kind, confidence, "Classified input");
                ParsedIntent {
                    kind,
                    entities,
                    confidence,
                    raw_input: input.to_string(),
                }
            }
            None => {
                tracing::debug!(input = %text, "No rule matched");
                ParsedIntent::unknown(input)
            }
        }
    }

    /// Turn a classified intent into an [`Action`].
    ///
    /// Volume levels become integers clamped to 0..=100; every other entity
    /// is passed through as a string.
    pub fn build_action(&self, intent: &ParsedIntent) -> Action {
        let mut params: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        if intent.kind == ActionKind::AdjustVolume {
            let level = intent
                .entities
                .get("level")
                .map_or(DEFAULT_LEVEL, |raw| parse_level(raw));
            params.insert("level".to_string(), json!(level));
        } else {
            for (name, value) in &intent.entities {
                params.insert(name.clone(), json!(value));
            }
        }
        registry::build(intent.kind, params)
    }
}

/// Parse a volume level, saturating oversized numbers at 100.
fn parse_level(raw: &str) -> i64 {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(level) => level.clamp(0, 100),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => 100,
        Err(_) => DEFAULT_LEVEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> IntentClassifier {
        IntentClassifier::new()
    }

    #[test]
    fn test_empty_input_is_unknown() {
        for input in ["", "   ", "\t\n"] {
            let intent = classifier().classify(input);
            assert_eq!(intent.kind, ActionKind::Unknown);
            assert_eq!(intent.confidence, 0.0);
            assert!(intent.entities.is_empty());
            assert_eq!(intent.raw_input, input);
        }
    }

    #[test]
    fn test_open_chrome_full_match() {
        let intent = classifier().classify("open chrome");
        assert_eq!(intent.kind, ActionKind::OpenApp);
        assert_eq!(intent.confidence, FULL_MATCH_CONFIDENCE);
        assert_eq!(intent.entities.get("app_name").map(String::as_str), Some("chrome"));
    }

    #[test]
    fn test_partial_match_scores_lower() {
        let intent = classifier().classify("please open chrome now");
        assert_eq!(intent.kind, ActionKind::OpenApp);
        assert_eq!(intent.confidence, PARTIAL_MATCH_CONFIDENCE);
        assert_eq!(intent.raw_input, "please open chrome now");
    }

    #[test]
    fn test_input_is_trimmed_but_raw_kept() {
        let intent = classifier().classify("  mute  ");
        assert_eq!(intent.kind, ActionKind::MuteVolume);
        assert_eq!(intent.confidence, FULL_MATCH_CONFIDENCE);
        assert_eq!(intent.raw_input, "  mute  ");
    }

    #[test]
    fn test_case_insensitive() {
        let intent = classifier().classify("SHUT DOWN");
        assert_eq!(intent.kind, ActionKind::Shutdown);
    }

    #[test]
    fn test_no_match_is_unknown() {
        let intent = classifier().classify("make me a sandwich");
        assert_eq!(intent.kind, ActionKind::Unknown);
        assert_eq!(intent.confidence, 0.0);
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut c = IntentClassifier::with_rules(vec![
            IntentRule::new(ActionKind::LockScreen, &[r"^lock$"], &[]).unwrap(),
            IntentRule::new(ActionKind::Shutdown, &[r"^lock$"], &[]).unwrap(),
        ]);
        assert_eq!(c.classify("lock").kind, ActionKind::LockScreen);

        c.add_rule(IntentRule::new(ActionKind::Restart, &[r"^lock$"], &[]).unwrap());
        assert_eq!(c.classify("lock").kind, ActionKind::Restart);
        assert_eq!(c.rule_count(), 3);
    }

    #[test]
    fn test_full_match_beats_earlier_partial() {
        let c = IntentClassifier::with_rules(vec![
            IntentRule::new(ActionKind::LockScreen, &[r"lock"], &[]).unwrap(),
            IntentRule::new(ActionKind::Shutdown, &[r"^lock it$"], &[]).unwrap(),
        ]);
        let intent = c.classify("lock it");
        assert_eq!(intent.kind, ActionKind::Shutdown);
        assert_eq!(intent.confidence, FULL_MATCH_CONFIDENCE);
    }

    #[test]
    fn test_add_rule_goes_first() {
        let mut c = classifier();
        let before = c.rule_count();
        c.add_rule(
            IntentRule::new(
                ActionKind::OpenUrl,
                &[r"^docs\s+(?P<crate>\S+)$"],
                &[("url", "crate")],
            )
            .unwrap(),
        );
        assert_eq!(c.rule_count(), before + 1);
        let intent = c.classify("docs serde");
        assert_eq!(intent.kind, ActionKind::OpenUrl);
        assert_eq!(intent.entities.get("url").map(String::as_str), Some("serde"));
    }

    #[test]
    fn test_rule_rejects_bad_pattern() {
        let err = IntentRule::new(ActionKind::OpenApp, &["(open"], &[]).unwrap_err();
        assert!(matches!(err, IntentError::InvalidPattern { .. }));

        let err = IntentRule::new(ActionKind::OpenApp, &[], &[]).unwrap_err();
        assert!(matches!(err, IntentError::EmptyRule(ActionKind::OpenApp)));
    }

    #[test]
    fn test_empty_capture_is_not_an_entity() {
        let intent = classifier().classify("screenshot");
        assert_eq!(intent.kind, ActionKind::TakeScreenshot);
        assert!(intent.entities.is_empty());
    }

    #[test]
    fn test_build_action_volume() {
        let c = classifier();
        let action = c.build_action(&c.classify("set volume to 40%"));
        assert_eq!(action.kind(), ActionKind::AdjustVolume);
        assert_eq!(action.int_param("level", -1), 40);

        let action = c.build_action(&c.classify("volume 250"));
        assert_eq!(action.int_param("level", -1), 100);
    }

    #[test]
    fn test_build_action_volume_without_level_defaults() {
        let c = classifier();
        let intent = ParsedIntent {
            kind: ActionKind::AdjustVolume,
            entities: BTreeMap::new(),
            confidence: FULL_MATCH_CONFIDENCE,
            raw_input: "volume".to_string(),
        };
        assert_eq!(c.build_action(&intent).int_param("level", -1), 50);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("0"), 0);
        assert_eq!(parse_level("75"), 75);
        assert_eq!(parse_level("99999999999999999999999"), 100);
        assert_eq!(parse_level("loud"), 50);
        assert_eq!(parse_level(""), 50);
    }

    #[test]
    fn test_build_action_passes_entities_as_strings() {
        let c = classifier();
        let action = c.build_action(&c.classify("open folder ~/Downloads"));
        assert_eq!(action.kind(), ActionKind::OpenFolder);
        assert_eq!(action.str_param("path"), "~/Downloads");
        assert!(!action.requires_confirmation());

        let action = c.build_action(&c.classify("shutdown"));
        assert!(action.requires_confirmation());
        assert_eq!(action.description(), "Shuts down the system");
    }
}
