//! Built-in intent rule table.
//!
//! Order matters: on equal confidence the earlier rule wins, so the
//! specific `open file` / `open folder` / `open url` forms are listed
//! before the catch-all `open <app>`.

use std::sync::OnceLock;

use deskpilot_action::ActionKind;

use super::IntentRule;

type RuleSpec = (ActionKind, &'static [&'static str], &'static [(&'static str, &'static str)]);

const RULES: &[RuleSpec] = &[
    // =========================================================================
    // Files, folders and URLs
    // =========================================================================
    (
        ActionKind::OpenFile,
        &[
            r"^open\s+file\s+(?P<path>.+)$",
            r"^open\s+(?P<path>(?:[a-z]:)?[\\/].+)$",
            r"^open\s+(?P<path>~[\\/].+)$",
        ],
        &[("path", "path")],
    ),
    (
        ActionKind::OpenFolder,
        &[
            r"^open\s+folder\s+(?P<path>.+)$",
            r"^open\s+directory\s+(?P<path>.+)$",
            r"^show\s+folder\s+(?P<path>.+)$",
        ],
        &[("path", "path")],
    ),
    (
        ActionKind::OpenUrl,
        &[
            r"^(?:open\s+)?(?:url|website|site|link)\s+(?P<url>.+)$",
            r"^open\s+(?P<url>https?://\S+)$",
            r"^go\s+to\s+(?P<url>(?:https?://)?[\w.-]+\.[a-z]{2,}.*)$",
            r"^browse\s+(?P<url>.+)$",
        ],
        &[("url", "url")],
    ),
    // =========================================================================
    // Applications (unanchored at the start so embedded requests still match)
    // =========================================================================
    (
        ActionKind::OpenApp,
        &[
            r"\bopen\s+(?:(?:app(?:lication)?|program)\s+)?(?P<app>.+)$",
            r"\blaunch\s+(?P<app>.+)$",
            r"\bstart\s+(?P<app>.+)$",
            r"\brun\s+(?P<app>.+)$",
        ],
        &[("app_name", "app")],
    ),
    // =========================================================================
    // Volume and screen
    // =========================================================================
    (
        ActionKind::AdjustVolume,
        &[
            r"^(?:set\s+)?volume\s+(?:to\s+)?(?P<level>\d+)%?$",
            r"^(?:adjust\s+)?volume\s+(?P<level>\d+)%?$",
        ],
        &[("level", "level")],
    ),
    (ActionKind::MuteVolume, &[r"^mute(?:\s+volume)?$", r"^silence$"], &[]),
    (ActionKind::UnmuteVolume, &[r"^unmute(?:\s+volume)?$", r"^un-mute(?:\s+volume)?$"], &[]),
    (
        ActionKind::TakeScreenshot,
        &[
            r"^(?:take\s+)?(?:a\s+)?screenshot$",
            r"^capture\s+screen$",
            r"^screenshot(?:\s+(?P<path>.+))?$",
            r"^screen\s+capture$",
        ],
        &[("path", "path")],
    ),
    // =========================================================================
    // Power
    // =========================================================================
    (
        ActionKind::Shutdown,
        &[r"^shutdown$", r"^shut\s+down$", r"^power\s+off$", r"^turn\s+off(?:\s+computer)?$"],
        &[],
    ),
    (ActionKind::Restart, &[r"^restart$", r"^reboot$", r"^restart\s+computer$"], &[]),
    (ActionKind::LockScreen, &[r"^lock(?:\s+screen)?$", r"^lock\s+computer$"], &[]),
    // =========================================================================
    // Information
    // =========================================================================
    (
        ActionKind::GetTime,
        &[
            r"^(?:what(?:'s|\s+is)\s+)?(?:the\s+)?time\??$",
            r"^current\s+time$",
            r"^tell\s+(?:me\s+)?(?:the\s+)?time$",
        ],
        &[],
    ),
    (
        ActionKind::GetDate,
        &[
            r"^(?:what(?:'s|\s+is)\s+)?(?:the\s+)?date\??$",
            r"^(?:what(?:'s|\s+is)\s+)?today(?:'s)?\s+date\??$",
            r"^current\s+date$",
        ],
        &[],
    ),
    (
        ActionKind::GetBattery,
        &[
            r"^(?:what(?:'s|\s+is)\s+)?(?:the\s+)?battery(?:\s+level|\s+status)?\??$",
            r"^check\s+battery$",
        ],
        &[],
    ),
    // =========================================================================
    // Assistant control
    // =========================================================================
    (
        ActionKind::Help,
        &[r"^help$", r"^(?:show\s+)?commands$", r"^what\s+can\s+you\s+do\??$"],
        &[],
    ),
    (
        ActionKind::Exit,
        &[r"^exit$", r"^quit$", r"^bye$", r"^goodbye$", r"^close$"],
        &[],
    ),
    (
        ActionKind::EnableSafeMode,
        &[r"^(?:enable\s+)?safe\s+mode$", r"^enter\s+safe\s+mode$"],
        &[],
    ),
    (
        ActionKind::DisableSafeMode,
        &[r"^disable\s+safe\s+mode$", r"^exit\s+safe\s+mode$", r"^normal\s+mode$"],
        &[],
    ),
    (
        ActionKind::Status,
        &[r"^status$", r"^show\s+status$", r"^assistant\s+status$"],
        &[],
    ),
];

/// The built-in rules, compiled on first use.
pub fn default_rules() -> &'static [IntentRule] {
    static COMPILED: OnceLock<Vec<IntentRule>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(kind, patterns, entities)| {
                IntentRule::new(*kind, patterns, entities).expect("Invalid built-in intent rule")
            })
            .collect()
    })
}
