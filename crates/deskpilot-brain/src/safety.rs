//! Safety gates applied before any action runs.
//!
//! The policy owns the emergency kill switch, the safe-mode flag, the
//! per-command cooldown and the sliding one-minute rate window. Every check
//! reads current state, so a toggle takes effect on the very next command.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use deskpilot_action::{registry, ActionKind, PermissionTier};
use deskpilot_core::config::SafetyConfig;

/// Length of the rate-limit window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

// =============================================================================
// Clock
// =============================================================================

/// Monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Reads `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.offset_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.offset_nanos.load(Ordering::SeqCst))
    }
}

// =============================================================================
// KillSwitch
// =============================================================================

/// Shared emergency stop.
///
/// Cloning yields another handle to the same flag, so it can be flipped
/// from a signal handler or another thread while the router runs.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn deactivate(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// SafetyPolicy
// =============================================================================

/// Gatekeeper consulted by the router for every command.
#[derive(Debug)]
pub struct SafetyPolicy {
    kill_switch: KillSwitch,
    safe_mode: bool,
    cooldown: Duration,
    max_commands_per_minute: u32,
    last_accepted: Option<Instant>,
    window: VecDeque<Instant>,
    confirmation_overrides: BTreeMap<String, bool>,
    clock: Arc<dyn Clock>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::from_config(&SafetyConfig::default())
    }
}

impl SafetyPolicy {
    /// Build a policy on the system clock.
    pub fn from_config(config: &SafetyConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Build a policy reading time from `clock`.
    pub fn with_clock(config: &SafetyConfig, clock: impl Clock + 'static) -> Self {
        let cooldown = Duration::try_from_secs_f64(config.cooldown_seconds).unwrap_or_else(|_| {
            tracing::warn!(
                cooldown_seconds = config.cooldown_seconds,
                "Invalid cooldown, disabling it"
            );
            Duration::ZERO
        });
        Self {
            kill_switch: KillSwitch::new(),
            safe_mode: config.safe_mode,
            cooldown,
            max_commands_per_minute: config.max_commands_per_minute,
            last_accepted: None,
            window: VecDeque::new(),
            confirmation_overrides: config.confirmation_required.clone(),
            clock: Arc::new(clock),
        }
    }

    // -------------------------------------------------------------------------
    // Kill switch
    // -------------------------------------------------------------------------

    /// A handle to this policy's kill switch.
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill_switch.clone()
    }

    pub fn is_kill_switch_active(&self) -> bool {
        self.kill_switch.is_active()
    }

    pub fn activate_kill_switch(&self) {
        self.kill_switch.activate();
        tracing::warn!("Kill switch activated");
    }

    pub fn deactivate_kill_switch(&self) {
        self.kill_switch.deactivate();
        tracing::info!("Kill switch deactivated");
    }

    // -------------------------------------------------------------------------
    // Safe mode
    // -------------------------------------------------------------------------

    pub fn is_safe_mode(&self) -> bool {
        self.safe_mode
    }

    pub fn enable_safe_mode(&mut self) {
        self.safe_mode = true;
        tracing::info!("Safe mode enabled");
    }

    pub fn disable_safe_mode(&mut self) {
        self.safe_mode = false;
        tracing::info!("Safe mode disabled");
    }

    pub fn permission_tier(&self, kind: ActionKind) -> PermissionTier {
        registry::metadata(kind).permission_tier
    }

    /// Whether `kind` may run under the current safe-mode setting.
    pub fn is_permitted(&self, kind: ActionKind) -> bool {
        !self.safe_mode || self.permission_tier(kind) == PermissionTier::Safe
    }

    /// Configured confirmation override for `kind`.
    pub fn requires_confirmation(&self, kind: ActionKind) -> bool {
        self.confirmation_overrides
            .get(kind.as_str())
            .copied()
            .unwrap_or(false)
    }

    // -------------------------------------------------------------------------
    // Cooldown and rate limit
    // -------------------------------------------------------------------------

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn max_commands_per_minute(&self) -> u32 {
        self.max_commands_per_minute
    }

    /// `true` when enough time has passed since the last accepted command.
    pub fn check_cooldown(&self) -> bool {
        match self.last_accepted {
            Some(last) => self.clock.now().saturating_duration_since(last) >= self.cooldown,
            None => true,
        }
    }

    /// `true` when the one-minute window has room for another command.
    ///
    /// Drops window entries that have aged out.
    pub fn check_rate_limit(&mut self) -> bool {
        let now = self.clock.now();
        self.prune(now);
        self.window.len() < self.max_commands_per_minute as usize
    }

    /// Charge one command against the cooldown and the rate window.
    pub fn record_command(&mut self) {
        let now = self.clock.now();
        self.last_accepted = Some(now);
        self.window.push_back(now);
    }

    /// Commands currently counted in the rate window.
    pub fn commands_in_window(&mut self) -> usize {
        let now = self.clock.now();
        self.prune(now);
        self.window.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.window.front() {
            if now.saturating_duration_since(*oldest) >= RATE_WINDOW {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}
