use serde::{Deserialize, Serialize};

use super::engine::PhaseTimer;
use super::phase::PhaseSpec;
use crate::error::TimerError;

/// Breathing session lengths offered to the user, in minutes.
pub const BREATHING_DURATION_OPTIONS_MIN: [u64; 4] = [1, 2, 5, 10];
pub const DEFAULT_BREATHING_MIN: u64 = 2;

/// Focus session lengths offered to the user, in minutes.
pub const FOCUS_PRESETS_MIN: [u64; 5] = [5, 15, 25, 45, 60];
pub const DEFAULT_FOCUS_MIN: u64 = 25;

/// Which mindfulness tool a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Paced breathing through a repeating phase pattern.
    Breathing,
    /// One uninterrupted focus block.
    Focus,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Breathing => "breathing",
            SessionKind::Focus => "focus",
        }
    }

    pub fn default_minutes(&self) -> u64 {
        match self {
            SessionKind::Breathing => DEFAULT_BREATHING_MIN,
            SessionKind::Focus => DEFAULT_FOCUS_MIN,
        }
    }

    /// Build an idle timer for this kind.
    ///
    /// Breathing sessions cycle through `pattern`; focus sessions use a single
    /// phase covering the whole session and ignore `pattern`.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `minutes` is zero.
    pub fn timer(&self, pattern: &PhaseSpec, minutes: u64) -> Result<PhaseTimer, TimerError> {
        let total_secs = minutes.saturating_mul(60);
        let spec = match self {
            SessionKind::Breathing => pattern.clone(),
            SessionKind::Focus => PhaseSpec::focus(total_secs)?,
        };
        PhaseTimer::new(spec, total_secs)
    }

    /// Idle timer with this kind's default pattern and length.
    ///
    /// # Errors
    /// Never fails for the built-in defaults; the signature mirrors `timer`.
    pub fn default_timer(&self) -> Result<PhaseTimer, TimerError> {
        self.timer(&PhaseSpec::box_breathing(), self.default_minutes())
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "breathing" | "breathe" => Ok(SessionKind::Breathing),
            "focus" => Ok(SessionKind::Focus),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}
