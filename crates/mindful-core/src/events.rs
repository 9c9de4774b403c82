use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every state change of a phase timer produces an Event.
/// The host renders them; completion events are what it persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase_index: usize,
        phase_name: String,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    /// `at` is the host time of the tick the pause froze on.
    TimerPaused {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The projection moved to another phase or another cycle since the
    /// previous tick. Skipped intermediate phases are not reported.
    PhaseChanged {
        phase_index: usize,
        phase_name: String,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        total_secs: u64,
        cycle_count: u64,
        at: DateTime<Utc>,
    },
    /// `at` is the host time last seen by the timer, or the system clock
    /// if it was never started.
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        elapsed_secs: u64,
        remaining_secs: u64,
        total_secs: u64,
        phase_index: usize,
        phase_name: String,
        phase_elapsed_secs: u64,
        phase_remaining_secs: u64,
        cycle_count: u64,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for the event a host should persist.
    pub fn is_completion(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. })
    }
}
