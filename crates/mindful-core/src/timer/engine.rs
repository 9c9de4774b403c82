//! Phase timer implementation.
//!
//! The timer is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically with
//! the current time in epoch milliseconds.
//!
//! Elapsed time is recomputed from the clock on every tick and the current
//! phase is projected from it, so late, coalesced or missing ticks never
//! cause drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed          (elapsed reaches the session length)
//! any -> Idle                   (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = PhaseTimer::new(PhaseSpec::box_breathing(), 120)?;
//! timer.start(now_ms());
//! // Once a second:
//! timer.tick(now_ms()); // Returns Some(Event) on phase change or completion
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{Phase, PhaseSpec, Projection};
use crate::error::TimerError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Terminal until `reset`.
    Completed,
}

/// Countdown engine cycling through a [`PhaseSpec`] until the session
/// length elapses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTimer {
    spec: PhaseSpec,
    total_secs: u64,
    state: TimerState,
    /// Elapsed time as of the last tick, in milliseconds.
    elapsed_ms: u64,
    /// Elapsed time banked before the current run segment.
    #[serde(default)]
    accumulated_ms: u64,
    /// Wall-clock anchor of the current run segment. Set only while running.
    #[serde(default)]
    resumed_at_ms: Option<u64>,
    /// When the session was first started from idle.
    #[serde(default)]
    started_at_ms: Option<u64>,
    #[serde(default)]
    projection: Projection,
    /// Host time passed to the most recent `start` or running `tick`.
    #[serde(default)]
    last_seen_ms: Option<u64>,
}

impl PhaseTimer {
    /// Create an idle timer.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `total_secs` is zero.
    pub fn new(spec: PhaseSpec, total_secs: u64) -> Result<Self, TimerError> {
        validate_total(total_secs)?;
        Ok(Self {
            spec,
            total_secs,
            state: TimerState::Idle,
            elapsed_ms: 0,
            accumulated_ms: 0,
            resumed_at_ms: None,
            started_at_ms: None,
            projection: Projection::default(),
            last_seen_ms: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn spec(&self) -> &PhaseSpec {
        &self.spec
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms / 1000
    }

    pub fn remaining_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.elapsed_secs())
    }

    pub fn current_phase_index(&self) -> usize {
        self.projection.phase_index
    }

    pub fn current_phase(&self) -> &Phase {
        // A PhaseSpec is never empty, so index 0 always exists.
        self.spec
            .get(self.projection.phase_index)
            .unwrap_or(&self.spec.phases()[0])
    }

    pub fn phase_elapsed_secs(&self) -> u64 {
        self.projection.phase_elapsed_secs
    }

    /// Seconds left in the current phase.
    pub fn phase_remaining_secs(&self) -> u64 {
        self.current_phase()
            .duration_secs
            .saturating_sub(self.projection.phase_elapsed_secs)
    }

    /// Full passes through the phase sequence, i.e. the breath count.
    pub fn cycle_count(&self) -> u64 {
        self.projection.cycle_count
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// 0.0 .. 100.0 progress across the whole session.
    pub fn progress_pct(&self) -> f64 {
        let total_ms = self.total_ms();
        if total_ms == 0 {
            return 0.0;
        }
        (self.elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at_ms.map(to_datetime)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs,
            phase_index: self.projection.phase_index,
            phase_name: self.current_phase().name.clone(),
            phase_elapsed_secs: self.projection.phase_elapsed_secs,
            phase_remaining_secs: self.phase_remaining_secs(),
            cycle_count: self.projection.cycle_count,
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from idle or resume from paused. No-op while running or completed.
    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if matches!(self.state, TimerState::Idle | TimerState::Paused) {
            self.last_seen_ms = Some(now_ms);
        }
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                self.accumulated_ms = 0;
                self.elapsed_ms = 0;
                self.resumed_at_ms = Some(now_ms);
                self.started_at_ms = Some(now_ms);
                self.projection = self.spec.project(0);
                debug!(total_secs = self.total_secs, "phase timer started");
                Some(Event::TimerStarted {
                    phase_index: self.projection.phase_index,
                    phase_name: self.current_phase().name.clone(),
                    total_secs: self.total_secs,
                    at: to_datetime(now_ms),
                })
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.accumulated_ms = self.elapsed_ms;
                self.resumed_at_ms = Some(now_ms);
                debug!(elapsed_ms = self.elapsed_ms, "phase timer resumed");
                Some(Event::TimerResumed {
                    elapsed_secs: self.elapsed_secs(),
                    remaining_secs: self.remaining_secs(),
                    at: to_datetime(now_ms),
                })
            }
            TimerState::Running | TimerState::Completed => None,
        }
    }

    /// Freeze elapsed and phase fields at their last-ticked values.
    /// No-op unless running.
    ///
    /// The event is stamped with the host time of the last tick.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        self.accumulated_ms = self.elapsed_ms;
        self.resumed_at_ms = None;
        debug!(elapsed_ms = self.elapsed_ms, "phase timer paused");
        Some(Event::TimerPaused {
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            at: self.last_seen_at(),
        })
    }

    /// Return to idle with every counter zeroed, optionally swapping in a new
    /// phase sequence and/or session length.
    ///
    /// The event is stamped with the host time of the last `start` or tick.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `total_secs` is zero. The timer is
    /// left untouched in that case.
    pub fn reset(
        &mut self,
        spec: Option<PhaseSpec>,
        total_secs: Option<u64>,
    ) -> Result<Event, TimerError> {
        if let Some(total) = total_secs {
            validate_total(total)?;
            self.total_secs = total;
        }
        if let Some(spec) = spec {
            self.spec = spec;
        }
        self.state = TimerState::Idle;
        self.elapsed_ms = 0;
        self.accumulated_ms = 0;
        self.resumed_at_ms = None;
        self.started_at_ms = None;
        self.projection = Projection::default();
        debug!(total_secs = self.total_secs, phases = self.spec.len(), "phase timer reset");
        Ok(Event::TimerReset {
            at: self.last_seen_at(),
        })
    }

    /// Recompute elapsed time from the wall clock and re-project the phase.
    ///
    /// Returns `Some(Event::TimerCompleted)` when the session length is
    /// reached, `Some(Event::PhaseChanged)` when the phase or cycle moved,
    /// `None` otherwise. Does nothing unless running.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let resumed_at = self.resumed_at_ms?;
        let total_ms = self.total_ms();
        self.last_seen_ms = Some(now_ms);

        // A clock that went backwards contributes nothing and never regresses.
        let segment = now_ms.saturating_sub(resumed_at);
        self.elapsed_ms = self
            .accumulated_ms
            .saturating_add(segment)
            .min(total_ms)
            .max(self.elapsed_ms);

        let previous = self.projection;
        self.projection = self.spec.project(self.elapsed_secs());

        if self.elapsed_ms >= total_ms {
            self.state = TimerState::Completed;
            self.accumulated_ms = self.elapsed_ms;
            self.resumed_at_ms = None;
            debug!(cycles = self.projection.cycle_count, "phase timer completed");
            return Some(Event::TimerCompleted {
                total_secs: self.total_secs,
                cycle_count: self.projection.cycle_count,
                at: to_datetime(now_ms),
            });
        }

        if self.projection.phase_index != previous.phase_index
            || self.projection.cycle_count != previous.cycle_count
        {
            return Some(Event::PhaseChanged {
                phase_index: self.projection.phase_index,
                phase_name: self.current_phase().name.clone(),
                cycle_count: self.projection.cycle_count,
                at: to_datetime(now_ms),
            });
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn total_ms(&self) -> u64 {
        self.total_secs.saturating_mul(1000)
    }

    /// Falls back to the system clock before the host has supplied a time.
    fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_seen_ms.map(to_datetime).unwrap_or_else(Utc::now)
    }
}

fn validate_total(total_secs: u64) -> Result<(), TimerError> {
    if total_secs == 0 {
        return Err(TimerError::invalid("session length must be positive"));
    }
    Ok(())
}

fn to_datetime(epoch_ms: u64) -> DateTime<Utc> {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
