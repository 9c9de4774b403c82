use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// A named sub-interval of a repeating cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    /// Duration in seconds. Always positive inside a [`PhaseSpec`].
    pub duration_secs: u64,
}

impl Phase {
    pub fn new(name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
        }
    }
}

/// Where a given elapsed time lands inside the repeating phase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Projection {
    pub phase_index: usize,
    pub phase_elapsed_secs: u64,
    pub cycle_count: u64,
}

/// Ordered, non-empty sequence of phases with positive durations.
///
/// Validation runs on construction and on deserialization, so a `PhaseSpec`
/// value always satisfies its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseSpec {
    phases: Vec<Phase>,
    /// `starts[i]` is the offset of phase `i` within one cycle.
    starts: Vec<u64>,
    cycle_secs: u64,
}

impl PhaseSpec {
    /// Build a phase sequence.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the sequence is empty, a phase has a
    /// zero duration or an empty name, or the cycle length overflows.
    pub fn new(phases: Vec<Phase>) -> Result<Self, TimerError> {
        if phases.is_empty() {
            return Err(TimerError::invalid("phase sequence is empty"));
        }

        let mut starts = Vec::with_capacity(phases.len());
        let mut cycle_secs: u64 = 0;
        for (i, phase) in phases.iter().enumerate() {
            if phase.name.trim().is_empty() {
                return Err(TimerError::invalid(format!("phase {i} has an empty name")));
            }
            if phase.duration_secs == 0 {
                return Err(TimerError::invalid(format!(
                    "phase '{}' must last at least one second",
                    phase.name
                )));
            }
            starts.push(cycle_secs);
            cycle_secs = cycle_secs
                .checked_add(phase.duration_secs)
                .ok_or_else(|| TimerError::invalid("cycle length overflows"))?;
        }

        Ok(Self {
            phases,
            starts,
            cycle_secs,
        })
    }

    /// Inhale 4s, hold 4s, exhale 4s, pause 2s.
    pub fn box_breathing() -> Self {
        Self::from_static(&[("inhale", 4), ("hold", 4), ("exhale", 4), ("pause", 2)])
    }

    /// A single `focus` phase spanning the whole session.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `total_secs` is zero.
    pub fn focus(total_secs: u64) -> Result<Self, TimerError> {
        Self::new(vec![Phase::new("focus", total_secs)])
    }

    fn from_static(phases: &[(&str, u64)]) -> Self {
        let mut starts = Vec::with_capacity(phases.len());
        let mut cycle_secs = 0;
        for (_, d) in phases {
            starts.push(cycle_secs);
            cycle_secs += d;
        }
        Self {
            phases: phases.iter().map(|(n, d)| Phase::new(*n, *d)).collect(),
            starts,
            cycle_secs,
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false for a validated spec.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Length of one full pass through every phase, in seconds.
    pub fn cycle_secs(&self) -> u64 {
        self.cycle_secs
    }

    /// Project `elapsed_secs` onto the repeating sequence.
    ///
    /// Pure function of elapsed time: the result does not depend on how many
    /// ticks were delivered on the way there.
    pub fn project(&self, elapsed_secs: u64) -> Projection {
        let cycle_count = elapsed_secs / self.cycle_secs;
        let position = elapsed_secs % self.cycle_secs;
        // First phase whose start lies beyond `position`, minus one.
        let phase_index = self.starts.partition_point(|&start| start <= position) - 1;
        Projection {
            phase_index,
            phase_elapsed_secs: position - self.starts[phase_index],
            cycle_count,
        }
    }
}

impl Default for PhaseSpec {
    fn default() -> Self {
        Self::box_breathing()
    }
}

impl TryFrom<Vec<Phase>> for PhaseSpec {
    type Error = TimerError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseSpec> for Vec<Phase> {
    fn from(spec: PhaseSpec) -> Self {
        spec.phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_breathing_cycle_is_14_seconds() {
        let spec = PhaseSpec::box_breathing();
        assert_eq!(spec.len(), 4);
        assert_eq!(spec.cycle_secs(), 14);
    }

    #[test]
    fn box_breathing_matches_validated_constructor() {
        let built = PhaseSpec::new(vec![
            Phase::new("inhale", 4),
            Phase::new("hold", 4),
            Phase::new("exhale", 4),
            Phase::new("pause", 2),
        ])
        .unwrap();
        assert_eq!(built, PhaseSpec::box_breathing());
    }

    #[test]
    fn rejects_empty_sequence() {
        assert!(matches!(
            PhaseSpec::new(vec![]),
            Err(TimerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        let result = PhaseSpec::new(vec![Phase::new("inhale", 4), Phase::new("hold", 0)]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_blank_name() {
        assert!(PhaseSpec::new(vec![Phase::new("  ", 3)]).is_err());
    }

    #[test]
    fn projection_at_ten_seconds_lands_in_exhale() {
        let spec = PhaseSpec::box_breathing();
        let p = spec.project(10);
        assert_eq!(spec.get(p.phase_index).unwrap().name, "exhale");
        assert_eq!(p.phase_elapsed_secs, 2);
        assert_eq!(p.cycle_count, 0);
    }

    #[test]
    fn projection_at_thirty_seconds_wraps_to_inhale() {
        let spec = PhaseSpec::box_breathing();
        let p = spec.project(30);
        assert_eq!(p.phase_index, 0);
        assert_eq!(p.phase_elapsed_secs, 2);
        assert_eq!(p.cycle_count, 2);
    }

    #[test]
    fn projection_on_phase_boundaries() {
        let spec = PhaseSpec::box_breathing();
        assert_eq!(spec.project(0).phase_index, 0);
        assert_eq!(spec.project(4).phase_index, 1);
        assert_eq!(spec.project(4).phase_elapsed_secs, 0);
        assert_eq!(spec.project(13).phase_index, 3);
        let wrapped = spec.project(14);
        assert_eq!(wrapped.phase_index, 0);
        assert_eq!(wrapped.cycle_count, 1);
    }

    #[test]
    fn focus_spec_is_single_phase() {
        let spec = PhaseSpec::focus(1500).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec.project(600).phase_elapsed_secs, 600);
        assert!(PhaseSpec::focus(0).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: PhaseSpec =
            serde_json::from_str(r#"[{"name":"in","duration_secs":3}]"#).unwrap();
        assert_eq!(ok.cycle_secs(), 3);

        let bad = serde_json::from_str::<PhaseSpec>(r#"[{"name":"in","duration_secs":0}]"#);
        assert!(bad.is_err());
        assert!(serde_json::from_str::<PhaseSpec>("[]").is_err());
    }

    #[test]
    fn serializes_as_plain_phase_list() {
        let json = serde_json::to_value(PhaseSpec::box_breathing()).unwrap();
        assert_eq!(json[0]["name"], "inhale");
        assert_eq!(json[3]["duration_secs"], 2);
    }
}
