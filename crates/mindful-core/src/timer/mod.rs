mod engine;
mod phase;
mod presets;

pub use engine::{now_ms, PhaseTimer, TimerState};
pub use phase::{Phase, PhaseSpec, Projection};
pub use presets::{
    SessionKind, BREATHING_DURATION_OPTIONS_MIN, DEFAULT_BREATHING_MIN, DEFAULT_FOCUS_MIN,
    FOCUS_PRESETS_MIN,
};

/// Format seconds as a zero-padded `MM:SS` clock. Minutes are not capped at 59.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::format_clock;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(3600 + 1), "60:01");
    }
}
