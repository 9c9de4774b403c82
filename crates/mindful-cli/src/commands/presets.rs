use mindful_core::{format_clock, Config};
use serde_json::json;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let pattern = &config.breathing.pattern;

    let presets = json!({
        "breathing": {
            "pattern": pattern,
            "cycle_secs": pattern.cycle_secs(),
            "default_minutes": config.breathing.default_minutes,
            "duration_options": config.breathing.duration_options,
        },
        "focus": {
            "default_minutes": config.focus.default_minutes,
            "presets": config
                .focus
                .presets
                .iter()
                .map(|m| json!({ "minutes": m, "clock": format_clock(m * 60) }))
                .collect::<Vec<_>>(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&presets)?);
    Ok(())
}
