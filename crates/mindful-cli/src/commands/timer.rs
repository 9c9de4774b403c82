use std::time::Duration;

use clap::Subcommand;
use mindful_core::{
    now_ms, CompletedSession, CompletionStore, Config, Database, Event, PhaseSpec, PhaseTimer,
    SessionKind, TimerState,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const TIMER_KEY: &str = "phase_timer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session, or resume a paused one
    Start {
        /// Session kind: breathing or focus. Reconfigures the timer when given.
        #[arg(long)]
        kind: Option<SessionKind>,
        /// Session length in minutes. Reconfigures the timer when given.
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop and return to idle, optionally with a new configuration
    Reset {
        #[arg(long)]
        kind: Option<SessionKind>,
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Print current timer state as JSON
    Status,
    /// Drive the timer in the foreground until it completes (Ctrl-C pauses)
    Run,
}

/// Timer plus the kind it was configured for, persisted between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedTimer {
    kind: SessionKind,
    timer: PhaseTimer,
}

impl SavedTimer {
    fn build(
        config: &Config,
        kind: SessionKind,
        minutes: Option<u64>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let minutes = minutes.unwrap_or(match kind {
            SessionKind::Breathing => config.breathing.default_minutes,
            SessionKind::Focus => config.focus.default_minutes,
        });
        let timer = kind.timer(&config.breathing.pattern, minutes)?;
        Ok(Self { kind, timer })
    }

    /// Swap in a new kind and/or length, keeping whatever was not given.
    fn reconfigure(
        &mut self,
        config: &Config,
        kind: Option<SessionKind>,
        minutes: Option<u64>,
    ) -> Result<Event, Box<dyn std::error::Error>> {
        let kind = kind.unwrap_or(self.kind);
        let minutes =
            minutes.or_else(|| (kind == self.kind).then(|| self.timer.total_secs() / 60));
        let fresh = Self::build(config, kind, minutes)?;
        let event = self
            .timer
            .reset(Some(fresh.timer.spec().clone()), Some(fresh.timer.total_secs()))?;
        self.kind = kind;
        Ok(event)
    }
}

fn load_timer(db: &Database, config: &Config) -> Result<SavedTimer, Box<dyn std::error::Error>> {
    if let Some(json) = db.kv_get(TIMER_KEY)? {
        match serde_json::from_str::<SavedTimer>(&json) {
            Ok(saved) => return Ok(saved),
            Err(e) => warn!(error = %e, "discarding unreadable saved timer"),
        }
    }
    SavedTimer::build(config, SessionKind::Breathing, None)
}

fn save_timer(db: &Database, saved: &SavedTimer) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(saved)?;
    db.kv_set(TIMER_KEY, &json)?;
    Ok(())
}

fn session_label(kind: SessionKind, spec: &PhaseSpec) -> String {
    match kind {
        SessionKind::Breathing => spec
            .phases()
            .iter()
            .map(|p| p.duration_secs.to_string())
            .collect::<Vec<_>>()
            .join("-"),
        SessionKind::Focus => "focus".to_string(),
    }
}

/// Persist the session if `event` is its completion.
fn record_if_completed(
    store: &dyn CompletionStore,
    saved: &SavedTimer,
    event: &Event,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Event::TimerCompleted {
        total_secs,
        cycle_count,
        at,
    } = event
    {
        let session = CompletedSession {
            kind: saved.kind,
            label: session_label(saved.kind, saved.timer.spec()),
            duration_secs: *total_secs,
            cycles: *cycle_count,
            started_at: saved.timer.started_at().unwrap_or(*at),
            completed_at: *at,
        };
        let id = store.record_completion(&session)?;
        info!(id, kind = %saved.kind, "completed session recorded");
    }
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

/// Bring elapsed time up to `now`, recording a completion if one happens.
fn catch_up(
    store: &dyn CompletionStore,
    saved: &mut SavedTimer,
    now: u64,
) -> Result<Option<Event>, Box<dyn std::error::Error>> {
    let event = saved.timer.tick(now);
    if let Some(ref e) = event {
        record_if_completed(store, saved, e)?;
    }
    Ok(event)
}

/// Count the time up to `now`, then pause.
///
/// Returns the completion if the session ran out first, followed by the
/// pause event if the timer was still running.
fn interrupt(
    store: &dyn CompletionStore,
    saved: &mut SavedTimer,
    now: u64,
) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
    let mut events: Vec<Event> = catch_up(store, saved, now)?
        .into_iter()
        .filter(Event::is_completion)
        .collect();
    events.extend(saved.timer.pause());
    Ok(events)
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut saved = load_timer(&db, &config)?;

    match action {
        TimerAction::Start { kind, minutes } => {
            if kind.is_some() || minutes.is_some() {
                saved.reconfigure(&config, kind, minutes)?;
            }
            catch_up(&db, &mut saved, now_ms())?;
            match saved.timer.start(now_ms()) {
                Some(event) => print_event(&event)?,
                None => print_event(&saved.timer.snapshot())?,
            }
        }
        TimerAction::Pause => {
            let events = interrupt(&db, &mut saved, now_ms())?;
            for event in &events {
                print_event(event)?;
            }
            if !events.iter().any(|e| matches!(e, Event::TimerPaused { .. })) {
                print_event(&saved.timer.snapshot())?;
            }
        }
        TimerAction::Resume => match resume(&mut saved, now_ms()) {
            Some(event) => print_event(&event)?,
            None => print_event(&saved.timer.snapshot())?,
        },
        TimerAction::Reset { kind, minutes } => {
            if let Some(event) = catch_up(&db, &mut saved, now_ms())? {
                if event.is_completion() {
                    print_event(&event)?;
                }
            }
            let event = if kind.is_some() || minutes.is_some() {
                saved.reconfigure(&config, kind, minutes)?
            } else {
                saved.timer.reset(None, None)?
            };
            print_event(&event)?;
        }
        TimerAction::Status => {
            let event = catch_up(&db, &mut saved, now_ms())?;
            print_event(&saved.timer.snapshot())?;
            if let Some(event) = event.filter(Event::is_completion) {
                print_event(&event)?;
            }
        }
        TimerAction::Run => {
            run_foreground(&db, &config, &mut saved).await?;
        }
    }

    save_timer(&db, &saved)?;
    Ok(())
}

/// Resume a paused session. Idle, running and completed timers are left alone.
fn resume(saved: &mut SavedTimer, now: u64) -> Option<Event> {
    if saved.timer.state() != TimerState::Paused {
        return None;
    }
    saved.timer.start(now)
}

/// Tick on a fixed interval until the session completes or Ctrl-C pauses it.
async fn run_foreground(
    db: &Database,
    config: &Config,
    saved: &mut SavedTimer,
) -> Result<(), Box<dyn std::error::Error>> {
    if saved.timer.state() == TimerState::Completed {
        return Err("session already completed; run `mindful timer reset` first".into());
    }
    if let Some(event) = saved.timer.start(now_ms()) {
        println!("{}", serde_json::to_string(&event)?);
    }
    save_timer(db, saved)?;

    let mut interval = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event) = catch_up(db, saved, now_ms())? {
                    println!("{}", serde_json::to_string(&event)?);
                    if event.is_completion() {
                        break;
                    }
                }
            }
            _ = &mut ctrl_c => {
                for event in interrupt(db, saved, now_ms())? {
                    println!("{}", serde_json::to_string(&event)?);
                }
                info!(state = ?saved.timer.state(), "interrupted");
                break;
            }
        }
    }

    println!("{}", serde_json::to_string(&saved.timer.snapshot())?);
    Ok(())
}
