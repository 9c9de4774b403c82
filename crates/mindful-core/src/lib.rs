//! # Mindful Core Library
//!
//! This library provides the core logic behind the mindful breathing and
//! focus tools. All behaviour lives here; the `mindful` CLI is a thin host
//! that feeds the clock in, renders events and persists completed sessions.
//!
//! ## Architecture
//!
//! - **Phase Timer**: A wall-clock-based state machine that cycles through a
//!   named phase sequence. The caller periodically invokes `tick(now)`; phase
//!   identity is projected from total elapsed time, so missed ticks never
//!   cause drift
//! - **Presets**: Box breathing, breathing session lengths and focus presets
//! - **Storage**: SQLite-based completion records and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PhaseTimer`]: Core timer state machine
//! - [`PhaseSpec`]: Validated phase sequence and projection
//! - [`Database`]: Completed-session persistence and statistics
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use storage::{CompletedSession, CompletionStore, Config, Database, Stats};
pub use timer::{format_clock, now_ms, Phase, PhaseSpec, PhaseTimer, SessionKind, TimerState};
