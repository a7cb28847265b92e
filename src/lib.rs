//! # Gloomcrawl
//!
//! A small turn-based dungeon crawler: a hero wanders a square grid of
//! rooms, haggles with merchants, fights whatever else lives down here,
//! and tries to reach the far corner alive.
//!
//! ## Architecture Overview
//!
//! The crate is split into an engine and a thin terminal front end:
//!
//! - **Game State**: the [`GameSession`] owns the roster and all
//!   session flags; no globals, every operation receives the session
//!   through the [`GameEngine`].
//! - **Encounter Engine**: movement, combat, retreat, trade, and mimic
//!   resolution as a single state machine driven one command at a time.
//! - **Generation System**: random dungeon sizing and population with
//!   collision-free placement.
//! - **Persistence**: a flat `key: value` save format with a two-pass
//!   loader.
//! - **Command Input**: a tokenizer producing a closed command enum
//!   from per-locale synonym tables.
//!
//! The engine never prints. It queues [`GameEvent`] values which the
//! presentation layer (here, `src/main.rs`) drains and renders.

pub mod game;
pub mod generation;
pub mod input;
pub mod persistence;

pub use game::{
    Character, CharacterKind, Direction, DisplayState, GameEngine, GameEvent, GameOutcome,
    GameSession, HelpContext, Language, PotionKind, Position,
};
pub use generation::roll_dungeon_size;
pub use input::{AdminCommand, Command, InputMode};
pub use persistence::SaveStore;

/// Core error type for the Gloomcrawl engine.
#[derive(thiserror::Error, Debug)]
pub enum CrawlError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An engine invariant was broken; this is a bug, not user error
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Operation is not legal in the current session state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A save file could not be parsed
    #[error("malformed save file: {0}")]
    MalformedSave(String),
}

/// Result type used throughout the Gloomcrawl codebase.
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Hero health at the start of a run
    pub const HERO_STARTING_HEALTH: i32 = 100;

    /// Hero damage ceiling without a strength potion
    pub const HERO_BASE_DAMAGE: i32 = 25;

    /// Hero damage ceiling while a strength potion is active
    pub const HERO_BOOSTED_DAMAGE: i32 = 50;

    /// Health lost on every turn the hero takes
    pub const TURN_HEALTH_DECAY: i32 = 2;

    /// Health restored by drinking a health potion
    pub const HEALTH_POTION_RESTORE: i32 = 25;

    /// Number of turn increments a strength potion lasts
    pub const STRENGTH_POTION_TURNS: u32 = 5;

    /// Price a merchant asks for any potion
    pub const POTION_PRICE: i32 = 50;

    /// Gold found inside a treasure chest that chose not to bite
    pub const CHEST_REWARD: i32 = 15;

    /// Below this health a cornered monster always fights
    pub const FORCED_COMBAT_THRESHOLD: i32 = 75;

    /// Divisor applied to the cell count when sizing the population
    pub const SPAWN_DENSITY_DIVISOR: f64 = 5.5;

    /// Default directory for save files
    pub const DEFAULT_SAVE_DIR: &str = "saves";
}
