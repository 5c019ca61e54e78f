//! # Delve
//!
//! Rules and simulation core for a turn-based, tile-grid dungeon crawl.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a handful of cooperating systems:
//!
//! - **Dice**: randomized numeric expressions (`2d8+3`) and d20 ability checks
//! - **World**: the tile grid, per-cell visibility, monsters, chests and doors
//! - **Generation**: room-and-corridor level generation plus level population
//! - **Doors**: a small state machine driven by lockpick and smash checks
//! - **Combat**: round-based attack/defense resolution against a monster roster
//! - **Level cache**: keeps every visited level alive for the whole session
//!
//! Input capture, screen output and on-disk file management are left to the
//! caller; the `input` and `rendering` modules only provide thin helpers.
//!
//! ## Concurrency
//!
//! Everything here is single-threaded and synchronous. A [`GameSession`] is not
//! safe for concurrent mutation from multiple threads without external
//! synchronization.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

/// Core error type for the Delve engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Dice expression could not be parsed
    #[error("Invalid dice expression: {0}")]
    InvalidExpression(String),

    /// Persisted level data is malformed or inconsistent
    #[error("Invalid level definition: {0}")]
    InvalidLevelDefinition(String),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    use crate::utils::DiceExpression;

    /// Default dungeon width in tiles
    pub const DEFAULT_MAP_WIDTH: u32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_MAP_HEIGHT: u32 = 24;

    /// Room placement attempts per level
    pub const MAX_ROOMS: u32 = 10;

    /// Smallest room edge
    pub const MIN_ROOM_SIZE: u32 = 4;

    /// Largest room edge
    pub const MAX_ROOM_SIZE: u32 = 10;

    /// Monsters on every freshly generated level
    pub const BASE_MONSTER_COUNT: u32 = 3;

    /// Additional monsters per dungeon depth
    pub const MONSTERS_PER_LEVEL: u32 = 2;

    /// Chance that a generated room receives a chest
    pub const CHEST_SPAWN_CHANCE: f64 = 0.3;

    /// Chest gold before the depth multiplier
    pub const BASE_GOLD_MIN: i32 = 10;

    /// Chest gold before the depth multiplier
    pub const BASE_GOLD_MAX: i32 = 50;

    /// Weapon damage for characters without an explicit weapon
    pub const BASE_WEAPON_DAMAGE: DiceExpression = DiceExpression {
        count: 1,
        faces: 8,
        modifier: 0,
    };

    /// Probability that fleeing from combat succeeds
    pub const FLEE_SUCCESS_CHANCE: f64 = 0.5;

    /// Chebyshev radius of the party's sight
    pub const VISION_RADIUS: i32 = 3;

    /// Largest sight radius a config may request
    pub const MAX_VISION_RADIUS: i32 = 100;

    /// Experience awarded per monster in a won encounter
    pub const EXPERIENCE_PER_MONSTER: u32 = 100;

    /// Largest party allowed
    pub const MAX_PARTY_SIZE: usize = 6;

    /// Messages retained in the session log
    pub const MESSAGE_LOG_SIZE: usize = 10;
}
