//! # Generation Module
//!
//! Procedural content generation: level layout, monster placement and chests.
//!
//! Layout generation is deterministic for a given [`Dice`] state, so seeding
//! the dice reproduces a whole dungeon.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::config;
use crate::game::{Level, Position};
use crate::utils::{reachable_positions, Dice};
use crate::{DelveError, DelveResult};
use serde::{Deserialize, Serialize};

/// Configuration for level layout generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible sessions
    pub seed: u64,
    /// Level width in tiles
    pub width: u32,
    /// Level height in tiles
    pub height: u32,
    /// Room placement attempts; rejected candidates are not retried
    pub max_rooms: u32,
    /// Minimum room edge
    pub min_room_size: u32,
    /// Maximum room edge
    pub max_room_size: u32,
}

impl GenerationConfig {
    /// Creates the standard 80x24 configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!((config.width, config.height), (80, 24));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_MAP_WIDTH,
            height: config::DEFAULT_MAP_HEIGHT,
            max_rooms: config::MAX_ROOMS,
            min_room_size: config::MIN_ROOM_SIZE,
            max_room_size: config::MAX_ROOM_SIZE,
        }
    }

    /// Creates a configuration for testing with smaller, simpler levels.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 40,
            height: 20,
            max_rooms: 6,
            min_room_size: 3,
            max_room_size: 6,
        }
    }

    /// Checks `1 <= min_room_size <= max_room_size < min(width, height)`.
    pub fn validate(&self) -> DelveResult<()> {
        if self.min_room_size < 1 {
            return Err(DelveError::InvalidConfig(
                "min_room_size must be at least 1".to_string(),
            ));
        }
        if self.min_room_size > self.max_room_size {
            return Err(DelveError::InvalidConfig(format!(
                "min_room_size {} exceeds max_room_size {}",
                self.min_room_size, self.max_room_size
            )));
        }
        if self.max_room_size >= self.width.min(self.height) {
            return Err(DelveError::InvalidConfig(format!(
                "max_room_size {} must be smaller than the {}x{} map",
                self.max_room_size, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Configuration for populating freshly built levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Monsters on every auto-populated level
    pub base_monster_count: u32,
    /// Extra monsters per dungeon depth
    pub monsters_per_level: u32,
    /// Chance that a generated room receives a chest
    pub chest_spawn_chance: f64,
}

impl PopulationConfig {
    /// Monsters to place on a level at `depth`.
    pub fn monster_count(&self, depth: u32) -> u32 {
        self.base_monster_count + depth * self.monsters_per_level
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base_monster_count: config::BASE_MONSTER_COUNT,
            monsters_per_level: config::MONSTERS_PER_LEVEL,
            chest_spawn_chance: config::CHEST_SPAWN_CHANCE,
        }
    }
}

/// An axis-aligned rectangle of floor carved during generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Acceptance order within its level
    pub id: u32,
    pub top_left: Position,
    pub width: u32,
    pub height: u32,
}

impl Room {
    /// Creates a new room.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Room};
    ///
    /// let room = Room::new(0, Position::new(5, 5), 10, 8);
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// ```
    pub fn new(id: u32, top_left: Position, width: u32, height: u32) -> Self {
        Self {
            id,
            top_left,
            width,
            height,
        }
    }

    pub fn bottom_right(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 - 1,
            self.top_left.y + self.height as i32 - 1,
        )
    }

    /// Center cell, rounding toward the top-left.
    pub fn center(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 / 2,
            self.top_left.y + self.height as i32 / 2,
        )
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.top_left.x
            && pos.y >= self.top_left.y
            && pos.x < self.top_left.x + self.width as i32
            && pos.y < self.top_left.y + self.height as i32
    }

    /// Inclusive-bound overlap test: rooms that merely touch, or sit one
    /// cell apart, also intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Room};
    ///
    /// let a = Room::new(0, Position::new(1, 1), 4, 4);
    /// let touching = Room::new(1, Position::new(5, 1), 4, 4);
    /// let apart = Room::new(2, Position::new(6, 1), 4, 4);
    /// assert!(a.intersects(&touching));
    /// assert!(!a.intersects(&apart));
    /// ```
    pub fn intersects(&self, other: &Room) -> bool {
        self.top_left.x <= other.top_left.x + other.width as i32
            && self.top_left.x + self.width as i32 >= other.top_left.x
            && self.top_left.y <= other.top_left.y + other.height as i32
            && self.top_left.y + self.height as i32 >= other.top_left.y
    }

    /// Every cell covered by the room, row by row.
    pub fn all_positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(self.area() as usize);
        for y in self.top_left.y..(self.top_left.y + self.height as i32) {
            for x in self.top_left.x..(self.top_left.x + self.width as i32) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content, drawing all randomness from `dice`.
    fn generate(&self, config: &GenerationConfig, dice: &mut Dice) -> DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates dice seeded from the config.
    pub fn create_dice(config: &GenerationConfig) -> Dice {
        Dice::seeded(config.seed)
    }

    /// Validates that a level has floor and that every room centre can be
    /// walked to from the up staircase.
    pub fn validate_level(level: &Level) -> DelveResult<()> {
        if level.passable_count() == 0 {
            return Err(DelveError::GenerationFailed(
                "Level has no floor tiles".to_string(),
            ));
        }

        let Some(start) = level.stairs_up else {
            return Ok(());
        };
        let reach = reachable_positions(start, |pos| !level.is_blocked(pos));
        for room in &level.rooms {
            if !reach.contains(&room.center()) {
                return Err(DelveError::GenerationFailed(format!(
                    "Room {} is not reachable from the stairs",
                    room.id
                )));
            }
        }
        Ok(())
    }
}
