//! # Dungeon Generation
//!
//! Room-and-corridor level layout.
//!
//! Rooms are placed first-fit: each of `max_rooms` candidates is kept only if
//! it intersects no earlier room, and every kept room after the first is joined
//! to its predecessor by an L-shaped corridor. Stairs are placed once carving
//! is finished.

use crate::game::{Level, Position};
use crate::generation::{utils, GenerationConfig, Generator, Room};
use crate::utils::Dice;
use crate::DelveResult;
use log::{debug, info, warn};

/// Which leg of an L-shaped corridor is dug first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorridorShape {
    HorizontalFirst,
    VerticalFirst,
}

/// Primary dungeon generator using the room-and-corridor algorithm.
///
/// # Examples
///
/// ```
/// use delve::{Dice, GenerationConfig, Generator, RoomCorridorGenerator};
///
/// let generator = RoomCorridorGenerator::new();
/// let config = GenerationConfig::new(3);
/// let level = generator.generate(&config, &mut Dice::seeded(3)).unwrap();
/// assert_eq!((level.width, level.height), (80, 24));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoomCorridorGenerator;

impl RoomCorridorGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Draws one room candidate, or `None` when the room cannot fit inside
    /// the one-cell margin.
    fn room_candidate(
        &self,
        config: &GenerationConfig,
        dice: &mut Dice,
        id: u32,
    ) -> Option<Room> {
        let width = dice.range(config.min_room_size as i32, config.max_room_size as i32);
        let height = dice.range(config.min_room_size as i32, config.max_room_size as i32);

        let max_x = config.width as i32 - width - 1;
        let max_y = config.height as i32 - height - 1;
        if max_x < 1 || max_y < 1 {
            return None;
        }

        let x = dice.range(1, max_x);
        let y = dice.range(1, max_y);
        Some(Room::new(id, Position::new(x, y), width as u32, height as u32))
    }

    /// Carves a room's full rectangle as floor.
    fn carve_room(&self, level: &mut Level, room: &Room) {
        for pos in room.all_positions() {
            level.carve_floor(pos);
        }
    }

    fn carve_horizontal(&self, level: &mut Level, x1: i32, x2: i32, y: i32) {
        for x in x1.min(x2)..=x1.max(x2) {
            level.carve_floor(Position::new(x, y));
        }
    }

    fn carve_vertical(&self, level: &mut Level, y1: i32, y2: i32, x: i32) {
        for y in y1.min(y2)..=y1.max(y2) {
            level.carve_floor(Position::new(x, y));
        }
    }

    /// Carves a one-tile-wide L-shaped corridor, endpoints included.
    pub fn carve_l_corridor(
        &self,
        level: &mut Level,
        start: Position,
        end: Position,
        shape: CorridorShape,
    ) {
        match shape {
            CorridorShape::HorizontalFirst => {
                self.carve_horizontal(level, start.x, end.x, start.y);
                self.carve_vertical(level, start.y, end.y, end.x);
            }
            CorridorShape::VerticalFirst => {
                self.carve_vertical(level, start.y, end.y, start.x);
                self.carve_horizontal(level, start.x, end.x, end.y);
            }
        }
    }
}

impl Generator<Level> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, dice: &mut Dice) -> DelveResult<Level> {
        config.validate()?;

        let mut level = Level::new(config.width, config.height);
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..config.max_rooms {
            let Some(room) = self.room_candidate(config, dice, rooms.len() as u32) else {
                continue;
            };
            if rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }

            self.carve_room(&mut level, &room);
            if let Some(previous) = rooms.last() {
                let shape = if dice.chance(0.5) {
                    CorridorShape::HorizontalFirst
                } else {
                    CorridorShape::VerticalFirst
                };
                self.carve_l_corridor(&mut level, previous.center(), room.center(), shape);
            }
            debug!("accepted room {} at {:?}", room.id, room.top_left);
            rooms.push(room);
        }

        if let (Some(first), Some(last)) = (rooms.first(), rooms.last()) {
            level.set_stairs_up(first.center());
            level.set_stairs_down(last.center());
        }
        level.rooms = rooms;

        if level.rooms.is_empty() {
            warn!("no room fit in a {}x{} level", config.width, config.height);
            return Ok(level);
        }

        self.validate(&level, config)?;
        info!(
            "generated {}x{} level with {} rooms",
            level.width,
            level.height,
            level.rooms.len()
        );
        Ok(level)
    }

    fn validate(&self, level: &Level, _config: &GenerationConfig) -> DelveResult<()> {
        utils::validate_level(level)
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}
