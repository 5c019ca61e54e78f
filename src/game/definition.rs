//! # Level Definitions
//!
//! Serde records for predefined and exported levels, and the conversions
//! between them and live [`Level`]s.
//!
//! Terrain is stored as row-major strings of map glyphs. Door and chest glyphs
//! only mark where a door or chest record is expected; the records themselves
//! carry the state.

use crate::game::door::{Door, DEFAULT_LOCKPICK_DC, DEFAULT_SMASH_DC};
use crate::game::entities::Monster;
use crate::game::world::{Level, Terrain};
use crate::game::Position;
use crate::utils::{Dice, DiceExpression};
use crate::{DelveError, DelveResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A predefined monster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDefinition {
    pub name: String,
    pub hit_dice: DiceExpression,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: DiceExpression,
    pub position: [i32; 2],
    /// Rolled from `hit_dice` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    /// Defaults to `max_hp`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
}

/// A predefined door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorDefinition {
    #[serde(default = "default_true")]
    pub horizontal: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_lockpick_dc")]
    pub lockpick_dc: i32,
    #[serde(default = "default_smash_dc")]
    pub smash_dc: i32,
    #[serde(default)]
    pub key_id: Option<String>,
    /// Defaults to `!locked`
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub is_destroyed: bool,
    pub position: [i32; 2],
}

fn default_true() -> bool {
    true
}

fn default_lockpick_dc() -> i32 {
    DEFAULT_LOCKPICK_DC
}

fn default_smash_dc() -> i32 {
    DEFAULT_SMASH_DC
}

impl DoorDefinition {
    /// Builds the door this record describes.
    pub fn to_door(&self) -> DelveResult<Door> {
        Door::from_parts(
            self.horizontal,
            self.locked,
            self.lockpick_dc,
            self.smash_dc,
            self.key_id.clone(),
            self.is_open.unwrap_or(!self.locked),
            self.is_destroyed,
        )
    }

    pub fn from_door(door: &Door, position: Position) -> Self {
        Self {
            horizontal: door.horizontal,
            locked: door.is_locked(),
            lockpick_dc: door.lockpick_dc,
            smash_dc: door.smash_dc,
            key_id: door.key_id.clone(),
            is_open: Some(door.is_open()),
            is_destroyed: door.is_destroyed(),
            position: position.into(),
        }
    }
}

/// One level of a dungeon file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<String>,
    #[serde(default)]
    pub stairs_up: Option<[i32; 2]>,
    #[serde(default)]
    pub stairs_down: Option<[i32; 2]>,
    #[serde(default)]
    pub chests: Vec<[i32; 2]>,
    #[serde(default)]
    pub monsters: Vec<MonsterDefinition>,
    #[serde(default)]
    pub doors: Vec<DoorDefinition>,
}

/// An ordered list of level definitions; index 0 is depth 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonDefinition {
    #[serde(default)]
    pub num_levels: usize,
    pub levels: Vec<LevelDefinition>,
}

impl DungeonDefinition {
    pub fn new(levels: Vec<LevelDefinition>) -> Self {
        Self {
            num_levels: levels.len(),
            levels,
        }
    }

    /// Parses a dungeon from JSON.
    pub fn from_json(json: &str) -> DelveResult<Self> {
        let dungeon: Self = serde_json::from_str(json)?;
        if dungeon.num_levels != 0 && dungeon.num_levels != dungeon.levels.len() {
            warn!(
                "dungeon declares {} levels but contains {}",
                dungeon.num_levels,
                dungeon.levels.len()
            );
        }
        Ok(dungeon)
    }

    pub fn to_json(&self) -> DelveResult<String> {
        serde_json::to_string_pretty(self).map_err(DelveError::from)
    }

    /// Reads a dungeon file.
    pub fn load(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let dungeon = Self::from_json(&json)?;
        info!(
            "loaded {} predefined levels from {}",
            dungeon.levels.len(),
            path.as_ref().display()
        );
        Ok(dungeon)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DelveResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Builds every level, failing on the first invalid one.
    pub fn build_levels(&self, dice: &mut Dice) -> DelveResult<Vec<Level>> {
        self.levels
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                Level::from_definition(definition, dice).map_err(|err| match err {
                    DelveError::InvalidLevelDefinition(msg) => DelveError::InvalidLevelDefinition(
                        format!("level {}: {}", index + 1, msg),
                    ),
                    other => other,
                })
            })
            .collect()
    }
}

fn invalid(message: impl Into<String>) -> DelveError {
    DelveError::InvalidLevelDefinition(message.into())
}

impl Level {
    /// Exports the level's current state.
    pub fn to_definition(&self) -> LevelDefinition {
        let tiles = self
            .rows()
            .map(|row| row.iter().map(|cell| cell.terrain.glyph()).collect())
            .collect();

        let monsters = self
            .monsters()
            .iter()
            .map(|occupant| MonsterDefinition {
                name: occupant.monster.name.clone(),
                hit_dice: occupant.monster.hit_dice,
                armor_class: occupant.monster.armor_class,
                attack_bonus: occupant.monster.attack_bonus,
                damage: occupant.monster.damage,
                position: occupant.position.into(),
                max_hp: Some(occupant.monster.max_hp),
                current_hp: Some(occupant.monster.current_hp),
            })
            .collect();

        LevelDefinition {
            width: self.width,
            height: self.height,
            tiles,
            stairs_up: self.stairs_up.map(Into::into),
            stairs_down: self.stairs_down.map(Into::into),
            chests: self.chests().iter().map(|&pos| pos.into()).collect(),
            monsters,
            doors: self
                .doors()
                .iter()
                .map(|placed| DoorDefinition::from_door(&placed.door, placed.position))
                .collect(),
        }
    }

    /// Builds a level from a definition.
    ///
    /// Monsters without stored hit points roll them from their hit dice. Any
    /// inconsistency between the terrain rows and the records fails the whole
    /// build with [`DelveError::InvalidLevelDefinition`].
    pub fn from_definition(definition: &LevelDefinition, dice: &mut Dice) -> DelveResult<Level> {
        if definition.width == 0 || definition.height == 0 {
            return Err(invalid("level must be at least 1x1"));
        }
        if definition.tiles.len() != definition.height as usize {
            return Err(invalid(format!(
                "expected {} tile rows, found {}",
                definition.height,
                definition.tiles.len()
            )));
        }

        let mut level = Level::new(definition.width, definition.height);
        let mut door_glyphs = Vec::new();
        let mut chest_glyphs = Vec::new();
        let mut glyph_stairs_up = None;
        let mut glyph_stairs_down = None;

        for (y, row) in definition.tiles.iter().enumerate() {
            if row.chars().count() != definition.width as usize {
                return Err(invalid(format!(
                    "row {} has {} columns, expected {}",
                    y,
                    row.chars().count(),
                    definition.width
                )));
            }
            for (x, glyph) in row.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                let terrain = Terrain::from_glyph(glyph).ok_or_else(|| {
                    invalid(format!("unknown glyph {:?} at ({}, {})", glyph, x, y))
                })?;
                match terrain {
                    Terrain::Wall => {}
                    Terrain::Floor => {
                        level.carve_floor(pos);
                    }
                    Terrain::Door { .. } => {
                        level.carve_floor(pos);
                        door_glyphs.push(pos);
                    }
                    Terrain::Chest => {
                        level.carve_floor(pos);
                        chest_glyphs.push(pos);
                    }
                    Terrain::StairsUp => {
                        level.carve_floor(pos);
                        glyph_stairs_up.get_or_insert(pos);
                    }
                    Terrain::StairsDown => {
                        level.carve_floor(pos);
                        glyph_stairs_down.get_or_insert(pos);
                    }
                }
            }
        }

        let stairs_up = definition.stairs_up.map(Position::from).or(glyph_stairs_up);
        let stairs_down = definition.stairs_down.map(Position::from).or(glyph_stairs_down);
        if let Some(pos) = stairs_up {
            if level.is_blocked(pos) {
                return Err(invalid(format!("stairs up at {:?} is not on floor", pos)));
            }
            level.set_stairs_up(pos);
        }
        if let Some(pos) = stairs_down {
            if level.is_blocked(pos) {
                return Err(invalid(format!("stairs down at {:?} is not on floor", pos)));
            }
            level.set_stairs_down(pos);
        }

        for &chest in &definition.chests {
            let pos = Position::from(chest);
            if !level.place_chest(pos) {
                return Err(invalid(format!("cannot place chest at {:?}", pos)));
            }
        }
        if let Some(pos) = chest_glyphs.iter().find(|pos| !level.has_chest(**pos)) {
            return Err(invalid(format!("chest glyph at {:?} has no chest record", pos)));
        }

        for record in &definition.doors {
            let pos = Position::from(record.position);
            let door = record.to_door()?;
            level
                .place_door(door, pos)
                .ok_or_else(|| invalid(format!("cannot place door at {:?}", pos)))?;
        }
        if let Some(pos) = door_glyphs.iter().find(|pos| level.door_at(**pos).is_none()) {
            return Err(invalid(format!("door glyph at {:?} has no door record", pos)));
        }

        for record in &definition.monsters {
            let pos = Position::from(record.position);
            for expression in [record.hit_dice, record.damage] {
                expression
                    .validate()
                    .map_err(|err| invalid(format!("{} at {:?}: {}", record.name, pos, err)))?;
            }
            let monster = match record.max_hp {
                Some(max_hp) => {
                    let mut monster = Monster::with_hit_points(
                        record.name.clone(),
                        record.hit_dice,
                        max_hp,
                        record.armor_class,
                        record.attack_bonus,
                        record.damage,
                    );
                    monster.current_hp = record.current_hp.unwrap_or(max_hp);
                    monster
                }
                None => Monster::new(
                    record.name.clone(),
                    record.hit_dice,
                    record.armor_class,
                    record.attack_bonus,
                    record.damage,
                    dice,
                ),
            };
            level
                .place_monster(monster, pos)
                .ok_or_else(|| invalid(format!("cannot place {} at {:?}", record.name, pos)))?;
        }

        Ok(level)
    }
}
