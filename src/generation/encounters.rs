//! # Encounter Generation
//!
//! Depth-scaled monster catalogue and random monster placement.

use crate::game::{Level, Monster, Position};
use crate::generation::PopulationConfig;
use crate::utils::{Dice, DiceExpression};
use log::debug;

const fn dice(count: u32, faces: u32, modifier: i32) -> DiceExpression {
    DiceExpression {
        count,
        faces,
        modifier,
    }
}

/// Stat block for a catalogue monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterTemplate {
    pub name: &'static str,
    pub hit_dice: DiceExpression,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: DiceExpression,
}

impl MonsterTemplate {
    /// Creates a monster with freshly rolled hit points.
    pub fn spawn(&self, dice: &mut Dice) -> Monster {
        Monster::new(
            self.name,
            self.hit_dice,
            self.armor_class,
            self.attack_bonus,
            self.damage,
            dice,
        )
    }
}

/// Monsters found at every depth.
pub const COMMON_MONSTERS: [MonsterTemplate; 5] = [
    MonsterTemplate {
        name: "Goblin",
        hit_dice: dice(1, 8, 0),
        armor_class: 12,
        attack_bonus: 1,
        damage: dice(1, 6, 0),
    },
    MonsterTemplate {
        name: "Orc",
        hit_dice: dice(2, 8, 0),
        armor_class: 13,
        attack_bonus: 2,
        damage: dice(1, 8, 1),
    },
    MonsterTemplate {
        name: "Skeleton",
        hit_dice: dice(1, 8, 0),
        armor_class: 13,
        attack_bonus: 1,
        damage: dice(1, 6, 0),
    },
    MonsterTemplate {
        name: "Zombie",
        hit_dice: dice(2, 8, 2),
        armor_class: 11,
        attack_bonus: 1,
        damage: dice(1, 6, 1),
    },
    MonsterTemplate {
        name: "Kobold",
        hit_dice: dice(1, 6, 0),
        armor_class: 12,
        attack_bonus: 0,
        damage: dice(1, 4, 0),
    },
];

/// Monsters that join the pool from [`DEEP_MONSTER_DEPTH`] on.
pub const DEEP_MONSTERS: [MonsterTemplate; 2] = [
    MonsterTemplate {
        name: "Bugbear",
        hit_dice: dice(3, 8, 3),
        armor_class: 14,
        attack_bonus: 3,
        damage: dice(1, 8, 2),
    },
    MonsterTemplate {
        name: "Ogre",
        hit_dice: dice(4, 8, 8),
        armor_class: 13,
        attack_bonus: 5,
        damage: dice(2, 6, 3),
    },
];

pub const DEEP_MONSTER_DEPTH: u32 = 3;

/// Places monsters on freshly built levels.
#[derive(Debug, Clone, Default)]
pub struct EncounterGenerator {
    pub population: PopulationConfig,
}

impl EncounterGenerator {
    pub fn new(population: PopulationConfig) -> Self {
        Self { population }
    }

    /// Monster pool for a dungeon depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::EncounterGenerator;
    ///
    /// assert_eq!(EncounterGenerator::catalogue(1).len(), 5);
    /// assert_eq!(EncounterGenerator::catalogue(3).len(), 7);
    /// ```
    pub fn catalogue(depth: u32) -> Vec<MonsterTemplate> {
        let mut pool = COMMON_MONSTERS.to_vec();
        if depth >= DEEP_MONSTER_DEPTH {
            pool.extend_from_slice(&DEEP_MONSTERS);
        }
        pool
    }

    /// Picks and spawns a random monster suited to `depth`.
    pub fn random_monster(&self, depth: u32, dice: &mut Dice) -> Monster {
        let pool = Self::catalogue(depth);
        pool[dice.index(pool.len())].spawn(dice)
    }

    /// Scatters up to `monster_count(depth)` monsters over random interior
    /// cells, giving up after ten attempts per monster. Blocked cells, occupied
    /// cells and stairs are skipped. Returns how many were placed.
    pub fn populate(&self, level: &mut Level, depth: u32, dice: &mut Dice) -> u32 {
        let count = self.population.monster_count(depth);
        let max_attempts = count * 10;
        let (max_x, max_y) = (level.width as i32 - 2, level.height as i32 - 2);

        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < max_attempts {
            attempts += 1;
            let pos = Position::new(dice.range(1, max_x), dice.range(1, max_y));
            if level.is_blocked(pos)
                || level.monster_at(pos).is_some()
                || level.stairs_up == Some(pos)
                || level.stairs_down == Some(pos)
            {
                continue;
            }
            let monster = self.random_monster(depth, dice);
            if level.place_monster(monster, pos).is_some() {
                placed += 1;
            }
        }

        debug!(
            "placed {}/{} monsters in {} attempts",
            placed, count, attempts
        );
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_level(width: u32, height: u32) -> Level {
        let mut level = Level::new(width, height);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                level.carve_floor(Position::new(x, y));
            }
        }
        level
    }

    #[test]
    fn test_catalogue_grows_with_depth() {
        let shallow: Vec<_> = EncounterGenerator::catalogue(2)
            .iter()
            .map(|t| t.name)
            .collect();
        assert!(!shallow.contains(&"Ogre"));
        let deep: Vec<_> = EncounterGenerator::catalogue(3)
            .iter()
            .map(|t| t.name)
            .collect();
        assert!(deep.contains(&"Bugbear"));
        assert!(deep.contains(&"Ogre"));
    }

    #[test]
    fn test_spawned_hit_points_follow_dice() {
        let mut dice = Dice::seeded(8);
        for template in EncounterGenerator::catalogue(5) {
            let monster = template.spawn(&mut dice);
            assert!(monster.max_hp >= template.hit_dice.min().max(1));
            assert!(monster.max_hp <= template.hit_dice.max());
            assert_eq!(monster.current_hp, monster.max_hp);
        }
    }

    #[test]
    fn test_populate_places_expected_count() {
        let generator = EncounterGenerator::default();
        let mut level = open_level(30, 20);
        let placed = generator.populate(&mut level, 2, &mut Dice::seeded(4));
        assert_eq!(placed, 7);
        assert_eq!(level.monsters().len(), 7);
        for occupant in level.monsters() {
            assert!(!level.is_blocked(occupant.position));
        }
    }

    #[test]
    fn test_populate_gives_up_on_full_level() {
        let generator = EncounterGenerator::default();
        let mut level = Level::new(10, 10);
        level.carve_floor(Position::new(4, 4));
        let placed = generator.populate(&mut level, 1, &mut Dice::seeded(2));
        assert!(placed <= 1);
    }

    #[test]
    fn test_populate_avoids_stairs() {
        let generator = EncounterGenerator::new(PopulationConfig {
            base_monster_count: 1,
            monsters_per_level: 0,
            chest_spawn_chance: 0.0,
        });
        let mut level = Level::new(5, 5);
        level.carve_floor(Position::new(2, 2));
        level.set_stairs_up(Position::new(2, 2));
        assert_eq!(generator.populate(&mut level, 1, &mut Dice::seeded(1)), 0);
    }
}
