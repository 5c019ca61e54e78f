//! # Level Lifecycle Cache
//!
//! Keeps every level the party has entered alive for the rest of the session.
//!
//! Predefined levels are immutable templates. The first request for a level
//! number clones its template (or generates a fresh level when there is none)
//! into a boxed instance; every later request returns that same instance, so
//! dead monsters, opened doors and looted chests persist across visits.

use crate::game::world::Level;
use crate::generation::{
    scatter_chests, EncounterGenerator, GenerationConfig, Generator, PopulationConfig,
    RoomCorridorGenerator,
};
use crate::utils::Dice;
use crate::{DelveError, DelveResult};
use log::info;
use std::collections::HashMap;

/// Where a cached level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOrigin {
    Template,
    Generated,
}

/// Bookkeeping recorded when a level is first built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelBuild {
    pub origin: LevelOrigin,
    /// Monsters placed by auto-population; `None` when the level arrived with
    /// its own monsters
    pub spawned_monsters: Option<u32>,
    pub chests_placed: usize,
}

#[derive(Debug)]
struct CachedLevel {
    level: Box<Level>,
    build: LevelBuild,
}

/// Keyed store of level instances, indexed by depth starting at 1.
///
/// # Examples
///
/// ```
/// use delve::{Dice, GenerationConfig, LevelCache, PopulationConfig};
///
/// let mut cache = LevelCache::new(GenerationConfig::new(1), PopulationConfig::default());
/// let mut dice = Dice::seeded(1);
/// let first = cache.get_or_create(2, &mut dice).unwrap() as *const _;
/// let second = cache.get_or_create(2, &mut dice).unwrap() as *const _;
/// assert_eq!(first, second);
/// ```
#[derive(Debug)]
pub struct LevelCache {
    templates: Vec<Level>,
    instances: HashMap<u32, CachedLevel>,
    generator: RoomCorridorGenerator,
    generation: GenerationConfig,
    encounters: EncounterGenerator,
}

impl LevelCache {
    pub fn new(generation: GenerationConfig, population: PopulationConfig) -> Self {
        Self {
            templates: Vec::new(),
            instances: HashMap::new(),
            generator: RoomCorridorGenerator::new(),
            generation,
            encounters: EncounterGenerator::new(population),
        }
    }

    /// Installs predefined levels; template `i` serves depth `i + 1`. Deeper
    /// levels fall back to generation.
    pub fn with_templates(mut self, templates: Vec<Level>) -> Self {
        self.templates = templates;
        self
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.instances.contains_key(&number)
    }

    pub fn get(&self, number: u32) -> Option<&Level> {
        self.instances.get(&number).map(|cached| cached.level.as_ref())
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut Level> {
        self.instances
            .get_mut(&number)
            .map(|cached| cached.level.as_mut())
    }

    /// How the level was built, if it has been.
    pub fn build_info(&self, number: u32) -> Option<LevelBuild> {
        self.instances.get(&number).map(|cached| cached.build)
    }

    /// Level numbers built so far, ascending.
    pub fn visited(&self) -> Vec<u32> {
        let mut numbers: Vec<_> = self.instances.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    /// Returns the instance for `number`, building and recording it first if
    /// this is the first request.
    pub fn get_or_create(&mut self, number: u32, dice: &mut Dice) -> DelveResult<&mut Level> {
        if number == 0 {
            return Err(DelveError::InvalidAction(
                "level numbers start at 1".to_string(),
            ));
        }

        if !self.instances.contains_key(&number) {
            let cached = self.build(number, dice)?;
            self.instances.insert(number, cached);
        }

        self.get_mut(number)
            .ok_or_else(|| DelveError::InvalidState(format!("level {} missing from cache", number)))
    }

    fn build(&self, number: u32, dice: &mut Dice) -> DelveResult<CachedLevel> {
        let (mut level, origin) = match self.templates.get(number as usize - 1) {
            Some(template) => (template.clone(), LevelOrigin::Template),
            None => (
                self.generator.generate(&self.generation, dice)?,
                LevelOrigin::Generated,
            ),
        };

        let spawned_monsters = if level.monsters().is_empty() {
            Some(self.encounters.populate(&mut level, number, dice))
        } else {
            None
        };

        let chests_placed = if level.chests().is_empty() {
            scatter_chests(
                &mut level,
                self.encounters.population.chest_spawn_chance,
                dice,
            )
        } else {
            0
        };

        info!(
            "built level {} ({:?}): {} monsters, {} chests",
            number,
            origin,
            level.monsters().len(),
            level.chests().len()
        );

        Ok(CachedLevel {
            level: Box::new(level),
            build: LevelBuild {
                origin,
                spawned_monsters,
                chests_placed,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Monster, Position};

    fn cache() -> LevelCache {
        LevelCache::new(GenerationConfig::new(11), PopulationConfig::default())
    }

    fn template_with_monster() -> Level {
        let mut level = Level::new(10, 6);
        for x in 1..9 {
            for y in 1..5 {
                level.carve_floor(Position::new(x, y));
            }
        }
        level.set_stairs_up(Position::new(1, 1));
        level.set_stairs_down(Position::new(8, 4));
        level.place_monster(
            Monster::with_hit_points(
                "Skeleton",
                "1d8".parse().unwrap(),
                6,
                13,
                1,
                "1d6".parse().unwrap(),
            ),
            Position::new(4, 2),
        );
        level
    }

    #[test]
    fn test_same_number_same_instance() {
        let mut cache = cache();
        let mut dice = Dice::seeded(1);
        let first: *const Level = cache.get_or_create(3, &mut dice).unwrap();
        cache.get_or_create(4, &mut dice).unwrap();
        let second: *const Level = cache.get_or_create(3, &mut dice).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(cache.visited(), vec![3, 4]);
    }

    #[test]
    fn test_mutation_survives_revisit() {
        let mut cache = cache();
        let mut dice = Dice::seeded(2);
        let level = cache.get_or_create(3, &mut dice).unwrap();
        let before = level.monsters().len();
        assert!(before > 0);
        let id = level.monsters()[0].id;
        level.remove_monster(id);

        let level = cache.get_or_create(3, &mut dice).unwrap();
        assert_eq!(level.monsters().len(), before - 1);
        assert!(level.monster(id).is_none());
    }

    #[test]
    fn test_generated_levels_are_populated() {
        let mut cache = cache();
        let mut dice = Dice::seeded(3);
        cache.get_or_create(1, &mut dice).unwrap();
        let build = cache.build_info(1).unwrap();
        assert_eq!(build.origin, LevelOrigin::Generated);
        assert!(build.spawned_monsters.is_some());
    }

    #[test]
    fn test_template_is_cloned_once_and_not_populated() {
        let mut cache = cache().with_templates(vec![template_with_monster()]);
        let mut dice = Dice::seeded(4);

        let level = cache.get_or_create(1, &mut dice).unwrap();
        assert_eq!(level.monsters().len(), 1);
        let id = level.monsters()[0].id;
        level.remove_monster(id);

        let level = cache.get_or_create(1, &mut dice).unwrap();
        assert!(level.monsters().is_empty());
        let build = cache.build_info(1).unwrap();
        assert_eq!(build.origin, LevelOrigin::Template);
        assert_eq!(build.spawned_monsters, None);
    }

    #[test]
    fn test_depth_beyond_templates_is_generated() {
        let mut cache = cache().with_templates(vec![template_with_monster()]);
        let mut dice = Dice::seeded(5);
        let level = cache.get_or_create(2, &mut dice).unwrap();
        assert_eq!((level.width, level.height), (80, 24));
        assert_eq!(cache.build_info(2).unwrap().origin, LevelOrigin::Generated);
    }

    #[test]
    fn test_level_zero_is_rejected() {
        let mut cache = cache();
        assert!(matches!(
            cache.get_or_create(0, &mut Dice::seeded(1)),
            Err(DelveError::InvalidAction(_))
        ));
        assert!(!cache.contains(0));
    }
}
