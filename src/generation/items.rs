//! # Treasure Generation
//!
//! Chest placement and chest gold.

use crate::game::Level;
use crate::utils::Dice;
use log::debug;

/// Gives each generated room a chest at its centre with probability
/// `chance`. Rooms whose centre is blocked or holds stairs get nothing.
/// Returns the number of chests placed.
pub fn scatter_chests(level: &mut Level, chance: f64, dice: &mut Dice) -> usize {
    let centres: Vec<_> = level.rooms.iter().map(|room| room.center()).collect();
    let mut placed = 0;
    for centre in centres {
        if dice.chance(chance) && level.place_chest(centre) {
            placed += 1;
        }
    }
    debug!("placed {} chests over {} rooms", placed, level.rooms.len());
    placed
}

/// Rolls the gold in a chest: `uniform(min, max) * depth`.
///
/// # Examples
///
/// ```
/// use delve::{roll_chest_gold, Dice};
///
/// let gold = roll_chest_gold(10, 50, 3, &mut Dice::seeded(1));
/// assert!((30..=150).contains(&gold));
/// ```
pub fn roll_chest_gold(min: i32, max: i32, depth: u32, dice: &mut Dice) -> u32 {
    let base = dice.range(min, max).max(0) as u32;
    base.saturating_mul(depth.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{utils, GenerationConfig, Generator, RoomCorridorGenerator};

    #[test]
    fn test_scatter_with_certain_chance() {
        let config = GenerationConfig::new(21);
        let mut dice = utils::create_dice(&config);
        let mut level = RoomCorridorGenerator::new()
            .generate(&config, &mut dice)
            .unwrap();
        let placed = scatter_chests(&mut level, 1.0, &mut dice);

        // Every room except those holding stairs gets a chest.
        let stairs_rooms = level
            .rooms
            .iter()
            .filter(|r| {
                Some(r.center()) == level.stairs_up || Some(r.center()) == level.stairs_down
            })
            .count();
        assert_eq!(placed, level.rooms.len() - stairs_rooms);
        for chest in level.chests() {
            assert_ne!(Some(*chest), level.stairs_up);
            assert_ne!(Some(*chest), level.stairs_down);
        }
    }

    #[test]
    fn test_scatter_with_zero_chance() {
        let config = GenerationConfig::new(21);
        let mut dice = utils::create_dice(&config);
        let mut level = RoomCorridorGenerator::new()
            .generate(&config, &mut dice)
            .unwrap();
        assert_eq!(scatter_chests(&mut level, 0.0, &mut dice), 0);
        assert!(level.chests().is_empty());
    }

    #[test]
    fn test_gold_scales_with_depth() {
        let mut dice = Dice::seeded(5);
        for depth in 1..=5 {
            let gold = roll_chest_gold(10, 50, depth, &mut dice);
            assert!(gold >= 10 * depth && gold <= 50 * depth);
        }
    }
}
