//! # Combat
//!
//! Round-by-round resolution of one character against a fixed roster of
//! monsters captured when the encounter starts.

use crate::config;
use crate::game::entities::{Character, Monster};
use crate::game::MonsterId;
use crate::utils::Dice;
use crate::{DelveError, DelveResult};
use log::{debug, info};

/// Result of one resolved round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Both sides still stand.
    Active { log: Vec<String> },
    /// Every monster in the roster is dead.
    Victory {
        log: Vec<String>,
        experience: u32,
        defeated: Vec<MonsterId>,
    },
    /// The acting character dropped to zero hit points.
    Defeat { log: Vec<String> },
}

impl RoundOutcome {
    pub fn log(&self) -> &[String] {
        match self {
            RoundOutcome::Active { log }
            | RoundOutcome::Victory { log, .. }
            | RoundOutcome::Defeat { log } => log,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RoundOutcome::Active { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncounterState {
    Active,
    Victory,
    Defeat,
}

/// An ongoing fight.
///
/// # Examples
///
/// ```
/// use delve::{
///     AbilityScores, Character, CharacterClass, CombatEncounter, Dice, Monster, RoundOutcome,
/// };
///
/// let mut hero = Character::new("Hero", CharacterClass::Fighter, 1, AbilityScores::default());
/// hero.current_hp = 0;
/// let (hit_dice, damage) = ("1d4".parse().unwrap(), "1d2".parse().unwrap());
/// let rat = Monster::with_hit_points("Rat", hit_dice, 2, 10, 0, damage);
/// let mut encounter = CombatEncounter::new(vec![(delve::new_monster_id(), rat)]);
///
/// let outcome = encounter.resolve_round(&mut hero, None, &mut Dice::seeded(1)).unwrap();
/// assert!(matches!(outcome, RoundOutcome::Defeat { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct CombatEncounter {
    roster: Vec<(MonsterId, Monster)>,
    state: EncounterState,
    round: u32,
    experience_per_monster: u32,
}

impl CombatEncounter {
    /// Starts an encounter. Monster order is the initiative order.
    pub fn new(roster: Vec<(MonsterId, Monster)>) -> Self {
        let state = if roster.iter().any(|(_, m)| m.is_alive()) {
            EncounterState::Active
        } else {
            EncounterState::Victory
        };
        Self {
            roster,
            state,
            round: 0,
            experience_per_monster: config::EXPERIENCE_PER_MONSTER,
        }
    }

    pub fn with_experience_per_monster(mut self, amount: u32) -> Self {
        self.experience_per_monster = amount;
        self
    }

    pub fn roster(&self) -> &[(MonsterId, Monster)] {
        &self.roster
    }

    pub fn living_monsters(&self) -> impl Iterator<Item = &(MonsterId, Monster)> {
        self.roster.iter().filter(|(_, m)| m.is_alive())
    }

    pub fn is_over(&self) -> bool {
        self.state != EncounterState::Active
    }

    /// Rounds resolved so far.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Resolves one round: the character strikes `target` (or the first living
    /// monster), then every living monster strikes back in roster order.
    ///
    /// Fails with [`DelveError::InvalidState`] once the encounter has ended and
    /// with [`DelveError::InvalidAction`] when `target` is not a living member
    /// of the roster.
    pub fn resolve_round(
        &mut self,
        character: &mut Character,
        target: Option<MonsterId>,
        dice: &mut Dice,
    ) -> DelveResult<RoundOutcome> {
        if self.is_over() {
            return Err(DelveError::InvalidState(
                "combat encounter has already ended".to_string(),
            ));
        }

        let mut log = Vec::new();

        if !character.is_alive() {
            log.push(format!("{} has fallen!", character.name));
            return Ok(self.finish_defeat(log));
        }

        let index = match target {
            Some(id) => self
                .roster
                .iter()
                .position(|(mid, m)| *mid == id && m.is_alive())
                .ok_or_else(|| {
                    DelveError::InvalidAction(format!("no living monster with id {}", id))
                })?,
            None => self
                .roster
                .iter()
                .position(|(_, m)| m.is_alive())
                .ok_or_else(|| DelveError::InvalidState("no living monsters".to_string()))?,
        };

        self.round += 1;

        let attack_modifier = character.attack_modifier();
        let weapon = character.weapon_damage;
        let monster = &mut self.roster[index].1;
        let roll = dice.ability_check(attack_modifier);
        if roll >= monster.armor_class {
            let damage = dice.roll(&weapon).max(1);
            monster.take_damage(damage);
            log.push(format!(
                "{} hits {} for {} damage! (Roll: {} vs AC {})",
                character.name, monster.name, damage, roll, monster.armor_class
            ));
            if !monster.is_alive() {
                log.push(format!("{} is slain!", monster.name));
            }
        } else {
            log.push(format!(
                "{} misses {}. (Roll: {} vs AC {})",
                character.name, monster.name, roll, monster.armor_class
            ));
        }

        for (_, monster) in self.roster.iter().filter(|(_, m)| m.is_alive()) {
            let roll = dice.ability_check(monster.attack_bonus);
            if roll >= character.armor_class {
                let damage = dice.roll(&monster.damage).max(1);
                character.take_damage(damage);
                log.push(format!(
                    "{} hits {} for {} damage!",
                    monster.name, character.name, damage
                ));
            } else {
                log.push(format!("{} misses {}.", monster.name, character.name));
            }
            if !character.is_alive() {
                break;
            }
        }
        debug!("combat round {} resolved", self.round);

        if !character.is_alive() {
            log.push(format!("{} has fallen!", character.name));
            return Ok(self.finish_defeat(log));
        }

        if self.roster.iter().all(|(_, m)| !m.is_alive()) {
            self.state = EncounterState::Victory;
            let experience = self.experience_per_monster * self.roster.len() as u32;
            log.push(format!("Victory! Gained {} experience.", experience));
            info!("combat won after {} rounds", self.round);
            return Ok(RoundOutcome::Victory {
                log,
                experience,
                defeated: self.roster.iter().map(|(id, _)| *id).collect(),
            });
        }

        Ok(RoundOutcome::Active { log })
    }

    fn finish_defeat(&mut self, log: Vec<String>) -> RoundOutcome {
        self.state = EncounterState::Defeat;
        info!("combat lost after {} rounds", self.round);
        RoundOutcome::Defeat { log }
    }

    /// Hands the roster back, e.g. to write damage onto the level after a flee.
    pub fn into_roster(self) -> Vec<(MonsterId, Monster)> {
        self.roster
    }
}
