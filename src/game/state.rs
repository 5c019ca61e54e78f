//! # Game Session
//!
//! Central session state and the operations that sequence every other system.
//!
//! A [`GameSession`] owns the party, the level cache, the dice and the active
//! encounter. Every operation is a single synchronous call that completes
//! before the next input is accepted. The session is not safe for concurrent
//! mutation from multiple threads without external synchronization.

use crate::config;
use crate::game::combat::{CombatEncounter, RoundOutcome};
use crate::game::definition::DungeonDefinition;
use crate::game::door::DoorAttempt;
use crate::game::entities::{Monster, Party};
use crate::game::levels::{LevelCache, LevelOrigin};
use crate::game::world::Level;
use crate::game::{Direction, DoorId, MonsterId, Position};
use crate::generation::{roll_chest_gold, GenerationConfig, PopulationConfig};
use crate::input::{Command, InputContext};
use crate::utils::Dice;
use crate::{DelveError, DelveResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Tunables for session rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Chebyshev radius of the party's sight
    pub vision_radius: i32,
    /// Probability that fleeing succeeds
    pub flee_success_chance: f64,
    /// Chest gold before the depth multiplier
    pub gold_min: i32,
    pub gold_max: i32,
    /// Experience per monster in a won encounter
    pub experience_per_monster: u32,
    /// Messages retained in the log
    pub message_log_size: usize,
    pub max_party_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vision_radius: config::VISION_RADIUS,
            flee_success_chance: config::FLEE_SUCCESS_CHANCE,
            gold_min: config::BASE_GOLD_MIN,
            gold_max: config::BASE_GOLD_MAX,
            experience_per_monster: config::EXPERIENCE_PER_MONSTER,
            message_log_size: config::MESSAGE_LOG_SIZE,
            max_party_size: config::MAX_PARTY_SIZE,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> DelveResult<()> {
        if !(0..=config::MAX_VISION_RADIUS).contains(&self.vision_radius) {
            return Err(DelveError::InvalidConfig(format!(
                "vision_radius must lie in [0, {}]",
                config::MAX_VISION_RADIUS
            )));
        }
        if !(0.0..=1.0).contains(&self.flee_success_chance) {
            return Err(DelveError::InvalidConfig(
                "flee_success_chance must lie in [0, 1]".to_string(),
            ));
        }
        if self.gold_min < 0 || self.gold_min > self.gold_max {
            return Err(DelveError::InvalidConfig(format!(
                "invalid chest gold range {}..={}",
                self.gold_min, self.gold_max
            )));
        }
        if self.message_log_size == 0 || self.max_party_size == 0 {
            return Err(DelveError::InvalidConfig(
                "message_log_size and max_party_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// All configuration for one session, loadable from JSON. Missing sections
/// and fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generation: GenerationConfig,
    pub population: PopulationConfig,
    pub session: SessionConfig,
}

impl GameConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> DelveResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DelveResult<()> {
        self.generation.validate()?;
        if !(0.0..=1.0).contains(&self.population.chest_spawn_chance) {
            return Err(DelveError::InvalidConfig(
                "chest_spawn_chance must lie in [0, 1]".to_string(),
            ));
        }
        self.session.validate()
    }
}

/// High-level state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Exploration,
    Combat,
    GameOver,
    Victory,
}

/// A locked door waiting for the player's lockpick/smash/cancel decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingInteraction {
    pub door: DoorId,
    pub position: Position,
}

/// What a movement attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked,
    DoorOpened,
    DoorLocked,
    CombatStarted,
}

/// Session statistics for the end-game report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub monsters_defeated: u32,
    pub total_gold_collected: u32,
    pub chests_opened: u32,
    pub max_dungeon_level: u32,
    pub total_experience: u32,
    pub doors_picked: u32,
    pub doors_smashed: u32,
}

/// Bounded message log; the oldest message drops out first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLog {
    messages: VecDeque<String>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("message: {}", message);
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.messages.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    StairsUp,
    StairsDown,
}

fn missing_level(depth: u32) -> DelveError {
    DelveError::InvalidState(format!("current level {} is not loaded", depth))
}

fn no_actor() -> DelveError {
    DelveError::InvalidState("no living party member".to_string())
}

fn missing_encounter() -> DelveError {
    DelveError::InvalidState("combat mode without an encounter".to_string())
}

/// Copies combat damage onto the level's monsters and removes the dead.
/// Returns how many monsters were removed.
fn write_back_damage(level: &mut Level, roster: &[(MonsterId, Monster)]) -> u32 {
    let mut removed = 0;
    for (id, fought) in roster {
        if fought.is_alive() {
            if let Some(monster) = level.monster_mut(*id) {
                monster.current_hp = fought.current_hp;
            }
        } else if level.remove_monster(*id).is_some() {
            removed += 1;
        }
    }
    removed
}

/// One play session.
///
/// # Examples
///
/// ```
/// use delve::{
///     AbilityScores, Character, CharacterClass, Dice, GameConfig, GameMode, GameSession, Party,
/// };
///
/// let mut party = Party::new();
/// party.add_member(Character::new("Hero", CharacterClass::Fighter, 1, AbilityScores::default()));
///
/// let session = GameSession::start(party, GameConfig::default(), Dice::seeded(1)).unwrap();
/// assert_eq!(session.depth(), 1);
/// assert_eq!(session.mode(), GameMode::Exploration);
/// assert_eq!(Some(session.position()), session.level().unwrap().stairs_up);
/// ```
#[derive(Debug)]
pub struct GameSession {
    pub party: Party,
    position: Position,
    depth: u32,
    mode: GameMode,
    turn: u64,
    levels: LevelCache,
    dice: Dice,
    pending_door: Option<PendingInteraction>,
    pending_descent_confirmation: bool,
    combat: Option<CombatEncounter>,
    combatant: usize,
    statistics: GameStatistics,
    messages: MessageLog,
    config: SessionConfig,
}

impl GameSession {
    /// Starts a session on a randomly generated dungeon.
    pub fn start(party: Party, config: GameConfig, dice: Dice) -> DelveResult<Self> {
        Self::start_with_templates(party, config, Vec::new(), dice)
    }

    /// Starts a session on a predefined dungeon. Depths past the last
    /// predefined level are generated. Every level is validated before the
    /// session exists.
    pub fn start_with_dungeon(
        party: Party,
        config: GameConfig,
        dungeon: &DungeonDefinition,
        mut dice: Dice,
    ) -> DelveResult<Self> {
        let templates = dungeon.build_levels(&mut dice)?;
        Self::start_with_templates(party, config, templates, dice)
    }

    fn start_with_templates(
        party: Party,
        config: GameConfig,
        templates: Vec<Level>,
        dice: Dice,
    ) -> DelveResult<Self> {
        config.validate()?;
        if party.is_empty() || !party.is_alive() {
            return Err(DelveError::InvalidState(
                "a session needs at least one living party member".to_string(),
            ));
        }
        if party.len() > config.session.max_party_size {
            return Err(DelveError::InvalidState(format!(
                "party of {} exceeds the limit of {}",
                party.len(),
                config.session.max_party_size
            )));
        }

        let has_templates = !templates.is_empty();
        let levels =
            LevelCache::new(config.generation, config.population).with_templates(templates);
        let mut session = Self {
            party,
            position: Position::new(0, 0),
            depth: 0,
            mode: GameMode::Exploration,
            turn: 0,
            levels,
            dice,
            pending_door: None,
            pending_descent_confirmation: false,
            combat: None,
            combatant: 0,
            statistics: GameStatistics::default(),
            messages: MessageLog::new(config.session.message_log_size),
            config: config.session,
        };
        if has_templates {
            session.messages.push(format!(
                "Loaded predesigned dungeon with {} levels",
                session.levels.template_count()
            ));
        }
        session.enter_level(1, Arrival::StairsUp)?;
        info!("session started with {} party members", session.party.len());
        Ok(session)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn statistics(&self) -> &GameStatistics {
        &self.statistics
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn combat(&self) -> Option<&CombatEncounter> {
        self.combat.as_ref()
    }

    pub fn pending_door(&self) -> Option<PendingInteraction> {
        self.pending_door
    }

    pub fn pending_descent_confirmation(&self) -> bool {
        self.pending_descent_confirmation
    }

    pub fn levels(&self) -> &LevelCache {
        &self.levels
    }

    /// The current level.
    pub fn level(&self) -> Option<&Level> {
        self.levels.get(self.depth)
    }

    /// Mutable access to the current level. Door transitions made through
    /// this handle must be followed by [`Level::sync_door`].
    pub fn level_mut(&mut self) -> Option<&mut Level> {
        self.levels.get_mut(self.depth)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.mode, GameMode::GameOver | GameMode::Victory)
    }

    /// Context for resolving the next key press.
    pub fn input_context(&self) -> InputContext {
        let level = self.level();
        InputContext {
            mode: self.mode,
            door_pending: self.pending_door.is_some(),
            on_stairs_down: level.and_then(|l| l.stairs_down) == Some(self.position),
            on_stairs_up: level.and_then(|l| l.stairs_up) == Some(self.position),
        }
    }

    fn require_mode(&self, mode: GameMode) -> DelveResult<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(DelveError::InvalidAction(format!(
                "not allowed in {:?} mode (expected {:?})",
                self.mode, mode
            )))
        }
    }

    /// Recomputes the visible region around the party.
    pub fn refresh_visibility(&mut self) {
        let (position, radius) = (self.position, self.config.vision_radius);
        if let Some(level) = self.levels.get_mut(self.depth) {
            level.update_visibility(position, radius);
        }
    }

    /// Makes `depth` current, building it on first entry, and places the
    /// party on the arriving staircase. On failure the session is unchanged.
    fn enter_level(&mut self, depth: u32, arrival: Arrival) -> DelveResult<()> {
        let revisit = self.levels.contains(depth);
        let level = self.levels.get_or_create(depth, &mut self.dice)?;

        let stairs = match arrival {
            Arrival::StairsUp => level.stairs_up,
            Arrival::StairsDown => level.stairs_down,
        };
        let landing = match stairs {
            Some(pos) => pos,
            None => first_open_cell(level).ok_or_else(|| {
                DelveError::GenerationFailed(format!("level {} has no open cell", depth))
            })?,
        };

        self.depth = depth;
        self.position = landing;
        self.pending_door = None;
        self.pending_descent_confirmation = false;
        self.statistics.max_dungeon_level = self.statistics.max_dungeon_level.max(depth);

        if revisit {
            self.messages
                .push(format!("Returned to dungeon level {}", depth));
        } else if let Some(build) = self.levels.build_info(depth) {
            let entered = match build.origin {
                LevelOrigin::Template => format!("Entered predesigned dungeon level {}", depth),
                LevelOrigin::Generated if self.levels.template_count() > 0 => format!(
                    "Entered randomly generated level {} (beyond predesigned levels)",
                    depth
                ),
                LevelOrigin::Generated => format!("Entered dungeon level {}", depth),
            };
            self.messages.push(entered);
            match build.spawned_monsters {
                Some(count) => self
                    .messages
                    .push(format!("Monsters spawned randomly ({} monsters)", count)),
                None => {
                    let count = self.level().map_or(0, |l| l.monsters().len());
                    self.messages
                        .push(format!("Found {} predefined monsters", count));
                }
            }
        }

        self.refresh_visibility();
        info!("party entered level {} at {:?}", depth, landing);
        Ok(())
    }

    /// Moves the party one step.
    ///
    /// Any pending door decision is cancelled first. Walking into a closed
    /// door tries to open it without moving; walking into a live monster starts
    /// combat against everything on that cell.
    pub fn move_party(&mut self, direction: Direction) -> DelveResult<MoveOutcome> {
        self.require_mode(GameMode::Exploration)?;
        self.pending_door = None;

        let depth = self.depth;
        let target = self.position + direction.to_delta();
        let level = self
            .levels
            .get_mut(depth)
            .ok_or_else(|| missing_level(depth))?;

        if level.is_blocked(target) {
            let Some(door_id) = level.door_at(target) else {
                self.messages.push("Cannot move there - blocked");
                return Ok(MoveOutcome::Blocked);
            };

            let actor = self.party.acting_index().ok_or_else(no_actor)?;
            let actor = &self.party.members[actor];
            let attempt = level
                .interact_door(door_id, |door| door.attempt_open(actor))
                .ok_or_else(|| DelveError::InvalidState(format!("door {:?} missing", door_id)))?;
            let locked = level.door(door_id).map_or(false, |door| door.is_locked());
            self.messages.push(attempt.message);

            if attempt.succeeded {
                level.update_visibility(self.position, self.config.vision_radius);
                return Ok(MoveOutcome::DoorOpened);
            }
            if locked {
                self.pending_door = Some(PendingInteraction {
                    door: door_id,
                    position: target,
                });
            }
            return Ok(MoveOutcome::DoorLocked);
        }

        if let Some((_, monster)) = level.monster_at(target) {
            if monster.is_alive() {
                self.messages
                    .push(format!("You encounter a {}!", monster.name));
                let roster: Vec<(MonsterId, Monster)> = level
                    .monsters_at(target)
                    .into_iter()
                    .filter_map(|id| level.monster(id).map(|m| (id, m.clone())))
                    .collect();
                self.messages.push(format!(
                    "Combat started against {} enemy(ies)!",
                    roster.len()
                ));
                self.combatant = self.party.acting_index().ok_or_else(no_actor)?;
                self.combat = Some(
                    CombatEncounter::new(roster)
                        .with_experience_per_monster(self.config.experience_per_monster),
                );
                self.mode = GameMode::Combat;
                return Ok(MoveOutcome::CombatStarted);
            }
        }

        if level.has_chest(target) {
            let gold = roll_chest_gold(
                self.config.gold_min,
                self.config.gold_max,
                depth,
                &mut self.dice,
            );
            self.party.distribute_gold(gold);
            level.take_chest(target);
            self.statistics.total_gold_collected += gold;
            self.statistics.chests_opened += 1;
            self.messages.push(format!("Found {} gold!", gold));
        }

        if level.stairs_down == Some(target) {
            self.messages
                .push("Found stairs going down. Press 'D' to descend");
        } else if level.stairs_up == Some(target) {
            self.messages
                .push("Found stairs going up. Press 'U' to ascend");
        } else {
            self.pending_descent_confirmation = false;
        }

        self.position = target;
        self.turn += 1;
        level.update_visibility(target, self.config.vision_radius);
        Ok(MoveOutcome::Moved)
    }

    fn resolve_pending_door<F>(&mut self, transition: F) -> DelveResult<DoorAttempt>
    where
        F: FnOnce(&mut crate::game::Door, &crate::game::Character, &mut Dice) -> DoorAttempt,
    {
        self.require_mode(GameMode::Exploration)?;
        let pending = self.pending_door.ok_or_else(|| {
            DelveError::InvalidAction("no door is awaiting a decision".to_string())
        })?;

        let depth = self.depth;
        let level = self
            .levels
            .get_mut(depth)
            .ok_or_else(|| missing_level(depth))?;
        let actor = self.party.acting_index().ok_or_else(no_actor)?;
        let actor = &self.party.members[actor];
        let dice = &mut self.dice;
        let attempt = level
            .interact_door(pending.door, |door| transition(door, actor, dice))
            .ok_or_else(|| DelveError::InvalidState(format!("door {:?} missing", pending.door)))?;

        if attempt.succeeded {
            self.pending_door = None;
            level.update_visibility(self.position, self.config.vision_radius);
        }
        self.messages.push(attempt.message.clone());
        self.turn += 1;
        Ok(attempt)
    }

    /// Tries to pick the pending door's lock with the acting party member.
    /// Costs a turn whatever the result.
    pub fn lockpick_pending(&mut self) -> DelveResult<DoorAttempt> {
        let attempt =
            self.resolve_pending_door(|door, actor, dice| door.attempt_lockpick(actor, dice))?;
        if attempt.succeeded {
            self.statistics.doors_picked += 1;
        }
        Ok(attempt)
    }

    /// Tries to smash the pending door with the acting party member.
    /// Costs a turn whatever the result.
    pub fn smash_pending(&mut self) -> DelveResult<DoorAttempt> {
        let attempt =
            self.resolve_pending_door(|door, actor, dice| door.attempt_smash(actor, dice))?;
        if attempt.succeeded {
            self.statistics.doors_smashed += 1;
        }
        Ok(attempt)
    }

    /// Takes the stairs down.
    ///
    /// When the next depth exceeds the party's average level the first call
    /// only warns and arms the confirmation; a second call descends. Stepping
    /// onto any non-stairs cell disarms it. Returns whether the party moved.
    pub fn descend(&mut self) -> DelveResult<bool> {
        self.require_mode(GameMode::Exploration)?;
        let level = self.level().ok_or_else(|| missing_level(self.depth))?;
        if level.stairs_down != Some(self.position) {
            return Err(DelveError::InvalidAction(
                "not standing on stairs down".to_string(),
            ));
        }

        let next = self.depth + 1;
        if next as f64 > self.party.average_level() && !self.pending_descent_confirmation {
            self.messages.push(format!(
                "WARNING: Level {} ahead! Monsters will be dangerous!",
                next
            ));
            self.messages
                .push("Press 'D' again to confirm descent, or move away to cancel.");
            self.pending_descent_confirmation = true;
            return Ok(false);
        }

        self.enter_level(next, Arrival::StairsUp)?;
        Ok(true)
    }

    /// Takes the stairs up. From depth 1 this escapes the dungeon and ends the
    /// session in victory.
    pub fn ascend(&mut self) -> DelveResult<bool> {
        self.require_mode(GameMode::Exploration)?;
        let level = self.level().ok_or_else(|| missing_level(self.depth))?;
        if level.stairs_up != Some(self.position) {
            return Err(DelveError::InvalidAction(
                "not standing on stairs up".to_string(),
            ));
        }

        if self.depth > 1 {
            self.enter_level(self.depth - 1, Arrival::StairsDown)?;
        } else {
            self.messages.push("You have escaped the dungeon!");
            self.mode = GameMode::Victory;
            info!("party escaped after {} turns", self.turn);
        }
        Ok(true)
    }

    /// Resolves one combat round against `target`, or the first living
    /// monster when `None`.
    pub fn attack(&mut self, target: Option<MonsterId>) -> DelveResult<RoundOutcome> {
        self.require_mode(GameMode::Combat)?;
        let encounter = self.combat.as_mut().ok_or_else(missing_encounter)?;
        let character = self
            .party
            .members
            .get_mut(self.combatant)
            .ok_or_else(no_actor)?;

        let outcome = encounter.resolve_round(character, target, &mut self.dice)?;
        self.turn += 1;

        let depth = self.depth;
        let level = self
            .levels
            .get_mut(depth)
            .ok_or_else(|| missing_level(depth))?;

        match &outcome {
            RoundOutcome::Victory {
                log,
                experience,
                defeated,
            } => {
                if let Some(line) = log.last() {
                    self.messages.push(line.clone());
                }
                for id in defeated {
                    level.remove_monster(*id);
                }
                self.party.distribute_experience(*experience);
                self.statistics.monsters_defeated += defeated.len() as u32;
                self.statistics.total_experience += experience;
                self.combat = None;
                self.mode = GameMode::Exploration;
            }
            RoundOutcome::Defeat { log } => {
                if let Some(line) = log.last() {
                    self.messages.push(line.clone());
                }
                write_back_damage(level, encounter.roster());
                self.combat = None;
                self.mode = GameMode::GameOver;
                info!("party defeated on level {}", depth);
            }
            RoundOutcome::Active { log } => {
                for line in log {
                    self.messages.push(line.clone());
                }
            }
        }
        Ok(outcome)
    }

    /// Tries to escape combat. Success ends the encounter without reward but
    /// keeps the damage dealt; either way a turn passes.
    pub fn flee(&mut self) -> DelveResult<bool> {
        self.require_mode(GameMode::Combat)?;
        self.turn += 1;

        if !self.dice.chance(self.config.flee_success_chance) {
            self.messages.push("You fail to escape!");
            return Ok(false);
        }

        let encounter = self.combat.take().ok_or_else(missing_encounter)?;
        let depth = self.depth;
        let level = self
            .levels
            .get_mut(depth)
            .ok_or_else(|| missing_level(depth))?;
        let removed = write_back_damage(level, encounter.roster());
        self.statistics.monsters_defeated += removed;
        self.mode = GameMode::Exploration;
        self.messages.push("You flee from combat!");
        Ok(true)
    }

    /// Runs a command. Returns `false` once the player asked to quit.
    pub fn apply(&mut self, command: Command) -> DelveResult<bool> {
        match command {
            Command::Move(direction) => {
                self.move_party(direction)?;
            }
            Command::Lockpick => {
                self.lockpick_pending()?;
            }
            Command::Smash => {
                self.smash_pending()?;
            }
            Command::Descend => {
                self.descend()?;
            }
            Command::Ascend => {
                self.ascend()?;
            }
            Command::Attack(target) => {
                self.attack(target)?;
            }
            Command::Flee => {
                self.flee()?;
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn first_open_cell(level: &Level) -> Option<Position> {
    level.rows().enumerate().find_map(|(y, row)| {
        row.iter()
            .position(|cell| !cell.blocked)
            .map(|x| Position::new(x as i32, y as i32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::definition::{DoorDefinition, LevelDefinition, MonsterDefinition};
    use crate::game::entities::{AbilityScores, Character, CharacterClass};

    fn party(level: u32) -> Party {
        let mut party = Party::new();
        party.add_member(Character::new(
            "Aldric",
            CharacterClass::Fighter,
            level,
            AbilityScores::new(16, 12, 14, 10, 10, 10),
        ));
        party.add_member(Character::new(
            "Mira",
            CharacterClass::Rogue,
            level,
            AbilityScores::new(10, 16, 12, 12, 10, 10),
        ));
        party
    }

    /// A corridor: stairs up at (1,1), a locked door at (3,1), a goblin at
    /// (5,1), stairs down at (7,1).
    fn corridor_dungeon(locked: bool) -> DungeonDefinition {
        DungeonDefinition::new(vec![LevelDefinition {
            width: 9,
            height: 3,
            tiles: vec![
                "#########".to_string(),
                "#>.-...<#".to_string(),
                "#########".to_string(),
            ],
            stairs_up: Some([1, 1]),
            stairs_down: Some([7, 1]),
            chests: Vec::new(),
            monsters: vec![MonsterDefinition {
                name: "Goblin".to_string(),
                hit_dice: "1d8".parse().unwrap(),
                armor_class: 12,
                attack_bonus: 1,
                damage: "1d6".parse().unwrap(),
                position: [5, 1],
                max_hp: Some(4),
                current_hp: None,
            }],
            doors: vec![DoorDefinition {
                horizontal: true,
                locked,
                lockpick_dc: 0,
                smash_dc: 0,
                key_id: None,
                is_open: Some(false),
                is_destroyed: false,
                position: [3, 1],
            }],
        }])
    }

    fn corridor_session(locked: bool) -> GameSession {
        GameSession::start_with_dungeon(
            party(5),
            GameConfig::default(),
            &corridor_dungeon(locked),
            Dice::seeded(17),
        )
        .unwrap()
    }

    #[test]
    fn test_session_rejects_empty_party() {
        let result = GameSession::start(Party::new(), GameConfig::default(), Dice::seeded(1));
        assert!(matches!(result, Err(DelveError::InvalidState(_))));
    }

    #[test]
    fn test_session_rejects_bad_config() {
        let mut config = GameConfig::default();
        config.session.flee_success_chance = 2.0;
        let result = GameSession::start(party(1), config, Dice::seeded(1));
        assert!(matches!(result, Err(DelveError::InvalidConfig(_))));

        let mut config = GameConfig::default();
        config.session.vision_radius = i32::MAX;
        assert!(matches!(config.validate(), Err(DelveError::InvalidConfig(_))));
        config.session.vision_radius = crate::config::MAX_VISION_RADIUS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_dungeon_never_starts() {
        let mut dungeon = corridor_dungeon(true);
        dungeon.levels[0].doors.clear();
        let config = GameConfig::default();
        let result = GameSession::start_with_dungeon(party(1), config, &dungeon, Dice::seeded(1));
        assert!(matches!(result, Err(DelveError::InvalidLevelDefinition(_))));
    }

    #[test]
    fn test_start_places_party_on_stairs_up() {
        let session = corridor_session(true);
        assert_eq!(session.position(), Position::new(1, 1));
        assert_eq!(session.turn(), 0);
        let level = session.level().unwrap();
        assert!(level.cell(Position::new(2, 1)).unwrap().visible);
        assert_eq!(level.monsters().len(), 1);
        assert!(session
            .messages()
            .iter()
            .any(|m| m == "Found 1 predefined monsters"));
    }

    #[test]
    fn test_blocked_move_keeps_position() {
        let mut session = corridor_session(true);
        let outcome = session.move_party(Direction::North).unwrap();
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(session.position(), Position::new(1, 1));
        assert_eq!(session.turn(), 0);
        assert_eq!(session.messages().latest(), Some("Cannot move there - blocked"));
    }

    #[test]
    fn test_locked_door_sets_pending_and_moving_cancels() {
        let mut session = corridor_session(true);
        session.move_party(Direction::East).unwrap();
        let outcome = session.move_party(Direction::East).unwrap();
        assert_eq!(outcome, MoveOutcome::DoorLocked);
        assert_eq!(
            session.pending_door().map(|p| p.position),
            Some(Position::new(3, 1))
        );
        assert!(session.input_context().door_pending);

        session.move_party(Direction::West).unwrap();
        assert!(session.pending_door().is_none());
    }

    #[test]
    fn test_lockpick_opens_door_and_costs_turn() {
        let mut session = corridor_session(true);
        session.move_party(Direction::East).unwrap();
        session.move_party(Direction::East).unwrap();
        let turn = session.turn();

        // DC 0 always succeeds
        let attempt = session.lockpick_pending().unwrap();
        assert!(attempt.succeeded);
        assert_eq!(session.turn(), turn + 1);
        assert!(session.pending_door().is_none());
        assert!(!session.level().unwrap().is_blocked(Position::new(3, 1)));
        assert_eq!(session.statistics().doors_picked, 1);
    }

    #[test]
    fn test_smash_without_pending_door_is_rejected() {
        let mut session = corridor_session(true);
        assert!(matches!(
            session.smash_pending(),
            Err(DelveError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_unlocked_door_opens_without_moving() {
        let mut session = corridor_session(false);
        session.move_party(Direction::East).unwrap();
        let outcome = session.move_party(Direction::East).unwrap();
        assert_eq!(outcome, MoveOutcome::DoorOpened);
        assert_eq!(session.position(), Position::new(2, 1));
        assert!(session.pending_door().is_none());
        assert_eq!(session.move_party(Direction::East).unwrap(), MoveOutcome::Moved);
    }

    fn walk_to_goblin(session: &mut GameSession) {
        session.move_party(Direction::East).unwrap();
        session.move_party(Direction::East).unwrap();
        session.smash_pending().unwrap();
        session.move_party(Direction::East).unwrap();
        session.move_party(Direction::East).unwrap();
        let outcome = session.move_party(Direction::East).unwrap();
        assert_eq!(outcome, MoveOutcome::CombatStarted);
    }

    #[test]
    fn test_monster_starts_combat() {
        let mut session = corridor_session(true);
        walk_to_goblin(&mut session);
        assert_eq!(session.mode(), GameMode::Combat);
        assert_eq!(session.position(), Position::new(4, 1));
        assert_eq!(session.combat().unwrap().roster().len(), 1);
        assert!(matches!(
            session.move_party(Direction::East),
            Err(DelveError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_fighting_to_victory_clears_the_monster() {
        let mut session = corridor_session(true);
        walk_to_goblin(&mut session);
        session.party.members[0].current_hp = 10_000;

        let mut rounds = 0;
        while session.mode() == GameMode::Combat {
            session.attack(None).unwrap();
            rounds += 1;
            assert!(rounds < 200);
        }
        assert_eq!(session.mode(), GameMode::Exploration);
        assert!(session.level().unwrap().monsters().is_empty());
        assert_eq!(session.statistics().monsters_defeated, 1);
        assert_eq!(session.statistics().total_experience, 100);
        assert_eq!(session.party.members[0].experience, 50);
    }

    #[test]
    fn test_fallen_combatant_ends_session() {
        let mut session = corridor_session(true);
        walk_to_goblin(&mut session);
        session.party.members[0].current_hp = 0;
        let outcome = session.attack(None).unwrap();
        assert!(matches!(outcome, RoundOutcome::Defeat { .. }));
        assert_eq!(session.mode(), GameMode::GameOver);
        assert!(session.is_finished());
    }

    #[test]
    fn test_flee_always_succeeds_when_certain() {
        let mut config = GameConfig::default();
        config.session.flee_success_chance = 1.0;
        let mut session = GameSession::start_with_dungeon(
            party(5),
            config,
            &corridor_dungeon(true),
            Dice::seeded(3),
        )
        .unwrap();
        walk_to_goblin(&mut session);
        let turn = session.turn();
        assert!(session.flee().unwrap());
        assert_eq!(session.mode(), GameMode::Exploration);
        assert_eq!(session.turn(), turn + 1);
        assert_eq!(session.level().unwrap().monsters().len(), 1);
    }

    #[test]
    fn test_flee_never_succeeds_when_impossible() {
        let mut config = GameConfig::default();
        config.session.flee_success_chance = 0.0;
        let mut session = GameSession::start_with_dungeon(
            party(5),
            config,
            &corridor_dungeon(true),
            Dice::seeded(3),
        )
        .unwrap();
        walk_to_goblin(&mut session);
        let turn = session.turn();
        assert!(!session.flee().unwrap());
        assert_eq!(session.mode(), GameMode::Combat);
        assert_eq!(session.turn(), turn + 1);
    }

    #[test]
    fn test_descend_requires_stairs() {
        let mut session = corridor_session(true);
        assert!(matches!(
            session.descend(),
            Err(DelveError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_ascend_from_first_level_is_victory() {
        let mut session = corridor_session(true);
        assert!(session.ascend().unwrap());
        assert_eq!(session.mode(), GameMode::Victory);
        assert_eq!(session.messages().latest(), Some("You have escaped the dungeon!"));
    }

    #[test]
    fn test_descent_confirmation_flow() {
        let mut session =
            GameSession::start(party(1), GameConfig::default(), Dice::seeded(8)).unwrap();
        let stairs_down = session.level().unwrap().stairs_down.unwrap();
        session.position = stairs_down;

        // Depth 2 exceeds an average party level of 1.
        assert!(!session.descend().unwrap());
        assert!(session.pending_descent_confirmation());
        assert_eq!(session.depth(), 1);

        assert!(session.descend().unwrap());
        assert_eq!(session.depth(), 2);
        assert!(!session.pending_descent_confirmation());
        assert_eq!(Some(session.position()), session.level().unwrap().stairs_up);
        assert_eq!(session.statistics().max_dungeon_level, 2);

        // Back up lands on the stairs down of level 1, the same instance.
        assert!(session.ascend().unwrap());
        assert_eq!(session.depth(), 1);
        assert_eq!(session.position(), stairs_down);
        assert_eq!(session.messages().latest(), Some("Returned to dungeon level 1"));
    }

    #[test]
    fn test_experienced_party_descends_at_once() {
        let mut session =
            GameSession::start(party(5), GameConfig::default(), Dice::seeded(8)).unwrap();
        session.position = session.level().unwrap().stairs_down.unwrap();
        assert!(session.descend().unwrap());
        assert_eq!(session.depth(), 2);
    }

    #[test]
    fn test_message_log_is_bounded() {
        let mut log = MessageLog::new(3);
        for i in 0..5 {
            log.push(format!("m{}", i));
        }
        assert_eq!(log.iter().collect::<Vec<_>>(), vec!["m2", "m3", "m4"]);
        assert_eq!(log.latest(), Some("m4"));
    }

    #[test]
    fn test_game_config_partial_json() {
        let config: GameConfig =
            serde_json::from_str(r#"{"session": {"vision_radius": 5}}"#).unwrap();
        assert_eq!(config.session.vision_radius, 5);
        assert_eq!(config.session.flee_success_chance, 0.5);
        assert_eq!(config.generation, GenerationConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_dispatches_commands() {
        let mut session = corridor_session(false);
        assert!(session.apply(Command::Move(Direction::East)).unwrap());
        assert_eq!(session.position(), Position::new(2, 1));
        assert!(!session.apply(Command::Quit).unwrap());
    }
}
