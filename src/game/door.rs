//! # Doors
//!
//! Per-door state machine: `ClosedUnlocked`, `ClosedLocked`, `Open`, `Destroyed`.
//!
//! Doors never touch the grid. Whoever triggers a transition must call
//! [`Level::sync_door`](crate::Level::sync_door) right afterwards so the cell's
//! `blocked` and `blocks_sight` flags follow the door.

use crate::utils::Dice;
use crate::{DelveError, DelveResult};
use log::debug;
use serde::{Deserialize, Serialize};

/// Anything that can attempt skill checks against a door.
pub trait SkillCheckActor {
    /// Bonus added to the d20 when picking a lock.
    fn lockpick_bonus(&self) -> i32;

    /// Bonus added to the d20 when smashing a door.
    fn smash_bonus(&self) -> i32;
}

/// Observable door state derived from the door's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorState {
    ClosedUnlocked,
    ClosedLocked,
    Open,
    Destroyed,
}

/// Result of a door interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoorAttempt {
    pub succeeded: bool,
    pub message: String,
}

impl DoorAttempt {
    fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

/// Default lockpicking difficulty.
pub const DEFAULT_LOCKPICK_DC: i32 = 15;

/// Default smashing difficulty.
pub const DEFAULT_SMASH_DC: i32 = 18;

/// A door that can be opened, picked, smashed or unlocked with a key.
///
/// Invariant: a destroyed door is always open and never locked.
///
/// # Examples
///
/// ```
/// use delve::{AbilityScores, Character, CharacterClass, Door, DoorState};
///
/// let hero = Character::new("Hero", CharacterClass::Fighter, 1, AbilityScores::default());
/// let mut door = Door::new(true, false);
/// let attempt = door.attempt_open(&hero);
/// assert!(attempt.succeeded);
/// assert_eq!(door.state(), DoorState::Open);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// `-` when true, `|` otherwise
    pub horizontal: bool,
    pub lockpick_dc: i32,
    pub smash_dc: i32,
    pub key_id: Option<String>,
    is_open: bool,
    is_locked: bool,
    is_destroyed: bool,
}

impl Door {
    /// Creates a closed door with default difficulty.
    pub fn new(horizontal: bool, locked: bool) -> Self {
        Self {
            horizontal,
            lockpick_dc: DEFAULT_LOCKPICK_DC,
            smash_dc: DEFAULT_SMASH_DC,
            key_id: None,
            is_open: false,
            is_locked: locked,
            is_destroyed: false,
        }
    }

    /// Rebuilds a door from persisted flags, rejecting impossible combinations.
    pub fn from_parts(
        horizontal: bool,
        locked: bool,
        lockpick_dc: i32,
        smash_dc: i32,
        key_id: Option<String>,
        is_open: bool,
        is_destroyed: bool,
    ) -> DelveResult<Self> {
        if is_destroyed && (!is_open || locked) {
            return Err(DelveError::InvalidLevelDefinition(
                "destroyed door must be open and unlocked".to_string(),
            ));
        }
        if locked && is_open {
            return Err(DelveError::InvalidLevelDefinition(
                "door cannot be both locked and open".to_string(),
            ));
        }
        Ok(Self {
            horizontal,
            lockpick_dc,
            smash_dc,
            key_id,
            is_open,
            is_locked: locked,
            is_destroyed,
        })
    }

    pub fn with_difficulty(mut self, lockpick_dc: i32, smash_dc: i32) -> Self {
        self.lockpick_dc = lockpick_dc;
        self.smash_dc = smash_dc;
        self
    }

    pub fn with_key(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Locked door, DC 10 to pick and 15 to smash.
    pub fn easy(horizontal: bool) -> Self {
        Self::new(horizontal, true).with_difficulty(10, 15)
    }

    /// Locked door, DC 15 to pick and 18 to smash.
    pub fn medium(horizontal: bool) -> Self {
        Self::new(horizontal, true).with_difficulty(15, 18)
    }

    /// Locked door, DC 20 to pick and 23 to smash.
    pub fn hard(horizontal: bool) -> Self {
        Self::new(horizontal, true).with_difficulty(20, 23)
    }

    /// Locked door, DC 25 to pick and 28 to smash.
    pub fn very_hard(horizontal: bool) -> Self {
        Self::new(horizontal, true).with_difficulty(25, 28)
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed
    }

    pub fn state(&self) -> DoorState {
        if self.is_destroyed {
            DoorState::Destroyed
        } else if self.is_open {
            DoorState::Open
        } else if self.is_locked {
            DoorState::ClosedLocked
        } else {
            DoorState::ClosedUnlocked
        }
    }

    pub fn is_passable(&self) -> bool {
        self.is_open || self.is_destroyed
    }

    pub fn blocks_sight(&self) -> bool {
        !self.is_passable()
    }

    /// Glyph drawn for the door's cell.
    pub fn glyph(&self) -> char {
        if self.is_passable() {
            '.'
        } else if self.horizontal {
            '-'
        } else {
            '|'
        }
    }

    /// Opens an unlocked door. A locked door refuses, prompting the caller to
    /// offer lockpick or smash.
    pub fn attempt_open<A: SkillCheckActor + ?Sized>(&mut self, _actor: &A) -> DoorAttempt {
        match self.state() {
            DoorState::Open => DoorAttempt::success("The door is already open."),
            DoorState::Destroyed => {
                DoorAttempt::success("The door has been destroyed - you can pass through.")
            }
            DoorState::ClosedUnlocked => {
                self.is_open = true;
                DoorAttempt::success("You open the door.")
            }
            DoorState::ClosedLocked => {
                DoorAttempt::failure("The door is locked. (L)ockpick it or (S)mash it?")
            }
        }
    }

    /// Picks the lock with a d20 check against `lockpick_dc`.
    pub fn attempt_lockpick<A: SkillCheckActor + ?Sized>(
        &mut self,
        actor: &A,
        dice: &mut Dice,
    ) -> DoorAttempt {
        if self.is_destroyed {
            return DoorAttempt::success("The door is already destroyed.");
        }
        if !self.is_locked {
            return DoorAttempt::success("The door is not locked.");
        }

        let roll = dice.ability_check(actor.lockpick_bonus());
        debug!("lockpick roll {} vs DC {}", roll, self.lockpick_dc);
        if roll >= self.lockpick_dc {
            self.is_locked = false;
            self.is_open = true;
            DoorAttempt::success(format!(
                "Lockpick successful! (Roll: {} vs DC {})",
                roll, self.lockpick_dc
            ))
        } else {
            DoorAttempt::failure(format!(
                "Failed to pick the lock. (Roll: {} vs DC {})",
                roll, self.lockpick_dc
            ))
        }
    }

    /// Smashes the door with a d20 check against `smash_dc`. Success leaves the
    /// door destroyed, which is also open and unlocked.
    pub fn attempt_smash<A: SkillCheckActor + ?Sized>(
        &mut self,
        actor: &A,
        dice: &mut Dice,
    ) -> DoorAttempt {
        match self.state() {
            DoorState::Destroyed => return DoorAttempt::success("The door is already destroyed."),
            DoorState::Open => return DoorAttempt::success("The door is already open."),
            DoorState::ClosedLocked | DoorState::ClosedUnlocked => {}
        }

        let roll = dice.ability_check(actor.smash_bonus());
        debug!("smash roll {} vs DC {}", roll, self.smash_dc);
        if roll >= self.smash_dc {
            self.is_locked = false;
            self.is_open = true;
            self.is_destroyed = true;
            DoorAttempt::success(format!(
                "You smash the door open! (Roll: {} vs DC {})",
                roll, self.smash_dc
            ))
        } else {
            DoorAttempt::failure(format!(
                "Failed to smash the door. (Roll: {} vs DC {})",
                roll, self.smash_dc
            ))
        }
    }

    /// Unlocks and opens a locked door when `key_id` matches the door's key.
    pub fn unlock_with_key(&mut self, key_id: &str) -> DoorAttempt {
        if self.state() != DoorState::ClosedLocked {
            return DoorAttempt::failure("The door is not locked.");
        }
        match &self.key_id {
            Some(expected) if expected == key_id => {
                self.is_locked = false;
                self.is_open = true;
                DoorAttempt::success("You unlock the door with the key.")
            }
            _ => DoorAttempt::failure("The key doesn't fit this lock."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        lockpick: i32,
        smash: i32,
    }

    impl SkillCheckActor for Fixed {
        fn lockpick_bonus(&self) -> i32 {
            self.lockpick
        }

        fn smash_bonus(&self) -> i32 {
            self.smash
        }
    }

    const CLUMSY: Fixed = Fixed {
        lockpick: -100,
        smash: -100,
    };

    const MASTER: Fixed = Fixed {
        lockpick: 100,
        smash: 100,
    };

    #[test]
    fn test_unlocked_door_opens() {
        let mut door = Door::new(true, false);
        assert_eq!(door.state(), DoorState::ClosedUnlocked);
        let attempt = door.attempt_open(&CLUMSY);
        assert!(attempt.succeeded);
        assert!(attempt.message.contains("open"));
        assert_eq!(door.state(), DoorState::Open);
        assert!(door.is_passable());
        assert_eq!(door.glyph(), '.');
    }

    #[test]
    fn test_locked_door_refuses_to_open() {
        let mut door = Door::medium(false);
        let attempt = door.attempt_open(&MASTER);
        assert!(!attempt.succeeded);
        assert_eq!(door.state(), DoorState::ClosedLocked);
        assert_eq!(door.glyph(), '|');
        assert!(door.blocks_sight());
    }

    #[test]
    fn test_lockpick_dc_zero_always_succeeds() {
        let mut dice = Dice::seeded(1);
        for _ in 0..50 {
            let mut door = Door::new(true, true).with_difficulty(0, 18);
            let attempt = door.attempt_lockpick(&Fixed { lockpick: -19, smash: 0 }, &mut dice);
            assert!(attempt.succeeded);
            assert_eq!(door.state(), DoorState::Open);
        }
    }

    #[test]
    fn test_failed_lockpick_changes_nothing() {
        let mut dice = Dice::seeded(2);
        let mut door = Door::very_hard(true);
        let attempt = door.attempt_lockpick(&CLUMSY, &mut dice);
        assert!(!attempt.succeeded);
        assert!(attempt.message.contains("DC 25"));
        assert_eq!(door.state(), DoorState::ClosedLocked);
    }

    #[test]
    fn test_smash_destroys_door() {
        let mut dice = Dice::seeded(3);
        let mut door = Door::hard(true);
        let attempt = door.attempt_smash(&MASTER, &mut dice);
        assert!(attempt.succeeded);
        assert_eq!(door.state(), DoorState::Destroyed);
        assert!(door.is_open());
        assert!(!door.is_locked());
    }

    #[test]
    fn test_smash_unlocked_closed_door() {
        let mut dice = Dice::seeded(4);
        let mut door = Door::new(false, false);
        assert!(door.attempt_smash(&MASTER, &mut dice).succeeded);
        assert_eq!(door.state(), DoorState::Destroyed);
    }

    #[test]
    fn test_smash_on_destroyed_door_does_not_roll() {
        let mut door = Door::easy(true);
        let mut dice = Dice::seeded(5);
        door.attempt_smash(&MASTER, &mut dice);
        assert_eq!(door.state(), DoorState::Destroyed);

        // Identically seeded dice must be unaffected by the no-op smash.
        let mut used = Dice::seeded(77);
        let mut fresh = Dice::seeded(77);
        let attempt = door.attempt_smash(&CLUMSY, &mut used);
        assert!(attempt.succeeded);
        assert_eq!(used.range(1, 1_000_000), fresh.range(1, 1_000_000));
    }

    #[test]
    fn test_failed_smash_changes_nothing() {
        let mut dice = Dice::seeded(6);
        let mut door = Door::easy(true);
        assert!(!door.attempt_smash(&CLUMSY, &mut dice).succeeded);
        assert_eq!(door.state(), DoorState::ClosedLocked);
    }

    #[test]
    fn test_unlock_with_key() {
        let mut door = Door::hard(true).with_key("iron");
        assert!(!door.unlock_with_key("brass").succeeded);
        assert_eq!(door.state(), DoorState::ClosedLocked);
        assert!(door.unlock_with_key("iron").succeeded);
        assert_eq!(door.state(), DoorState::Open);
        assert!(!door.unlock_with_key("iron").succeeded);
    }

    #[test]
    fn test_keyless_door_rejects_keys() {
        let mut door = Door::hard(true);
        assert!(!door.unlock_with_key("").succeeded);
        assert_eq!(door.state(), DoorState::ClosedLocked);
    }

    #[test]
    fn test_from_parts_enforces_invariant() {
        assert!(Door::from_parts(true, false, 15, 18, None, false, true).is_err());
        assert!(Door::from_parts(true, true, 15, 18, None, true, true).is_err());
        assert!(Door::from_parts(true, true, 15, 18, None, true, false).is_err());
        let door = Door::from_parts(true, false, 15, 18, None, true, true).unwrap();
        assert_eq!(door.state(), DoorState::Destroyed);
    }
}
