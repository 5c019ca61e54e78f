//! # Entities
//!
//! Characters, the player's party and monsters.
//!
//! Class-specific bonuses are not decided by comparing class names. Each
//! [`CharacterClass`] resolves to a static [`ClassTraits`] row that declares how
//! its members attack, pick locks and smash doors.

use crate::config;
use crate::game::door::SkillCheckActor;
use crate::utils::{Dice, DiceExpression};
use serde::{Deserialize, Serialize};

/// The six raw ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    /// Creates a score block in the usual STR, DEX, CON, INT, WIS, CHA order.
    pub fn new(
        strength: i32,
        dexterity: i32,
        constitution: i32,
        intelligence: i32,
        wisdom: i32,
        charisma: i32,
    ) -> Self {
        Self {
            strength,
            dexterity,
            constitution,
            intelligence,
            wisdom,
            charisma,
        }
    }

    /// Converts a raw score into its modifier, `floor((score - 10) / 2)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::AbilityScores;
    ///
    /// assert_eq!(AbilityScores::modifier(10), 0);
    /// assert_eq!(AbilityScores::modifier(15), 2);
    /// assert_eq!(AbilityScores::modifier(9), -1);
    /// ```
    pub fn modifier(score: i32) -> i32 {
        (score - 10).div_euclid(2)
    }

    pub fn strength_modifier(&self) -> i32 {
        Self::modifier(self.strength)
    }

    pub fn dexterity_modifier(&self) -> i32 {
        Self::modifier(self.dexterity)
    }

    pub fn constitution_modifier(&self) -> i32 {
        Self::modifier(self.constitution)
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

/// How quickly a class's base attack bonus grows with level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackProgression {
    /// Base attack equals level
    Full,
    /// Base attack equals three quarters of level
    Medium,
    /// Base attack equals half of level
    Half,
}

impl AttackProgression {
    /// Base attack bonus at the given level.
    pub fn base_attack(self, level: u32) -> i32 {
        let level = level as i32;
        match self {
            AttackProgression::Full => level,
            AttackProgression::Medium => level * 3 / 4,
            AttackProgression::Half => level / 2,
        }
    }
}

/// Where a class draws its lockpicking bonus from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockpickBonus {
    /// Character level plus dexterity modifier
    LevelPlusDexterity,
    /// Dexterity modifier alone
    Dexterity,
}

/// Where a class draws its door-smashing bonus from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmashBonus {
    /// Strength modifier alone
    Strength,
    /// Strength modifier plus half the character level, rounded down
    StrengthPlusHalfLevel,
}

/// Declared capabilities of a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTraits {
    pub hit_die: i32,
    pub attack_progression: AttackProgression,
    pub lockpick_bonus: LockpickBonus,
    pub smash_bonus: SmashBonus,
}

const FIGHTER: ClassTraits = ClassTraits {
    hit_die: 10,
    attack_progression: AttackProgression::Full,
    lockpick_bonus: LockpickBonus::Dexterity,
    smash_bonus: SmashBonus::StrengthPlusHalfLevel,
};

const WIZARD: ClassTraits = ClassTraits {
    hit_die: 4,
    attack_progression: AttackProgression::Half,
    lockpick_bonus: LockpickBonus::Dexterity,
    smash_bonus: SmashBonus::Strength,
};

const CLERIC: ClassTraits = ClassTraits {
    hit_die: 8,
    attack_progression: AttackProgression::Medium,
    lockpick_bonus: LockpickBonus::Dexterity,
    smash_bonus: SmashBonus::Strength,
};

const ROGUE: ClassTraits = ClassTraits {
    hit_die: 6,
    attack_progression: AttackProgression::Medium,
    lockpick_bonus: LockpickBonus::LevelPlusDexterity,
    smash_bonus: SmashBonus::Strength,
};

/// Playable character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    /// Melee-focused class; gets a bonus when smashing doors
    Fighter,
    Wizard,
    Cleric,
    /// Stealth-focused class; adds its level when picking locks
    Rogue,
}

impl CharacterClass {
    /// Looks up this class's row in the trait table.
    pub fn traits(self) -> ClassTraits {
        match self {
            CharacterClass::Fighter => FIGHTER,
            CharacterClass::Wizard => WIZARD,
            CharacterClass::Cleric => CLERIC,
            CharacterClass::Rogue => ROGUE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Rogue => "Rogue",
        }
    }
}

/// A member of the player's party.
///
/// # Examples
///
/// ```
/// use delve::{AbilityScores, Character, CharacterClass};
///
/// let fighter = Character::new(
///     "Warrior",
///     CharacterClass::Fighter,
///     1,
///     AbilityScores::new(15, 10, 16, 10, 10, 10),
/// );
/// assert!(fighter.is_alive());
/// assert_eq!(fighter.attack_modifier(), 3); // BAB 1 + STR 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub class: CharacterClass,
    pub level: u32,
    pub abilities: AbilityScores,
    pub max_hp: i32,
    pub current_hp: i32,
    pub armor_class: i32,
    pub weapon_damage: DiceExpression,
    pub gold: u32,
    pub experience: u32,
}

impl Character {
    /// Creates a character with hit points and armor class derived from class
    /// and abilities.
    pub fn new(
        name: impl Into<String>,
        class: CharacterClass,
        level: u32,
        abilities: AbilityScores,
    ) -> Self {
        let level = level.max(1);
        let traits = class.traits();
        let con = abilities.constitution_modifier();
        let first_level = (traits.hit_die + con).max(1);
        let per_level = (traits.hit_die / 2 + 1 + con).max(1);
        let max_hp = first_level + per_level * (level as i32 - 1);

        Self {
            name: name.into(),
            class,
            level,
            abilities,
            max_hp,
            current_hp: max_hp,
            armor_class: 10 + abilities.dexterity_modifier(),
            weapon_damage: config::BASE_WEAPON_DAMAGE,
            gold: 0,
            experience: 0,
        }
    }

    /// Replaces the derived armor class, e.g. for worn armor.
    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    /// Replaces the default weapon damage.
    pub fn with_weapon(mut self, damage: DiceExpression) -> Self {
        self.weapon_damage = damage;
        self
    }

    /// Modifier added to this character's attack rolls.
    pub fn attack_modifier(&self) -> i32 {
        self.class.traits().attack_progression.base_attack(self.level)
            + self.abilities.strength_modifier()
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Applies damage, flooring hit points at zero. Returns the damage taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        self.current_hp = (self.current_hp - amount).max(0);
        amount
    }

    pub fn gain_experience(&mut self, amount: u32) {
        self.experience += amount;
    }
}

impl SkillCheckActor for Character {
    fn lockpick_bonus(&self) -> i32 {
        let dex = self.abilities.dexterity_modifier();
        match self.class.traits().lockpick_bonus {
            LockpickBonus::LevelPlusDexterity => self.level as i32 + dex,
            LockpickBonus::Dexterity => dex,
        }
    }

    fn smash_bonus(&self) -> i32 {
        let str_mod = self.abilities.strength_modifier();
        match self.class.traits().smash_bonus {
            SmashBonus::Strength => str_mod,
            SmashBonus::StrengthPlusHalfLevel => str_mod + self.level as i32 / 2,
        }
    }
}

/// The player's group of characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub members: Vec<Character>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member unless the party is full.
    pub fn add_member(&mut self, character: Character) -> bool {
        if self.members.len() >= config::MAX_PARTY_SIZE {
            return false;
        }
        self.members.push(character);
        true
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True while at least one member is alive.
    pub fn is_alive(&self) -> bool {
        self.members.iter().any(Character::is_alive)
    }

    pub fn alive_members(&self) -> impl Iterator<Item = &Character> {
        self.members.iter().filter(|m| m.is_alive())
    }

    /// Index of the member who acts for the party: the first one still alive.
    pub fn acting_index(&self) -> Option<usize> {
        self.members.iter().position(Character::is_alive)
    }

    pub fn total_gold(&self) -> u32 {
        self.members.iter().map(|m| m.gold).sum()
    }

    /// Splits gold evenly, giving any remainder to the first member.
    pub fn distribute_gold(&mut self, amount: u32) {
        if self.members.is_empty() {
            return;
        }
        let share = amount / self.members.len() as u32;
        let remainder = amount % self.members.len() as u32;
        for member in &mut self.members {
            member.gold += share;
        }
        self.members[0].gold += remainder;
    }

    /// Splits experience evenly among living members; the remainder is lost.
    pub fn distribute_experience(&mut self, amount: u32) {
        let alive = self.alive_members().count() as u32;
        if alive == 0 {
            return;
        }
        let share = amount / alive;
        for member in self.members.iter_mut().filter(|m| m.is_alive()) {
            member.gain_experience(share);
        }
    }

    /// Mean level of living members, zero when nobody is alive.
    pub fn average_level(&self) -> f64 {
        let (count, total) = self
            .alive_members()
            .fold((0u32, 0u32), |(c, t), m| (c + 1, t + m.level));
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }
}

/// A hostile creature living on a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub hit_dice: DiceExpression,
    pub max_hp: i32,
    pub current_hp: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage: DiceExpression,
    #[serde(default)]
    pub special_abilities: Vec<String>,
    #[serde(default)]
    pub treasure: Vec<String>,
}

impl Monster {
    /// Creates a monster whose hit points are rolled from its hit dice.
    pub fn new(
        name: impl Into<String>,
        hit_dice: DiceExpression,
        armor_class: i32,
        attack_bonus: i32,
        damage: DiceExpression,
        dice: &mut Dice,
    ) -> Self {
        let hp = dice.roll(&hit_dice).max(1);
        Self::with_hit_points(name, hit_dice, hp, armor_class, attack_bonus, damage)
    }

    /// Creates a monster with fixed, unrolled hit points.
    pub fn with_hit_points(
        name: impl Into<String>,
        hit_dice: DiceExpression,
        hit_points: i32,
        armor_class: i32,
        attack_bonus: i32,
        damage: DiceExpression,
    ) -> Self {
        Self {
            name: name.into(),
            hit_dice,
            max_hp: hit_points,
            current_hp: hit_points,
            armor_class,
            attack_bonus,
            damage,
            special_abilities: Vec::new(),
            treasure: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Applies damage, flooring hit points at zero. Returns the damage taken.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        self.current_hp = (self.current_hp - amount).max(0);
        amount
    }

    /// Map glyph: the upper-cased first letter of the name.
    pub fn glyph(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('M')
    }
}
