//! # Dice Engine
//!
//! Randomized numeric expressions of the form `NdM[+/-K]` and d20 ability checks.
//!
//! All randomness in a session flows through a single [`Dice`] value. It wraps any
//! `rand::RngCore`, so tests can inject a seeded source and get repeatable rolls.

use crate::{DelveError, DelveResult};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed dice expression such as `2d8+3`.
///
/// # Examples
///
/// ```
/// use delve::DiceExpression;
///
/// let expr: DiceExpression = "2d8+3".parse().unwrap();
/// assert_eq!(expr.count, 2);
/// assert_eq!(expr.faces, 8);
/// assert_eq!(expr.modifier, 3);
/// assert_eq!(expr.min(), 5);
/// assert_eq!(expr.max(), 19);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    /// Number of dice rolled
    pub count: u32,
    /// Faces on each die
    pub faces: u32,
    /// Flat modifier added to the sum
    pub modifier: i32,
}

/// Most dice a single expression may roll.
pub const MAX_DICE_COUNT: u32 = 1_000;

impl DiceExpression {
    /// Creates an expression, rejecting zero dice, zero-faced dice and any
    /// expression whose total cannot fit in an `i32`.
    pub fn new(count: u32, faces: u32, modifier: i32) -> DelveResult<Self> {
        let expression = Self {
            count,
            faces,
            modifier,
        };
        expression.validate()?;
        Ok(expression)
    }

    /// Checks the bounds enforced by [`DiceExpression::new`].
    ///
    /// Fields are public, so records built by hand or deserialized through
    /// other paths are checked again before they are rolled from a file.
    pub fn validate(&self) -> DelveResult<()> {
        let invalid = || {
            DelveError::InvalidExpression(format!(
                "{}d{}{:+}",
                self.count, self.faces, self.modifier
            ))
        };
        if self.count == 0 || self.faces == 0 || self.count > MAX_DICE_COUNT {
            return Err(invalid());
        }
        let faces = i32::try_from(self.faces).map_err(|_| invalid())?;
        let count = self.count as i32;
        count
            .checked_mul(faces)
            .and_then(|highest| highest.checked_add(self.modifier))
            .and_then(|_| count.checked_add(self.modifier))
            .map(|_| ())
            .ok_or_else(invalid)
    }

    /// Smallest possible total.
    pub fn min(&self) -> i32 {
        saturate(i64::from(self.count) + i64::from(self.modifier))
    }

    /// Largest possible total.
    pub fn max(&self) -> i32 {
        saturate(i64::from(self.count) * i64::from(self.faces) + i64::from(self.modifier))
    }
}

fn saturate(total: i64) -> i32 {
    total.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl FromStr for DiceExpression {
    type Err = DelveError;

    fn from_str(spec: &str) -> DelveResult<Self> {
        let invalid = || DelveError::InvalidExpression(spec.to_string());

        let compact: String = spec
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        let (count_part, rest) = compact.split_once('d').ok_or_else(invalid)?;
        let count = if count_part.is_empty() {
            1
        } else {
            parse_digits(count_part).ok_or_else(invalid)?
        };

        let (faces_part, modifier) = match rest.find(|c| c == '+' || c == '-') {
            Some(idx) => {
                let (faces, signed) = rest.split_at(idx);
                let magnitude = parse_digits(&signed[1..])
                    .and_then(|m| i32::try_from(m).ok())
                    .ok_or_else(invalid)?;
                let modifier = if signed.starts_with('-') {
                    -magnitude
                } else {
                    magnitude
                };
                (faces, modifier)
            }
            None => (rest, 0),
        };
        let faces = parse_digits(faces_part).ok_or_else(invalid)?;

        Self::new(count, faces, modifier).map_err(|_| invalid())
    }
}

fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DelveError;

    fn try_from(value: String) -> DelveResult<Self> {
        value.parse()
    }
}

impl From<DiceExpression> for String {
    fn from(expr: DiceExpression) -> Self {
        expr.to_string()
    }
}

/// The session's single source of randomness.
pub struct Dice {
    rng: Box<dyn RngCore>,
}

impl Dice {
    /// Creates dice backed by a seeded `StdRng` for reproducible sessions.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Dice;
    ///
    /// let mut a = Dice::seeded(7);
    /// let mut b = Dice::seeded(7);
    /// assert_eq!(a.ability_check(2), b.ability_check(2));
    /// ```
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates dice seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Wraps an arbitrary random source.
    pub fn from_rng<R: RngCore + 'static>(rng: R) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Parses and rolls an expression in one step.
    pub fn roll_expression(&mut self, spec: &str) -> DelveResult<i32> {
        let expression: DiceExpression = spec.parse()?;
        Ok(self.roll(&expression))
    }

    /// Sums `count` independent rolls over `[1, faces]` plus the modifier.
    ///
    /// The sum is taken in `i64` and saturated, so hand-built expressions that
    /// skip [`DiceExpression::new`] never overflow.
    pub fn roll(&mut self, expression: &DiceExpression) -> i32 {
        let mut total = i64::from(expression.modifier);
        for _ in 0..expression.count {
            total += i64::from(self.rng.gen_range(1..=expression.faces));
        }
        saturate(total)
    }

    /// Rolls a d20 and adds `modifier`.
    pub fn ability_check(&mut self, modifier: i32) -> i32 {
        let roll = self.rng.gen_range(1..=20) + modifier;
        log::debug!("ability check d20{:+} = {}", modifier, roll);
        roll
    }

    /// Uniform integer in `[low, high]`. Collapses to `low` for an empty range.
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Uniform index in `[0, len)`.
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// Returns true with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dice").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_expression() {
        let expr: DiceExpression = "2d8+3".parse().unwrap();
        assert_eq!(expr, DiceExpression::new(2, 8, 3).unwrap());
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            "1d6".parse::<DiceExpression>().unwrap(),
            DiceExpression::new(1, 6, 0).unwrap()
        );
        assert_eq!(
            "d20".parse::<DiceExpression>().unwrap(),
            DiceExpression::new(1, 20, 0).unwrap()
        );
        assert_eq!(
            " 4D8 - 2 ".parse::<DiceExpression>().unwrap(),
            DiceExpression::new(4, 8, -2).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "8", "2d", "d", "2x8", "2d8+", "0d6", "2d0", "-1d6", "2d8+3+1", "ad6"] {
            let result = bad.parse::<DiceExpression>();
            assert!(
                matches!(result, Err(DelveError::InvalidExpression(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_rejects_totals_beyond_i32() {
        for bad in ["1d4000000000", "3d2000000000", "100000d100000", "2d1073741824"] {
            assert!(
                matches!(
                    bad.parse::<DiceExpression>(),
                    Err(DelveError::InvalidExpression(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(DiceExpression::new(1, i32::MAX as u32, 1).is_err());
        assert!(DiceExpression::new(MAX_DICE_COUNT + 1, 6, 0).is_err());

        let widest = DiceExpression::new(1, i32::MAX as u32, 0).unwrap();
        assert_eq!(widest.max(), i32::MAX);
    }

    #[test]
    fn test_roll_saturates_unchecked_expressions() {
        let mut dice = Dice::seeded(3);
        let huge = DiceExpression {
            count: 3,
            faces: 2_000_000_000,
            modifier: 0,
        };
        assert!(huge.validate().is_err());
        assert_eq!(huge.max(), i32::MAX);
        for _ in 0..50 {
            assert!(dice.roll(&huge) >= 3);
        }
        assert!(dice.roll_expression("3d2000000000").is_err());
    }

    #[test]
    fn test_display_is_canonical() {
        let expr: DiceExpression = "2D8 + 3".parse().unwrap();
        assert_eq!(expr.to_string(), "2d8+3");
        let expr: DiceExpression = "1d6-1".parse().unwrap();
        assert_eq!(expr.to_string(), "1d6-1");
        let expr: DiceExpression = "d4".parse().unwrap();
        assert_eq!(expr.to_string(), "1d4");
    }

    #[test]
    fn test_serde_as_string() {
        let expr: DiceExpression = "3d8+3".parse().unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"3d8+3\"");
        let back: DiceExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
        assert!(serde_json::from_str::<DiceExpression>("\"nonsense\"").is_err());
    }

    #[test]
    fn test_roll_stays_in_bounds() {
        let mut dice = Dice::seeded(12345);
        let expr: DiceExpression = "2d8+3".parse().unwrap();
        for _ in 0..500 {
            let total = dice.roll(&expr);
            assert!(total >= expr.min() && total <= expr.max());
        }
    }

    #[test]
    fn test_roll_expression_reports_invalid() {
        let mut dice = Dice::seeded(1);
        assert!(dice.roll_expression("banana").is_err());
        let total = dice.roll_expression("1d1+4").unwrap();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_ability_check_range() {
        let mut dice = Dice::seeded(99);
        for _ in 0..500 {
            let roll = dice.ability_check(3);
            assert!((4..=23).contains(&roll));
        }
    }

    #[test]
    fn test_seeded_dice_are_deterministic() {
        let mut a = Dice::seeded(42);
        let mut b = Dice::seeded(42);
        let rolls_a: Vec<i32> = (0..20).map(|_| a.range(1, 100)).collect();
        let rolls_b: Vec<i32> = (0..20).map(|_| b.range(1, 100)).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn test_chance_edges() {
        let mut dice = Dice::seeded(5);
        assert!(!dice.chance(0.0));
        assert!(!dice.chance(f64::NAN));
        assert!(dice.chance(1.0));
        assert_eq!(dice.range(7, 7), 7);
        assert_eq!(dice.range(9, 3), 9);
        assert_eq!(dice.index(0), 0);
    }
}
