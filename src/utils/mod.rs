//! # Utilities Module
//!
//! Dice rolling, reachability and path helpers shared by the game systems.

pub mod dice;
pub mod pathfinding;

pub use self::dice::*;
pub use self::pathfinding::*;
