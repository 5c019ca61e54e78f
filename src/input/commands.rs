//! # Command Definitions
//!
//! Game commands produced by the input handler and consumed by
//! [`GameSession::apply`](crate::GameSession::apply).

use crate::game::{Direction, MonsterId};
use serde::{Deserialize, Serialize};

/// One player decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Step the party one cell
    Move(Direction),
    /// Pick the lock of the door awaiting a decision
    Lockpick,
    /// Smash the door awaiting a decision
    Smash,
    /// Take the stairs down
    Descend,
    /// Take the stairs up
    Ascend,
    /// Resolve one combat round; `None` targets the first living monster
    Attack(Option<MonsterId>),
    /// Try to escape combat
    Flee,
    /// Leave the game
    Quit,
}

impl Command {
    /// Whether the command ends the current turn's input loop.
    pub fn is_quit(self) -> bool {
        matches!(self, Command::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_quit_ends_input() {
        assert!(Command::Quit.is_quit());
        for command in [
            Command::Move(Direction::North),
            Command::Lockpick,
            Command::Smash,
            Command::Descend,
            Command::Ascend,
            Command::Attack(None),
            Command::Flee,
        ] {
            assert!(!command.is_quit(), "{:?}", command);
        }
    }
}
