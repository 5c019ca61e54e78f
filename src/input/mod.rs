//! # Input Module
//!
//! Maps key presses to [`Command`]s.
//!
//! Capturing keys from a terminal is the caller's job; this module only
//! decides what a key means in the current game context. Several keys are
//! overloaded: `d` descends while standing on stairs down and moves right
//! otherwise, and `s` smashes a pending door but otherwise moves down.

pub mod commands;

pub use commands::*;

use crate::game::{Direction, GameMode};

/// A key press as delivered by the terminal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Splits a recorded key stream into keys, decoding ANSI arrow sequences
    /// (`ESC [ A` .. `ESC [ D`).
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Key;
    ///
    /// let keys = Key::parse_stream("w\x1b[Cq");
    /// assert_eq!(keys, vec![Key::Char('w'), Key::Right, Key::Char('q')]);
    /// ```
    pub fn parse_stream(stream: &str) -> Vec<Key> {
        let chars: Vec<char> = stream.chars().collect();
        let mut keys = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '\x1b' && chars.get(i + 1) == Some(&'[') {
                let arrow = match chars.get(i + 2) {
                    Some('A') => Some(Key::Up),
                    Some('B') => Some(Key::Down),
                    Some('C') => Some(Key::Right),
                    Some('D') => Some(Key::Left),
                    _ => None,
                };
                if let Some(key) = arrow {
                    keys.push(key);
                    i += 3;
                    continue;
                }
            }
            if !chars[i].is_whitespace() {
                keys.push(Key::Char(chars[i]));
            }
            i += 1;
        }
        keys
    }
}

/// What the handler needs to know about the session to resolve a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub mode: GameMode,
    pub door_pending: bool,
    pub on_stairs_down: bool,
    pub on_stairs_up: bool,
}

/// Input handler for processing player commands.
#[derive(Debug, Clone, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Command, GameMode, InputContext, InputHandler, Key};
    ///
    /// let handler = InputHandler::new();
    /// let context = InputContext {
    ///     mode: GameMode::Combat,
    ///     door_pending: false,
    ///     on_stairs_down: false,
    ///     on_stairs_up: false,
    /// };
    /// assert_eq!(handler.command_for(Key::Char('a'), &context), Some(Command::Attack(None)));
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Maps a movement key to a direction: arrows, WASD, and the numeric keypad
    /// (8/2/4/6 plus diagonals 7/9/1/3).
    pub fn movement(&self, key: Key) -> Option<Direction> {
        match key {
            Key::Up => Some(Direction::North),
            Key::Down => Some(Direction::South),
            Key::Left => Some(Direction::West),
            Key::Right => Some(Direction::East),
            Key::Char(c) => match c.to_ascii_lowercase() {
                'w' | '8' => Some(Direction::North),
                's' | '2' => Some(Direction::South),
                'a' | '4' => Some(Direction::West),
                'd' | '6' => Some(Direction::East),
                '7' => Some(Direction::Northwest),
                '9' => Some(Direction::Northeast),
                '1' => Some(Direction::Southwest),
                '3' => Some(Direction::Southeast),
                _ => None,
            },
        }
    }

    /// Resolves a key to a command, or `None` when the key means nothing in
    /// this context.
    pub fn command_for(&self, key: Key, context: &InputContext) -> Option<Command> {
        let letter = match key {
            Key::Char(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        };
        if letter == Some('q') {
            return Some(Command::Quit);
        }

        match context.mode {
            GameMode::Exploration => {
                if context.door_pending {
                    match letter {
                        Some('l') => return Some(Command::Lockpick),
                        Some('s') => return Some(Command::Smash),
                        _ => {}
                    }
                }
                match letter {
                    Some('d') if context.on_stairs_down => return Some(Command::Descend),
                    Some('u') if context.on_stairs_up => return Some(Command::Ascend),
                    _ => {}
                }
                self.movement(key).map(Command::Move)
            }
            GameMode::Combat => match letter {
                Some('a') => Some(Command::Attack(None)),
                Some('f') => Some(Command::Flee),
                _ => None,
            },
            GameMode::GameOver | GameMode::Victory => None,
        }
    }
}
