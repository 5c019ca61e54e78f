//! # Display Management
//!
//! Builds the text screen for a [`GameSession`]: a map viewport centred on the
//! party, a status panel, the most recent messages and the end-game report.

use crate::game::{CellView, GameMode, GameSession, GameStatistics, Level, Position};
use crate::{DelveError, DelveResult};

/// Text display for a session.
///
/// # Examples
///
/// ```
/// use delve::{
///     AbilityScores, Character, CharacterClass, Dice, GameConfig, GameSession, Party, TextDisplay,
/// };
///
/// let mut party = Party::new();
/// party.add_member(Character::new("Hero", CharacterClass::Fighter, 1, AbilityScores::default()));
/// let session = GameSession::start(party, GameConfig::default(), Dice::seeded(4)).unwrap();
///
/// let mut display = TextDisplay::new(40, 15);
/// let screen = display.render_game(&session).unwrap();
/// assert!(screen.contains('1'));
/// ```
#[derive(Debug, Clone)]
pub struct TextDisplay {
    /// Map viewport offset x in tiles
    pub viewport_x: i32,
    /// Map viewport offset y in tiles
    pub viewport_y: i32,
    /// Map viewport width in tiles
    pub map_width: i32,
    /// Map viewport height in tiles
    pub map_height: i32,
    /// Messages shown under the map
    pub message_lines: usize,
}

impl Default for TextDisplay {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl TextDisplay {
    pub fn new(map_width: i32, map_height: i32) -> Self {
        Self {
            viewport_x: 0,
            viewport_y: 0,
            map_width: map_width.max(1),
            map_height: map_height.max(1),
            message_lines: 5,
        }
    }

    /// A viewport exactly the size of `level`, so the whole map is drawn.
    pub fn for_level(level: &Level) -> Self {
        Self::new(level.width as i32, level.height as i32)
    }

    /// Centers the viewport on the given position.
    pub fn center_viewport_on_position(&mut self, position: Position) {
        self.viewport_x = position.x - self.map_width / 2;
        self.viewport_y = position.y - self.map_height / 2;
    }

    /// Keeps the viewport inside the level when the level is larger than it.
    fn clamp_viewport(&mut self, level: &Level) {
        let max_x = (level.width as i32 - self.map_width).max(0);
        let max_y = (level.height as i32 - self.map_height).max(0);
        self.viewport_x = self.viewport_x.clamp(0, max_x);
        self.viewport_y = self.viewport_y.clamp(0, max_y);
    }

    /// Renders the complete screen: map, status panel and messages, or the
    /// end-game report once the session has finished.
    pub fn render_game(&mut self, session: &GameSession) -> DelveResult<String> {
        let level = session
            .level()
            .ok_or_else(|| DelveError::InvalidState("No current level".to_string()))?;

        self.center_viewport_on_position(session.position());
        self.clamp_viewport(level);

        let mut screen = self.render_map(level, Some(session.position()));
        screen.push('\n');
        screen.push_str(&render_status(session));
        screen.push('\n');
        screen.push_str(&self.render_messages(session));
        if session.is_finished() {
            screen.push('\n');
            screen.push_str(&render_statistics(session.mode(), session.statistics()));
        }
        Ok(screen)
    }

    /// Renders the viewport as rows of glyphs. Unexplored cells are blank.
    pub fn render_map(&self, level: &Level, party: Option<Position>) -> String {
        let mut out = String::with_capacity(((self.map_width + 1) * self.map_height) as usize);
        for screen_y in 0..self.map_height {
            let mut row = String::with_capacity(self.map_width as usize);
            for screen_x in 0..self.map_width {
                let world_pos =
                    Position::new(self.viewport_x + screen_x, self.viewport_y + screen_y);
                row.push(match level.view(world_pos, party) {
                    CellView::Unexplored => ' ',
                    CellView::Remembered(glyph) | CellView::Visible(glyph) => glyph,
                });
            }
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }

    /// The most recent messages, oldest first.
    pub fn render_messages(&self, session: &GameSession) -> String {
        let log = session.messages();
        let skip = log.len().saturating_sub(self.message_lines);
        log.iter()
            .skip(skip)
            .map(|message| format!("{}\n", message))
            .collect()
    }
}

/// Party panel: depth, turn, position and one line per member.
pub fn render_status(session: &GameSession) -> String {
    let mut out = format!(
        "Dungeon Level: {}  Turn: {}  Position: ({}, {})\n",
        session.depth(),
        session.turn(),
        session.position().x,
        session.position().y
    );

    for member in &session.party.members {
        let state = if member.is_alive() { "" } else { " (fallen)" };
        out.push_str(&format!(
            "{} the {} L{}  HP {}/{}  AC {}  XP {}  Gold {}{}\n",
            member.name,
            member.class.name(),
            member.level,
            member.current_hp,
            member.max_hp,
            member.armor_class,
            member.experience,
            member.gold,
            state
        ));
    }

    if let Some(encounter) = session.combat() {
        out.push_str(&format!("Combat round {}:\n", encounter.round() + 1));
        for (_, monster) in encounter.living_monsters() {
            out.push_str(&format!(
                "  {} HP {}/{}  AC {}\n",
                monster.name, monster.current_hp, monster.max_hp, monster.armor_class
            ));
        }
        out.push_str("[A]ttack  [F]lee\n");
    } else if session.pending_door().is_some() {
        out.push_str("The door is locked: [L]ockpick  [S]mash  or move away\n");
    }
    out
}

/// End-game report.
pub fn render_statistics(mode: GameMode, stats: &GameStatistics) -> String {
    let headline = match mode {
        GameMode::Victory => "You escaped the dungeon!",
        GameMode::GameOver => "Your party has fallen.",
        GameMode::Exploration | GameMode::Combat => "Session statistics",
    };
    format!(
        "{}\n\
         Deepest level reached: {}\n\
         Monsters defeated: {}\n\
         Chests opened: {}\n\
         Gold collected: {}\n\
         Experience earned: {}\n\
         Doors picked: {}\n\
         Doors smashed: {}\n",
        headline,
        stats.max_dungeon_level,
        stats.monsters_defeated,
        stats.chests_opened,
        stats.total_gold_collected,
        stats.total_experience,
        stats.doors_picked,
        stats.doors_smashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_room() -> Level {
        let mut level = Level::new(7, 5);
        for y in 1..4 {
            for x in 1..6 {
                level.carve_floor(Position::new(x, y));
            }
        }
        level
    }

    #[test]
    fn test_unexplored_level_renders_blank() {
        let level = walled_room();
        let display = TextDisplay::for_level(&level);
        let map = display.render_map(&level, None);
        assert_eq!(map, "\n\n\n\n\n");
    }

    #[test]
    fn test_visible_cells_and_party_overlay() {
        let mut level = walled_room();
        level.update_visibility(Position::new(3, 2), 10);
        let display = TextDisplay::for_level(&level);
        let map = display.render_map(&level, Some(Position::new(3, 2)));
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows[0], "#######");
        assert_eq!(rows[2], "#..1..#");
    }

    #[test]
    fn test_remembered_floor_is_dimmed() {
        let mut level = walled_room();
        level.update_visibility(Position::new(1, 1), 1);
        level.update_visibility(Position::new(5, 3), 1);
        let display = TextDisplay::for_level(&level);
        let map = display.render_map(&level, Some(Position::new(5, 3)));
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows[0], "###");
        assert!(rows[1].starts_with("#··"));
        assert!(rows[3].ends_with(".1#"));
    }

    #[test]
    fn test_viewport_clamps_to_level() {
        let level = walled_room();
        let mut display = TextDisplay::new(3, 3);
        display.center_viewport_on_position(Position::new(0, 0));
        display.clamp_viewport(&level);
        assert_eq!((display.viewport_x, display.viewport_y), (0, 0));
        display.center_viewport_on_position(Position::new(6, 4));
        display.clamp_viewport(&level);
        assert_eq!((display.viewport_x, display.viewport_y), (4, 2));
    }

    #[test]
    fn test_statistics_report() {
        let stats = GameStatistics {
            monsters_defeated: 3,
            max_dungeon_level: 2,
            ..GameStatistics::default()
        };
        let report = render_statistics(GameMode::Victory, &stats);
        assert!(report.starts_with("You escaped the dungeon!"));
        assert!(report.contains("Monsters defeated: 3"));
        assert!(report.contains("Deepest level reached: 2"));
    }
}
