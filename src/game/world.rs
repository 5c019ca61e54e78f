//! # World Representation
//!
//! The tile grid of a single dungeon level together with everything living on
//! it: monsters, chests, doors and stairs.
//!
//! Cells never own monsters or doors. They hold a [`MonsterId`] or [`DoorId`]
//! key into the level's own collections, so removing a monster cannot leave a
//! stale reference behind.

use crate::game::door::{Door, DoorAttempt};
use crate::game::entities::Monster;
use crate::game::{new_monster_id, DoorId, MonsterId, Position};
use crate::generation::Room;
use log::debug;

/// Terrain kinds and their map glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Wall,
    Floor,
    StairsUp,
    StairsDown,
    Chest,
    /// A closed door; open or destroyed doors are drawn as floor
    Door { horizontal: bool },
}

impl Terrain {
    /// Glyph used for this terrain in maps and level definitions.
    pub fn glyph(self) -> char {
        match self {
            Terrain::Wall => '#',
            Terrain::Floor => '.',
            Terrain::StairsUp => '>',
            Terrain::StairsDown => '<',
            Terrain::Chest => '$',
            Terrain::Door { horizontal: true } => '-',
            Terrain::Door { horizontal: false } => '|',
        }
    }

    /// Parses a glyph back into terrain.
    pub fn from_glyph(glyph: char) -> Option<Terrain> {
        match glyph {
            '#' => Some(Terrain::Wall),
            '.' => Some(Terrain::Floor),
            '>' => Some(Terrain::StairsUp),
            '<' => Some(Terrain::StairsDown),
            '$' => Some(Terrain::Chest),
            '-' => Some(Terrain::Door { horizontal: true }),
            '|' => Some(Terrain::Door { horizontal: false }),
            _ => None,
        }
    }

    /// Whether this terrain stops movement and sight by itself.
    pub fn is_blocking(self) -> bool {
        matches!(self, Terrain::Wall | Terrain::Door { .. })
    }
}

/// A single grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub terrain: Terrain,
    pub blocked: bool,
    pub blocks_sight: bool,
    pub explored: bool,
    pub visible: bool,
    pub monster: Option<MonsterId>,
    pub door: Option<DoorId>,
}

impl Cell {
    /// Creates an unexplored cell whose flags follow the terrain.
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            blocked: terrain.is_blocking(),
            blocks_sight: terrain.is_blocking(),
            explored: false,
            visible: false,
            monster: None,
            door: None,
        }
    }

    pub fn wall() -> Self {
        Self::new(Terrain::Wall)
    }

    pub fn floor() -> Self {
        Self::new(Terrain::Floor)
    }

    fn set_terrain(&mut self, terrain: Terrain) {
        self.terrain = terrain;
        self.blocked = terrain.is_blocking();
        self.blocks_sight = terrain.is_blocking();
    }
}

/// A monster and where it stands.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupant {
    pub id: MonsterId,
    pub monster: Monster,
    pub position: Position,
}

/// A door and the cell it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedDoor {
    pub door: Door,
    pub position: Position,
}

/// What a renderer should show for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    /// Never seen: drawn blank
    Unexplored,
    /// Seen before but out of sight: walls keep their glyph, the rest is dimmed
    Remembered(char),
    /// Currently in sight, including party and monster overlays
    Visible(char),
}

/// Glyph for the party overlay.
pub const PARTY_GLYPH: char = '1';

/// Glyph for remembered, out-of-sight non-wall cells.
pub const DIM_FLOOR_GLYPH: char = '·';

/// One dungeon level.
///
/// # Examples
///
/// ```
/// use delve::{Level, Position};
///
/// let mut level = Level::new(10, 8);
/// assert!(level.is_blocked(Position::new(3, 3)));
/// level.carve_floor(Position::new(3, 3));
/// assert!(!level.is_blocked(Position::new(3, 3)));
/// assert!(level.is_blocked(Position::new(-1, 0)));
/// ```
#[derive(Debug, Clone)]
pub struct Level {
    pub width: u32,
    pub height: u32,
    cells: Vec<Vec<Cell>>,
    /// Rooms accepted during generation, in generation order
    pub rooms: Vec<Room>,
    monsters: Vec<Occupant>,
    chests: Vec<Position>,
    doors: Vec<PlacedDoor>,
    pub stairs_up: Option<Position>,
    pub stairs_down: Option<Position>,
}

impl Level {
    /// Creates a level of solid wall.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Cell::wall(); width as usize]; height as usize],
            rooms: Vec::new(),
            monsters: Vec::new(),
            chests: Vec::new(),
            doors: Vec::new(),
            stairs_up: None,
            stairs_down: None,
        }
    }

    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        if self.is_valid_position(pos) {
            Some(&self.cells[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        if self.is_valid_position(pos) {
            Some(&mut self.cells[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// Iterates over rows of cells, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// True for out-of-bounds coordinates and for cells flagged as blocked.
    pub fn is_blocked(&self, pos: Position) -> bool {
        self.cell(pos).map_or(true, |cell| cell.blocked)
    }

    /// Overwrites the terrain at `pos`, resetting its movement and sight flags.
    /// Out-of-bounds coordinates are ignored.
    pub fn set_terrain(&mut self, pos: Position, terrain: Terrain) -> bool {
        match self.cell_mut(pos) {
            Some(cell) => {
                cell.set_terrain(terrain);
                true
            }
            None => false,
        }
    }

    /// Turns the cell at `pos` into floor, silently clipping out-of-bounds
    /// coordinates.
    pub fn carve_floor(&mut self, pos: Position) -> bool {
        self.set_terrain(pos, Terrain::Floor)
    }

    /// Number of cells that do not block movement.
    pub fn passable_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.blocked)
            .count()
    }

    /// Marks every cell within Chebyshev distance `radius` of the observer as
    /// visible and explored, and every other cell as not visible.
    ///
    /// Walls and doors do not occlude sight; the visible region is a square.
    pub fn update_visibility(&mut self, observer: Position, radius: i32) {
        for cell in self.cells.iter_mut().flatten() {
            cell.visible = false;
        }

        if radius < 0 {
            return;
        }
        // Clip the square to the grid.
        let (max_x, max_y) = (self.width as i32 - 1, self.height as i32 - 1);
        let (left, right) = (
            observer.x.saturating_sub(radius).max(0),
            observer.x.saturating_add(radius).min(max_x),
        );
        let (top, bottom) = (
            observer.y.saturating_sub(radius).max(0),
            observer.y.saturating_add(radius).min(max_y),
        );
        for y in top..=bottom {
            for x in left..=right {
                if let Some(cell) = self.cell_mut(Position::new(x, y)) {
                    cell.visible = true;
                    cell.explored = true;
                }
            }
        }
    }

    /// Places a monster on a free, unblocked cell.
    ///
    /// Returns the monster's key, or `None` when the cell is out of bounds,
    /// blocked, or already occupied.
    pub fn place_monster(&mut self, monster: Monster, pos: Position) -> Option<MonsterId> {
        if self.is_blocked(pos) || self.cell(pos).and_then(|c| c.monster).is_some() {
            return None;
        }

        let id = new_monster_id();
        if let Some(cell) = self.cell_mut(pos) {
            cell.monster = Some(id);
        }
        self.monsters.push(Occupant {
            id,
            monster,
            position: pos,
        });
        Some(id)
    }

    /// All monsters in placement order.
    pub fn monsters(&self) -> &[Occupant] {
        &self.monsters
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.iter().find(|o| o.id == id).map(|o| &o.monster)
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters
            .iter_mut()
            .find(|o| o.id == id)
            .map(|o| &mut o.monster)
    }

    /// The monster referenced by the cell at `pos`, if any.
    pub fn monster_at(&self, pos: Position) -> Option<(MonsterId, &Monster)> {
        let id = self.cell(pos)?.monster?;
        self.monster(id).map(|monster| (id, monster))
    }

    /// Keys of every monster standing on `pos`, in list order.
    pub fn monsters_at(&self, pos: Position) -> Vec<MonsterId> {
        self.monsters
            .iter()
            .filter(|o| o.position == pos)
            .map(|o| o.id)
            .collect()
    }

    /// Removes a monster from the level and clears its cell reference.
    pub fn remove_monster(&mut self, id: MonsterId) -> Option<Monster> {
        let index = self.monsters.iter().position(|o| o.id == id)?;
        let occupant = self.monsters.remove(index);
        if let Some(cell) = self.cell_mut(occupant.position) {
            if cell.monster == Some(id) {
                cell.monster = None;
            }
        }
        debug!("removed {} at {:?}", occupant.monster.name, occupant.position);
        Some(occupant.monster)
    }

    /// Places a chest on an unblocked floor cell. Cells holding a door, even an
    /// open one, are refused.
    pub fn place_chest(&mut self, pos: Position) -> bool {
        let placeable = matches!(
            self.cell(pos),
            Some(cell) if !cell.blocked && cell.terrain == Terrain::Floor && cell.door.is_none()
        );
        if !placeable {
            return false;
        }
        self.set_terrain(pos, Terrain::Chest);
        self.chests.push(pos);
        true
    }

    pub fn chests(&self) -> &[Position] {
        &self.chests
    }

    pub fn has_chest(&self, pos: Position) -> bool {
        self.chests.contains(&pos)
    }

    /// Removes the chest at `pos`, turning the cell back into floor.
    pub fn take_chest(&mut self, pos: Position) -> bool {
        let Some(index) = self.chests.iter().position(|&c| c == pos) else {
            return false;
        };
        self.chests.remove(index);
        if self.cell(pos).map(|c| c.terrain) == Some(Terrain::Chest) {
            self.set_terrain(pos, Terrain::Floor);
        }
        true
    }

    /// Places a door on an unblocked, unoccupied floor cell and syncs the cell
    /// to the door's state.
    pub fn place_door(&mut self, door: Door, pos: Position) -> Option<DoorId> {
        let placeable = matches!(
            self.cell(pos),
            Some(cell) if !cell.blocked
                && cell.terrain == Terrain::Floor
                && cell.door.is_none()
                && cell.monster.is_none()
        );
        if !placeable {
            return None;
        }

        let id = DoorId(self.doors.len());
        self.doors.push(PlacedDoor {
            door,
            position: pos,
        });
        if let Some(cell) = self.cell_mut(pos) {
            cell.door = Some(id);
        }
        self.sync_door(id);
        Some(id)
    }

    pub fn doors(&self) -> &[PlacedDoor] {
        &self.doors
    }

    pub fn door(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(id.0).map(|placed| &placed.door)
    }

    /// Mutable door access. Call [`Level::sync_door`] after any transition.
    pub fn door_mut(&mut self, id: DoorId) -> Option<&mut Door> {
        self.doors.get_mut(id.0).map(|placed| &mut placed.door)
    }

    pub fn door_at(&self, pos: Position) -> Option<DoorId> {
        self.cell(pos)?.door
    }

    /// Copies a door's passability onto its cell.
    pub fn sync_door(&mut self, id: DoorId) {
        let Some(placed) = self.doors.get(id.0) else {
            return;
        };
        let pos = placed.position;
        let passable = placed.door.is_passable();
        let terrain = if passable {
            Terrain::Floor
        } else {
            Terrain::Door {
                horizontal: placed.door.horizontal,
            }
        };
        if let Some(cell) = self.cell_mut(pos) {
            cell.terrain = terrain;
            cell.blocked = !passable;
            cell.blocks_sight = !passable;
        }
    }

    /// Runs a door transition and syncs the grid immediately afterwards.
    pub fn interact_door<F>(&mut self, id: DoorId, transition: F) -> Option<DoorAttempt>
    where
        F: FnOnce(&mut Door) -> DoorAttempt,
    {
        let attempt = transition(self.door_mut(id)?);
        self.sync_door(id);
        Some(attempt)
    }

    /// Marks `pos` as the up staircase.
    pub fn set_stairs_up(&mut self, pos: Position) -> bool {
        if self.set_terrain(pos, Terrain::StairsUp) {
            self.stairs_up = Some(pos);
            true
        } else {
            false
        }
    }

    /// Marks `pos` as the down staircase.
    pub fn set_stairs_down(&mut self, pos: Position) -> bool {
        if self.set_terrain(pos, Terrain::StairsDown) {
            self.stairs_down = Some(pos);
            true
        } else {
            false
        }
    }

    /// Three-state view of a cell for rendering.
    pub fn view(&self, pos: Position, party: Option<Position>) -> CellView {
        let Some(cell) = self.cell(pos) else {
            return CellView::Unexplored;
        };

        if !cell.explored {
            CellView::Unexplored
        } else if cell.visible {
            if party == Some(pos) {
                return CellView::Visible(PARTY_GLYPH);
            }
            match self.monster_at(pos) {
                Some((_, monster)) if monster.is_alive() => CellView::Visible(monster.glyph()),
                _ => CellView::Visible(cell.terrain.glyph()),
            }
        } else if cell.terrain == Terrain::Wall {
            CellView::Remembered(Terrain::Wall.glyph())
        } else {
            CellView::Remembered(DIM_FLOOR_GLYPH)
        }
    }
}
