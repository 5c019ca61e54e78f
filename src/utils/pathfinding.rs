//! # Grid Reachability
//!
//! Flood-fill and shortest-path helpers over the tile grid.

use crate::game::Position;
use pathfinding::prelude::{bfs, bfs_reach};
use std::collections::HashSet;

/// Collects every position reachable from `start` through cardinal steps.
///
/// Returns an empty set when `start` itself is not passable.
///
/// # Examples
///
/// ```
/// use delve::{reachable_positions, Position};
///
/// let open = |p: Position| (0..3).contains(&p.x) && p.y == 0;
/// let reach = reachable_positions(Position::new(0, 0), open);
/// assert_eq!(reach.len(), 3);
/// ```
pub fn reachable_positions<F>(start: Position, passable: F) -> HashSet<Position>
where
    F: Fn(Position) -> bool,
{
    if !passable(start) {
        return HashSet::new();
    }

    bfs_reach(start, |pos: &Position| {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|next| passable(*next))
            .collect::<Vec<_>>()
    })
    .collect()
}

/// Shortest walk from `start` to `goal` using the party's eight movement
/// directions. The returned path includes both endpoints.
///
/// # Examples
///
/// ```
/// use delve::{shortest_path, Position};
///
/// let open = |p: Position| (0..5).contains(&p.x) && (0..5).contains(&p.y);
/// let path = shortest_path(Position::new(0, 0), Position::new(3, 3), open).unwrap();
/// assert_eq!(path.len(), 4);
/// ```
pub fn shortest_path<F>(start: Position, goal: Position, passable: F) -> Option<Vec<Position>>
where
    F: Fn(Position) -> bool,
{
    if !passable(start) || !passable(goal) {
        return None;
    }

    bfs(
        &start,
        |pos: &Position| {
            pos.adjacent_positions()
                .into_iter()
                .filter(|next| passable(*next))
                .collect::<Vec<_>>()
        },
        |pos| *pos == goal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_start_reaches_nothing() {
        let reach = reachable_positions(Position::new(0, 0), |_| false);
        assert!(reach.is_empty());
    }

    #[test]
    fn test_reach_stops_at_walls() {
        // Two 3x3 pockets separated by a wall column at x == 3.
        let passable = |p: Position| (0..7).contains(&p.x) && (0..3).contains(&p.y) && p.x != 3;
        let reach = reachable_positions(Position::new(1, 1), passable);
        assert_eq!(reach.len(), 9);
        assert!(!reach.contains(&Position::new(5, 1)));
    }

    #[test]
    fn test_shortest_path_goes_around_walls() {
        // A wall column at x == 2 with a gap at y == 4.
        let passable = |p: Position| {
            (0..5).contains(&p.x) && (0..5).contains(&p.y) && (p.x != 2 || p.y == 4)
        };
        let path = shortest_path(Position::new(0, 0), Position::new(4, 0), passable).unwrap();
        assert_eq!(path.first(), Some(&Position::new(0, 0)));
        assert_eq!(path.last(), Some(&Position::new(4, 0)));
        assert!(path.contains(&Position::new(2, 4)));
        assert!(shortest_path(Position::new(0, 0), Position::new(2, 0), passable).is_none());
    }
}
