use std::collections::{BTreeSet, HashMap, HashSet};

use crate::entity::Position;
use crate::grid::{Grid, Tile};

/// 4-directional steps in clockwise order starting from right, as `(dx, dy)`.
pub const ORTHOGONAL_STEPS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Diagonal steps in the fixed trial order used by every walker.
pub const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// The tiles the player and Sparx may stand on: every non-empty tile with
/// an `Empty` tile among its 8 neighbours.
///
/// A `Perimeter` is a snapshot. It is rebuilt from the grid after each
/// capture and never edited in place.
#[derive(Debug, Clone, Default)]
pub struct Perimeter {
    tiles: HashSet<Position>,
    ordered: Vec<Position>,
    index: HashMap<Position, usize>,
}

impl Perimeter {
    pub fn compute(grid: &Grid) -> Self {
        Self::from_tiles(compute_tiles(grid))
    }

    pub fn from_tiles(tiles: HashSet<Position>) -> Self {
        let ordered = build_ordered(&tiles);
        let index = ordered.iter().enumerate().map(|(i, pos)| (*pos, i)).collect();
        Self {
            tiles,
            ordered,
            index,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.tiles.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &HashSet<Position> {
        &self.tiles
    }

    /// Closed walk visiting each perimeter tile exactly once.
    pub fn ordered(&self) -> &[Position] {
        &self.ordered
    }

    pub fn index_of(&self, pos: Position) -> Option<usize> {
        self.index.get(&pos).copied()
    }

    /// Index into [`ordered`](Self::ordered) of the tile closest to `target`.
    pub fn nearest_index(&self, target: Position) -> Option<usize> {
        self.ordered
            .iter()
            .enumerate()
            .min_by_key(|(_, pos)| pos.manhattan(target))
            .map(|(i, _)| i)
    }

    pub fn nearest(&self, target: Position) -> Option<Position> {
        self.nearest_index(target).map(|i| self.ordered[i])
    }

    /// Whether an entity may step from `from` to `to` without squeezing
    /// through solid ground.
    ///
    /// Orthogonal single steps are fine. A diagonal step between two solid
    /// tiles needs one of its corner tiles on the perimeter. Longer jumps
    /// never are.
    pub fn can_step_between(&self, grid: &Grid, from: Position, to: Position) -> bool {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();

        if dx > 1 || dy > 1 || (dx == 0 && dy == 0) {
            return false;
        }
        if dx + dy == 1 {
            return true;
        }
        if !grid.at(from).is_solid() || !grid.at(to).is_solid() {
            return true;
        }

        let corner_a = Position::new(to.x, from.y);
        let corner_b = Position::new(from.x, to.y);
        self.contains(corner_a) || self.contains(corner_b)
    }
}

/// Collects every in-bounds non-empty tile 8-adjacent to an `Empty` tile.
pub fn compute_tiles(grid: &Grid) -> HashSet<Position> {
    let mut tiles = HashSet::new();

    for pos in grid.positions() {
        if grid.at(pos) != Tile::Empty {
            continue;
        }
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbor = pos.offset(dx, dy);
                if grid.in_bounds(neighbor) && grid.at(neighbor) != Tile::Empty {
                    tiles.insert(neighbor);
                }
            }
        }
    }

    tiles
}

/// Orders a perimeter set into a walk.
///
/// Starts at the row-major smallest tile and greedily steps to unvisited
/// neighbours, orthogonal before diagonal. When the walk runs dry it jumps
/// to the unvisited tile nearest the last one placed, so a perimeter split
/// into several loops comes out as one sequence with a jump between loops.
pub fn build_ordered(tiles: &HashSet<Position>) -> Vec<Position> {
    let mut remaining: BTreeSet<Position> = tiles.iter().copied().collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    let Some(mut current) = remaining.pop_first() else {
        return ordered;
    };
    ordered.push(current);

    loop {
        let step = ORTHOGONAL_STEPS
            .iter()
            .chain(DIAGONAL_STEPS.iter())
            .map(|&(dx, dy)| current.offset(dx, dy))
            .find(|pos| remaining.contains(pos));

        // min_by_key keeps the first of equally near tiles, i.e. the row-major smallest
        let next = match step {
            Some(next) => next,
            None => match remaining.iter().copied().min_by_key(|pos| pos.manhattan(current)) {
                Some(next) => next,
                None => break,
            },
        };

        remaining.remove(&next);
        ordered.push(next);
        current = next;
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fill_rect(grid: &mut Grid, x0: i32, y0: i32, x1: i32, y1: i32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                grid.set(y, x, Tile::Filled);
            }
        }
    }

    fn assert_exact_cover(perimeter: &Perimeter) {
        let ordered = perimeter.ordered();
        let unique: HashSet<Position> = ordered.iter().copied().collect();
        assert_eq!(ordered.len(), unique.len(), "ordered perimeter has duplicates");
        assert_eq!(&unique, perimeter.tiles(), "ordered perimeter misses tiles");
    }

    #[test]
    fn test_initial_perimeter_is_the_border() {
        let grid = Grid::new(10, 6).unwrap();
        let perimeter = Perimeter::compute(&grid);

        let border: HashSet<Position> = grid
            .positions()
            .filter(|pos| grid.at(*pos) == Tile::Border)
            .collect();
        assert_eq!(perimeter.tiles(), &border);
    }

    #[test]
    fn test_ordered_border_walks_clockwise_from_top_left() {
        let grid = Grid::new(5, 4).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let ordered = perimeter.ordered();

        assert_eq!(ordered[0], Position::new(0, 0));
        assert_eq!(ordered[1], Position::new(1, 0));
        assert_eq!(ordered[4], Position::new(4, 0));
        assert_eq!(ordered[5], Position::new(4, 1));
        assert_eq!(*ordered.last().unwrap(), Position::new(0, 1));

        // Single loop: every consecutive pair is one step apart
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
        assert_exact_cover(&perimeter);
    }

    #[test]
    fn test_ordered_covers_disjoint_loops() {
        // Solid wall through the middle leaves two separate pockets
        let mut grid = Grid::new(15, 8).unwrap();
        fill_rect(&mut grid, 5, 1, 9, 6);
        let perimeter = Perimeter::compute(&grid);

        // Interior wall tiles (6..=8) touch no empty space
        assert!(!perimeter.contains(Position::new(7, 3)));
        assert!(perimeter.contains(Position::new(5, 3)));
        assert!(perimeter.contains(Position::new(9, 3)));
        assert_exact_cover(&perimeter);

        // Two pockets whose perimeters share no tiles
        let mut grid = Grid::new(20, 10).unwrap();
        fill_rect(&mut grid, 1, 1, 18, 8);
        for y in 2..=3 {
            for x in 2..=4 {
                grid.set(y, x, Tile::Empty);
            }
        }
        for y in 6..=7 {
            for x in 12..=16 {
                grid.set(y, x, Tile::Empty);
            }
        }
        let perimeter = Perimeter::compute(&grid);
        // Rings of 5x4 and 7x4 around the 3x2 and 5x2 holes
        assert_eq!(perimeter.len(), (5 * 4 - 3 * 2) + (7 * 4 - 5 * 2));
        assert_exact_cover(&perimeter);
    }

    #[test]
    fn test_empty_perimeter_orders_to_nothing() {
        let mut grid = Grid::new(5, 5).unwrap();
        fill_rect(&mut grid, 1, 1, 3, 3);
        let perimeter = Perimeter::compute(&grid);
        assert!(perimeter.is_empty());
        assert!(perimeter.ordered().is_empty());
        assert_eq!(perimeter.nearest(Position::new(2, 2)), None);
    }

    #[test]
    fn test_diagonal_gap_crossing_blocked_without_corner() {
        // Two filled tiles touching only at a corner, with open space on both
        // corner tiles: the corners are Empty so neither is on the perimeter.
        let mut grid = Grid::new(9, 9).unwrap();
        grid.set(3, 3, Tile::Filled);
        grid.set(4, 4, Tile::Filled);
        let perimeter = Perimeter::compute(&grid);

        let a = Position::new(3, 3);
        let b = Position::new(4, 4);
        assert!(perimeter.contains(a) && perimeter.contains(b));
        assert!(!perimeter.can_step_between(&grid, a, b));
        assert!(!perimeter.can_step_between(&grid, b, a));

        // Fill one corner and the diagonal becomes a legal shortcut
        grid.set(3, 4, Tile::Filled);
        let perimeter = Perimeter::compute(&grid);
        assert!(perimeter.can_step_between(&grid, a, b));
    }

    #[test]
    fn test_step_validity_by_distance() {
        let grid = Grid::new(6, 6).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let origin = Position::new(0, 2);

        assert!(perimeter.can_step_between(&grid, origin, Position::new(0, 3)));
        assert!(perimeter.can_step_between(&grid, origin, Position::new(1, 2)));
        assert!(!perimeter.can_step_between(&grid, origin, Position::new(0, 4)));
        assert!(!perimeter.can_step_between(&grid, origin, origin));
    }

    #[test]
    fn test_nearest_prefers_row_major_on_ties() {
        let grid = Grid::new(7, 7).unwrap();
        let perimeter = Perimeter::compute(&grid);
        // Centre is 3 away from four border midpoints; the top one wins
        assert_eq!(perimeter.nearest(Position::new(3, 3)), Some(Position::new(3, 0)));
        let index = perimeter.nearest_index(Position::new(6, 5)).unwrap();
        assert_eq!(perimeter.ordered()[index], Position::new(6, 5));
        assert_eq!(perimeter.index_of(Position::new(6, 5)), Some(index));
    }

    proptest! {
        #[test]
        fn prop_perimeter_sound_and_complete(
            width in 3i32..18,
            height in 3i32..18,
            fills in prop::collection::vec((1i32..17, 1i32..17), 0..60),
        ) {
            let mut grid = Grid::new(width, height).unwrap();
            for (x, y) in fills {
                if grid.get(y, x) == Tile::Empty {
                    grid.set(y, x, Tile::Filled);
                }
            }
            let perimeter = Perimeter::compute(&grid);

            for pos in grid.positions() {
                let tile = grid.at(pos);
                let touches_empty = (-1..=1).any(|dy| (-1..=1).any(|dx| {
                    (dx, dy) != (0, 0) && {
                        let n = pos.offset(dx, dy);
                        grid.in_bounds(n) && grid.at(n) == Tile::Empty
                    }
                }));
                let expected = tile != Tile::Empty && touches_empty;
                prop_assert_eq!(perimeter.contains(pos), expected, "mismatch at {:?}", pos);
            }

            let ordered = perimeter.ordered();
            let unique: HashSet<Position> = ordered.iter().copied().collect();
            prop_assert_eq!(ordered.len(), perimeter.len());
            prop_assert_eq!(&unique, perimeter.tiles());
        }
    }
}
