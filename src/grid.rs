use std::cell::Cell;
use std::collections::HashSet;

use crate::entity::Position;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Border,
    Filled,
    Trail,
}

impl Tile {
    /// Border and Filled tiles are safe ground and block flood fill.
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Border | Tile::Filled)
    }
}

/// Rectangular tile grid with a one-tile `Border` frame.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Vec<Tile>>,
    fill_cache: Cell<Option<f32>>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Result<Self, ConfigError> {
        if width <= 0 || height <= 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }

        let mut tiles = vec![vec![Tile::Empty; width as usize]; height as usize];

        // Stamp the border frame
        for x in 0..width as usize {
            tiles[0][x] = Tile::Border;
            tiles[(height - 1) as usize][x] = Tile::Border;
        }
        for row in tiles.iter_mut() {
            row[0] = Tile::Border;
            row[(width - 1) as usize] = Tile::Border;
        }

        Ok(Self {
            width,
            height,
            tiles,
            fill_cache: Cell::new(None),
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Tile at row `y`, column `x`. Anything off the grid reads as `Border`.
    pub fn get(&self, y: i32, x: i32) -> Tile {
        self.at(Position::new(x, y))
    }

    pub fn at(&self, pos: Position) -> Tile {
        if !self.in_bounds(pos) {
            return Tile::Border;
        }
        self.tiles[pos.y as usize][pos.x as usize]
    }

    /// Overwrites a tile; out-of-bounds writes are ignored.
    pub fn set(&mut self, y: i32, x: i32, tile: Tile) {
        self.put(Position::new(x, y), tile);
    }

    pub fn put(&mut self, pos: Position, tile: Tile) {
        if !self.in_bounds(pos) {
            return;
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        self.fill_cache.set(None);
    }

    /// Share of non-border tiles that are `Filled`, in `[0, 1]`.
    ///
    /// Memoized; any `set` invalidates the cached value.
    pub fn fill_percentage(&self) -> f32 {
        if let Some(cached) = self.fill_cache.get() {
            return cached;
        }

        let mut total = 0usize;
        let mut filled = 0usize;
        for tile in self.tiles.iter().flatten() {
            if *tile != Tile::Border {
                total += 1;
                if *tile == Tile::Filled {
                    filled += 1;
                }
            }
        }

        let percentage = if total == 0 {
            0.0
        } else {
            filled as f32 / total as f32
        };
        self.fill_cache.set(Some(percentage));
        percentage
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().flatten().filter(|t| **t == tile).count()
    }

    /// Every position on the grid, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    /// Multi-source 4-directional fill over tiles that are neither `Filled`
    /// nor `Border`. Seeds that are solid or off the grid contribute nothing.
    pub fn flood_fill<I>(&self, seeds: I) -> HashSet<Position>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for seed in seeds {
            if self.in_bounds(seed) && !self.at(seed).is_solid() && visited.insert(seed) {
                stack.push(seed);
            }
        }

        while let Some(pos) = stack.pop() {
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = pos.offset(dx, dy);
                if !self.in_bounds(next) || self.at(next).is_solid() {
                    continue;
                }
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }

        visited
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.tiles == other.tiles
    }
}

impl Eq for Grid {}
