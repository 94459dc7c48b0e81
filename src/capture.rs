use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::entity::Position;
use crate::grid::{Grid, Tile};
use crate::perimeter::{Perimeter, ORTHOGONAL_STEPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Nothing to commit.
    Empty,
    /// Trail too short to count; its tiles went back to `Empty`.
    Discarded,
    /// Trail committed. `filled` counts every newly `Filled` tile, trail included.
    Committed { filled: usize },
}

impl CaptureOutcome {
    /// Whether the grid's solid layout changed and the perimeter is stale.
    pub fn changed_territory(&self) -> bool {
        matches!(self, CaptureOutcome::Committed { .. })
    }

    pub fn filled(&self) -> usize {
        match self {
            CaptureOutcome::Committed { filled } => *filled,
            _ => 0,
        }
    }
}

/// Commits a closed trail and fills whatever it cut off from the Qix.
///
/// `perimeter` must be the snapshot the trail was drawn against and
/// `references` the Qix positions. Every region of open space that holds no
/// reference is filled. A lone remaining region is never filled, even
/// without a reference in it.
pub fn resolve(
    grid: &mut Grid,
    perimeter: &Perimeter,
    trail: &[Position],
    references: &[Position],
) -> CaptureOutcome {
    if trail.is_empty() {
        return CaptureOutcome::Empty;
    }

    if trail.len() <= 2 && anchor_count(perimeter, trail) < 2 {
        for pos in trail {
            if grid.at(*pos) == Tile::Trail {
                grid.put(*pos, Tile::Empty);
            }
        }
        debug!(length = trail.len(), "discarded degenerate trail");
        return CaptureOutcome::Discarded;
    }

    for pos in trail {
        grid.put(*pos, Tile::Filled);
    }

    let regions = empty_regions(grid);
    let mut filled = trail.len();

    if regions.len() > 1 {
        let mut open = grid.flood_fill(references.iter().copied());
        if open.is_empty() {
            // No Qix in open space (one was standing on the trail): keep the largest region
            if let Some(largest) = regions.iter().max_by_key(|region| region.len()) {
                open = largest.clone();
            }
        }

        for region in &regions {
            if region.iter().any(|pos| open.contains(pos)) {
                continue;
            }
            for pos in region {
                grid.put(*pos, Tile::Filled);
            }
            filled += region.len();
        }
    }

    debug!(
        trail = trail.len(),
        filled,
        regions = regions.len(),
        fill = grid.fill_percentage(),
        "capture committed"
    );
    CaptureOutcome::Committed { filled }
}

/// Distinct perimeter tiles orthogonally next to the trail.
fn anchor_count(perimeter: &Perimeter, trail: &[Position]) -> usize {
    let anchors: HashSet<Position> = trail
        .iter()
        .flat_map(|pos| ORTHOGONAL_STEPS.iter().map(move |&(dx, dy)| pos.offset(dx, dy)))
        .filter(|pos| !trail.contains(pos) && perimeter.contains(*pos))
        .collect();
    anchors.len()
}

/// Connected regions of open space, discovered in row-major seed order.
fn empty_regions(grid: &Grid) -> Vec<HashSet<Position>> {
    let mut remaining: BTreeSet<Position> = grid
        .positions()
        .filter(|pos| grid.at(*pos) == Tile::Empty)
        .collect();
    let mut regions = Vec::new();

    while let Some(seed) = remaining.pop_first() {
        let region = grid.flood_fill([seed]);
        for pos in &region {
            remaining.remove(pos);
        }
        regions.push(region);
    }

    regions
}
