use tracing::{debug, trace};

use crate::entity::{Direction, Player, Position};
use crate::grid::{Grid, Tile};
use crate::perimeter::Perimeter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// The player stepped back onto their own trail.
    SelfIntersection,
    /// The player stepped onto a Qix while drawing.
    QixContact,
    /// A Qix moved onto the live trail.
    QixHitTrail,
    /// A Sparx reached the tile the trail started from.
    SparxSeveredTrail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The movement throttle has not elapsed yet.
    Throttled,
    NoIntent,
    /// Illegal step; nothing changed.
    Rejected,
    /// Moved along safe ground.
    Moved,
    StartedTrail,
    Extended,
    /// The trail reconnected with safe ground. The tiles are still `Trail`
    /// on the grid and must be handed to the capture resolver.
    Closed(Vec<Position>),
    Died(DeathCause),
}

/// Owns the player and validates each step against the grid and perimeter.
#[derive(Debug, Clone)]
pub struct TrailController {
    player: Player,
    speed: u32,
}

impl TrailController {
    pub fn new(player: Player, speed: u32) -> Self {
        Self {
            player,
            speed: speed.max(1),
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn is_drawing(&self) -> bool {
        self.player.is_drawing
    }

    pub fn trail_contains(&self, pos: Position) -> bool {
        self.player.is_drawing && self.player.trail.contains(&pos)
    }

    pub fn attempt_move(
        &mut self,
        grid: &mut Grid,
        perimeter: &Perimeter,
        qixes: &[Position],
        intent: Option<Direction>,
        draw_held: bool,
    ) -> MoveOutcome {
        self.player.move_timer += 1;
        if self.player.move_timer < self.speed {
            return MoveOutcome::Throttled;
        }
        self.player.move_timer = 0;

        let Some(direction) = intent else {
            return MoveOutcome::NoIntent;
        };

        let current = self.player.position;
        let next = current.moved(direction);
        if !grid.in_bounds(next) {
            return MoveOutcome::Rejected;
        }

        let current_tile = grid.at(current);
        let next_tile = grid.at(next);

        if current_tile.is_solid()
            && next_tile.is_solid()
            && !perimeter.can_step_between(grid, current, next)
        {
            return MoveOutcome::Rejected;
        }

        let allowed = perimeter.contains(next)
            || (draw_held && next_tile == Tile::Empty)
            || (self.player.is_drawing && next_tile == Tile::Trail);
        if !allowed {
            return MoveOutcome::Rejected;
        }

        let mut outcome = MoveOutcome::Moved;
        if !self.player.is_drawing && next_tile == Tile::Empty {
            // Trails can only leave from safe ground
            if !current_tile.is_solid() {
                return MoveOutcome::Rejected;
            }
            self.player.start_trail();
            outcome = MoveOutcome::StartedTrail;
        }

        if self.player.is_drawing && qixes.contains(&next) {
            self.die(grid, DeathCause::QixContact);
            return MoveOutcome::Died(DeathCause::QixContact);
        }

        self.player.position = next;
        trace!(x = next.x, y = next.y, drawing = self.player.is_drawing, "player moved");

        if !self.player.is_drawing {
            return outcome;
        }

        match next_tile {
            Tile::Trail => {
                self.die(grid, DeathCause::SelfIntersection);
                MoveOutcome::Died(DeathCause::SelfIntersection)
            }
            Tile::Empty => {
                grid.put(next, Tile::Trail);
                self.player.add_to_trail();
                if outcome == MoveOutcome::Moved {
                    outcome = MoveOutcome::Extended;
                }
                outcome
            }
            Tile::Border | Tile::Filled => {
                let trail = std::mem::take(&mut self.player.trail);
                self.player.clear_trail();
                debug!(length = trail.len(), "trail closed");
                MoveOutcome::Closed(trail)
            }
        }
    }

    /// The one recovery path for every fatal event: lose a life, erase the
    /// trail and respawn on the tile the trail started from.
    pub fn die(&mut self, grid: &mut Grid, cause: DeathCause) {
        self.player.lives = self.player.lives.saturating_sub(1);

        for pos in &self.player.trail {
            if grid.at(*pos) == Tile::Trail {
                grid.put(*pos, Tile::Empty);
            }
        }
        if let Some(origin) = self.player.trail_origin {
            self.player.position = origin;
        }
        self.player.clear_trail();
        self.player.move_timer = 0;

        debug!(?cause, lives = self.player.lives, "player died");
    }

    /// Sparx contact costs a life without touching the trail.
    pub fn lose_life(&mut self) {
        self.player.lives = self.player.lives.saturating_sub(1);
        debug!(lives = self.player.lives, "player hit by sparx");
    }

    /// Moves the player onto the nearest perimeter tile if a capture left
    /// them stranded. Returns the new position when a move happened.
    pub fn snap_to_perimeter(&mut self, perimeter: &Perimeter) -> Option<Position> {
        if perimeter.contains(self.player.position) {
            return None;
        }
        let nearest = perimeter.nearest(self.player.position)?;
        debug!(from = ?self.player.position, to = ?nearest, "player snapped to perimeter");
        self.player.position = nearest;
        Some(nearest)
    }
}
