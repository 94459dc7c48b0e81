use rand::Rng;
use tracing::{debug, warn};

use crate::config::{GameConfig, SparxMovement};
use crate::entity::Position;
use crate::grid::{Grid, Tile};
use crate::perimeter::{Perimeter, DIAGONAL_STEPS, ORTHOGONAL_STEPS};
use crate::trail::{DeathCause, TrailController};

pub trait Enemy {
    fn position(&self) -> Position;
    fn relocate(&mut self, to: Position);
}

/// Roams open space, bouncing off walls. Touching the trail kills.
#[derive(Debug, Clone)]
pub struct Qix {
    pub position: Position,
    pub velocity: (i32, i32),
    pub move_timer: u32,
}

impl Qix {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            position: Position::new(x, y),
            velocity: (1, 1),
            move_timer: 0,
        }
    }

    pub fn step<R: Rng>(&mut self, grid: &Grid, turn_chance: f64, rng: &mut R) {
        if rng.gen::<f64>() < turn_chance {
            if rng.gen_bool(0.5) {
                self.velocity.1 = -self.velocity.1;
            }
            if rng.gen_bool(0.5) {
                self.velocity.0 = -self.velocity.0;
            }
        }

        let pos = self.position;
        let mut next = pos.offset(self.velocity.0, self.velocity.1);
        let tile = grid.at(next);

        if tile.is_solid() {
            if tile == Tile::Border {
                // Border (or off the grid): straight bounce back
                self.velocity = (-self.velocity.0, -self.velocity.1);
            } else {
                // Filled: slide along whichever axis is still open
                let blocked_y = grid.at(Position::new(pos.x, next.y)).is_solid();
                let blocked_x = grid.at(Position::new(next.x, pos.y)).is_solid();
                if blocked_y {
                    self.velocity.1 = -self.velocity.1;
                }
                if blocked_x {
                    self.velocity.0 = -self.velocity.0;
                }
                if !blocked_x && !blocked_y {
                    // Clipped a lone corner
                    self.velocity = (-self.velocity.0, -self.velocity.1);
                }
            }
            next = pos.offset(self.velocity.0, self.velocity.1);
        }

        if matches!(grid.at(next), Tile::Empty | Tile::Trail) {
            self.position = next;
        }
    }

    pub fn randomize_heading<R: Rng>(&mut self, rng: &mut R) {
        self.velocity = (
            if rng.gen_bool(0.5) { 1 } else { -1 },
            if rng.gen_bool(0.5) { 1 } else { -1 },
        );
    }
}

impl Enemy for Qix {
    fn position(&self) -> Position {
        self.position
    }

    fn relocate(&mut self, to: Position) {
        self.position = to;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Clockwise,
    CounterClockwise,
}

impl Bias {
    pub fn reversed(self) -> Bias {
        match self {
            Bias::Clockwise => Bias::CounterClockwise,
            Bias::CounterClockwise => Bias::Clockwise,
        }
    }

    /// Index step along the ordered perimeter.
    fn index_step(self) -> isize {
        match self {
            Bias::Clockwise => 1,
            Bias::CounterClockwise => -1,
        }
    }

    fn preference(self, step: (i32, i32)) -> i32 {
        // Clockwise: right > down > left > up. Counter-clockwise mirrors it.
        match (self, step) {
            (Bias::Clockwise, (1, 0)) | (Bias::CounterClockwise, (-1, 0)) => 40,
            (Bias::Clockwise, (0, 1)) | (Bias::CounterClockwise, (0, -1)) => 30,
            (Bias::Clockwise, (-1, 0)) | (Bias::CounterClockwise, (1, 0)) => 20,
            (Bias::Clockwise, (0, -1)) | (Bias::CounterClockwise, (0, 1)) => 10,
            _ => 0,
        }
    }
}

const BACKTRACK_PENALTY: i32 = 100;
const MOMENTUM_BONUS: i32 = 50;

/// Patrols the perimeter.
#[derive(Debug, Clone)]
pub struct Sparx {
    pub position: Position,
    pub bias: Bias,
    /// Moves left before this Sparx can hit the player again.
    pub cooldown: u32,
    pub last_position: Position,
    /// Slot in the ordered perimeter, used by [`SparxMovement::Patrol`].
    pub index: usize,
    pub move_timer: u32,
}

impl Sparx {
    pub fn new(position: Position, bias: Bias, cooldown: u32) -> Self {
        Self {
            position,
            bias,
            cooldown,
            last_position: position,
            index: 0,
            move_timer: 0,
        }
    }

    /// Picks the best-scoring orthogonal perimeter neighbour, falling back
    /// to the first legal diagonal one.
    pub fn steer(&self, grid: &Grid, perimeter: &Perimeter) -> Option<Position> {
        let from = self.position;
        let last = (
            from.x - self.last_position.x,
            from.y - self.last_position.y,
        );

        let mut best: Option<(i32, Position)> = None;
        for step in ORTHOGONAL_STEPS {
            let to = from.offset(step.0, step.1);
            if !perimeter.contains(to) || !perimeter.can_step_between(grid, from, to) {
                continue;
            }

            let mut score = self.bias.preference(step);
            if step == (-last.0, -last.1) {
                score -= BACKTRACK_PENALTY;
            }
            if step == last {
                score += MOMENTUM_BONUS;
            }

            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, to));
            }
        }

        if let Some((_, to)) = best {
            return Some(to);
        }

        DIAGONAL_STEPS
            .iter()
            .map(|&(dx, dy)| from.offset(dx, dy))
            .find(|to| perimeter.contains(*to) && perimeter.can_step_between(grid, from, *to))
    }

    /// Next slot along the ordered perimeter in the bias direction.
    pub fn patrol(&mut self, perimeter: &Perimeter) -> Option<Position> {
        let ordered = perimeter.ordered();
        if ordered.is_empty() {
            return None;
        }
        let len = ordered.len() as isize;
        let index = (self.index as isize + self.bias.index_step()).rem_euclid(len) as usize;
        self.index = index;
        Some(ordered[index])
    }
}

impl Enemy for Sparx {
    fn position(&self) -> Position {
        self.position
    }

    fn relocate(&mut self, to: Position) {
        self.position = to;
        self.last_position = to;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySettings {
    pub qix_speed: u32,
    pub sparx_speed: u32,
    pub sparx_cooldown: u32,
    pub qix_turn_chance: f64,
    pub movement: SparxMovement,
}

impl From<&GameConfig> for EnemySettings {
    fn from(config: &GameConfig) -> Self {
        Self {
            qix_speed: config.qix_speed.max(1),
            sparx_speed: config.sparx_speed.max(1),
            sparx_cooldown: config.sparx_cooldown,
            qix_turn_chance: config.qix_turn_chance,
            movement: config.sparx_movement,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparxEvent {
    /// Cooldown-gated contact: one life lost.
    Hit { sparx: usize },
    /// Reached the trail origin while the player was drawing.
    SeveredTrail { sparx: usize },
}

#[derive(Debug, Clone)]
pub struct EnemyController {
    qixes: Vec<Qix>,
    sparxes: Vec<Sparx>,
    settings: EnemySettings,
}

impl EnemyController {
    pub fn new(qixes: Vec<Qix>, sparxes: Vec<Sparx>, settings: EnemySettings) -> Self {
        Self {
            qixes,
            sparxes,
            settings,
        }
    }

    pub fn qixes(&self) -> &[Qix] {
        &self.qixes
    }

    pub fn sparxes(&self) -> &[Sparx] {
        &self.sparxes
    }

    pub fn settings(&self) -> &EnemySettings {
        &self.settings
    }

    pub fn qix_positions(&self) -> Vec<Position> {
        self.qixes.iter().map(|q| q.position).collect()
    }

    /// Moves every Qix whose throttle elapsed. The first Qix to land on the
    /// live trail kills the player; the trail is gone after that.
    pub fn move_qixes<R: Rng>(
        &mut self,
        grid: &mut Grid,
        player: &mut TrailController,
        rng: &mut R,
    ) -> Option<DeathCause> {
        let mut death = None;

        for qix in self.qixes.iter_mut() {
            qix.move_timer += 1;
            if qix.move_timer < self.settings.qix_speed {
                continue;
            }
            qix.move_timer = 0;

            qix.step(grid, self.settings.qix_turn_chance, rng);

            if death.is_none() && player.trail_contains(qix.position) {
                player.die(grid, DeathCause::QixHitTrail);
                death = Some(DeathCause::QixHitTrail);
            }
        }

        death
    }

    pub fn move_sparxes(
        &mut self,
        grid: &mut Grid,
        perimeter: &Perimeter,
        player: &mut TrailController,
    ) -> Vec<SparxEvent> {
        let settings = self.settings;
        let mut events = Vec::new();

        for (i, sparx) in self.sparxes.iter_mut().enumerate() {
            sparx.move_timer += 1;
            if sparx.move_timer < settings.sparx_speed {
                continue;
            }
            sparx.move_timer = 0;

            if perimeter.is_empty() {
                continue;
            }
            if sparx.cooldown > 0 {
                sparx.cooldown -= 1;
            }

            let old = sparx.position;
            let next = match settings.movement {
                SparxMovement::Steering => sparx.steer(grid, perimeter),
                SparxMovement::Patrol => sparx.patrol(perimeter),
            };
            if let Some(next) = next {
                sparx.last_position = old;
                sparx.position = next;
            }

            if sparx.cooldown == 0 {
                let target = player.player().position;
                if target == sparx.position || target == old || crossed(old, sparx.position, target) {
                    player.lose_life();
                    sparx.bias = sparx.bias.reversed();
                    sparx.cooldown = settings.sparx_cooldown;
                    events.push(SparxEvent::Hit { sparx: i });
                    continue;
                }
            }

            if player.is_drawing() && player.player().trail_origin == Some(sparx.position) {
                player.die(grid, DeathCause::SparxSeveredTrail);
                events.push(SparxEvent::SeveredTrail { sparx: i });
                // The player respawns on this tile; no other Sparx acts this tick
                break;
            }
        }

        events
    }

    /// Puts every enemy a capture left on an invalid tile back on the
    /// nearest valid one. With nothing valid to move to, the enemy stays put.
    pub fn remap<R: Rng>(&mut self, grid: &Grid, perimeter: &Perimeter, rng: &mut R) {
        let empty: Vec<Position> = grid
            .positions()
            .filter(|pos| grid.at(*pos) == Tile::Empty)
            .collect();

        let moved = relocate_stranded(
            &mut self.qixes,
            |pos| matches!(grid.at(pos), Tile::Empty | Tile::Trail),
            |pos| empty.iter().copied().min_by_key(|e| e.manhattan(pos)),
        );
        for i in moved {
            self.qixes[i].randomize_heading(rng);
        }

        if perimeter.is_empty() {
            warn!("perimeter is empty, sparx left in place");
            return;
        }

        relocate_stranded(
            &mut self.sparxes,
            |pos| perimeter.contains(pos),
            |pos| perimeter.nearest(pos),
        );
        for sparx in self.sparxes.iter_mut() {
            if let Some(index) = perimeter.index_of(sparx.position) {
                sparx.index = index;
            }
        }
    }
}

/// Relocates each enemy failing `is_valid` to `nearest(position)`.
/// Returns the indices that moved.
fn relocate_stranded<E: Enemy>(
    enemies: &mut [E],
    is_valid: impl Fn(Position) -> bool,
    nearest: impl Fn(Position) -> Option<Position>,
) -> Vec<usize> {
    let mut moved = Vec::new();

    for (i, enemy) in enemies.iter_mut().enumerate() {
        let from = enemy.position();
        if is_valid(from) {
            continue;
        }
        match nearest(from) {
            Some(to) => {
                debug!(?from, ?to, "enemy relocated");
                enemy.relocate(to);
                moved.push(i);
            }
            None => warn!(?from, "no valid tile to relocate enemy to"),
        }
    }

    moved
}

/// True when `target` lies strictly between `from` and `to` on a shared row or column.
fn crossed(from: Position, to: Position, target: Position) -> bool {
    let between = |a: i32, b: i32, v: i32| (a < v && v < b) || (b < v && v < a);

    if from.y == to.y && to.y == target.y {
        return between(from.x, to.x, target.x);
    }
    if from.x == to.x && to.x == target.x {
        return between(from.y, to.y, target.y);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Direction, Player};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(movement: SparxMovement) -> EnemySettings {
        EnemySettings {
            qix_speed: 1,
            sparx_speed: 1,
            sparx_cooldown: 3,
            qix_turn_chance: 0.0,
            movement,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn fill_column(grid: &mut Grid, x: i32) {
        for y in 1..grid.height() - 1 {
            grid.set(y, x, Tile::Filled);
        }
    }

    #[test]
    fn test_qix_bounces_off_border() {
        let grid = Grid::new(10, 10).unwrap();
        let mut qix = Qix::new(1, 1);
        qix.velocity = (-1, -1);
        qix.step(&grid, 0.0, &mut rng());
        assert_eq!(qix.velocity, (1, 1));
        assert_eq!(qix.position, Position::new(2, 2));
    }

    #[test]
    fn test_qix_slides_along_filled_wall() {
        let mut grid = Grid::new(10, 10).unwrap();
        fill_column(&mut grid, 5);
        let mut qix = Qix::new(4, 3);
        qix.step(&grid, 0.0, &mut rng());
        assert_eq!(qix.velocity, (-1, 1));
        assert_eq!(qix.position, Position::new(3, 4));
    }

    #[test]
    fn test_qix_bounces_off_lone_corner() {
        let mut grid = Grid::new(10, 10).unwrap();
        grid.set(4, 5, Tile::Filled);
        let mut qix = Qix::new(4, 3);
        qix.step(&grid, 0.0, &mut rng());
        assert_eq!(qix.velocity, (-1, -1));
        assert_eq!(qix.position, Position::new(3, 2));
    }

    #[test]
    fn test_qix_on_trail_kills_once() {
        let mut grid = Grid::new(12, 12).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut player = TrailController::new(Player::new(6, 0, 5), 1);
        for _ in 0..3 {
            player.attempt_move(&mut grid, &perimeter, &[], Some(Direction::Down), true);
        }
        assert!(player.trail_contains(Position::new(6, 2)));

        // Both Qix step onto the trail this tick
        let mut first = Qix::new(5, 1);
        first.velocity = (1, 1);
        let mut second = Qix::new(7, 2);
        second.velocity = (-1, 1);
        let mut enemies = EnemyController::new(vec![first, second], vec![], settings(SparxMovement::Steering));

        let death = enemies.move_qixes(&mut grid, &mut player, &mut rng());
        assert_eq!(death, Some(DeathCause::QixHitTrail));
        assert_eq!(player.player().lives, 4);
        assert_eq!(player.player().position, Position::new(6, 0));
        assert_eq!(grid.count(Tile::Trail), 0);
    }

    #[test]
    fn test_sparx_never_backtracks_when_alternative_exists() {
        let grid = Grid::new(10, 10).unwrap();
        let perimeter = Perimeter::compute(&grid);

        // Came leftwards along the top border; clockwise bias favours right
        let mut sparx = Sparx::new(Position::new(5, 0), Bias::Clockwise, 0);
        sparx.last_position = Position::new(6, 0);
        assert_eq!(sparx.steer(&grid, &perimeter), Some(Position::new(4, 0)));
    }

    #[test]
    fn test_sparx_turns_corners_following_bias() {
        let grid = Grid::new(6, 6).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut sparx = Sparx::new(Position::new(2, 0), Bias::Clockwise, 0);

        let mut visited = vec![sparx.position];
        for _ in 0..20 {
            let next = sparx.steer(&grid, &perimeter).unwrap();
            sparx.last_position = sparx.position;
            sparx.position = next;
            visited.push(next);
        }
        // Full clockwise lap of the 20-tile border
        assert_eq!(visited[20], Position::new(2, 0));
        assert_eq!(visited[3], Position::new(5, 0));
        assert_eq!(visited[4], Position::new(5, 1));
    }

    #[test]
    fn test_sparx_diagonal_gap_blocked() {
        let mut grid = Grid::new(9, 9).unwrap();
        grid.set(3, 3, Tile::Filled);
        grid.set(4, 4, Tile::Filled);
        let tiles = [Position::new(3, 3), Position::new(4, 4)].into_iter().collect();
        let perimeter = Perimeter::from_tiles(tiles);

        let sparx = Sparx::new(Position::new(3, 3), Bias::Clockwise, 0);
        assert_eq!(sparx.steer(&grid, &perimeter), None);
    }

    #[test]
    fn test_sparx_hit_costs_life_and_reverses() {
        let mut grid = Grid::new(10, 10).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut player = TrailController::new(Player::new(4, 0, 3), 1);

        let mut sparx = Sparx::new(Position::new(5, 0), Bias::CounterClockwise, 0);
        sparx.last_position = Position::new(6, 0);
        let mut enemies = EnemyController::new(vec![], vec![sparx], settings(SparxMovement::Steering));

        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert_eq!(events, vec![SparxEvent::Hit { sparx: 0 }]);
        assert_eq!(player.player().lives, 2);
        assert_eq!(enemies.sparxes()[0].bias, Bias::Clockwise);
        assert_eq!(enemies.sparxes()[0].cooldown, 3);

        // Cooldown suppresses the next contact
        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert!(events.is_empty());
        assert_eq!(player.player().lives, 2);
    }

    #[test]
    fn test_sparx_reaching_trail_origin_is_fatal() {
        let mut grid = Grid::new(10, 10).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut player = TrailController::new(Player::new(4, 0, 3), 1);
        player.attempt_move(&mut grid, &perimeter, &[], Some(Direction::Down), true);
        player.attempt_move(&mut grid, &perimeter, &[], Some(Direction::Down), true);

        // Still cooling down, so only the origin check applies
        let mut sparx = Sparx::new(Position::new(5, 0), Bias::CounterClockwise, 5);
        sparx.last_position = Position::new(6, 0);
        let mut enemies = EnemyController::new(vec![], vec![sparx], settings(SparxMovement::Steering));

        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert_eq!(events, vec![SparxEvent::SeveredTrail { sparx: 0 }]);
        assert_eq!(player.player().lives, 2);
        assert!(!player.is_drawing());
        assert_eq!(grid.count(Tile::Trail), 0);
        assert_eq!(player.player().position, Position::new(4, 0));
    }

    #[test]
    fn test_severed_trail_ends_sparx_turn() {
        let mut grid = Grid::new(10, 10).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut player = TrailController::new(Player::new(4, 0, 5), 1);
        player.attempt_move(&mut grid, &perimeter, &[], Some(Direction::Down), true);
        player.attempt_move(&mut grid, &perimeter, &[], Some(Direction::Down), true);

        // Both Sparx head for the origin (4, 0) this tick; the second is armed
        let mut first = Sparx::new(Position::new(5, 0), Bias::CounterClockwise, 5);
        first.last_position = Position::new(6, 0);
        let mut second = Sparx::new(Position::new(3, 0), Bias::Clockwise, 0);
        second.last_position = Position::new(2, 0);
        let mut enemies =
            EnemyController::new(vec![], vec![first, second], settings(SparxMovement::Steering));

        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert_eq!(events, vec![SparxEvent::SeveredTrail { sparx: 0 }]);
        assert_eq!(player.player().lives, 4);
        assert_eq!(player.player().position, Position::new(4, 0));
        assert_eq!(enemies.sparxes()[1].position, Position::new(3, 0));
    }

    #[test]
    fn test_patrol_jump_over_player_hits() {
        let mut grid = Grid::new(10, 10).unwrap();
        // Two separate stretches of perimeter on the top row
        let tiles = [(0, 0), (1, 0), (5, 0), (6, 0)]
            .into_iter()
            .map(|(x, y)| Position::new(x, y))
            .collect();
        let perimeter = Perimeter::from_tiles(tiles);
        assert_eq!(
            perimeter.ordered(),
            &[
                Position::new(0, 0),
                Position::new(1, 0),
                Position::new(5, 0),
                Position::new(6, 0),
            ]
        );

        let mut player = TrailController::new(Player::new(3, 0, 3), 1);
        let mut sparx = Sparx::new(Position::new(1, 0), Bias::Clockwise, 0);
        sparx.index = 1;
        let mut enemies = EnemyController::new(vec![], vec![sparx], settings(SparxMovement::Patrol));

        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert_eq!(events, vec![SparxEvent::Hit { sparx: 0 }]);
        assert_eq!(player.player().lives, 2);
        let sparx = &enemies.sparxes()[0];
        assert_eq!(sparx.position, Position::new(5, 0));
        assert_eq!(sparx.bias, Bias::CounterClockwise);
    }

    #[test]
    fn test_patrol_leaving_player_tile_hits() {
        let mut grid = Grid::new(8, 6).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let mut player = TrailController::new(Player::new(5, 0, 3), 1);

        let mut sparx = Sparx::new(Position::new(5, 0), Bias::Clockwise, 0);
        sparx.index = perimeter.index_of(Position::new(5, 0)).unwrap();
        let mut enemies = EnemyController::new(vec![], vec![sparx], settings(SparxMovement::Patrol));

        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert_eq!(events, vec![SparxEvent::Hit { sparx: 0 }]);
        assert_eq!(enemies.sparxes()[0].position, Position::new(6, 0));
        assert_eq!(player.player().lives, 2);
    }

    #[test]
    fn test_crossed_detects_jump_over() {
        let from = Position::new(2, 0);
        let to = Position::new(6, 0);
        assert!(crossed(from, to, Position::new(4, 0)));
        assert!(crossed(to, from, Position::new(3, 0)));
        assert!(!crossed(from, to, Position::new(6, 0)));
        assert!(!crossed(from, to, Position::new(4, 1)));
        assert!(crossed(Position::new(0, 1), Position::new(0, 5), Position::new(0, 2)));
    }

    #[test]
    fn test_patrol_walks_ordered_perimeter() {
        let grid = Grid::new(6, 5).unwrap();
        let perimeter = Perimeter::compute(&grid);
        let len = perimeter.ordered().len();

        let mut sparx = Sparx::new(perimeter.ordered()[0], Bias::CounterClockwise, 0);
        assert_eq!(sparx.patrol(&perimeter), Some(perimeter.ordered()[len - 1]));
        sparx.bias = Bias::Clockwise;
        assert_eq!(sparx.patrol(&perimeter), Some(perimeter.ordered()[0]));
        assert_eq!(sparx.patrol(&perimeter), Some(perimeter.ordered()[1]));
    }

    #[test]
    fn test_remap_moves_stranded_enemies() {
        let mut grid = Grid::new(12, 10).unwrap();
        let qix = Qix::new(2, 4);
        let mut sparx = Sparx::new(Position::new(0, 4), Bias::Clockwise, 0);
        sparx.index = 99;

        // Capture the left columns: both enemies now stand in solid ground
        for x in 1..=4 {
            fill_column(&mut grid, x);
        }
        let perimeter = Perimeter::compute(&grid);
        let mut enemies =
            EnemyController::new(vec![qix], vec![sparx], settings(SparxMovement::Patrol));
        enemies.remap(&grid, &perimeter, &mut rng());

        assert_eq!(enemies.qixes()[0].position, Position::new(5, 4));
        let sparx = &enemies.sparxes()[0];
        assert_eq!(sparx.position, Position::new(4, 4));
        assert_eq!(perimeter.ordered()[sparx.index], sparx.position);
    }

    #[test]
    fn test_remap_with_no_valid_tiles_leaves_enemies() {
        let mut grid = Grid::new(6, 6).unwrap();
        for x in 1..=4 {
            fill_column(&mut grid, x);
        }
        let perimeter = Perimeter::compute(&grid);
        assert!(perimeter.is_empty());

        let mut enemies = EnemyController::new(
            vec![Qix::new(2, 2)],
            vec![Sparx::new(Position::new(0, 2), Bias::Clockwise, 0)],
            settings(SparxMovement::Steering),
        );
        enemies.remap(&grid, &perimeter, &mut rng());
        assert_eq!(enemies.qixes()[0].position, Position::new(2, 2));
        assert_eq!(enemies.sparxes()[0].position, Position::new(0, 2));

        let mut player = TrailController::new(Player::new(0, 0, 3), 1);
        let events = enemies.move_sparxes(&mut grid, &perimeter, &mut player);
        assert!(events.is_empty());
    }

    proptest! {
        #[test]
        fn prop_qix_never_enters_solid_ground(
            fills in prop::collection::vec((1i32..19, 1i32..14), 0..40),
            seed in any::<u64>(),
            steps in 1usize..300,
        ) {
            let mut grid = Grid::new(20, 15).unwrap();
            for (x, y) in fills {
                if (x, y) != (10, 7) {
                    grid.set(y, x, Tile::Filled);
                }
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let mut qix = Qix::new(10, 7);

            for _ in 0..steps {
                qix.step(&grid, 0.3, &mut rng);
                let tile = grid.at(qix.position);
                prop_assert!(
                    tile == Tile::Empty,
                    "Qix entered {:?} at {:?}",
                    tile,
                    qix.position
                );
            }
        }

        #[test]
        fn prop_sparx_backtracks_only_at_dead_ends(
            fills in prop::collection::vec((1i32..15, 1i32..11), 0..30),
            start in 0usize..400,
            bias in prop_oneof![Just(Bias::Clockwise), Just(Bias::CounterClockwise)],
        ) {
            let mut grid = Grid::new(16, 12).unwrap();
            for (x, y) in fills {
                grid.set(y, x, Tile::Filled);
            }
            let perimeter = Perimeter::compute(&grid);
            prop_assume!(!perimeter.is_empty());

            let from = perimeter.ordered()[start % perimeter.len()];
            let legal: Vec<Position> = ORTHOGONAL_STEPS
                .iter()
                .map(|&(dx, dy)| from.offset(dx, dy))
                .filter(|to| perimeter.contains(*to))
                .collect();

            for previous in &legal {
                let mut sparx = Sparx::new(from, bias, 0);
                sparx.last_position = *previous;
                let chosen = sparx.steer(&grid, &perimeter);
                if legal.len() > 1 {
                    prop_assert_ne!(chosen, Some(*previous));
                }
            }
        }
    }
}
