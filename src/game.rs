use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::capture::{self, CaptureOutcome};
use crate::config::{Difficulty, GameConfig};
use crate::enemy::{Bias, EnemyController, EnemySettings, Qix, Sparx, SparxEvent};
use crate::entity::{Direction, Player, Position};
use crate::error::ConfigError;
use crate::grid::Grid;
use crate::perimeter::Perimeter;
use crate::trail::{DeathCause, MoveOutcome, TrailController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Playing,
    Won,
    Lost,
}

/// What the player asked for this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub direction: Option<Direction>,
    pub draw: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub movement: MoveOutcome,
    pub capture: Option<CaptureOutcome>,
    pub qix_death: Option<DeathCause>,
    pub sparx_events: Vec<SparxEvent>,
    pub lives_lost: u32,
    pub status: RoundStatus,
}

impl TickReport {
    fn idle(status: RoundStatus) -> Self {
        Self {
            movement: MoveOutcome::NoIntent,
            capture: None,
            qix_death: None,
            sparx_events: Vec::new(),
            lives_lost: 0,
            status,
        }
    }
}

/// One round of play: the grid, its perimeter snapshot, the player and the
/// enemies, advanced one fixed tick at a time.
pub struct GameCore {
    config: GameConfig,
    difficulty: Difficulty,
    grid: Grid,
    perimeter: Perimeter,
    trail: TrailController,
    enemies: EnemyController,
    status: RoundStatus,
    score: usize,
    rng: StdRng,
}

impl GameCore {
    pub fn start_round(config: GameConfig, difficulty: Difficulty) -> Result<Self, ConfigError> {
        Self::with_rng(config, difficulty, StdRng::from_entropy())
    }

    /// Same as [`start_round`](Self::start_round) with a reproducible random stream.
    pub fn start_round_seeded(
        config: GameConfig,
        difficulty: Difficulty,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, difficulty: Difficulty, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let profile = config.profile(difficulty);

        let width = config.grid_width;
        let height = config.grid_height;
        let grid = Grid::new(width, height)?;
        let perimeter = Perimeter::compute(&grid);

        let player = Player::new(width / 2, height - 1, profile.lives);
        let qixes = spawn_qixes(&grid, profile.qix_count);
        let sparxes = spawn_sparxes(
            &perimeter,
            player.position,
            &grid,
            profile.sparx_count,
            config.sparx_spawn_grace,
        );

        info!(
            ?difficulty,
            width,
            height,
            qixes = qixes.len(),
            sparxes = sparxes.len(),
            lives = profile.lives,
            "round started"
        );

        Ok(Self {
            trail: TrailController::new(player, config.player_speed),
            enemies: EnemyController::new(qixes, sparxes, EnemySettings::from(&config)),
            config,
            difficulty,
            grid,
            perimeter,
            status: RoundStatus::Playing,
            score: 0,
            rng,
        })
    }

    /// Starts a fresh round with the same configuration and difficulty.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        *self = Self::with_rng(self.config.clone(), self.difficulty, rng)?;
        Ok(())
    }

    /// Advances the round by one tick: player, then capture, then Qix, then Sparx.
    pub fn tick(&mut self, input: TickInput) -> TickReport {
        if self.status != RoundStatus::Playing {
            return TickReport::idle(self.status);
        }

        let lives_before = self.trail.player().lives;
        let qixes = self.enemies.qix_positions();

        let movement = self.trail.attempt_move(
            &mut self.grid,
            &self.perimeter,
            &qixes,
            input.direction,
            input.draw,
        );

        let capture = match &movement {
            MoveOutcome::Closed(trail) => Some(self.commit_capture(trail)),
            _ => None,
        };

        let qix_death = self
            .enemies
            .move_qixes(&mut self.grid, &mut self.trail, &mut self.rng);
        let sparx_events = self
            .enemies
            .move_sparxes(&mut self.grid, &self.perimeter, &mut self.trail);

        self.update_status();

        TickReport {
            movement,
            capture,
            qix_death,
            sparx_events,
            lives_lost: lives_before.saturating_sub(self.trail.player().lives),
            status: self.status,
        }
    }

    /// Resolves a closed trail and, when territory changed, rebuilds the
    /// perimeter and moves every stranded entity in the same step.
    pub fn commit_capture(&mut self, trail: &[Position]) -> CaptureOutcome {
        let references = self.enemies.qix_positions();
        let outcome = capture::resolve(&mut self.grid, &self.perimeter, trail, &references);

        if outcome.changed_territory() {
            self.perimeter = Perimeter::compute(&self.grid);
            self.trail.snap_to_perimeter(&self.perimeter);
            self.enemies.remap(&self.grid, &self.perimeter, &mut self.rng);
            self.score += outcome.filled();
        }

        outcome
    }

    fn update_status(&mut self) {
        if self.trail.player().lives == 0 {
            self.status = RoundStatus::Lost;
            info!(score = self.score, "round lost");
        } else if self.grid.fill_percentage() >= self.config.fill_threshold {
            self.status = RoundStatus::Won;
            info!(
                score = self.score,
                fill = self.grid.fill_percentage(),
                "round won"
            );
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn perimeter(&self) -> &Perimeter {
        &self.perimeter
    }

    pub fn player(&self) -> &Player {
        self.trail.player()
    }

    pub fn qixes(&self) -> &[Qix] {
        self.enemies.qixes()
    }

    pub fn sparxes(&self) -> &[Sparx] {
        self.enemies.sparxes()
    }

    pub fn lives(&self) -> u32 {
        self.trail.player().lives
    }

    pub fn fill_percentage(&self) -> f32 {
        self.grid.fill_percentage()
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Qix start on a diagonal through the playfield, a third of the way in for
/// the first two.
fn spawn_qixes(grid: &Grid, count: usize) -> Vec<Qix> {
    let slots = (count as i32 + 1).max(3);
    (1..=count as i32)
        .map(|i| {
            let x = (grid.width() * i / slots).clamp(1, grid.width() - 2);
            let y = (grid.height() * i / slots).clamp(1, grid.height() - 2);
            Qix::new(x, y)
        })
        .collect()
}

/// Sparx start across from the player: a clockwise/counter-clockwise pair
/// on the mirrored point, further ones on the point opposite that.
fn spawn_sparxes(
    perimeter: &Perimeter,
    player: Position,
    grid: &Grid,
    count: usize,
    grace: u32,
) -> Vec<Sparx> {
    let target = Position::new(
        grid.width() - 1 - player.x,
        if player.y > grid.height() / 2 {
            0
        } else {
            grid.height() - 1
        },
    );
    let opposite = Position::new(grid.width() - 1 - target.x, grid.height() - 1 - target.y);

    let (Some(near), Some(far)) = (perimeter.nearest(target), perimeter.nearest(opposite)) else {
        return Vec::new();
    };

    (0..count)
        .map(|i| {
            let position = if (i / 2) % 2 == 0 { near } else { far };
            let bias = if i % 2 == 0 {
                Bias::Clockwise
            } else {
                Bias::CounterClockwise
            };
            let mut sparx = Sparx::new(position, bias, grace);
            sparx.index = perimeter.index_of(position).unwrap_or(0);
            sparx
        })
        .collect()
}
