pub mod capture;
pub mod cli_renderer;
pub mod config;
pub mod enemy;
pub mod entity;
pub mod error;
pub mod game;
pub mod grid;
pub mod perimeter;
pub mod renderer;
pub mod trail;

pub use capture::CaptureOutcome;
pub use cli_renderer::CliRenderer;
pub use config::{Difficulty, GameConfig, SparxMovement};
pub use enemy::{Bias, Qix, Sparx, SparxEvent};
pub use entity::{Direction, Player, Position};
pub use error::ConfigError;
pub use game::{GameCore, RoundStatus, TickInput, TickReport};
pub use grid::{Grid, Tile};
pub use perimeter::Perimeter;
pub use renderer::{Controls, Input, Renderer};
pub use trail::{DeathCause, MoveOutcome};
