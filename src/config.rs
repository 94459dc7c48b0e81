use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Normal,
    Hard,
    Expert,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty '{other}' (expected normal, hard or expert)")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        };
        f.write_str(name)
    }
}

/// How Sparx choose their next perimeter tile. One strategy applies to a whole round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparxMovement {
    /// Score the neighbouring perimeter tiles every step.
    #[default]
    Steering,
    /// Walk the ordered perimeter by index.
    Patrol,
}

/// Entity counts and starting lives for one difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProfile {
    pub qix_count: usize,
    pub sparx_count: usize,
    pub lives: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profiles {
    pub normal: RoundProfile,
    pub hard: RoundProfile,
    pub expert: RoundProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            normal: RoundProfile {
                qix_count: 1,
                sparx_count: 2,
                lives: 9,
            },
            hard: RoundProfile {
                qix_count: 2,
                sparx_count: 3,
                lives: 6,
            },
            expert: RoundProfile {
                qix_count: 2,
                sparx_count: 3,
                lives: 3,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_width: i32,
    pub grid_height: i32,
    /// Fraction of the playfield that must be filled to win.
    pub fill_threshold: f32,
    // Movement periods, in ticks.
    pub player_speed: u32,
    pub qix_speed: u32,
    pub sparx_speed: u32,
    /// Sparx moves during which a Sparx cannot hit again after a hit.
    pub sparx_cooldown: u32,
    pub sparx_spawn_grace: u32,
    /// Chance per Qix move of a random heading change.
    pub qix_turn_chance: f64,
    pub sparx_movement: SparxMovement,
    pub tick_interval_ms: u64,
    pub profiles: Profiles,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 80,
            grid_height: 60,
            fill_threshold: 0.75,
            player_speed: 3,
            qix_speed: 4,
            sparx_speed: 5,
            sparx_cooldown: 3,
            sparx_spawn_grace: 10,
            qix_turn_chance: 0.02,
            sparx_movement: SparxMovement::default(),
            tick_interval_ms: 16,
            profiles: Profiles::default(),
        }
    }
}

impl GameConfig {
    /// Reads a TOML config file. Keys that are left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn profile(&self, difficulty: Difficulty) -> RoundProfile {
        match difficulty {
            Difficulty::Normal => self.profiles.normal,
            Difficulty::Hard => self.profiles.hard,
            Difficulty::Expert => self.profiles.expert,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.grid_width < 3 || self.grid_height < 3 {
            return Err(ConfigError::NoPlayfield {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if !(self.fill_threshold > 0.0 && self.fill_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.fill_threshold));
        }
        for (entity, speed) in [
            ("player", self.player_speed),
            ("qix", self.qix_speed),
            ("sparx", self.sparx_speed),
        ] {
            if speed == 0 {
                return Err(ConfigError::ZeroSpeed { entity });
            }
        }
        for difficulty in [Difficulty::Normal, Difficulty::Hard, Difficulty::Expert] {
            let profile = self.profile(difficulty);
            if profile.qix_count == 0 {
                return Err(ConfigError::NoEntities { kind: "qix" });
            }
            if profile.sparx_count == 0 {
                return Err(ConfigError::NoEntities { kind: "sparx" });
            }
            if profile.lives == 0 {
                return Err(ConfigError::NoLives { difficulty });
            }
        }
        Ok(())
    }
}
