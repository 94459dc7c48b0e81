use std::io;
use std::path::PathBuf;

use crate::config::Difficulty;

/// Caller contract violations, reported when a round is set up.
///
/// Nothing that happens during play is an error: rejected moves, deaths and
/// discarded trails are ordinary outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("a {width}x{height} grid has no open playfield inside its border")]
    NoPlayfield { width: i32, height: i32 },

    #[error("round profile needs at least one {kind}")]
    NoEntities { kind: &'static str },

    #[error("{difficulty:?} round profile starts with zero lives")]
    NoLives { difficulty: Difficulty },

    #[error("fill threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f32),

    #[error("{entity} movement period must be at least one tick")]
    ZeroSpeed { entity: &'static str },

    #[error("could not read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse config file")]
    Parse(#[from] toml::de::Error),
}
