use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use qix::cli_renderer::HUD_LINES;
use qix::{CliRenderer, Controls, Difficulty, GameConfig, GameCore, Input, Renderer};

#[derive(Parser, Debug)]
#[command(name = "qix-cli", about = "Claim the playfield, dodge the Qix and the Sparx")]
struct Args {
    /// TOML file with game settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// normal, hard or expert
    #[arg(long, default_value_t = Difficulty::Normal)]
    difficulty: Difficulty,

    /// Grid width in tiles (defaults to the configured width, shrunk to fit the terminal)
    #[arg(long)]
    width: Option<i32>,

    #[arg(long)]
    height: Option<i32>,

    /// Seed for a reproducible round
    #[arg(long)]
    seed: Option<u64>,

    /// Write debug logs to this file; the terminal belongs to the game
    #[arg(long)]
    log: Option<PathBuf>,
}

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };

    // Each tile is two characters wide; keep room for the status lines
    let (term_width, term_height) = terminal::size().context("reading terminal size")?;
    let fit_width = ((term_width / 2) as i32).max(20);
    let fit_height = (term_height.saturating_sub(HUD_LINES) as i32).max(10);

    config.grid_width = args.width.unwrap_or(config.grid_width.min(fit_width));
    config.grid_height = args.height.unwrap_or(config.grid_height.min(fit_height));
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log {
        init_logging(path)?;
    }

    let config = build_config(&args)?;
    let tick_interval = Duration::from_millis(config.tick_interval_ms);
    let mut game = match args.seed {
        Some(seed) => GameCore::start_round_seeded(config, args.difficulty, seed)?,
        None => GameCore::start_round(config, args.difficulty)?,
    };

    let mut renderer = CliRenderer::new();
    let mut controls = Controls::default();
    renderer.init()?;

    let mut last_tick = Instant::now();

    loop {
        if let Some(input) = renderer.poll_input()? {
            match input {
                Input::Quit => break,
                Input::Restart => {
                    game.reset()?;
                    controls.reset();
                }
                steering => controls.apply(steering),
            }
        }

        if last_tick.elapsed() >= tick_interval {
            game.tick(controls.tick_input());
            last_tick = Instant::now();
        }

        renderer.render(&game)?;
    }

    renderer.cleanup()?;
    Ok(())
}
