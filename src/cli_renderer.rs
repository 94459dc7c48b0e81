use crate::entity::{Direction, Position};
use crate::game::{GameCore, RoundStatus};
use crate::grid::Tile;
use crate::renderer::{Input, Renderer};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Lines below the board used by the status display.
pub const HUD_LINES: u16 = 4;

#[derive(Debug, Clone, Copy)]
enum Glyph {
    Player { drawing: bool },
    Qix,
    Sparx,
}

pub struct CliRenderer {
    last_render: Instant,
    target_frame_time: Duration,
}

impl CliRenderer {
    pub fn new() -> Self {
        Self {
            last_render: Instant::now(),
            // 30 FPS
            target_frame_time: Duration::from_millis(33),
        }
    }

    fn draw_tile(&self, tile: Tile, stdout: &mut io::Stdout) -> io::Result<()> {
        let color = match tile {
            Tile::Empty => Color::Black,
            Tile::Border => Color::DarkGrey,
            Tile::Filled => Color::Blue,
            Tile::Trail => Color::Yellow,
        };
        queue!(stdout, SetBackgroundColor(color), Print("  "))?;
        Ok(())
    }

    fn draw_glyph(&self, glyph: Glyph, tile: Tile, stdout: &mut io::Stdout) -> io::Result<()> {
        match glyph {
            Glyph::Player { drawing } => queue!(
                stdout,
                SetBackgroundColor(if drawing { Color::Magenta } else { Color::Green }),
                SetForegroundColor(Color::Black),
                Print("@@")
            )?,
            Glyph::Qix => queue!(
                stdout,
                SetBackgroundColor(Color::Black),
                SetForegroundColor(Color::Red),
                Print("<>")
            )?,
            Glyph::Sparx => queue!(
                stdout,
                SetBackgroundColor(if tile == Tile::Border { Color::DarkGrey } else { Color::Blue }),
                SetForegroundColor(Color::Yellow),
                Print("**")
            )?,
        }
        queue!(stdout, ResetColor)?;
        Ok(())
    }

    /// Later entries win: Sparx under Qix under the player.
    fn glyphs(game: &GameCore) -> HashMap<Position, Glyph> {
        let mut glyphs = HashMap::new();
        for sparx in game.sparxes() {
            glyphs.insert(sparx.position, Glyph::Sparx);
        }
        for qix in game.qixes() {
            glyphs.insert(qix.position, Glyph::Qix);
        }
        let player = game.player();
        glyphs.insert(
            player.position,
            Glyph::Player {
                drawing: player.is_drawing,
            },
        );
        glyphs
    }

    fn draw_info(&self, game: &GameCore, stdout: &mut io::Stdout) -> io::Result<()> {
        let top = game.grid().height() as u16;
        let config = game.config();

        queue!(
            stdout,
            cursor::MoveTo(0, top),
            ResetColor,
            terminal::Clear(ClearType::CurrentLine),
            Print(format!(
                "Difficulty: {}  Lives: {}  Score: {}  Filled: {:.1}%  Target: {:.0}%  {}",
                game.difficulty(),
                game.lives(),
                game.score(),
                game.fill_percentage() * 100.0,
                config.fill_threshold * 100.0,
                if game.player().is_drawing { "DRAWING" } else { "" }
            ))
        )?;

        queue!(
            stdout,
            cursor::MoveTo(0, top + 1),
            Print("Arrows steer | X stop | Space toggle draw | R restart | Q quit")
        )?;

        queue!(stdout, cursor::MoveTo(0, top + 2), terminal::Clear(ClearType::CurrentLine))?;
        match game.status() {
            RoundStatus::Won => {
                queue!(
                    stdout,
                    SetForegroundColor(Color::Green),
                    Print("YOU WIN! Press R to play again"),
                    ResetColor
                )?;
            }
            RoundStatus::Lost => {
                queue!(
                    stdout,
                    SetForegroundColor(Color::Red),
                    Print("GAME OVER! Press R to restart"),
                    ResetColor
                )?;
            }
            RoundStatus::Playing => {}
        }

        Ok(())
    }
}

impl Renderer for CliRenderer {
    fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )?;
        Ok(())
    }

    fn render(&mut self, game: &GameCore) -> io::Result<()> {
        if self.last_render.elapsed() < self.target_frame_time {
            return Ok(());
        }
        self.last_render = Instant::now();

        let mut stdout = io::stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        let grid = game.grid();
        let glyphs = Self::glyphs(game);

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = Position::new(x, y);
                let tile = grid.at(pos);
                match glyphs.get(&pos) {
                    Some(glyph) => self.draw_glyph(*glyph, tile, &mut stdout)?,
                    None => self.draw_tile(tile, &mut stdout)?,
                }
            }
            queue!(stdout, ResetColor, Print("\r\n"))?;
        }

        self.draw_info(game, &mut stdout)?;

        stdout.flush()?;
        Ok(())
    }

    fn cleanup(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::Show,
            terminal::LeaveAlternateScreen,
            ResetColor
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    fn poll_input(&mut self) -> io::Result<Option<Input>> {
        if !event::poll(Duration::from_millis(5))? {
            return Ok(None);
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            return Ok(None);
        };
        if kind != KeyEventKind::Press {
            return Ok(None);
        }

        let input = match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Input::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => Input::Restart,
            KeyCode::Char('x') | KeyCode::Char('X') => Input::Stop,
            KeyCode::Char(' ') => Input::ToggleDraw,
            KeyCode::Up => Input::Direction(Direction::Up),
            KeyCode::Down => Input::Direction(Direction::Down),
            KeyCode::Left => Input::Direction(Direction::Left),
            KeyCode::Right => Input::Direction(Direction::Right),
            _ => return Ok(None),
        };
        Ok(Some(input))
    }
}

impl Drop for CliRenderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
