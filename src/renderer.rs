use crate::entity::Direction;
use crate::game::{GameCore, TickInput};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Direction(Direction),
    Stop,
    ToggleDraw,
    Quit,
    Restart,
}

/// Trait that abstracts rendering implementation.
/// The core never calls back into a renderer; it only gets read.
pub trait Renderer {
    fn init(&mut self) -> io::Result<()>;

    fn render(&mut self, game: &GameCore) -> io::Result<()>;

    /// Restore terminal/display state
    fn cleanup(&mut self) -> io::Result<()>;

    fn poll_input(&mut self) -> io::Result<Option<Input>>;
}

/// Latches discrete key presses into the steady intent fed to each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    direction: Option<Direction>,
    draw: bool,
}

impl Controls {
    /// Applies a steering input. Quit and Restart belong to the caller.
    pub fn apply(&mut self, input: Input) {
        match input {
            Input::Direction(direction) => self.direction = Some(direction),
            Input::Stop => self.direction = None,
            Input::ToggleDraw => self.draw = !self.draw,
            Input::Quit | Input::Restart => {}
        }
    }

    pub fn tick_input(&self) -> TickInput {
        TickInput {
            direction: self.direction,
            draw: self.draw,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
