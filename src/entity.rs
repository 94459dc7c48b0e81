use std::cmp::Ordering;

/// Integer grid coordinate. Ordering is row-major: `y` first, then `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn moved(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy)
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(&self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-axis movement intent. Diagonal intent is never a player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// `(dx, dy)` step for this direction, with `y` growing downwards.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub position: Position,
    pub lives: u32,
    pub is_drawing: bool,
    pub trail: Vec<Position>,
    /// Safe tile the current trail left from; the player respawns here.
    pub trail_origin: Option<Position>,
    pub move_timer: u32,
}

impl Player {
    pub fn new(x: i32, y: i32, lives: u32) -> Self {
        Self {
            position: Position::new(x, y),
            lives,
            is_drawing: false,
            trail: Vec::new(),
            trail_origin: None,
            move_timer: 0,
        }
    }

    pub fn start_trail(&mut self) {
        self.is_drawing = true;
        self.trail.clear();
        self.trail_origin = Some(self.position);
    }

    pub fn add_to_trail(&mut self) {
        if self.is_drawing {
            self.trail.push(self.position);
        }
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
        self.is_drawing = false;
        self.trail_origin = None;
    }
}
