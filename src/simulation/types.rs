//! Core types for the traffic simulation
//!
//! Small value types shared across the simulation modules.

/// A unique identifier for a car
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarId(pub usize);

/// One of the four travel directions on the grid
///
/// The grid uses screen coordinates: x grows to the right, y grows
/// downward, so `Up` decreases y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit step for this direction as signed offsets
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The direction a right-turning driver ends up facing
    pub fn rotated_clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }
}

/// A vehicle occupying one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Car {
    pub id: CarId,
    /// Current velocity in cells per tick
    pub velocity: u32,
    pub direction: Direction,
    /// Set at spawn time, consumed at the first turn marker the car enters
    pub will_turn: bool,
}

/// A static cell annotation that redirects turning traffic
///
/// A car entering the cell with its will-turn flag set adopts this
/// direction and clears the flag. Cars without the flag pass through
/// unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnMarker {
    pub direction: Direction,
}
