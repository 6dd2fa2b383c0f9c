//! A single cell of the simulation grid

use super::light::TrafficLight;
use super::types::{Car, TurnMarker};

/// One grid cell with its optional attachments
///
/// A car and a traffic light may coexist in the same cell; the light
/// applies to traffic passing through it. Absent attachments are `None`,
/// there are no sentinel values.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// The car currently occupying this cell (if any)
    pub car: Option<Car>,
    /// Turn marker placed at construction time (if any)
    pub turn: Option<TurnMarker>,
    /// Traffic light placed at construction time (if any)
    pub light: Option<TrafficLight>,
    /// Whether this cell is part of the road network
    pub is_road: bool,
    /// Whether new cars may be created here
    pub is_spawn_point: bool,
}

impl Cell {
    /// Copy of this cell with the static features only, the car stripped
    pub fn without_car(&self) -> Cell {
        Cell {
            car: None,
            ..self.clone()
        }
    }
}
