//! Standalone traffic simulation module
//!
//! This module contains the cellular automaton core: the grid, the
//! update rule, the junction builder and the spawn machinery. It has no
//! knowledge of rendering or metrics output and can be driven entirely
//! from tests.

mod cell;
mod grid;
mod light;
mod rules;
mod spawn;
mod step;
mod topology;
mod types;

pub use cell::Cell;
pub use grid::Grid;
pub use light::{LightPhase, LightTiming, TrafficLight};
pub use rules::{NagelSchreckenberg, UpdateRule};
pub use spawn::seed_density;
pub use topology::{
    carve_right_turn_lane, ApproachConfig, JunctionConfig, DEFAULT_TURN_PROBABILITY,
};
pub use types::{Car, CarId, Direction, TurnMarker};
