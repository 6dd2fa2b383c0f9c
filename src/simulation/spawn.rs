//! Car creation
//!
//! The per-tick spawn pass plus the optional startup density fill.
//! Both draw velocity uniformly from [0, vmax] and decide turn intent
//! against the cell's table entry.

use log::warn;
use rand::Rng;

use super::cell::Cell;
use super::grid::Grid;
use super::types::Car;

/// Run the spawn pass for one tick, writing new cars into the next buffer
///
/// A spawn point produces a car when the grid is under its cap, the
/// probability draw passes and the cell is currently empty. A spawn
/// point without a travel direction is skipped; everything else fails
/// silently.
pub(crate) fn run_spawn_pass<R: Rng>(grid: &mut Grid, next: &mut [Cell], vmax: u32, rng: &mut R) {
    for y in 0..grid.height {
        for x in 0..grid.width {
            let index = grid.index(x, y);
            if !grid.cells[index].is_spawn_point {
                continue;
            }
            if grid.car_count >= grid.max_cars {
                continue;
            }
            if rng.random::<f64>() > grid.spawn_probability {
                continue;
            }
            if grid.cells[index].car.is_some() {
                continue;
            }
            let Some(direction) = grid.lane_direction(x, y) else {
                warn!("Spawn point ({}, {}) has no travel direction, skipping", x, y);
                continue;
            };
            let will_turn = rng.random::<f64>() < grid.turn_probability_at(x, y);
            let velocity = rng.random_range(0..=vmax);
            let id = grid.allocate_car_id();
            next[index].car = Some(Car {
                id,
                velocity,
                direction,
                will_turn,
            });
            grid.car_count += 1;
            grid.cars_spawned += 1;
        }
    }
}

/// Fill road cells with an initial car density before a run
///
/// Every road cell with an unambiguous travel direction receives a car
/// with probability `density`, stopping at the grid's car cap. Returns
/// the number of cars placed.
pub fn seed_density<R: Rng>(grid: &mut Grid, density: f64, vmax: u32, rng: &mut R) -> usize {
    let mut seeded = 0;
    for y in 0..grid.height {
        for x in 0..grid.width {
            if grid.car_count >= grid.max_cars {
                return seeded;
            }
            let index = grid.index(x, y);
            if !grid.cells[index].is_road || grid.cells[index].car.is_some() {
                continue;
            }
            let Some(direction) = grid.lane_direction(x, y) else {
                continue;
            };
            if rng.random::<f64>() >= density {
                continue;
            }
            let will_turn = rng.random::<f64>() < grid.turn_probability_at(x, y);
            let velocity = rng.random_range(0..=vmax);
            let id = grid.allocate_car_id();
            grid.cells[index].car = Some(Car {
                id,
                velocity,
                direction,
                will_turn,
            });
            grid.car_count += 1;
            grid.cars_spawned += 1;
            seeded += 1;
        }
    }
    seeded
}
