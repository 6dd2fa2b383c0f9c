//! The simulation grid
//!
//! Owns every cell plus the car counters and the per-coordinate lookup
//! tables the topology builder populates. Dimensions are fixed at
//! construction and never change.

use std::collections::HashMap;

use super::cell::Cell;
use super::types::{Car, CarId, Direction};

/// A rectangular grid of cells addressed by (x, y)
#[derive(Debug, Clone)]
pub struct Grid {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Row-major cell storage
    pub(crate) cells: Vec<Cell>,
    /// Monotonically increasing id source, never reused
    pub(crate) next_car_id: usize,
    pub(crate) car_count: usize,
    pub(crate) cars_spawned: usize,
    pub(crate) cars_retired: usize,
    pub(crate) max_cars: usize,
    /// Chance per spawn point per tick that a car is created
    pub(crate) spawn_probability: f64,
    /// Turn-intent chance for spawn points without a table entry
    pub(crate) default_turn_probability: f64,
    /// Travel direction per road cell; `None` marks cells claimed by
    /// crossing lanes where no single direction applies
    pub(crate) lane_directions: HashMap<(usize, usize), Option<Direction>>,
    /// Turn-intent probability per cell, populated lane by lane
    pub(crate) turn_probabilities: HashMap<(usize, usize), f64>,
}

impl Grid {
    /// Create an empty grid with no roads and no spawn cap
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            next_car_id: 0,
            car_count: 0,
            cars_spawned: 0,
            cars_retired: 0,
            max_cars: usize::MAX,
            spawn_probability: 0.0,
            default_turn_probability: 0.0,
            lane_directions: HashMap::new(),
            turn_probabilities: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub(crate) fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let index = self.index(x, y);
        &mut self.cells[index]
    }

    /// Iterate over all cars with their coordinates, row-major
    pub fn cars(&self) -> impl Iterator<Item = ((usize, usize), &Car)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.car
                .as_ref()
                .map(move |car| ((i % self.width, i / self.width), car))
        })
    }

    /// Number of cars currently on the grid
    pub fn car_count(&self) -> usize {
        self.car_count
    }

    /// Total cars ever created
    pub fn cars_spawned(&self) -> usize {
        self.cars_spawned
    }

    /// Total cars that left the grid
    pub fn cars_retired(&self) -> usize {
        self.cars_retired
    }

    pub fn max_cars(&self) -> usize {
        self.max_cars
    }

    pub fn set_max_cars(&mut self, max_cars: usize) {
        self.max_cars = max_cars;
    }

    /// Hand out a fresh unique car id
    pub fn allocate_car_id(&mut self) -> CarId {
        let id = CarId(self.next_car_id);
        self.next_car_id += 1;
        id
    }

    /// Travel direction recorded for a road cell, if unambiguous
    pub fn lane_direction(&self, x: usize, y: usize) -> Option<Direction> {
        self.lane_directions.get(&(x, y)).copied().flatten()
    }

    /// Turn-intent probability for a cell, falling back to the default
    pub fn turn_probability_at(&self, x: usize, y: usize) -> f64 {
        self.turn_probabilities
            .get(&(x, y))
            .copied()
            .unwrap_or(self.default_turn_probability)
    }

    /// Mean velocity over all cars, 0.0 when the grid is empty
    pub fn average_velocity(&self) -> f64 {
        let mut total = 0u64;
        let mut count = 0usize;
        for (_, car) in self.cars() {
            total += u64::from(car.velocity);
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Distance from the car at (x, y) to the nearest obstacle ahead
    ///
    /// Returns `None` when no car occupies the cell. The walk stops at a
    /// red light or another car (distance to that cell), grants one cell
    /// of extra clearance at a turn marker the car intends to take, and
    /// treats the grid boundary as an open exit one cell past the edge.
    pub fn distance_to_obstacle(&self, x: usize, y: usize) -> Option<u32> {
        self.cell(x, y)
            .car
            .as_ref()
            .map(|car| self.scan_gap(x, y, car))
    }

    pub(crate) fn scan_gap(&self, x: usize, y: usize, car: &Car) -> u32 {
        let (dx, dy) = car.direction.offset();
        let mut cx = x as i64;
        let mut cy = y as i64;
        let mut steps = 0u32;
        loop {
            cx += dx;
            cy += dy;
            steps += 1;
            if !self.in_bounds(cx, cy) {
                return steps + 1;
            }
            let cell = self.cell(cx as usize, cy as usize);
            if let Some(light) = &cell.light {
                if light.is_red() {
                    return steps;
                }
            }
            if cell.car.is_some() {
                return steps;
            }
            if cell.turn.is_some() && car.will_turn {
                return steps + 1;
            }
        }
    }
}
