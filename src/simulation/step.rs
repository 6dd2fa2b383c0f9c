//! One simulation tick
//!
//! The update is two-phase: every car's velocity and destination are
//! planned against the frozen current generation, then all moves are
//! applied into a fresh buffer that replaces it atomically. Cars are
//! processed in row-major scan order and the first car to claim a cell
//! keeps it.

use rand::Rng;

use super::cell::Cell;
use super::grid::Grid;
use super::rules::UpdateRule;
use super::spawn::run_spawn_pass;
use super::types::Car;

struct PlannedMove {
    from: usize,
    dest: usize,
    car: Car,
}

impl Grid {
    /// Advance the simulation by one tick
    ///
    /// Lights tick first, then spawns go into the next generation, then
    /// every car plans its move against the current one. A car whose
    /// destination lies off the grid retires; a car beaten to its
    /// destination waits out the tick where it stands with velocity 0.
    pub fn step<R: Rng>(
        &mut self,
        rule: &dyn UpdateRule,
        vmax: u32,
        brake_probability: f64,
        rng: &mut R,
    ) {
        for cell in &mut self.cells {
            if let Some(light) = &mut cell.light {
                light.advance();
            }
        }

        // The next generation starts with the static features only.
        let mut next: Vec<Cell> = self.cells.iter().map(Cell::without_car).collect();

        run_spawn_pass(self, &mut next, vmax, rng);

        let mut planned = Vec::with_capacity(self.car_count);
        for y in 0..self.height {
            for x in 0..self.width {
                let index = self.index(x, y);
                let Some(car) = self.cells[index].car else {
                    continue;
                };
                let gap = self.scan_gap(x, y, &car);
                let velocity = rule.next_velocity(car.velocity, gap, vmax, brake_probability, rng);
                let (dx, dy) = car.direction.offset();
                let dest_x = x as i64 + dx * velocity as i64;
                let dest_y = y as i64 + dy * velocity as i64;
                if !self.in_bounds(dest_x, dest_y) {
                    self.car_count = self.car_count.saturating_sub(1);
                    self.cars_retired += 1;
                    continue;
                }
                planned.push(PlannedMove {
                    from: index,
                    dest: self.index(dest_x as usize, dest_y as usize),
                    car: Car { velocity, ..car },
                });
            }
        }

        for mut planned_move in planned {
            let target = if next[planned_move.dest].car.is_none() {
                planned_move.dest
            } else {
                planned_move.car.velocity = 0;
                planned_move.from
            };
            if target != planned_move.from {
                if let Some(marker) = next[target].turn {
                    if planned_move.car.will_turn {
                        planned_move.car.direction = marker.direction;
                        planned_move.car.will_turn = false;
                    }
                }
            }
            next[target].car = Some(planned_move.car);
        }

        self.cells = next;
    }
}
