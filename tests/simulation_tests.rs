//! Core update rule and movement tests
//!
//! Exercises the velocity rule, gap scanning, the two-phase step and
//! the spawn machinery on small hand-built grids.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use traffic_ca::simulation::{
    seed_density, Car, CarId, Direction, Grid, JunctionConfig, LightPhase, LightTiming,
    NagelSchreckenberg, TrafficLight, TurnMarker, UpdateRule,
};

fn car(id: usize, velocity: u32, direction: Direction) -> Car {
    Car {
        id: CarId(id),
        velocity,
        direction,
        will_turn: false,
    }
}

#[test]
fn test_acceleration_toward_open_road() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);

    // Plenty of room: accelerate by one.
    assert_eq!(rule.next_velocity(2, 5, 5, 0.0, &mut rng), 3);
    // Acceleration is capped at vmax.
    assert_eq!(rule.next_velocity(3, 10, 3, 0.0, &mut rng), 3);
    // A standing car pulls away.
    assert_eq!(rule.next_velocity(0, 10, 5, 0.0, &mut rng), 1);
}

#[test]
fn test_blocked_car_stays_put() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);

    // Obstacle in the adjacent cell leaves no room to move.
    assert_eq!(rule.next_velocity(0, 1, 5, 0.0, &mut rng), 0);
    assert_eq!(rule.next_velocity(4, 1, 5, 0.0, &mut rng), 0);
}

#[test]
fn test_random_braking() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);

    // With certain braking the car loses one cell of speed.
    assert_eq!(rule.next_velocity(2, 5, 5, 1.0, &mut rng), 2);
    // Braking never drives velocity below zero.
    assert_eq!(rule.next_velocity(0, 1, 5, 1.0, &mut rng), 0);
}

#[test]
fn test_light_cycle_timing() {
    let timing = LightTiming {
        red: 3,
        yellow: 1,
        green: 4,
    };
    let mut light = TrafficLight::new(timing);
    assert!(light.is_red());
    assert_eq!(light.timer, 0);

    // Red holds for exactly three ticks.
    light.advance();
    light.advance();
    assert!(light.is_red());
    light.advance();
    assert_eq!(light.phase, LightPhase::Green);
    assert_eq!(light.timer, 0);

    // Green for four, yellow for one, then back to red.
    for _ in 0..4 {
        assert!(!light.is_red());
        light.advance();
    }
    assert_eq!(light.phase, LightPhase::Yellow);
    assert_eq!(light.timer, 0);
    light.advance();
    assert!(light.is_red());
    assert_eq!(light.timer, 0);

    // Eight ticks make one full cycle back to the starting state.
    assert_eq!(light, TrafficLight::new(timing));
}

#[test]
fn test_gap_scan_stops_at_car_ahead() {
    let mut grid = Grid::new(10, 3);
    grid.cell_mut(1, 1).car = Some(car(1, 0, Direction::Right));
    grid.cell_mut(4, 1).car = Some(car(2, 0, Direction::Right));

    assert_eq!(grid.distance_to_obstacle(1, 1), Some(3));
    // No car on the cell means no distance to measure.
    assert_eq!(grid.distance_to_obstacle(0, 0), None);
}

#[test]
fn test_gap_scan_stops_at_red_light_only() {
    let timing = LightTiming {
        red: 3,
        yellow: 1,
        green: 4,
    };
    let mut grid = Grid::new(10, 1);
    grid.cell_mut(0, 0).car = Some(car(1, 0, Direction::Right));
    grid.cell_mut(4, 0).light = Some(TrafficLight::new(timing));

    // A fresh light is red and blocks at its own cell.
    assert_eq!(grid.distance_to_obstacle(0, 0), Some(4));

    // A green light is no obstacle; the scan runs to the open boundary.
    grid.cell_mut(4, 0).light = Some(TrafficLight {
        phase: LightPhase::Green,
        timer: 0,
        timing,
    });
    assert_eq!(grid.distance_to_obstacle(0, 0), Some(11));
}

#[test]
fn test_gap_scan_open_boundary() {
    let mut grid = Grid::new(10, 3);
    grid.cell_mut(8, 1).car = Some(car(1, 0, Direction::Right));
    grid.cell_mut(9, 2).car = Some(car(2, 0, Direction::Right));

    // The boundary counts as one cell past the edge so cars can leave.
    assert_eq!(grid.distance_to_obstacle(8, 1), Some(3));
    assert_eq!(grid.distance_to_obstacle(9, 2), Some(2));
}

#[test]
fn test_gap_scan_turn_marker_clearance() {
    let mut grid = Grid::new(12, 3);
    let mut turning = car(1, 0, Direction::Right);
    turning.will_turn = true;
    grid.cell_mut(1, 1).car = Some(turning);
    grid.cell_mut(4, 1).turn = Some(TurnMarker {
        direction: Direction::Down,
    });

    // One extra cell of clearance lets the car land on the marker.
    assert_eq!(grid.distance_to_obstacle(1, 1), Some(4));

    // Without the intent flag the marker is invisible.
    grid.cell_mut(1, 1).car = Some(car(1, 0, Direction::Right));
    assert_eq!(grid.distance_to_obstacle(1, 1), Some(12));
}

#[test]
fn test_step_moves_and_retires_cars() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut grid = Grid::new(10, 1);
    grid.cell_mut(5, 0).car = Some(car(1, 0, Direction::Right));

    grid.step(&rule, 3, 0.0, &mut rng);
    assert_eq!(grid.cell(6, 0).car.map(|c| c.velocity), Some(1));

    grid.step(&rule, 3, 0.0, &mut rng);
    assert_eq!(grid.cell(8, 0).car.map(|c| c.velocity), Some(2));

    // Two cells from the edge the car accelerates off the grid.
    grid.step(&rule, 3, 0.0, &mut rng);
    assert_eq!(grid.cars().count(), 0);
    assert_eq!(grid.cars_retired(), 1);
}

#[test]
fn test_turn_marker_consumed_once() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut grid = Grid::new(12, 12);
    let mut turning = car(1, 1, Direction::Right);
    turning.will_turn = true;
    grid.cell_mut(3, 1).car = Some(turning);
    grid.cell_mut(5, 1).turn = Some(TurnMarker {
        direction: Direction::Down,
    });
    grid.cell_mut(5, 8).turn = Some(TurnMarker {
        direction: Direction::Right,
    });

    // The car lands on the marker, turns and clears its intent flag.
    grid.step(&rule, 3, 0.0, &mut rng);
    let turned = grid.cell(5, 1).car.unwrap();
    assert_eq!(turned.direction, Direction::Down);
    assert!(!turned.will_turn);

    // Without the flag the second marker has no pull; the car passes
    // straight over it at cruising speed.
    grid.step(&rule, 3, 0.0, &mut rng);
    grid.step(&rule, 3, 0.0, &mut rng);
    grid.step(&rule, 3, 0.0, &mut rng);
    let through = grid.cell(5, 10).car.unwrap();
    assert_eq!(through.direction, Direction::Down);

    grid.step(&rule, 3, 0.0, &mut rng);
    assert_eq!(grid.cars().count(), 0);
    assert_eq!(grid.cars_retired(), 1);
}

#[test]
fn test_destination_conflict_first_writer_wins() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut grid = Grid::new(7, 3);
    // Both cars reach (3, 0) this step; the row-major scan plans the
    // rightbound car first.
    grid.cell_mut(1, 0).car = Some(car(1, 1, Direction::Right));
    grid.cell_mut(3, 2).car = Some(car(2, 1, Direction::Up));

    grid.step(&rule, 3, 0.0, &mut rng);

    let winner = grid.cell(3, 0).car.unwrap();
    assert_eq!(winner.id, CarId(1));
    assert_eq!(winner.velocity, 2);

    // The loser waits out the tick where it stood.
    let held = grid.cell(3, 2).car.unwrap();
    assert_eq!(held.id, CarId(2));
    assert_eq!(held.velocity, 0);
    assert_eq!(grid.cars().count(), 2);
}

#[test]
fn test_spawn_denied_on_occupied_cell() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut config = JunctionConfig::standard(50, 50);
    config.spawn_probability = 1.0;
    let mut grid = config.build().unwrap();
    grid.cell_mut(23, 0).car = Some(car(900, 0, Direction::Down));

    grid.step(&rule, 3, 0.0, &mut rng);

    // The parked car rolled forward and its spawn point produced
    // nothing this tick; the other eleven all fired.
    assert!(grid.cell(23, 0).car.is_none());
    assert_eq!(grid.cars_spawned(), 11);
    assert_eq!(grid.cars().count(), 12);
    for (_, spawned) in grid.cars() {
        assert!(spawned.velocity <= 3);
    }
}

#[test]
fn test_spawn_respects_capacity() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(7);
    let mut config = JunctionConfig::standard(50, 50);
    config.spawn_probability = 1.0;
    config.max_cars = 5;
    let mut grid = config.build().unwrap();

    for _ in 0..30 {
        grid.step(&rule, 3, 0.3, &mut rng);
        assert!(grid.car_count() <= 5);
        assert_eq!(grid.cars().count(), grid.car_count());
    }
}

#[test]
fn test_seed_density_fills_roads_up_to_cap() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut grid = JunctionConfig::standard(50, 50).build().unwrap();

    let seeded = seed_density(&mut grid, 1.0, 3, &mut rng);
    assert_eq!(seeded, 100);
    assert_eq!(grid.car_count(), 100);

    // Every seeded car sits on a directed road cell, never inside the
    // junction box where directions are ambiguous.
    for ((x, y), _) in grid.cars() {
        assert!(grid.cell(x, y).is_road);
        assert!(grid.lane_direction(x, y).is_some());
    }
    assert!(grid.cell(24, 24).car.is_none());
    assert!(grid.cell(25, 25).car.is_none());
}

#[test]
fn test_population_invariants_over_long_run() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(42);
    let mut config = JunctionConfig::standard(50, 50);
    config.max_cars = 20;
    let mut grid = config.build().unwrap();

    let mut ever_seen = HashSet::new();
    let mut retired_ids = HashSet::new();

    for _ in 0..200 {
        grid.step(&rule, 3, 0.3, &mut rng);

        let on_grid = grid.cars().count();
        assert!(on_grid <= 20);
        assert_eq!(grid.car_count(), on_grid);
        // No car is ever lost or duplicated by the two-phase update.
        assert_eq!(grid.cars_spawned() - grid.cars_retired(), on_grid);

        let ids: HashSet<_> = grid.cars().map(|(_, c)| c.id).collect();
        assert_eq!(ids.len(), on_grid);

        // An id that left the grid stays gone for the rest of the run.
        for id in &ids {
            assert!(
                !retired_ids.contains(id),
                "retired id {:?} reappeared on the grid",
                id
            );
        }
        retired_ids.extend(ever_seen.difference(&ids).copied());
        ever_seen.extend(ids);

        let average = grid.average_velocity();
        assert!((0.0..=3.0).contains(&average));
    }
}

#[test]
fn test_average_velocity() {
    let mut grid = Grid::new(5, 5);
    assert_eq!(grid.average_velocity(), 0.0);

    grid.cell_mut(0, 0).car = Some(car(1, 1, Direction::Right));
    grid.cell_mut(0, 2).car = Some(car(2, 3, Direction::Right));
    assert_eq!(grid.average_velocity(), 2.0);
}
