//! Metrics and rendering output tests
//!
//! Checks the CSV schemas, the recorder bookkeeping and the PPM pixel
//! priorities against tiny grids with known contents.

use std::env;
use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;

use traffic_ca::simulation::{
    Car, CarId, Direction, Grid, LightTiming, NagelSchreckenberg, TrafficLight,
};
use traffic_ca::stats::MetricsRecorder;
use traffic_ca::viz::{
    id_color, velocity_color, write_frame, write_frame_interpolated, Colormap, FrameStyle,
    TURBO_SRGB,
};

fn car(id: usize, velocity: u32, direction: Direction) -> Car {
    Car {
        id: CarId(id),
        velocity,
        direction,
        will_turn: false,
    }
}

fn style() -> FrameStyle {
    FrameStyle {
        scale: 1,
        vmax: 3,
        colormap: Colormap::Turbo,
        color_by_id: false,
    }
}

#[test]
fn test_recorder_tracks_exits_and_waiting() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut grid = Grid::new(10, 1);
    grid.cell_mut(8, 0).car = Some(car(1, 0, Direction::Right));
    let mut recorder = MetricsRecorder::new(true);

    grid.step(&rule, 3, 0.0, &mut rng);
    recorder.record(0, &grid);
    grid.step(&rule, 3, 0.0, &mut rng);
    recorder.record(1, &grid);

    let steps = recorder.steps();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].cars_exited, 0);
    assert_eq!(steps[0].average_speed, 1.0);
    assert_eq!(steps[0].cars_waiting, 0);
    assert_eq!(steps[1].cars_exited, 1);
    assert_eq!(steps[1].average_speed, 0.0);

    // Tracing logged the car once, before it left the grid.
    let log = recorder.vehicle_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].vehicle_id, 1);
    assert_eq!((log[0].x, log[0].y), (9, 0));
    assert!(!log[0].waiting);
}

#[test]
fn test_csv_schemas() {
    let rule = NagelSchreckenberg;
    let mut rng = StdRng::seed_from_u64(0);
    let mut grid = Grid::new(10, 1);
    grid.cell_mut(8, 0).car = Some(car(1, 0, Direction::Right));
    let mut recorder = MetricsRecorder::new(true);

    grid.step(&rule, 3, 0.0, &mut rng);
    recorder.record(0, &grid);
    grid.step(&rule, 3, 0.0, &mut rng);
    recorder.record(1, &grid);

    let dir = env::temp_dir();
    let metrics_path = dir.join(format!("traffic_ca_{}_metrics.csv", std::process::id()));
    let log_path = dir.join(format!("traffic_ca_{}_trajectories.csv", std::process::id()));

    recorder.export_step_metrics(&metrics_path).unwrap();
    recorder.export_vehicle_log(&log_path).unwrap();

    let metrics = fs::read_to_string(&metrics_path).unwrap();
    assert_eq!(
        metrics,
        "step,carsExited,avgSpeed,carsWaiting\n0,0,1.0000,0\n1,1,0.0000,0\n"
    );

    let log = fs::read_to_string(&log_path).unwrap();
    assert_eq!(log, "vehicle_id,step,x,y,velocity,waiting\n1,0,9,0,1,0\n");

    let _ = fs::remove_file(&metrics_path);
    let _ = fs::remove_file(&log_path);
}

#[test]
fn test_velocity_colormap_endpoints() {
    assert_eq!(velocity_color(0, 3, Colormap::Turbo), TURBO_SRGB[0]);
    assert_eq!(velocity_color(3, 3, Colormap::Turbo), TURBO_SRGB[255]);
    // Degenerate vmax and missing tables fall back to black.
    assert_eq!(velocity_color(2, 0, Colormap::Turbo), [0, 0, 0]);
    assert_eq!(velocity_color(2, 3, Colormap::Magma), [0, 0, 0]);
}

#[test]
fn test_id_colors_are_stable_and_distinct() {
    assert_eq!(id_color(7), id_color(7));
    assert_ne!(id_color(7), id_color(8));
}

#[test]
fn test_frame_pixel_priorities() {
    let timing = LightTiming {
        red: 3,
        yellow: 1,
        green: 4,
    };
    let mut grid = Grid::new(2, 2);
    grid.cell_mut(0, 0).light = Some(TrafficLight::new(timing));
    grid.cell_mut(1, 0).car = Some(car(1, 3, Direction::Right));
    grid.cell_mut(0, 1).is_road = true;

    let path = env::temp_dir().join(format!("traffic_ca_{}_frame.ppm", std::process::id()));
    write_frame(&grid, &path, &style()).unwrap();
    let bytes = fs::read(&path).unwrap();
    let _ = fs::remove_file(&path);

    let header = b"P6\n2 2\n255\n";
    assert_eq!(&bytes[..header.len()], header);
    let body = &bytes[header.len()..];
    assert_eq!(body.len(), 12);
    // Red light, car at full speed, bare road, empty background.
    assert_eq!(&body[0..3], &[255, 0, 0]);
    assert_eq!(&body[3..6], &TURBO_SRGB[255]);
    assert_eq!(&body[6..9], &[0, 0, 0]);
    assert_eq!(&body[9..12], &[50, 50, 50]);
}

#[test]
fn test_interpolated_frame_blends_positions() {
    let mut prev = Grid::new(4, 1);
    prev.cell_mut(0, 0).car = Some(car(1, 3, Direction::Right));
    let mut next = Grid::new(4, 1);
    next.cell_mut(2, 0).car = Some(car(1, 3, Direction::Right));

    let path = env::temp_dir().join(format!("traffic_ca_{}_interp.ppm", std::process::id()));
    write_frame_interpolated(&prev, &next, 0.5, &path, &style()).unwrap();
    let bytes = fs::read(&path).unwrap();
    let _ = fs::remove_file(&path);

    let header = b"P6\n4 1\n255\n";
    assert_eq!(&bytes[..header.len()], header);
    let body = &bytes[header.len()..];
    // The car renders halfway between its two positions; every other
    // cell is background.
    assert_eq!(&body[0..3], &[50, 50, 50]);
    assert_eq!(&body[3..6], &TURBO_SRGB[255]);
    assert_eq!(&body[6..9], &[50, 50, 50]);
    assert_eq!(&body[9..12], &[50, 50, 50]);
}
