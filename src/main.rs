use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use traffic_ca::simulation::{seed_density, JunctionConfig, NagelSchreckenberg};
use traffic_ca::stats::MetricsRecorder;
use traffic_ca::viz::{write_frame, write_frame_interpolated, Colormap, FrameStyle};

#[derive(Parser)]
#[command(name = "traffic_ca")]
#[command(about = "Cellular automaton simulation of a signalized four-way junction")]
struct Cli {
    /// Number of simulation steps to run
    #[arg(long, short = 's', default_value = "1000")]
    steps: usize,

    /// Width of the grid in cells
    #[arg(long, short = 'W', default_value = "100")]
    width: usize,

    /// Height of the grid in cells
    #[arg(long, short = 'H', default_value = "100")]
    height: usize,

    /// Maximum velocity in cells per step
    #[arg(long, default_value = "3")]
    vmax: u32,

    /// Probability of random braking per car per step
    #[arg(long, default_value = "0.3")]
    brake_prob: f64,

    /// Probability of a spawn point producing a car per step
    #[arg(long, default_value = "0.5")]
    spawn_prob: f64,

    /// Probability that a car from a regular lane intends to turn right
    #[arg(long, default_value = "0.4")]
    turn_prob: f64,

    /// Maximum number of cars on the grid at once
    #[arg(long, default_value = "100")]
    max_cars: usize,

    /// Number of inbound lanes per approach
    #[arg(long, default_value = "2")]
    lanes: usize,

    /// Whether approaches get a dedicated right-turn slip lane
    #[arg(long, default_value = "true", action = ArgAction::Set)]
    slip_lanes: bool,

    /// Initial car density on the road network (0 disables seeding)
    #[arg(long, default_value = "0.0")]
    density: f64,

    /// Seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Enable PPM visualization, optionally into the given directory
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "viz")]
    viz: Option<PathBuf>,

    /// Extra interpolated frames between steps for smooth playback
    #[arg(long, default_value = "0")]
    smooth: u32,

    /// Pixels per cell edge in exported frames
    #[arg(long, default_value = "4")]
    scale: usize,

    /// Colormap for car velocities (turbo, magma or viridis)
    #[arg(long, default_value = "turbo")]
    colormap: String,

    /// Color cars by id instead of velocity
    #[arg(long)]
    color_by_id: bool,

    /// Write CSV metrics, optionally into the given directory
    #[arg(long, num_args = 0..=1, default_missing_value = "data")]
    metrics: Option<PathBuf>,

    /// Also log every car's position each step (needs --metrics)
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let Some(colormap) = Colormap::from_name(&cli.colormap) else {
        bail!(
            "Unknown colormap '{}', expected turbo, magma or viridis",
            cli.colormap
        );
    };

    let mut config = JunctionConfig::standard(cli.width, cli.height);
    config.max_cars = cli.max_cars;
    config.spawn_probability = cli.spawn_prob;
    config.default_turn_probability = cli.turn_prob;
    for approach in [
        &mut config.north,
        &mut config.south,
        &mut config.east,
        &mut config.west,
    ] {
        approach.lanes = cli.lanes;
        approach.slip_lane = cli.slip_lanes;
    }
    let mut grid = config.build()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if cli.density > 0.0 {
        let seeded = seed_density(&mut grid, cli.density, cli.vmax, &mut rng);
        info!("Seeded {} cars at density {}", seeded, cli.density);
    }

    if let Some(dir) = &cli.viz {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create viz directory {}", dir.display()))?;
    }
    if let Some(dir) = &cli.metrics {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create metrics directory {}", dir.display()))?;
    }

    let style = FrameStyle {
        scale: cli.scale,
        vmax: cli.vmax,
        colormap,
        color_by_id: cli.color_by_id,
    };
    let rule = NagelSchreckenberg;
    let mut recorder = MetricsRecorder::new(cli.trace);
    let mut frame = 0usize;

    info!(
        "Running {} steps on a {}x{} grid (vmax {}, brake {:.2}, spawn {:.2})",
        cli.steps, cli.width, cli.height, cli.vmax, cli.brake_prob, cli.spawn_prob
    );

    for step in 0..cli.steps {
        // Keep the previous generation around only when interpolated
        // frames are wanted.
        let previous = if cli.viz.is_some() && cli.smooth > 0 {
            Some(grid.clone())
        } else {
            None
        };

        grid.step(&rule, cli.vmax, cli.brake_prob, &mut rng);
        recorder.record(step, &grid);

        if let Some(dir) = &cli.viz {
            if let Some(previous) = &previous {
                for sub in 1..=cli.smooth {
                    let t = sub as f64 / (cli.smooth + 1) as f64;
                    let path = dir.join(format!("frame_{:05}.ppm", frame));
                    write_frame_interpolated(previous, &grid, t, &path, &style)?;
                    frame += 1;
                }
            }
            let path = dir.join(format!("frame_{:05}.ppm", frame));
            write_frame(&grid, &path, &style)?;
            frame += 1;
        }

        if (step + 1) % 100 == 0 {
            info!(
                "Step {}: {} cars on the road, {} exited, average speed {:.2}",
                step + 1,
                grid.car_count(),
                grid.cars_retired(),
                grid.average_velocity()
            );
        }
    }

    recorder.print_summary(&grid);

    if let Some(dir) = &cli.metrics {
        let metrics_path = dir.join("timestep_metrics.csv");
        recorder.export_step_metrics(&metrics_path)?;
        info!("Wrote {}", metrics_path.display());
        if cli.trace {
            let trajectories_path = dir.join("vehicle_trajectories.csv");
            recorder.export_vehicle_log(&trajectories_path)?;
            info!("Wrote {}", trajectories_path.display());
        }
    }

    Ok(())
}
