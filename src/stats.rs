use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::simulation::Grid;

/// Aggregate measurements for one simulation step
#[derive(Debug, Clone, Copy)]
pub struct StepMetrics {
    pub step: usize,
    pub cars_exited: usize,
    pub average_speed: f64,
    pub cars_waiting: usize,
}

/// Position and speed of one car at one step
#[derive(Debug, Clone, Copy)]
pub struct VehicleLogEntry {
    pub vehicle_id: usize,
    pub step: usize,
    pub x: usize,
    pub y: usize,
    pub velocity: u32,
    pub waiting: bool,
}

/// Collects per-step metrics and, optionally, per-car trajectories
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    steps: Vec<StepMetrics>,
    vehicle_log: Vec<VehicleLogEntry>,
    last_retired: usize,
    trace: bool,
}

impl MetricsRecorder {
    /// Create a recorder; `trace` enables the per-car trajectory log
    pub fn new(trace: bool) -> Self {
        MetricsRecorder {
            trace,
            ..MetricsRecorder::default()
        }
    }

    /// Capture the grid state after a step has been applied
    pub fn record(&mut self, step: usize, grid: &Grid) {
        let cars_exited = grid.cars_retired() - self.last_retired;
        self.last_retired = grid.cars_retired();
        let cars_waiting = grid.cars().filter(|(_, car)| car.velocity == 0).count();
        self.steps.push(StepMetrics {
            step,
            cars_exited,
            average_speed: grid.average_velocity(),
            cars_waiting,
        });
        if self.trace {
            for ((x, y), car) in grid.cars() {
                self.vehicle_log.push(VehicleLogEntry {
                    vehicle_id: car.id.0,
                    step,
                    x,
                    y,
                    velocity: car.velocity,
                    waiting: car.velocity == 0,
                });
            }
        }
    }

    /// Recorded per-step metrics, in step order
    pub fn steps(&self) -> &[StepMetrics] {
        &self.steps
    }

    /// Recorded trajectory entries, empty unless tracing was enabled
    pub fn vehicle_log(&self) -> &[VehicleLogEntry] {
        &self.vehicle_log
    }

    /// Write the per-step metrics as CSV
    pub fn export_step_metrics(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create metrics file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "step,carsExited,avgSpeed,carsWaiting")?;
        for metrics in &self.steps {
            writeln!(
                writer,
                "{},{},{:.4},{}",
                metrics.step, metrics.cars_exited, metrics.average_speed, metrics.cars_waiting
            )?;
        }
        Ok(())
    }

    /// Write the per-car trajectory log as CSV
    pub fn export_vehicle_log(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create trajectory file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "vehicle_id,step,x,y,velocity,waiting")?;
        for entry in &self.vehicle_log {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                entry.vehicle_id,
                entry.step,
                entry.x,
                entry.y,
                entry.velocity,
                entry.waiting as u8
            )?;
        }
        Ok(())
    }

    /// Log the end-of-run summary
    pub fn print_summary(&self, grid: &Grid) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Steps recorded: {}", self.steps.len());
        info!("Total cars spawned: {}", grid.cars_spawned());
        info!("Total cars exited: {}", grid.cars_retired());
        info!("Cars still on the road: {}", grid.car_count());
        info!("Final average speed: {:.2}", grid.average_velocity());
        info!(
            "Completion rate: {:.1}%",
            if grid.cars_spawned() > 0 {
                (grid.cars_retired() as f64 / grid.cars_spawned() as f64) * 100.0
            } else {
                0.0
            }
        );
    }
}
