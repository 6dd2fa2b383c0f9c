//! Road topology construction
//!
//! Builds a signalized four-way junction on an empty grid: one lane
//! strip per approach spanning the whole grid, spawn points on the
//! boundary edge of every inbound lane, traffic lights on the stop
//! line, right-turn markers on the junction-box corners and optional
//! dedicated slip lanes that bypass the signals.
//!
//! Traffic keeps to the right. Approaches are named after the edge
//! cars enter from, so the north approach travels down the grid and
//! its rightmost lane is the westernmost one.

use anyhow::{ensure, Result};
use log::warn;

use super::grid::Grid;
use super::light::{LightTiming, TrafficLight};
use super::types::{Direction, TurnMarker};

/// Turn-intent probability for the rightmost normal lane unless configured
pub const DEFAULT_TURN_PROBABILITY: f64 = 0.4;

/// Per-approach lane layout
#[derive(Debug, Clone, Copy)]
pub struct ApproachConfig {
    /// Number of parallel lanes, at least one
    pub lanes: usize,
    /// Whether to carve a dedicated right-turn lane beside the
    /// rightmost lane
    pub slip_lane: bool,
    /// Length of the slip lane before its bend; 0 runs it all the way
    /// from the grid boundary
    pub slip_offset: usize,
}

/// Design-time description of a junction
///
/// Consumed by [`JunctionConfig::build`], which validates the layout and
/// produces a ready [`Grid`]. North/south traffic shares one light
/// timing, east/west traffic the other; all lights start Red.
#[derive(Debug, Clone)]
pub struct JunctionConfig {
    pub width: usize,
    pub height: usize,
    pub north: ApproachConfig,
    pub south: ApproachConfig,
    pub east: ApproachConfig,
    pub west: ApproachConfig,
    pub ns_lights: LightTiming,
    pub ew_lights: LightTiming,
    pub max_cars: usize,
    pub spawn_probability: f64,
    pub default_turn_probability: f64,
}

impl JunctionConfig {
    /// Two lanes plus a slip lane on every approach, moderate traffic
    pub fn standard(width: usize, height: usize) -> Self {
        let approach = ApproachConfig {
            lanes: 2,
            slip_lane: true,
            slip_offset: 0,
        };
        let timing = LightTiming {
            red: 30,
            yellow: 5,
            green: 25,
        };
        Self {
            width,
            height,
            north: approach,
            south: approach,
            east: approach,
            west: approach,
            ns_lights: timing,
            ew_lights: timing,
            max_cars: 100,
            spawn_probability: 0.5,
            default_turn_probability: DEFAULT_TURN_PROBABILITY,
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.width >= 8 && self.height >= 8,
            "Grid {}x{} is too small for a junction",
            self.width,
            self.height
        );
        let approaches = [
            ("north", &self.north),
            ("south", &self.south),
            ("east", &self.east),
            ("west", &self.west),
        ];
        for (name, approach) in approaches {
            ensure!(
                approach.lanes >= 1,
                "The {} approach needs at least one lane",
                name
            );
        }
        let cx = self.width / 2;
        let cy = self.height / 2;
        ensure!(
            self.north.lanes + 2 <= cx,
            "North approach lanes do not fit between the center and the west edge"
        );
        ensure!(
            self.south.lanes + 2 <= self.width - cx,
            "South approach lanes do not fit between the center and the east edge"
        );
        ensure!(
            self.east.lanes + 2 <= cy,
            "East approach lanes do not fit between the center and the north edge"
        );
        ensure!(
            self.west.lanes + 2 <= self.height - cy,
            "West approach lanes do not fit between the center and the south edge"
        );
        for timing in [&self.ns_lights, &self.ew_lights] {
            ensure!(
                timing.red >= 1 && timing.yellow >= 1 && timing.green >= 1,
                "Light phase durations must be at least one tick"
            );
        }
        ensure!(
            (0.0..=1.0).contains(&self.spawn_probability),
            "Spawn probability must lie in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.default_turn_probability),
            "Turn probability must lie in [0, 1]"
        );
        Ok(())
    }

    /// Validate the layout and build the junction grid
    pub fn build(self) -> Result<Grid> {
        self.validate()?;

        let mut grid = Grid::new(self.width, self.height);
        grid.max_cars = self.max_cars;
        grid.spawn_probability = self.spawn_probability;
        grid.default_turn_probability = self.default_turn_probability;

        let cx = self.width / 2;
        let cy = self.height / 2;

        // Junction box footprint, shared by all four lane strips.
        let box_left = cx - self.north.lanes;
        let box_right = cx + self.south.lanes - 1;
        let box_top = cy - self.east.lanes;
        let box_bottom = cy + self.west.lanes - 1;

        // Lane strips span the whole grid so each approach also carries
        // the opposite approach's outbound traffic past the junction.
        for col in box_left..cx {
            mark_column(&mut grid, col, Direction::Down);
        }
        for col in cx..=box_right {
            mark_column(&mut grid, col, Direction::Up);
        }
        for row in box_top..cy {
            mark_row(&mut grid, row, Direction::Left);
        }
        for row in cy..=box_bottom {
            mark_row(&mut grid, row, Direction::Right);
        }

        // Spawn points on the boundary edge of every inbound lane. Only
        // the rightmost lane of each approach feeds turning traffic.
        for col in box_left..cx {
            let p = if col == box_left {
                self.default_turn_probability
            } else {
                0.0
            };
            mark_spawn(&mut grid, col, 0, p);
        }
        for col in cx..=box_right {
            let p = if col == box_right {
                self.default_turn_probability
            } else {
                0.0
            };
            mark_spawn(&mut grid, col, self.height - 1, p);
        }
        for row in box_top..cy {
            let p = if row == box_top {
                self.default_turn_probability
            } else {
                0.0
            };
            mark_spawn(&mut grid, self.width - 1, row, p);
        }
        for row in cy..=box_bottom {
            let p = if row == box_bottom {
                self.default_turn_probability
            } else {
                0.0
            };
            mark_spawn(&mut grid, 0, row, p);
        }

        // Traffic lights on the stop line, the last cell before the box.
        let north_stop = box_top - 1;
        let south_stop = box_bottom + 1;
        let east_stop = box_right + 1;
        let west_stop = box_left - 1;
        for col in box_left..cx {
            grid.cell_mut(col, north_stop).light = Some(TrafficLight::new(self.ns_lights));
        }
        for col in cx..=box_right {
            grid.cell_mut(col, south_stop).light = Some(TrafficLight::new(self.ns_lights));
        }
        for row in box_top..cy {
            grid.cell_mut(east_stop, row).light = Some(TrafficLight::new(self.ew_lights));
        }
        for row in cy..=box_bottom {
            grid.cell_mut(west_stop, row).light = Some(TrafficLight::new(self.ew_lights));
        }

        // Right-turn markers on the box corners. Each one sits on the
        // rightmost lane of its approach and redirects onto the crossing
        // street's outbound lane.
        set_marker(&mut grid, box_left, box_top, Direction::Left);
        set_marker(&mut grid, box_right, box_top, Direction::Up);
        set_marker(&mut grid, box_right, box_bottom, Direction::Right);
        set_marker(&mut grid, box_left, box_bottom, Direction::Down);

        // Slip lanes bend one cell outside the box corner, joining the
        // crossing street without entering the signalized area.
        if self.north.slip_lane {
            let bend = (box_left as i64 - 1, box_top as i64);
            let length = slip_length(self.north.slip_offset, bend.1);
            let origin = (bend.0, bend.1 - length as i64);
            carve_right_turn_lane(&mut grid, origin, Direction::Down, length);
        }
        if self.east.slip_lane {
            let bend = (box_right as i64, box_top as i64 - 1);
            let length = slip_length(self.east.slip_offset, self.width as i64 - 1 - bend.0);
            let origin = (bend.0 + length as i64, bend.1);
            carve_right_turn_lane(&mut grid, origin, Direction::Left, length);
        }
        if self.south.slip_lane {
            let bend = (box_right as i64 + 1, box_bottom as i64);
            let length = slip_length(self.south.slip_offset, self.height as i64 - 1 - bend.1);
            let origin = (bend.0, bend.1 + length as i64);
            carve_right_turn_lane(&mut grid, origin, Direction::Up, length);
        }
        if self.west.slip_lane {
            let bend = (box_left as i64, box_bottom as i64 + 1);
            let length = slip_length(self.west.slip_offset, bend.0);
            let origin = (bend.0 - length as i64, bend.1);
            carve_right_turn_lane(&mut grid, origin, Direction::Right, length);
        }

        Ok(grid)
    }
}

fn slip_length(configured: usize, to_edge: i64) -> usize {
    if configured == 0 {
        to_edge.max(0) as usize
    } else {
        configured
    }
}

/// Carve an L-shaped right-turn bypass onto an existing grid
///
/// The first arm runs `offset` cells from `origin` along `approach` to
/// the bend, which carries a marker redirecting 90 degrees clockwise.
/// The second arm continues in the turn direction and ends with a marker
/// pointing back along the approach. The origin becomes a turn-only
/// spawn point. Off-grid origins are skipped; arms are clipped at the
/// boundary.
pub fn carve_right_turn_lane(
    grid: &mut Grid,
    origin: (i64, i64),
    approach: Direction,
    offset: usize,
) {
    if !grid.in_bounds(origin.0, origin.1) {
        warn!(
            "Right-turn lane origin ({}, {}) lies off-grid, skipping",
            origin.0, origin.1
        );
        return;
    }

    let turn = approach.rotated_clockwise();
    let (ax, ay) = approach.offset();

    // Arm parallel to the approach, ending at the bend.
    let mut bend = origin;
    for i in 0..=offset {
        let x = origin.0 + ax * i as i64;
        let y = origin.1 + ay * i as i64;
        if !grid.in_bounds(x, y) {
            break;
        }
        mark_road(grid, x as usize, y as usize, approach);
        grid.turn_probabilities.insert((x as usize, y as usize), 1.0);
        bend = (x, y);
    }
    grid.cell_mut(bend.0 as usize, bend.1 as usize).turn = Some(TurnMarker { direction: turn });

    // Arm along the exit direction, clipped at the boundary.
    let (tx, ty) = turn.offset();
    let mut arm_end = None;
    for i in 1..=offset {
        let x = bend.0 + tx * i as i64;
        let y = bend.1 + ty * i as i64;
        if !grid.in_bounds(x, y) {
            break;
        }
        mark_road(grid, x as usize, y as usize, turn);
        grid.turn_probabilities.insert((x as usize, y as usize), 0.0);
        arm_end = Some((x as usize, y as usize));
    }
    if let Some((x, y)) = arm_end {
        grid.cell_mut(x, y).turn = Some(TurnMarker {
            direction: approach,
        });
    }

    let spawn = (origin.0 as usize, origin.1 as usize);
    grid.cell_mut(spawn.0, spawn.1).is_spawn_point = true;
}

/// Mark a cell as road and record its travel direction, downgrading the
/// entry to ambiguous when crossing lanes both claim the cell
fn mark_road(grid: &mut Grid, x: usize, y: usize, direction: Direction) {
    grid.cell_mut(x, y).is_road = true;
    grid.lane_directions
        .entry((x, y))
        .and_modify(|existing| {
            if *existing != Some(direction) {
                *existing = None;
            }
        })
        .or_insert(Some(direction));
}

fn mark_column(grid: &mut Grid, col: usize, direction: Direction) {
    for row in 0..grid.height() {
        mark_road(grid, col, row, direction);
    }
}

fn mark_row(grid: &mut Grid, row: usize, direction: Direction) {
    for col in 0..grid.width() {
        mark_road(grid, col, row, direction);
    }
}

fn mark_spawn(grid: &mut Grid, x: usize, y: usize, turn_probability: f64) {
    grid.cell_mut(x, y).is_spawn_point = true;
    grid.turn_probabilities.insert((x, y), turn_probability);
}

fn set_marker(grid: &mut Grid, x: usize, y: usize, direction: Direction) {
    grid.cell_mut(x, y).turn = Some(TurnMarker { direction });
}
