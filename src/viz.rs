//! PPM frame rendering
//!
//! Renders the grid into binary P6 frames, one pixel block per cell.
//! Cars color by velocity through a colormap (or by a stable id hash),
//! traffic lights override whatever occupies their cell, roads draw
//! black and everything off the network draws dark gray.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::simulation::{Car, Grid, LightPhase};

/// Velocity colormaps offered on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Turbo,
    Magma,
    Viridis,
}

impl Colormap {
    /// Parse a colormap name as given on the command line
    pub fn from_name(name: &str) -> Option<Colormap> {
        match name.to_ascii_lowercase().as_str() {
            "turbo" => Some(Colormap::Turbo),
            "magma" => Some(Colormap::Magma),
            "viridis" => Some(Colormap::Viridis),
            _ => None,
        }
    }
}

// Turbo colormap lookup table.
// Original source: Google AI Blog, 2019. Author: Anton Mikhailov.
// License: Apache 2.0 (https://www.apache.org/licenses/LICENSE-2.0)
#[rustfmt::skip]
pub const TURBO_SRGB: [[u8; 3]; 256] = [
    [48, 18, 59], [50, 21, 67], [51, 24, 74], [52, 27, 81], [53, 30, 88], [54, 33, 95], [55, 36, 102], [56, 39, 109],
    [57, 42, 115], [58, 45, 121], [59, 47, 128], [60, 50, 134], [61, 53, 139], [62, 56, 145], [63, 59, 151], [63, 62, 156],
    [64, 64, 162], [65, 67, 167], [65, 70, 172], [66, 73, 177], [66, 75, 181], [67, 78, 186], [68, 81, 191], [68, 84, 195],
    [68, 86, 199], [69, 89, 203], [69, 92, 207], [69, 94, 211], [70, 97, 214], [70, 100, 218], [70, 102, 221], [70, 105, 224],
    [70, 107, 227], [71, 110, 230], [71, 113, 233], [71, 115, 235], [71, 118, 238], [71, 120, 240], [71, 123, 242], [70, 125, 244],
    [70, 128, 246], [70, 130, 248], [70, 133, 250], [70, 135, 251], [69, 138, 252], [69, 140, 253], [68, 143, 254], [67, 145, 254],
    [66, 148, 255], [65, 150, 255], [64, 153, 255], [62, 155, 254], [61, 158, 254], [59, 160, 253], [58, 163, 252], [56, 165, 251],
    [55, 168, 250], [53, 171, 248], [51, 173, 247], [49, 175, 245], [47, 178, 244], [46, 180, 242], [44, 183, 240], [42, 185, 238],
    [40, 188, 235], [39, 190, 233], [37, 192, 231], [35, 195, 228], [34, 197, 226], [32, 199, 223], [31, 201, 221], [30, 203, 218],
    [28, 205, 216], [27, 208, 213], [26, 210, 210], [26, 212, 208], [25, 213, 205], [24, 215, 202], [24, 217, 200], [24, 219, 197],
    [24, 221, 194], [24, 222, 192], [24, 224, 189], [25, 226, 187], [25, 227, 185], [26, 228, 182], [28, 230, 180], [29, 231, 178],
    [31, 233, 175], [32, 234, 172], [34, 235, 170], [37, 236, 167], [39, 238, 164], [42, 239, 161], [44, 240, 158], [47, 241, 155],
    [50, 242, 152], [53, 243, 148], [56, 244, 145], [60, 245, 142], [63, 246, 138], [67, 247, 135], [70, 248, 132], [74, 248, 128],
    [78, 249, 125], [82, 250, 122], [85, 250, 118], [89, 251, 115], [93, 252, 111], [97, 252, 108], [101, 253, 105], [105, 253, 102],
    [109, 254, 98], [113, 254, 95], [117, 254, 92], [121, 254, 89], [125, 255, 86], [128, 255, 83], [132, 255, 81], [136, 255, 78],
    [139, 255, 75], [143, 255, 73], [146, 255, 71], [150, 254, 68], [153, 254, 66], [156, 254, 64], [159, 253, 63], [161, 253, 61],
    [164, 252, 60], [167, 252, 58], [169, 251, 57], [172, 251, 56], [175, 250, 55], [177, 249, 54], [180, 248, 54], [183, 247, 53],
    [185, 246, 53], [188, 245, 52], [190, 244, 52], [193, 243, 52], [195, 241, 52], [198, 240, 52], [200, 239, 52], [203, 237, 52],
    [205, 236, 52], [208, 234, 52], [210, 233, 53], [212, 231, 53], [215, 229, 53], [217, 228, 54], [219, 226, 54], [221, 224, 55],
    [223, 223, 55], [225, 221, 55], [227, 219, 56], [229, 217, 56], [231, 215, 57], [233, 213, 57], [235, 211, 57], [236, 209, 58],
    [238, 207, 58], [239, 205, 58], [241, 203, 58], [242, 201, 58], [244, 199, 58], [245, 197, 58], [246, 195, 58], [247, 193, 58],
    [248, 190, 57], [249, 188, 57], [250, 186, 57], [251, 184, 56], [251, 182, 55], [252, 179, 54], [252, 177, 54], [253, 174, 53],
    [253, 172, 52], [254, 169, 51], [254, 167, 50], [254, 164, 49], [254, 161, 48], [254, 158, 47], [254, 155, 45], [254, 153, 44],
    [254, 150, 43], [254, 147, 42], [254, 144, 41], [253, 141, 39], [253, 138, 38], [252, 135, 37], [252, 132, 35], [251, 129, 34],
    [251, 126, 33], [250, 123, 31], [249, 120, 30], [249, 117, 29], [248, 114, 28], [247, 111, 26], [246, 108, 25], [245, 105, 24],
    [244, 102, 23], [243, 99, 21], [242, 96, 20], [241, 93, 19], [240, 91, 18], [239, 88, 17], [237, 85, 16], [236, 83, 15],
    [235, 80, 14], [234, 78, 13], [232, 75, 12], [231, 73, 12], [229, 71, 11], [228, 69, 10], [226, 67, 10], [225, 65, 9],
    [223, 63, 8], [221, 61, 8], [220, 59, 7], [218, 57, 7], [216, 55, 6], [214, 53, 6], [212, 51, 5], [210, 49, 5],
    [208, 47, 5], [206, 45, 4], [204, 43, 4], [202, 42, 4], [200, 40, 3], [197, 38, 3], [195, 37, 3], [193, 35, 2],
    [190, 33, 2], [188, 32, 2], [185, 30, 2], [183, 29, 2], [180, 27, 1], [178, 26, 1], [175, 24, 1], [172, 23, 1],
    [169, 22, 1], [167, 20, 1], [164, 19, 1], [161, 18, 1], [158, 16, 1], [155, 15, 1], [152, 14, 1], [149, 13, 1],
    [146, 11, 1], [142, 10, 1], [139, 9, 2], [136, 8, 2], [133, 7, 2], [129, 6, 2], [126, 5, 2], [122, 4, 3],
];

/// Map a velocity in [0, vmax] onto a colormap entry
pub fn velocity_color(velocity: u32, vmax: u32, colormap: Colormap) -> [u8; 3] {
    if vmax == 0 {
        return [0, 0, 0];
    }
    let index = ((velocity as f64 / vmax as f64) * 255.0) as usize;
    match colormap {
        Colormap::Turbo => TURBO_SRGB[index.min(255)],
        // Magma and viridis are accepted but render black, matching
        // the reference exporter.
        Colormap::Magma | Colormap::Viridis => [0, 0, 0],
    }
}

/// Stable per-car color from a Knuth multiplicative hash of the id
pub fn id_color(id: usize) -> [u8; 3] {
    let hue = (id as u32).wrapping_mul(2_654_435_761) % 360;
    hsv_to_rgb(hue as f64, 0.85, 0.90)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [u8; 3] {
    let c = value * saturation;
    let sector = hue / 60.0;
    let x = c * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = value - c;
    let (r, g, b) = if sector < 1.0 {
        (c, x, 0.0)
    } else if sector < 2.0 {
        (x, c, 0.0)
    } else if sector < 3.0 {
        (0.0, c, x)
    } else if sector < 4.0 {
        (0.0, x, c)
    } else if sector < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}

fn light_color(phase: LightPhase) -> [u8; 3] {
    match phase {
        LightPhase::Red => [255, 0, 0],
        LightPhase::Yellow => [255, 255, 0],
        LightPhase::Green => [0, 255, 0],
    }
}

fn car_color(car: &Car, style: &FrameStyle) -> [u8; 3] {
    if style.color_by_id {
        id_color(car.id.0)
    } else {
        velocity_color(car.velocity, style.vmax, style.colormap)
    }
}

/// Rendering options shared by every frame of a run
#[derive(Debug, Clone, Copy)]
pub struct FrameStyle {
    /// Pixels per cell edge
    pub scale: usize,
    /// Velocity that maps to the top of the colormap
    pub vmax: u32,
    pub colormap: Colormap,
    /// Color cars by id hash instead of velocity
    pub color_by_id: bool,
}

impl Default for FrameStyle {
    fn default() -> Self {
        FrameStyle {
            scale: 4,
            vmax: 3,
            colormap: Colormap::Turbo,
            color_by_id: false,
        }
    }
}

/// Write one frame as a binary P6 image
pub fn write_frame(grid: &Grid, path: &Path, style: &FrameStyle) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create frame {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let width = grid.width() * style.scale;
    let height = grid.height() * style.scale;
    write!(writer, "P6\n{} {}\n255\n", width, height)?;
    let mut row = Vec::with_capacity(width * 3);
    for py in 0..height {
        row.clear();
        for px in 0..width {
            let cell = grid.cell(px / style.scale, py / style.scale);
            let rgb = if let Some(light) = cell.light {
                light_color(light.phase)
            } else if let Some(car) = &cell.car {
                car_color(car, style)
            } else if cell.turn.is_some() || cell.is_spawn_point || cell.is_road {
                [0, 0, 0]
            } else {
                [50, 50, 50]
            };
            row.extend_from_slice(&rgb);
        }
        writer.write_all(&row)?;
    }
    Ok(())
}

/// Write an in-between frame blending car positions between two generations
///
/// Cars are matched by id and drawn at the linear interpolation of their
/// two positions at fraction `t`; a car present in only one generation is
/// omitted. Lights and car colors come from the earlier generation. The
/// road itself is not drawn, only lights and cars stand out from the
/// background in smooth playback.
pub fn write_frame_interpolated(
    prev: &Grid,
    next: &Grid,
    t: f64,
    path: &Path,
    style: &FrameStyle,
) -> Result<()> {
    let mut previous_positions = HashMap::new();
    for ((x, y), car) in prev.cars() {
        previous_positions.insert(car.id, (x, y, *car));
    }
    let mut car_at: HashMap<(usize, usize), Car> = HashMap::new();
    for ((next_x, next_y), next_car) in next.cars() {
        let Some(&(prev_x, prev_y, car)) = previous_positions.get(&next_car.id) else {
            continue;
        };
        let ix = prev_x as f64 + t * (next_x as f64 - prev_x as f64);
        let iy = prev_y as f64 + t * (next_y as f64 - prev_y as f64);
        let fx = (ix.round() as usize).min(prev.width() - 1);
        let fy = (iy.round() as usize).min(prev.height() - 1);
        car_at.insert((fx, fy), car);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create frame {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let width = prev.width() * style.scale;
    let height = prev.height() * style.scale;
    write!(writer, "P6\n{} {}\n255\n", width, height)?;
    let mut row = Vec::with_capacity(width * 3);
    for py in 0..height {
        row.clear();
        for px in 0..width {
            let x = px / style.scale;
            let y = py / style.scale;
            let rgb = if let Some(light) = prev.cell(x, y).light {
                light_color(light.phase)
            } else if let Some(car) = car_at.get(&(x, y)) {
                car_color(car, style)
            } else {
                [50, 50, 50]
            };
            row.extend_from_slice(&rgb);
        }
        writer.write_all(&row)?;
    }
    Ok(())
}
