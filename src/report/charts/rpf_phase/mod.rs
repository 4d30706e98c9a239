//! RPF length by phase chart, drawn by one of three interchangeable backends.

use crate::core::model::{PhaseByLength, RpfPlotTool};
use anyhow::Result;
use std::path::Path;

mod cartesian3d;
mod grouped;
mod isometric;

pub use cartesian3d::CartesianBars3d;
pub use grouped::GroupedBars;
pub use isometric::IsometricBars;

pub const FILE_NAME: &str = "rpf_phase.png";

/// Visualizes counts over (RPF length x phase) into a PNG at `path`.
pub trait RpfPhaseRenderer {
    fn name(&self) -> &'static str;
    fn render(&self, distr: &PhaseByLength, path: &Path) -> Result<()>;
}

pub fn renderer_for(tool: RpfPlotTool) -> Box<dyn RpfPhaseRenderer> {
    match tool {
        RpfPlotTool::Grouped2D => Box::new(GroupedBars),
        RpfPlotTool::Cartesian3D => Box::new(CartesianBars3d),
        RpfPlotTool::Isometric3D => Box::new(IsometricBars),
    }
}

const TERRAIN_STOPS: [(f64, [f64; 3]); 5] = [
    (0.0, [51.0, 51.0, 153.0]),
    (0.15, [0.0, 153.0, 255.0]),
    (0.25, [0.0, 204.0, 102.0]),
    (0.5, [255.0, 255.0, 153.0]),
    (0.75, [128.0, 92.0, 84.0]),
];

/// Colour of the `i`-th of `n` RPF lengths, walking the terrain ramp from
/// blue through green to sand.
pub(crate) fn length_color(i: usize, n: usize) -> (u8, u8, u8) {
    let t = if n <= 1 {
        0.0
    } else {
        0.72 * i as f64 / (n - 1) as f64
    };
    let mut lo = TERRAIN_STOPS[0];
    let mut hi = TERRAIN_STOPS[TERRAIN_STOPS.len() - 1];
    for w in TERRAIN_STOPS.windows(2) {
        if t >= w[0].0 && t <= w[1].0 {
            lo = w[0];
            hi = w[1];
            break;
        }
    }
    let span = (hi.0 - lo.0).max(1e-9);
    let f = ((t - lo.0) / span).clamp(0.0, 1.0);
    let mix = |c: usize| (lo.1[c] + (hi.1[c] - lo.1[c]) * f).round() as u8;
    (mix(0), mix(1), mix(2))
}
