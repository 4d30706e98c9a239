use super::{RpfPhaseRenderer, length_color};
use crate::core::model::{PHASES, PhaseByLength};
use anyhow::{Result, bail};
use plotters::prelude::*;
use std::path::Path;

/// 3D bar chart on a plotters cartesian grid: phase along x, counts up y,
/// RPF length along z.
pub struct CartesianBars3d;

const HALF_BAR: f64 = 0.25;

impl RpfPhaseRenderer for CartesianBars3d {
    fn name(&self) -> &'static str {
        "pyplot3D"
    }

    fn render(&self, distr: &PhaseByLength, path: &Path) -> Result<()> {
        let lengths: Vec<u32> = distr.lengths().collect();
        let (Some(&min_len), Some(&max_len)) = (lengths.first(), lengths.last()) else {
            bail!("no RPF lengths to plot");
        };
        let max_count = (distr.max_count() as f64).max(1.0);

        let root = BitMapBackend::new(path, (1400, 900)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(30)
            .caption(
                "RPF phase distribution (x: phase, y: counts, z: RPF length)",
                ("sans-serif", 28),
            )
            .build_cartesian_3d(
                -0.5f64..2.5f64,
                0f64..max_count * 1.05,
                (min_len as f64 - 0.5)..(max_len as f64 + 0.5),
            )?;
        chart.with_projection(|mut pb| {
            pb.yaw = 0.55;
            pb.pitch = 0.35;
            pb.scale = 0.85;
            pb.into_matrix()
        });

        let phase_fmt = |v: &f64| format!("{:.0}", v);
        let length_fmt = |v: &f64| format!("{:.0}", v);
        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.08))
            .max_light_lines(3)
            .x_labels(3)
            .z_labels(lengths.len().min(25))
            .x_formatter(&phase_fmt)
            .z_formatter(&length_fmt)
            .draw()?;

        let n = lengths.len();
        chart.draw_series(distr.iter().enumerate().flat_map(|(j, (length, counts))| {
            let (r, g, b) = length_color(j, n);
            let z = length as f64;
            PHASES.into_iter().map(move |phase| {
                let x = phase.index() as f64;
                let h = counts.get(phase) as f64;
                Cubiod::new(
                    [(x - HALF_BAR, 0.0, z - HALF_BAR), (x + HALF_BAR, h, z + HALF_BAR)],
                    RGBColor(r, g, b).filled(),
                    BLACK,
                )
            })
        }))?;

        root.present()?;
        Ok(())
    }
}
