use super::svg::{self, Frame, PHASE_COLORS};
use crate::core::model::{PHASES, PhasePosition};
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

pub const FILE_NAME: &str = "phase_relpos_distr.png";
pub const BINS: usize = 20;

/// Per-phase histograms of relative position over [0, 1].
pub type PhaseHistogram = [[u64; BINS]; 3];

/// Bins relative positions by phase. The last bin is closed on the right;
/// positions outside [0, 1] (or NaN) are dropped.
pub fn bin_relative_positions(positions: &[PhasePosition]) -> PhaseHistogram {
    let mut hist = [[0u64; BINS]; 3];
    for p in positions {
        let v = p.rel_position;
        if !(0.0..=1.0).contains(&v) {
            continue;
        }
        let bin = ((v * BINS as f64) as usize).min(BINS - 1);
        hist[p.phase.index()][bin] += 1;
    }
    hist
}

pub fn render(positions: &[PhasePosition], path: &Path) -> Result<()> {
    svg::rasterize(&build_svg(&bin_relative_positions(positions))?, path)
}

pub(crate) fn build_svg(hist: &PhaseHistogram) -> Result<String> {
    let f = Frame::new(900.0, 480.0).with_right(130.0);
    let mut out = String::with_capacity(16 * 1024);
    svg::begin(&mut out, f.w, f.h)?;
    svg::plot_area(&mut out, &f)?;
    let max = hist.iter().flatten().copied().max().unwrap_or(0);
    let axis_max = svg::y_axis(&mut out, &f, max as f64, 6)?;

    let slot = f.plot_w() / BINS as f64;
    let bar_w = slot * 0.85 / 3.0;
    for bin in 0..BINS {
        let x0 = f.left + slot * bin as f64 + slot * 0.075;
        for phase in PHASES {
            let i = phase.index();
            let y = f.y_of(hist[i][bin] as f64, axis_max);
            writeln!(
                out,
                "<rect class=\"bar\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                x0 + bar_w * i as f64,
                y,
                bar_w,
                f.top + f.plot_h() - y,
                PHASE_COLORS[i]
            )?;
        }
    }
    for tick in 0..=4 {
        let v = tick as f64 * 0.25;
        svg::x_label_at(&mut out, &f, f.left + f.plot_w() * v, &svg::fmt_tick(v))?;
    }

    svg::axis_labels(&mut out, &f, "Relative position in sequence", "Counts")?;
    let entries: Vec<(&str, &str)> = PHASES
        .iter()
        .map(|p| p.label())
        .zip(PHASE_COLORS)
        .collect();
    svg::legend(&mut out, f.left + f.plot_w() + 15.0, f.top + 10.0, None, &entries, 12.0)?;
    svg::end(&mut out)?;
    Ok(out)
}
