use super::RpfPhaseRenderer;
use crate::core::model::{PHASES, PhaseByLength};
use crate::report::charts::svg::{self, Frame, PHASE_COLORS};
use anyhow::{Result, bail};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Grouped 2D bars: one group per RPF length, one bar per phase.
pub struct GroupedBars;

impl RpfPhaseRenderer for GroupedBars {
    fn name(&self) -> &'static str {
        "grouped2D"
    }

    fn render(&self, distr: &PhaseByLength, path: &Path) -> Result<()> {
        svg::rasterize(&build_svg(distr)?, path)
    }
}

pub(crate) fn build_svg(distr: &PhaseByLength) -> Result<String> {
    let n = distr.len();
    if n == 0 {
        bail!("no RPF lengths to plot");
    }
    let width = (90.0 + 140.0 + 48.0 * n as f64).max(720.0);
    let f = Frame::new(width, 480.0).with_right(140.0);
    let mut out = String::with_capacity(16 * 1024);
    svg::begin(&mut out, f.w, f.h)?;
    svg::plot_area(&mut out, &f)?;
    let axis_max = svg::y_axis(&mut out, &f, distr.max_count() as f64, 6)?;

    let slot = f.plot_w() / n as f64;
    let bar_w = slot * 0.8 / 3.0;
    for (g, (length, counts)) in distr.iter().enumerate() {
        let x0 = f.left + slot * g as f64 + slot * 0.1;
        for phase in PHASES {
            let i = phase.index();
            let y = f.y_of(counts.get(phase) as f64, axis_max);
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
        svg::x_label_at(&mut out, &f, f.left + slot * (g as f64 + 0.5), &length.to_string())?;
    }

    svg::axis_labels(&mut out, &f, "RPF length", "Count")?;
    let entries: Vec<(&str, &str)> = ["0", "1", "2"]
        .into_iter()
        .zip(PHASE_COLORS)
        .collect();
    svg::legend(
        &mut out,
        f.left + f.plot_w() + 20.0,
        f.top + f.plot_h() / 2.0 - 50.0,
        Some("Phase"),
        &entries,
        13.0,
    )?;
    svg::end(&mut out)?;
    Ok(out)
}
