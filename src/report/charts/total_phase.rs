use super::svg::{self, Frame, PHASE_COLORS};
use crate::core::model::{PHASES, PhaseCounts};
use anyhow::Result;
use std::fmt::Write as FmtWrite;
use std::path::Path;

pub const FILE_NAME: &str = "tot_phase.png";

/// Default power of ten used on the y axis, shared by all reports so they
/// compare at a glance.
pub const DEFAULT_EXPONENT: i32 = 6;

pub fn render(counts: &PhaseCounts, exponent: i32, path: &Path) -> Result<()> {
    svg::rasterize(&build_svg(counts, exponent)?, path)
}

pub(crate) fn build_svg(counts: &PhaseCounts, exponent: i32) -> Result<String> {
    let f = Frame::new(640.0, 480.0);
    let scale = 10f64.powi(exponent);
    let mut out = String::with_capacity(8 * 1024);
    svg::begin(&mut out, f.w, f.h)?;
    svg::plot_area(&mut out, &f)?;
    let max_scaled = counts.max() as f64 / scale;
    let axis_max = svg::y_axis(&mut out, &f, max_scaled, 6)?;

    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\">1e{}</text>",
        f.left,
        f.top - 8.0,
        exponent
    )?;

    let slot = f.plot_w() / 3.0;
    let bar_w = slot * 0.8;
    for phase in PHASES {
        let i = phase.index();
        let v = counts.get(phase) as f64 / scale;
        let y = f.y_of(v, axis_max);
        let x = f.left + slot * i as f64 + (slot - bar_w) / 2.0;
        writeln!(
            out,
            "<rect class=\"bar\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            x,
            y,
            bar_w,
            f.top + f.plot_h() - y,
            PHASE_COLORS[i]
        )?;
        svg::x_label_at(&mut out, &f, f.left + slot * (i as f64 + 0.5), &i.to_string())?;
    }
    svg::axis_labels(&mut out, &f, "Phase", "Counts")?;
    svg::end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_bars_scaled_by_exponent() {
        let s = build_svg(&PhaseCounts([2_800_000, 1_000_000, 500_000]), 6).unwrap();
        assert_eq!(s.matches("class=\"bar\"").count(), 3);
        assert!(s.contains(">1e6<"));
        // axis labels are in units of 1e6
        assert!(s.contains(">3<"));
        assert!(!s.contains(">3000000<"));
    }

    fn tick_labels(svg: &str) -> Vec<String> {
        svg.lines()
            .filter(|l| l.contains("text-anchor=\"end\""))
            .filter_map(|l| l.split('>').nth(1))
            .map(|l| l.trim_end_matches("</text").to_string())
            .collect()
    }

    #[test]
    fn small_counts_keep_distinct_ticks() {
        let s = build_svg(&PhaseCounts([10, 20, 5]), 6).unwrap();
        let labels = tick_labels(&s);
        assert!(labels.len() >= 2, "{labels:?}");
        let mut uniq = labels.clone();
        uniq.sort();
        uniq.dedup();
        assert_eq!(uniq.len(), labels.len(), "{labels:?}");
        assert!(labels.contains(&"0.000005".to_string()), "{labels:?}");
    }

    #[test]
    fn writes_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(FILE_NAME);
        std::fs::write(&path, b"stale").unwrap();
        render(&PhaseCounts([10, 20, 5]), DEFAULT_EXPONENT, &path).unwrap();
        assert_eq!(&std::fs::read(&path).unwrap()[..4], b"\x89PNG");
    }
}
