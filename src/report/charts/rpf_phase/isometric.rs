use super::{RpfPhaseRenderer, length_color};
use crate::core::model::{PHASES, PhaseByLength};
use crate::report::charts::svg;
use anyhow::{Result, bail};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Isometric bar scene drawn as vector graphics and rasterized. Counts are
/// expressed in units of 10^k, where k is the order of magnitude of the
/// mean count.
pub struct IsometricBars;

impl RpfPhaseRenderer for IsometricBars {
    fn name(&self) -> &'static str {
        "mayavi"
    }

    fn render(&self, distr: &PhaseByLength, path: &Path) -> Result<()> {
        svg::rasterize(&build_svg(distr)?, path)
    }
}

const HALF_BAR: f64 = 0.25;
const WALL_HEIGHT: f64 = 360.0;
const MARGIN: f64 = 90.0;

/// Screen basis: phase axis runs right-down, length axis left-down.
struct Projection {
    origin: (f64, f64),
    phase: (f64, f64),
    length: (f64, f64),
    unit: f64,
}

impl Projection {
    fn at(&self, p: f64, l: f64, h: f64) -> (f64, f64) {
        (
            self.origin.0 + p * self.phase.0 + l * self.length.0,
            self.origin.1 + p * self.phase.1 + l * self.length.1 - h * self.unit,
        )
    }
}

pub(crate) fn order_of_magnitude(mean: f64) -> i32 {
    if mean <= 0.0 {
        0
    } else {
        mean.log10().floor() as i32
    }
}

pub(crate) fn build_svg(distr: &PhaseByLength) -> Result<String> {
    let n = distr.len();
    if n == 0 {
        bail!("no RPF lengths to plot");
    }
    let order = order_of_magnitude(distr.mean_count());
    let scale = 10f64.powi(order);
    let axis_max = (distr.max_count() as f64 / scale).ceil().max(1.0);

    let phase = (110.0, 45.0);
    let length = (-46.0, 24.0);
    let w = MARGIN * 2.0 + 3.0 * phase.0 + n as f64 * -length.0 + 80.0;
    let h = MARGIN * 2.0 + WALL_HEIGHT + 3.0 * phase.1 + n as f64 * length.1 + 40.0;
    let proj = Projection {
        origin: (MARGIN + 80.0 + n as f64 * -length.0, MARGIN + WALL_HEIGHT),
        phase,
        length,
        unit: WALL_HEIGHT / axis_max,
    };

    let mut out = String::with_capacity(32 * 1024);
    svg::begin(&mut out, w, h)?;

    let (p0, p1) = (-0.5, 2.5);
    let (l0, l1) = (-0.5, n as f64 - 0.5);
    // floor, back wall (along phase), side wall (along length)
    polygon(
        &mut out,
        &[proj.at(p0, l0, 0.0), proj.at(p1, l0, 0.0), proj.at(p1, l1, 0.0), proj.at(p0, l1, 0.0)],
        "#ffffff",
        "#999",
    )?;
    polygon(
        &mut out,
        &[proj.at(p0, l0, 0.0), proj.at(p1, l0, 0.0), proj.at(p1, l0, axis_max), proj.at(p0, l0, axis_max)],
        "#ffffff",
        "#999",
    )?;
    polygon(
        &mut out,
        &[proj.at(p0, l0, 0.0), proj.at(p0, l1, 0.0), proj.at(p0, l1, axis_max), proj.at(p0, l0, axis_max)],
        "#ffffff",
        "#999",
    )?;

    let step = if axis_max > 10.0 { (axis_max / 5.0).ceil() } else { 2.0 };
    let mut k = 0.0;
    while k <= axis_max {
        line(&mut out, proj.at(p0, l1, k), proj.at(p0, l0, k), "#bbb")?;
        line(&mut out, proj.at(p0, l0, k), proj.at(p1, l0, k), "#bbb")?;
        let (tx, ty) = proj.at(p0, l1, k);
        text(&mut out, tx - 8.0, ty, "end", 13.0, &svg::fmt_tick(k))?;
        k += step;
    }

    for p in PHASES {
        let x = p.index() as f64;
        line(&mut out, proj.at(x, l0, 0.0), proj.at(x, l1, 0.0), "#ddd")?;
        let (tx, ty) = proj.at(x, l1 + 0.9, 0.0);
        text(&mut out, tx, ty, "middle", 14.0, &p.index().to_string())?;
    }
    let lengths: Vec<u32> = distr.lengths().collect();
    for (j, len) in lengths.iter().enumerate() {
        let l = j as f64;
        line(&mut out, proj.at(p0, l, 0.0), proj.at(p1, l, 0.0), "#ddd")?;
        let (tx, ty) = proj.at(p1 + 0.25, l, 0.0);
        text(&mut out, tx, ty + 4.0, "start", 13.0, &len.to_string())?;
    }

    let (ax, ay) = proj.at(1.0, l1 + 1.8, 0.0);
    text(&mut out, ax, ay, "middle", 16.0, "Phase")?;
    let (bx, by) = proj.at(p1 + 1.2, (n as f64 - 1.0) / 2.0, 0.0);
    text(&mut out, bx, by + 10.0, "start", 16.0, "RPF")?;
    let (cx, cy) = proj.at(p0, l1, axis_max);
    text(
        &mut out,
        cx - 8.0,
        cy - 24.0,
        "end",
        16.0,
        &format!("Counts (10^{})", order),
    )?;

    // painter's order: far bars first
    let mut bars: Vec<(usize, usize, f64)> = Vec::with_capacity(n * 3);
    for (j, (_, counts)) in distr.iter().enumerate() {
        for p in PHASES {
            bars.push((j, p.index(), counts.get(p) as f64 / scale));
        }
    }
    bars.sort_by_key(|(j, p, _)| (j + p, *p));
    for (j, p, height) in bars {
        cuboid(&mut out, &proj, p as f64, j as f64, height, length_color(j, n))?;
    }

    svg::end(&mut out)?;
    Ok(out)
}

fn cuboid(
    out: &mut String,
    proj: &Projection,
    p: f64,
    l: f64,
    height: f64,
    rgb: (u8, u8, u8),
) -> Result<()> {
    let (pa, pb) = (p - HALF_BAR, p + HALF_BAR);
    let (la, lb) = (l - HALF_BAR, l + HALF_BAR);
    let shade = |f: f64| {
        format!(
            "#{:02x}{:02x}{:02x}",
            (rgb.0 as f64 * f).min(255.0) as u8,
            (rgb.1 as f64 * f).min(255.0) as u8,
            (rgb.2 as f64 * f).min(255.0) as u8
        )
    };
    // face towards +phase
    polygon(
        out,
        &[proj.at(pb, la, 0.0), proj.at(pb, lb, 0.0), proj.at(pb, lb, height), proj.at(pb, la, height)],
        &shade(0.75),
        "#000",
    )?;
    // face towards +length
    polygon(
        out,
        &[proj.at(pa, lb, 0.0), proj.at(pb, lb, 0.0), proj.at(pb, lb, height), proj.at(pa, lb, height)],
        &shade(0.9),
        "#000",
    )?;
    writeln!(out, "<g class=\"bar\">")?;
    polygon(
        out,
        &[proj.at(pa, la, height), proj.at(pb, la, height), proj.at(pb, lb, height), proj.at(pa, lb, height)],
        &shade(1.0),
        "#000",
    )?;
    writeln!(out, "</g>")?;
    Ok(())
}

fn polygon(out: &mut String, pts: &[(f64, f64)], fill: &str, stroke: &str) -> Result<()> {
    let points: Vec<String> = pts.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect();
    writeln!(
        out,
        "<polygon points=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
        points.join(" "),
        fill,
        stroke
    )?;
    Ok(())
}

fn line(out: &mut String, a: (f64, f64), b: (f64, f64), stroke: &str) -> Result<()> {
    writeln!(
        out,
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\"/>",
        a.0, a.1, b.0, b.1, stroke
    )?;
    Ok(())
}

fn text(out: &mut String, x: f64, y: f64, anchor: &str, size: f64, s: &str) -> Result<()> {
    writeln!(
        out,
        "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"{}\" fill=\"#000\" text-anchor=\"{}\">{}</text>",
        x,
        y,
        size,
        anchor,
        svg::escape(s)
    )?;
    Ok(())
}
