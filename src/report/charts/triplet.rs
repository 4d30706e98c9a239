use super::svg::{self, PHASE_COLORS};
use crate::core::model::codon::{self, codons_by_amino_acid};
use crate::core::model::{PHASES, PhaseCounts, TripletDistribution};
use crate::report::group_thousands;
use anyhow::Result;
use std::f64::consts::{PI, TAU};
use std::fmt::Write as FmtWrite;
use std::path::Path;

pub const FILE_NAME: &str = "triplet_id.png";

const COLS: usize = 8;
const CELL_W: f64 = 230.0;
const CELL_H: f64 = 250.0;
const RADIUS: f64 = 72.0;
const HEADER: f64 = 70.0;

const START_COLOR: &str = "#00ff00";
const STOP_COLOR: &str = "#ff0000";

pub fn render(triplets: &TripletDistribution, path: &Path) -> Result<()> {
    svg::rasterize(&build_svg(triplets)?, path)
}

fn title_color(codon: &str) -> &'static str {
    if codon::is_start(codon) {
        START_COLOR
    } else if codon::is_stop(codon) {
        STOP_COLOR
    } else {
        "#000"
    }
}

pub(crate) fn build_svg(triplets: &TripletDistribution) -> Result<String> {
    let cells = codons_by_amino_acid();
    let rows = cells.len().div_ceil(COLS);
    let w = CELL_W * COLS as f64;
    let h = HEADER + CELL_H * rows as f64;
    let mut out = String::with_capacity(64 * 1024);
    svg::begin(&mut out, w, h)?;

    let entries: Vec<(&str, &str)> = PHASES
        .iter()
        .map(|p| p.label())
        .zip(PHASE_COLORS)
        .collect();
    svg::legend(&mut out, w - 150.0, 8.0, None, &entries, 12.0)?;

    let empty = PhaseCounts::default();
    for (i, (codon, aa)) in cells.iter().enumerate() {
        let cx = CELL_W * (i % COLS) as f64 + CELL_W / 2.0;
        let top = HEADER + CELL_H * (i / COLS) as f64;
        writeln!(out, "<g class=\"cell\">")?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"17\" font-weight=\"bold\" fill=\"{}\" text-anchor=\"middle\">{}: {}</text>",
            cx,
            top + 22.0,
            title_color(codon),
            codon,
            aa
        )?;
        let counts = triplets.get(codon).unwrap_or(&empty);
        pie(&mut out, cx, top + 40.0 + CELL_H / 2.0 - 10.0, counts)?;
        writeln!(out, "</g>")?;
    }

    svg::end(&mut out)?;
    Ok(out)
}

fn pie(out: &mut String, cx: f64, cy: f64, counts: &PhaseCounts) -> Result<()> {
    let total = counts.total();
    if total == 0 {
        writeln!(
            out,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"#999\"/>",
            cx, cy, RADIUS
        )?;
        return Ok(());
    }

    let point = |a: f64, r: f64| (cx + r * a.sin(), cy - r * a.cos());
    let mut start = 0.0;
    for phase in PHASES {
        let v = counts.get(phase);
        if v == 0 {
            continue;
        }
        let frac = v as f64 / total as f64;
        let end = start + frac * TAU;
        let color = PHASE_COLORS[phase.index()];
        if v == total {
            writeln!(
                out,
                "<circle class=\"slice\" cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\" stroke=\"#fff\"/>",
                cx, cy, RADIUS, color
            )?;
        } else {
            let (x0, y0) = point(start, RADIUS);
            let (x1, y1) = point(end, RADIUS);
            writeln!(
                out,
                "<path class=\"slice\" d=\"M{:.2},{:.2} L{:.2},{:.2} A{},{} 0 {} 1 {:.2},{:.2} Z\" fill=\"{}\" stroke=\"#fff\"/>",
                cx,
                cy,
                x0,
                y0,
                RADIUS,
                RADIUS,
                u8::from(end - start > PI),
                x1,
                y1,
                color
            )?;
        }

        let mid = (start + end) / 2.0;
        let (lx, ly) = point(mid, RADIUS * 0.6);
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#000\" text-anchor=\"middle\" dominant-baseline=\"middle\">{:.1}%</text>",
            lx,
            ly,
            frac * 100.0
        )?;
        let (ox, oy) = point(mid, RADIUS + 14.0);
        let anchor = if mid.sin() >= 0.0 { "start" } else { "end" };
        writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#333\" text-anchor=\"{}\" dominant-baseline=\"middle\">{}</text>",
            ox,
            oy,
            anchor,
            group_thousands(v)
        )?;
        start = end;
    }
    Ok(())
}
