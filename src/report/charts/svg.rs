use anyhow::{Result, anyhow};
use resvg::{tiny_skia, usvg};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Fill colours of the three phases, sampled from a terrain-like ramp.
pub const PHASE_COLORS: [&str; 3] = ["#3b5bb5", "#2fb36b", "#d9c77e"];
pub const PLOT_BG: &str = "#f2f2f2";
pub const FONT: &str = "Helvetica Neue,Helvetica,Arial,sans-serif";

/// Canvas with margins around a rectangular plot area.
#[derive(Clone, Copy, Debug)]
pub struct Frame {
    pub w: f64,
    pub h: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Frame {
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            w,
            h,
            left: 70.0,
            right: 20.0,
            top: 30.0,
            bottom: 50.0,
        }
    }

    pub fn with_right(mut self, right: f64) -> Self {
        self.right = right;
        self
    }

    pub fn plot_w(&self) -> f64 {
        self.w - self.left - self.right
    }

    pub fn plot_h(&self) -> f64 {
        self.h - self.top - self.bottom
    }

    /// Canvas y of a data value on a linear axis starting at zero.
    pub fn y_of(&self, v: f64, max_y: f64) -> f64 {
        let scale = if max_y <= 0.0 { 0.0 } else { self.plot_h() / max_y };
        self.top + self.plot_h() - v * scale
    }
}

pub fn begin(out: &mut String, w: f64, h: f64) -> Result<()> {
    writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"{}\">",
        w, h, w, h, FONT
    )?;
    writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"#fff\"/>",
        w, h
    )?;
    Ok(())
}

pub fn end(out: &mut String) -> Result<()> {
    writeln!(out, "</svg>")?;
    Ok(())
}

pub fn plot_area(out: &mut String, f: &Frame) -> Result<()> {
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        f.left,
        f.top,
        f.plot_w(),
        f.plot_h(),
        PLOT_BG
    )?;
    Ok(())
}

/// Horizontal grid lines with tick labels. Returns the axis maximum, rounded
/// up to the last tick.
pub fn y_axis(out: &mut String, f: &Frame, max_y: f64, ticks: usize) -> Result<f64> {
    let (start, step, count) = nice_ticks(0.0, max_y.max(1e-9), ticks);
    let axis_max = (start + step * (count - 1) as f64).max(1e-9);
    for i in 0..count {
        let v = start + step * i as f64;
        let y = f.y_of(v, axis_max);
        writeln!(
            out,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#fff\" stroke-width=\"1.5\"/>",
            f.left,
            y,
            f.left + f.plot_w(),
            y
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            f.left - 6.0,
            y,
            fmt_tick_step(v, step)
        )?;
    }
    Ok(axis_max)
}

pub fn x_label_at(out: &mut String, f: &Frame, x: f64, label: &str) -> Result<()> {
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"#444\" text-anchor=\"middle\" dominant-baseline=\"hanging\">{}</text>",
        x,
        f.top + f.plot_h() + 6.0,
        escape(label)
    )?;
    Ok(())
}

pub fn axis_labels(out: &mut String, f: &Frame, x_label: &str, y_label: &str) -> Result<()> {
    let x = f.left + f.plot_w() / 2.0;
    let y = f.top + f.plot_h() + 38.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"#222\" text-anchor=\"middle\">{}</text>",
        x,
        y,
        escape(x_label)
    )?;
    let yx = f.left - 48.0;
    let yy = f.top + f.plot_h() / 2.0;
    writeln!(
        out,
        "<text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"#222\" text-anchor=\"middle\" transform=\"rotate(-90 {} {})\">{}</text>",
        yx,
        yy,
        yx,
        yy,
        escape(y_label)
    )?;
    Ok(())
}

/// Boxed legend with one swatch per entry.
pub fn legend(
    out: &mut String,
    x: f64,
    y: f64,
    title: Option<&str>,
    entries: &[(&str, &str)],
    font_size: f64,
) -> Result<()> {
    let row = font_size * 1.6;
    let title_rows = if title.is_some() { 1.0 } else { 0.0 };
    let height = row * (entries.len() as f64 + title_rows) + font_size * 0.6;
    let width = font_size * 6.5;
    writeln!(
        out,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#fff\" stroke=\"#bbb\"/>",
        x, y, width, height
    )?;
    let mut cy = y + font_size * 0.3;
    if let Some(t) = title {
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"#222\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
            x + width / 2.0,
            cy + row / 2.0,
            font_size,
            escape(t)
        )?;
        cy += row;
    }
    for (label, color) in entries {
        writeln!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            x + font_size * 0.5,
            cy + row * 0.2,
            font_size * 1.4,
            row * 0.6,
            color
        )?;
        writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"#222\" dominant-baseline=\"middle\">{}</text>",
            x + font_size * 2.3,
            cy + row / 2.0,
            font_size,
            escape(label)
        )?;
        cy += row;
    }
    Ok(())
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn fmt_tick(v: f64) -> String {
    if (v - v.round()).abs() < 0.001 {
        format!("{}", v.round() as i64)
    } else if v.abs() < 10.0 {
        format!("{:.2}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Formats a tick with as many decimals as the tick spacing needs, so
/// neighbouring ticks never collapse into the same label.
pub fn fmt_tick_step(v: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    };
    format!("{:.*}", decimals, v)
}

pub fn nice_ticks(min: f64, max: f64, ticks: usize) -> (f64, f64, usize) {
    let range = (max - min).abs().max(1e-9);
    let rough = range / (ticks.max(2) as f64 - 1.0);
    let mag = 10f64.powf(rough.abs().log10().floor());
    let norm = rough / mag;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    } * mag;
    let start = (min / step).floor() * step;
    let end = (max / step).ceil() * step;
    let count = ((end - start) / step).round() as usize + 1;
    (start, step, count)
}

/// Rasterizes an SVG document to a PNG file, replacing any existing file.
pub fn rasterize(svg: &str, path: &Path) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|e| anyhow!("usvg parse failed: {e}"))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow!("invalid canvas {}x{}", size.width(), size.height()))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .save_png(path)
        .map_err(|e| anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(())
}
