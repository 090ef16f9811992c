//! Two-panel SVG dashboard: status breakdown bars on the left, required versus
//! projected-actual progress on the right.

use crate::classifier::StatusCounts;
use crate::error::Result;
use crate::paths;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const PANEL_WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 110.0;
const GRID_LINES: usize = 5;
const MAX_X_LABELS: usize = 30;

const BAR_COLOR: &str = "steelblue";
const REQUIRED_COLOR: &str = "gray";
const ACTUAL_COLOR: &str = "dodgerblue";

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardInput {
    pub epic_key: String,
    pub project_name: String,
    /// Already in display order.
    pub status_counts: StatusCounts,
    pub labels: Vec<String>,
    pub required: Vec<f64>,
    pub actual: Vec<f64>,
}

/// Plot area of one panel in absolute SVG coordinates.
struct Frame {
    x0: f64,
    y0: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn panel(index: usize) -> Self {
        Self {
            x0: index as f64 * PANEL_WIDTH + MARGIN_LEFT,
            y0: MARGIN_TOP,
            width: PANEL_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
        }
    }

    fn bottom(&self) -> f64 {
        self.y0 + self.height
    }

    fn center_x(&self) -> f64 {
        self.x0 + self.width / 2.0
    }

    /// SVG y for `value` on a 0..=`max` axis.
    fn y(&self, value: f64, max: f64) -> f64 {
        self.bottom() - value / max * self.height
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn fmt_num(v: f64) -> String {
    format!("{v:.1}")
}

fn axes(svg: &mut String, frame: &Frame, title: &str, x_label: &str, y_label: &str) {
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"18\" font-weight=\"bold\">{}</text>\n",
        fmt_num(frame.center_x()),
        fmt_num(frame.y0 - 25.0),
        escape(title)
    ));
    svg.push_str(&format!(
        "<line x1=\"{x0}\" y1=\"{y0}\" x2=\"{x0}\" y2=\"{y1}\" stroke=\"black\"/>\n\
         <line x1=\"{x0}\" y1=\"{y1}\" x2=\"{x1}\" y2=\"{y1}\" stroke=\"black\"/>\n",
        x0 = fmt_num(frame.x0),
        y0 = fmt_num(frame.y0),
        x1 = fmt_num(frame.x0 + frame.width),
        y1 = fmt_num(frame.bottom()),
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"14\">{}</text>\n",
        fmt_num(frame.center_x()),
        fmt_num(HEIGHT - 12.0),
        escape(x_label)
    ));
    let ly = frame.y0 + frame.height / 2.0;
    let lx = frame.x0 - 50.0;
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-size=\"14\" transform=\"rotate(-90 {x} {y})\">{}</text>\n",
        escape(y_label),
        x = fmt_num(lx),
        y = fmt_num(ly),
    ));
}

fn y_ticks(svg: &mut String, frame: &Frame, max: f64, grid: bool) {
    for i in 0..=GRID_LINES {
        let value = max * i as f64 / GRID_LINES as f64;
        let y = frame.y(value, max);
        if grid && i > 0 {
            svg.push_str(&format!(
                "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"#dddddd\"/>\n",
                fmt_num(frame.x0),
                fmt_num(frame.x0 + frame.width),
                y = fmt_num(y),
            ));
        }
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"11\">{}</text>\n",
            fmt_num(frame.x0 - 6.0),
            fmt_num(y + 4.0),
            fmt_num(value)
        ));
    }
}

fn status_panel(svg: &mut String, input: &DashboardInput) {
    let frame = Frame::panel(0);
    axes(
        svg,
        &frame,
        &format!("Status Breakdown for Epic {}", input.epic_key),
        "Status",
        "Count",
    );

    let max = input
        .status_counts
        .iter()
        .map(|(_, c)| c)
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    y_ticks(svg, &frame, max, false);

    let n = input.status_counts.len();
    if n == 0 {
        return;
    }
    let slot = frame.width / n as f64;
    let bar_width = slot * 0.6;
    for (i, (status, count)) in input.status_counts.iter().enumerate() {
        let cx = frame.x0 + slot * (i as f64 + 0.5);
        let top = frame.y(count as f64, max);
        svg.push_str(&format!(
            "<rect class=\"bar\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{BAR_COLOR}\"/>\n",
            fmt_num(cx - bar_width / 2.0),
            fmt_num(top),
            fmt_num(bar_width),
            fmt_num(frame.bottom() - top),
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"12\">{count}</text>\n",
            fmt_num(cx),
            fmt_num(top - 4.0),
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"11\">{}</text>\n",
            fmt_num(cx),
            fmt_num(frame.bottom() + 18.0),
            escape(status)
        ));
    }
}

fn polyline(points: &[(f64, f64)], color: &str, dashed: bool) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
        .collect();
    let dash = if dashed {
        " stroke-dasharray=\"6,4\""
    } else {
        ""
    };
    format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\"{dash}/>\n",
        coords.join(" ")
    )
}

fn velocity_panel(svg: &mut String, input: &DashboardInput) {
    let frame = Frame::panel(1);
    axes(
        svg,
        &frame,
        "Actual vs Required Velocity",
        "Working Days",
        "Cumulative Tickets Completed",
    );

    let max = input
        .required
        .iter()
        .chain(input.actual.iter())
        .copied()
        .fold(1.0_f64, f64::max);
    y_ticks(svg, &frame, max, true);

    let n = input.labels.len().max(input.required.len()).max(input.actual.len());
    let x = |i: usize| {
        if n <= 1 {
            frame.center_x()
        } else {
            frame.x0 + frame.width * i as f64 / (n - 1) as f64
        }
    };

    let stride = n.div_ceil(MAX_X_LABELS).max(1);
    for (i, label) in input.labels.iter().enumerate().step_by(stride) {
        let lx = x(i);
        let ly = frame.bottom() + 14.0;
        svg.push_str(&format!(
            "<text x=\"{x}\" y=\"{y}\" text-anchor=\"end\" font-size=\"10\" transform=\"rotate(-45 {x} {y})\">{}</text>\n",
            escape(label),
            x = fmt_num(lx),
            y = fmt_num(ly),
        ));
    }

    let required: Vec<(f64, f64)> = input
        .required
        .iter()
        .enumerate()
        .map(|(i, v)| (x(i), frame.y(*v, max)))
        .collect();
    let actual: Vec<(f64, f64)> = input
        .actual
        .iter()
        .enumerate()
        .map(|(i, v)| (x(i), frame.y(*v, max)))
        .collect();

    if !required.is_empty() {
        svg.push_str(&polyline(&required, REQUIRED_COLOR, true));
    }
    if !actual.is_empty() {
        svg.push_str(&polyline(&actual, ACTUAL_COLOR, false));
        for (px, py) in &actual {
            svg.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"3\" fill=\"{ACTUAL_COLOR}\"/>\n",
                fmt_num(*px),
                fmt_num(*py)
            ));
        }
    }

    // Legend
    let lx = frame.x0 + 15.0;
    let ly = frame.y0 + 15.0;
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"170\" height=\"48\" fill=\"white\" stroke=\"#cccccc\"/>\n",
        fmt_num(lx - 5.0),
        fmt_num(ly - 10.0),
    ));
    for (row, (label, color, dashed)) in [
        ("Required Velocity", REQUIRED_COLOR, true),
        ("Actual Progress", ACTUAL_COLOR, false),
    ]
    .into_iter()
    .enumerate()
    {
        let y = ly + row as f64 * 20.0;
        svg.push_str(&polyline(&[(lx, y), (lx + 30.0, y)], color, dashed));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\">{label}</text>\n",
            fmt_num(lx + 38.0),
            fmt_num(y + 4.0),
        ));
    }
}

/// Render the dashboard as a standalone SVG document.
pub fn render_svg(input: &DashboardInput) -> String {
    let width = PANEL_WIDTH * 2.0;
    let mut svg = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n\
         <title>{}</title>\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n",
        escape(&input.project_name),
        w = width,
        h = HEIGHT,
    );
    status_panel(&mut svg, input);
    velocity_panel(&mut svg, input);
    svg.push_str("</svg>\n");
    svg
}

/// Write `dashboard_<date>.svg` into `dir`, replacing any earlier file for
/// the same date.
pub fn write_dashboard(dir: &Path, date: NaiveDate, input: &DashboardInput) -> Result<PathBuf> {
    let path = dir.join(paths::dashboard_file_name(date));
    crate::io::atomic_write(&path, render_svg(input).as_bytes())?;
    tracing::debug!(path = %path.display(), "wrote dashboard");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
