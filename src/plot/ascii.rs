//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - series line: `-`, broken at missing periods
//! - observed points: `o`
//! - selected range: `*` between the endpoints, `[` and `]` at the endpoints

use crate::axis::AxisBounds;
use crate::selection::ChartSeries;

/// Render `series` into a `width` x `height` grid with a one-line header.
///
/// The category axis spans the full width; the value axis uses `bounds`.
pub fn render_series_plot(
    series: &ChartSeries,
    bounds: &AxisBounds,
    width: usize,
    height: usize,
    highlight: Option<(usize, usize)>,
) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let n = series.len();

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so markers overlay them.
    for run in series.segments() {
        let mut prev = None;
        for &(i, v) in &run {
            let x = map_x(i, n, width);
            let y = map_y(v, bounds.min, bounds.max, height);
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, x, y, '-');
            }
            prev = Some((x, y));
        }
    }

    for (i, v) in series.observed() {
        let x = map_x(i, n, width);
        let y = map_y(v, bounds.min, bounds.max, height);
        let ch = match highlight {
            Some((lo, _)) if i == lo => '[',
            Some((_, hi)) if i == hi => ']',
            Some((lo, hi)) if i > lo && i < hi => '*',
            _ => 'o',
        };
        grid[y][x] = ch;
    }

    let (first, last) = match (series.dates.first(), series.dates.last()) {
        (Some(a), Some(b)) => (a.format("%Y-%m").to_string(), b.format("%Y-%m").to_string()),
        _ => ("-".to_string(), "-".to_string()),
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} [{first} .. {last}] n={n} | y=[{}, {}] step={}\n",
        series.metric,
        fmt_tick(bounds.min),
        fmt_tick(bounds.max),
        fmt_tick(bounds.tick_interval),
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

/// Tick label without trailing zeros (`2`, `0.25`, `1500`).
pub fn fmt_tick(v: f64) -> String {
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let u = i as f64 / (n as f64 - 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::Unit;

    fn series(values: Vec<Option<f64>>) -> ChartSeries {
        let dates = (0..values.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap())
            .collect();
        ChartSeries {
            metric: "m".to_string(),
            unit: Unit::Index,
            dates,
            values,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let s = series(vec![Some(0.0), Some(10.0)]);
        let bounds = AxisBounds { min: 0.0, max: 10.0, tick_interval: 5.0 };
        let txt = render_series_plot(&s, &bounds, 10, 5, None);
        let expected = concat!(
            "Plot: m [2024-01 .. 2024-02] n=2 | y=[0, 10] step=5\n",
            "        -o\n",
            "      --\n",
            "    --\n",
            "  --\n",
            "o-\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn marks_selection_and_breaks_at_gaps() {
        let s = series(vec![Some(1.0), Some(1.0), None, Some(1.0), Some(1.0)]);
        let bounds = AxisBounds { min: 0.0, max: 2.0, tick_interval: 1.0 };
        let txt = render_series_plot(&s, &bounds, 10, 5, Some((1, 4)));
        let mid_row = txt.lines().nth(3).unwrap();
        assert_eq!(mid_row, "o-[    *-]");
    }

    #[test]
    fn tick_labels_drop_trailing_zeros() {
        assert_eq!(fmt_tick(2.0), "2");
        assert_eq!(fmt_tick(0.25), "0.25");
        assert_eq!(fmt_tick(-0.0), "0");
        assert_eq!(fmt_tick(1500.0), "1500");
    }
}
