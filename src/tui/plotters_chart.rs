//! Plotters-powered series chart widget for Ratatui.
//!
//! The chart fills its whole area with the plotting region (no Plotters label
//! areas): the category axis maps index `0` to the left column and the last
//! index to the right column, the same mapping [`PlotArea`] uses to turn mouse
//! columns back into indices. Tick labels are drawn by the caller around it.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//!
//! [`PlotArea`]: crate::selection::PlotArea

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Smallest area the chart draws into.
pub const MIN_WIDTH: u16 = 20;
pub const MIN_HEIGHT: u16 = 6;

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct PanelChart<'a> {
    /// Runs of consecutive observed `(index, value)` points; lines break between runs.
    pub segments: &'a [Vec<(f64, f64)>],
    /// X bounds in category-index space.
    pub x_bounds: [f64; 2],
    /// Y bounds from the axis scaler.
    pub y_bounds: [f64; 2],
    /// Horizontal grid lines.
    pub y_ticks: &'a [f64],
    /// Sorted `(lo, hi)` index range to highlight.
    pub highlight: Option<(usize, usize)>,
    /// Trend color for the highlighted part of the line.
    pub highlight_color: (u8, u8, u8),
}

impl<'a> Widget for PanelChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area; render a hint instead.
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root).margin(0).build_cartesian_2d(x0..x1, y0..y1)?;

            let grid_color = RGBColor(70, 70, 70);
            let line_color = RGBColor(0, 255, 255); // cyan
            let marker_color = RGBColor(255, 255, 0); // yellow
            let (r, g, b) = self.highlight_color;
            let highlight_color = RGBColor(r, g, b);

            // 1) Grid at the nice ticks.
            for &t in self.y_ticks {
                chart.draw_series(std::iter::once(PathElement::new(vec![(x0, t), (x1, t)], &grid_color)))?;
            }

            // 2) Range endpoints as vertical markers, under the line.
            if let Some((lo, hi)) = self.highlight {
                for x in [lo as f64, hi as f64] {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![(x, y0), (x, y1)],
                        &marker_color,
                    )))?;
                }
            }

            // 3) Series line, broken at gaps. Single-point runs get a dot.
            for run in self.segments {
                if run.len() == 1 {
                    chart.draw_series(run.iter().map(|&p| Pixel::new(p, line_color)))?;
                } else {
                    chart.draw_series(LineSeries::new(run.iter().copied(), &line_color))?;
                }
            }

            // 4) Highlighted part of the line, in the trend color.
            if let Some((lo, hi)) = self.highlight {
                let (lo, hi) = (lo as f64, hi as f64);
                for run in self.segments {
                    let inside: Vec<(f64, f64)> = run.iter().copied().filter(|&(x, _)| x >= lo && x <= hi).collect();
                    match inside.len() {
                        0 => {}
                        1 => {
                            chart.draw_series(inside.iter().map(|&p| Pixel::new(p, highlight_color)))?;
                        }
                        _ => {
                            chart.draw_series(LineSeries::new(inside.into_iter(), &highlight_color))?;
                        }
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// X bounds for `len` categories: index `0` to `len - 1`.
pub fn category_bounds(len: usize) -> [f64; 2] {
    [0.0, len.saturating_sub(1).max(1) as f64]
}
