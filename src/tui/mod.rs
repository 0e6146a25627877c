//! Ratatui-based terminal dashboard.
//!
//! One tab per dataset. The header picks tab, region and segment; the cards
//! row shows latest-vs-previous snapshots; the chart plots one metric and
//! measures a range with a mouse drag. Datasets load on a worker thread so the
//! UI never blocks on the network.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, KeyCode,
        KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
};

use crate::axis::AxisBounds;
use crate::data::{LoadPolicy, Loader, PendingLoad, Poll};
use crate::domain::{ALL_SEGMENTS, KNOWN_REGIONS, PanelPoint, PrevPolicy, TabKey};
use crate::error::AppError;
use crate::selection::{CellPointer, ChartSeries, PlotArea, PointerKind, RangeSelector, SelectionState, Trend};
use crate::snapshot::available_segments;

mod plotters_chart;

use plotters_chart::{PanelChart, category_bounds};

/// Start the dashboard on `tab`, showing `region`.
pub fn run(loader: Loader, tab: TabKey, region: &str) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(loader, tab, region);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen, mouse capture) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, EnableFocusChange) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableFocusChange, DisableMouseCapture, LeaveAlternateScreen);
    }
}

struct App {
    loader: Loader,
    tab: TabKey,
    regions: Vec<String>,
    region_idx: usize,
    /// Segments present in the loaded dataset.
    segments: Vec<String>,
    segment_idx: usize,
    metric_idx: usize,
    policy: PrevPolicy,
    points: Vec<PanelPoint>,
    pending: Option<PendingLoad>,
    load_error: Option<String>,
    selector: RangeSelector,
    /// Where the chart was last drawn; mouse events resolve against it.
    plot_area: Option<PlotArea>,
    status: String,
}

impl App {
    fn new(loader: Loader, tab: TabKey, region: &str) -> Self {
        let mut regions: Vec<String> = KNOWN_REGIONS.iter().map(|r| r.to_string()).collect();
        let region_idx = match regions.iter().position(|r| r == region) {
            Some(i) => i,
            None => {
                regions.push(region.to_string());
                regions.len() - 1
            }
        };
        let mut app = Self {
            loader,
            tab,
            regions,
            region_idx,
            segments: vec![ALL_SEGMENTS.to_string()],
            segment_idx: 0,
            metric_idx: 0,
            policy: tab.default_prev_policy(),
            points: Vec::new(),
            pending: None,
            load_error: None,
            selector: RangeSelector::new(),
            plot_area: None,
            status: String::new(),
        };
        app.request_load();
        app
    }

    fn region(&self) -> &str {
        self.regions.get(self.region_idx).map(String::as_str).unwrap_or("canada")
    }

    fn segment(&self) -> &str {
        self.segments.get(self.segment_idx).map(String::as_str).unwrap_or(ALL_SEGMENTS)
    }

    fn metric(&self) -> &'static str {
        let metrics = self.tab.metrics();
        metrics.get(self.metric_idx).or(metrics.first()).copied().unwrap_or("")
    }

    /// Start loading the current tab. Any earlier request is cancelled so its
    /// result can't land on the wrong tab.
    fn request_load(&mut self) {
        if let Some(prev) = self.pending.take() {
            prev.cancel();
        }
        self.points.clear();
        self.load_error = None;
        self.selector.reset();
        self.pending = Some(PendingLoad::spawn(&self.loader, self.tab.key(), LoadPolicy::Lenient));
        self.status = format!("Loading {} from {}...", self.tab.key(), self.loader.describe());
        tracing::debug!(tab = %self.tab, "requested dataset");
    }

    /// Returns whether anything changed.
    fn poll_load(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        match pending.poll() {
            Poll::Pending => false,
            Poll::Ready(Ok(points)) => {
                self.status = format!("{}: {} observations", self.tab.key(), points.len());
                self.segments = available_segments(&points);
                self.segment_idx = 0;
                self.points = points;
                self.pending = None;
                self.selector.reset();
                true
            }
            Poll::Ready(Err(err)) => {
                tracing::warn!(tab = %self.tab, error = %err, "dataset load failed");
                self.load_error = Some(err.to_string());
                self.status = "Load failed (l to retry).".to_string();
                self.pending = None;
                true
            }
            Poll::Dropped => {
                self.pending = None;
                true
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_load() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Mouse(mouse) => {
                    if self.handle_mouse(mouse) {
                        needs_redraw = true;
                    }
                }
                Event::FocusLost => {
                    if self.selector.handle(crate::selection::PointerEvent::Leave) {
                        needs_redraw = true;
                    }
                }
                Event::Resize(_, _) => {
                    // Columns move; a half-finished drag would map to new indices.
                    self.selector.handle(crate::selection::PointerEvent::Leave);
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.prev()),
            KeyCode::Down | KeyCode::Char('j') => {
                self.metric_idx = cycle(self.metric_idx, self.tab.metrics().len(), 1);
                self.selector.reset();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.metric_idx = cycle(self.metric_idx, self.tab.metrics().len(), -1);
                self.selector.reset();
            }
            KeyCode::Char('r') => {
                self.region_idx = cycle(self.region_idx, self.regions.len(), 1);
                self.selector.reset();
                self.status = format!("region: {}", self.region());
            }
            KeyCode::Char('R') => {
                self.region_idx = cycle(self.region_idx, self.regions.len(), -1);
                self.selector.reset();
                self.status = format!("region: {}", self.region());
            }
            KeyCode::Char('s') => {
                self.segment_idx = cycle(self.segment_idx, self.segments.len(), 1);
                self.selector.reset();
                self.status = format!("segment: {}", self.segment());
            }
            KeyCode::Char('p') => {
                self.policy = self.policy.toggle();
                self.status = format!("previous value: {}", self.policy.display_name());
            }
            KeyCode::Char('c') | KeyCode::Esc => {
                if self.selector.clear() {
                    self.status = "Selection cleared.".to_string();
                }
            }
            KeyCode::Char('l') => self.request_load(),
            _ => {}
        }
        false
    }

    fn switch_tab(&mut self, tab: TabKey) {
        self.tab = tab;
        self.metric_idx = 0;
        self.policy = tab.default_prev_policy();
        self.request_load();
    }

    /// Returns whether the selection changed.
    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some(area) = self.plot_area else {
            return false;
        };
        let pointer = CellPointer {
            column: mouse.column,
            row: mouse.row,
        };
        let Some(kind) = pointer_kind(mouse.kind, area.contains(pointer)) else {
            return false;
        };
        self.selector.handle_raw(&area, kind, &pointer)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(6),
                Constraint::Min(0),
                Constraint::Length(4),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_cards(frame, chunks[1]);
        self.draw_chart(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled("panel", Style::default().fg(Color::Cyan)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let selected = TabKey::ALL.iter().position(|t| *t == self.tab).unwrap_or(0);
        let tabs = Tabs::new(TabKey::ALL.iter().map(|t| t.display_name()))
            .select(selected)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        frame.render_widget(tabs, rows[0]);

        let slice = Paragraph::new(Line::from(vec![
            Span::raw("region: "),
            Span::styled(self.region(), Style::default().fg(Color::Yellow)),
            Span::raw("  segment: "),
            Span::styled(self.segment(), Style::default().fg(Color::Yellow)),
            Span::raw("  metric: "),
            Span::styled(self.metric(), Style::default().fg(Color::Yellow)),
            Span::raw("  prev: "),
            Span::styled(self.policy.display_name(), Style::default().fg(Color::Yellow)),
        ]));
        frame.render_widget(slice, rows[1]);
    }

    fn draw_cards(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let metrics = self.tab.metrics();
        if metrics.is_empty() {
            return;
        }
        let snapshots = crate::snapshot::resolve(&self.points, self.region(), metrics, self.segment(), self.policy);

        let constraints: Vec<Constraint> = metrics
            .iter()
            .map(|_| Constraint::Ratio(1, metrics.len() as u32))
            .collect();
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (i, &metric) in metrics.iter().enumerate() {
            let focused = i == self.metric_idx;
            let border = if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let label = crate::report::metric_label(metric);
            let block = Block::default().borders(Borders::ALL).border_style(border).title(label);

            let text = match snapshots.iter().find(|s| s.metric == metric) {
                Some(snap) => {
                    let lines = crate::report::format_card(snap);
                    let trend = snap.abs_delta().map(Trend::of).unwrap_or(Trend::Flat);
                    let mut out: Vec<Line> = Vec::new();
                    if let Some(latest) = lines.get(1) {
                        out.push(Line::from(Span::styled(
                            latest.clone(),
                            Style::default().add_modifier(Modifier::BOLD),
                        )));
                    }
                    if let Some(change) = lines.get(2) {
                        out.push(Line::from(Span::styled(change.clone(), Style::default().fg(trend_color(trend)))));
                    }
                    Text::from(out)
                }
                None if self.pending.is_some() => Text::from(Span::styled("...", Style::default().fg(Color::DarkGray))),
                None => Text::from(Span::styled("not available", Style::default().fg(Color::DarkGray))),
            };
            frame.render_widget(Paragraph::new(text).block(block), cells[i]);
        }
    }

    fn draw_chart(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let metric = self.metric();
        let block = Block::default()
            .title(crate::report::metric_label(metric))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);
        self.plot_area = None;

        let series = ChartSeries::from_points(&self.points, metric, self.region(), self.segment());
        let (series, bounds) = match series.and_then(|s| s.value_bounds().map(|b| (s, b))) {
            Some(found) => found,
            None => {
                let msg = empty_state_message(self.pending.is_some(), self.load_error.as_deref(), metric);
                let style = if self.load_error.is_some() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default().fg(Color::Yellow)
                };
                frame.render_widget(Paragraph::new(msg).style(style).alignment(Alignment::Center), inner);
                return;
            }
        };

        let (chart_rect, insets) = chart_layout(inner);
        let plot_area = PlotArea {
            x: chart_rect.x,
            y: chart_rect.y,
            width: chart_rect.width,
            height: chart_rect.height,
            len: series.len(),
        };

        let segments: Vec<Vec<(f64, f64)>> = series
            .segments()
            .into_iter()
            .map(|run| run.into_iter().map(|(i, v)| (i as f64, v)).collect())
            .collect();
        let ticks = bounds.ticks();
        let highlight = self.selector.highlight_range();
        let trend = self
            .selector
            .summarize(&series.values)
            .map(|s| s.trend)
            .unwrap_or(Trend::Flat);

        let widget = PanelChart {
            segments: &segments,
            x_bounds: category_bounds(series.len()),
            y_bounds: bounds.as_array(),
            y_ticks: &ticks,
            highlight,
            highlight_color: match self.selector.state() {
                SelectionState::Selected { .. } => trend.rgb(),
                _ => (255, 255, 0),
            },
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, insets, &plot_area, &series, &bounds);
        }
        self.plot_area = Some(plot_area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ tab  ↑/↓ metric  r/R region  s segment  p prev  drag measure  c clear  l reload  q quit";
        let mut lines = vec![Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ])];

        let series = ChartSeries::from_points(&self.points, self.metric(), self.region(), self.segment());
        if let Some(series) = &series {
            lines.push(selection_line(&self.selector, series));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Map a crossterm mouse event onto a controller gesture.
///
/// Only the left button drives selection. A drag that leaves the plot area
/// counts as leaving the chart.
fn pointer_kind(kind: MouseEventKind, inside: bool) -> Option<PointerKind> {
    match kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerKind::Down),
        MouseEventKind::Drag(MouseButton::Left) if inside => Some(PointerKind::Move),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerKind::Leave),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerKind::Up),
        _ => None,
    }
}

fn selection_line<'a>(selector: &RangeSelector, series: &ChartSeries) -> Line<'a> {
    match selector.state() {
        SelectionState::Idle => Line::from(Span::styled(
            "Drag across the chart to measure a range.",
            Style::default().fg(Color::DarkGray),
        )),
        SelectionState::Dragging { start, end } => Line::from(Span::styled(
            format!("measuring {} → {}", date_label(series, start), date_label(series, end)),
            Style::default().fg(Color::Yellow),
        )),
        SelectionState::Selected { .. } => match selector.summarize(&series.values) {
            Some(summary) => Line::from(Span::styled(
                crate::report::format_selection_summary(&summary, series),
                Style::default().fg(trend_color(summary.trend)).add_modifier(Modifier::BOLD),
            )),
            None => Line::from(Span::styled(
                "Selected range has a missing endpoint.",
                Style::default().fg(Color::DarkGray),
            )),
        },
    }
}

fn trend_color(trend: Trend) -> Color {
    let (r, g, b) = trend.rgb();
    Color::Rgb(r, g, b)
}

fn date_label(series: &ChartSeries, index: usize) -> String {
    series
        .dates
        .get(index)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_else(|| index.to_string())
}

fn empty_state_message(loading: bool, error: Option<&str>, metric: &str) -> String {
    if loading {
        return "Loading...".to_string();
    }
    match error {
        Some(err) => format!("Failed to load data: {err}"),
        None => format!("No data for {metric} in this region/segment."),
    }
}

fn cycle(idx: usize, len: usize, step: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (idx as isize + step).rem_euclid(len as isize) as usize
}

/// Compact tick label: `1.2M`, `850k`, `4.5`.
fn fmt_axis_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.0}k", v / 1e3)
    } else {
        crate::plot::fmt_tick((v * 100.0).round() / 100.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 1,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    insets: AxisInsets,
    plot: &PlotArea,
    series: &ChartSeries,
    bounds: &AxisBounds,
) {
    let style = Style::default().fg(Color::Gray);
    let height = plot.height.saturating_sub(1);

    // Value ticks at the scaler's nice positions.
    for t in bounds.ticks() {
        let u = (t - bounds.min) / bounds.span();
        if !u.is_finite() {
            continue;
        }
        let y = plot.y + height - (f64::from(height) * u.clamp(0.0, 1.0)).round() as u16;
        let label = fmt_axis_value(t);
        let label_len = label.chars().count() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    // Date ticks: a handful of evenly spaced categories.
    let y = plot.y + plot.height;
    if y >= inner.y + inner.height {
        return;
    }
    let n = series.len();
    let ticks = 5usize.min(n);
    let mut last_end = 0u16;
    for i in 0..ticks {
        let index = if ticks <= 1 {
            0
        } else {
            (i * (n - 1) + (ticks - 1) / 2) / (ticks - 1)
        };
        let Some(col) = plot.column_of(index) else {
            continue;
        };
        let label = date_label(series, index);
        let label_len = label.chars().count() as u16;
        let start = col
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        if start < last_end {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
        last_end = start + label_len + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_button_drives_gestures() {
        assert_eq!(
            pointer_kind(MouseEventKind::Down(MouseButton::Left), true),
            Some(PointerKind::Down)
        );
        assert_eq!(
            pointer_kind(MouseEventKind::Drag(MouseButton::Left), true),
            Some(PointerKind::Move)
        );
        assert_eq!(pointer_kind(MouseEventKind::Up(MouseButton::Left), false), Some(PointerKind::Up));
        assert_eq!(pointer_kind(MouseEventKind::Down(MouseButton::Right), true), None);
        assert_eq!(pointer_kind(MouseEventKind::Moved, true), None);
    }

    #[test]
    fn dragging_off_the_plot_cancels() {
        let area = PlotArea {
            x: 10,
            y: 5,
            width: 21,
            height: 10,
            len: 3,
        };
        let mut sel = RangeSelector::new();
        let inside = CellPointer { column: 10, row: 6 };
        let outside = CellPointer { column: 40, row: 6 };

        sel.handle_raw(&area, PointerKind::Down, &inside);
        let kind = pointer_kind(MouseEventKind::Drag(MouseButton::Left), area.contains(outside)).unwrap();
        sel.handle_raw(&area, kind, &outside);
        assert_eq!(sel.state(), SelectionState::Idle);
    }

    #[test]
    fn cycling_wraps_both_ways() {
        assert_eq!(cycle(0, 3, -1), 2);
        assert_eq!(cycle(2, 3, 1), 0);
        assert_eq!(cycle(1, 3, 1), 2);
        assert_eq!(cycle(5, 0, 1), 0);
    }

    #[test]
    fn axis_labels_stay_compact() {
        assert_eq!(fmt_axis_value(2_500_000.0), "2.5M");
        assert_eq!(fmt_axis_value(850_000.0), "850k");
        assert_eq!(fmt_axis_value(4.5), "4.5");
        assert_eq!(fmt_axis_value(-1.25), "-1.25");
        assert_eq!(fmt_axis_value(3.0e9), "3.0B");
    }

    #[test]
    fn empty_state_explains_itself() {
        assert_eq!(empty_state_message(true, None, "sales"), "Loading...");
        assert_eq!(
            empty_state_message(false, Some("boom"), "sales"),
            "Failed to load data: boom"
        );
        assert_eq!(
            empty_state_message(false, None, "sales"),
            "No data for sales in this region/segment."
        );
    }

    #[test]
    fn chart_layout_reserves_axis_space() {
        let (rect, insets) = chart_layout(Rect::new(0, 0, 80, 20));
        assert!(insets.is_some());
        assert_eq!(rect, Rect::new(8, 1, 70, 18));

        let (rect, insets) = chart_layout(Rect::new(0, 0, 15, 4));
        assert!(insets.is_none());
        assert_eq!(rect, Rect::new(0, 0, 15, 4));
    }
}
