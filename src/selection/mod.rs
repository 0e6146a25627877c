//! Pointer-driven range measurement over a rendered series.
//!
//! The controller is a three-state machine owned by one chart:
//!
//! ```text
//!            down(i)              up(j), j != start
//!   Idle ─────────────▶ Dragging ───────────────────▶ Selected
//!    ▲   ◀─ up(start) ──┘  │  ▲                          │
//!    │   ◀─ leave ─────────┘  └──────── down(i) ─────────┘
//!    └──────────────────── clear / reset ────────────────┘
//! ```
//!
//! Pointer payloads never reach the controller directly: an [`IndexResolver`]
//! turns them into category indices, and anything that resolves to no index is
//! ignored.

pub mod resolver;
pub mod series;

pub use resolver::{CellPointer, IndexResolver, PlotArea};
pub use series::ChartSeries;

/// Selection state for one chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    /// Pointer held; `end` tracks the live position, nothing committed yet.
    Dragging { start: usize, end: usize },
    /// Committed range. `start`/`end` are in gesture order, not sorted.
    Selected { start: usize, end: usize },
}

/// Pointer gestures, after index resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down(Option<usize>),
    Move(Option<usize>),
    Up(Option<usize>),
    /// Pointer left the chart area.
    Leave,
}

/// Range-selection controller.
#[derive(Debug, Clone, Default)]
pub struct RangeSelector {
    state: SelectionState,
}

impl RangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Committed `(lo, hi)` range, sorted.
    pub fn selected_range(&self) -> Option<(usize, usize)> {
        match self.state {
            SelectionState::Selected { start, end } => Some((start.min(end), start.max(end))),
            _ => None,
        }
    }

    /// Range to highlight while rendering: the committed one, or the live drag.
    pub fn highlight_range(&self) -> Option<(usize, usize)> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Dragging { start, end } | SelectionState::Selected { start, end } => {
                Some((start.min(end), start.max(end)))
            }
        }
    }

    /// Resolve a raw pointer payload and apply it. Returns whether a redraw is
    /// needed.
    pub fn handle_raw<E, R>(&mut self, resolver: &R, kind: PointerKind, event: &E) -> bool
    where
        R: IndexResolver<E>,
    {
        let index = resolver.resolve_index(event);
        let event = match kind {
            PointerKind::Down => PointerEvent::Down(index),
            PointerKind::Move => PointerEvent::Move(index),
            PointerKind::Up => PointerEvent::Up(index),
            PointerKind::Leave => PointerEvent::Leave,
        };
        self.handle(event)
    }

    /// Apply one event. Returns whether the state changed.
    pub fn handle(&mut self, event: PointerEvent) -> bool {
        let next = match (self.state, event) {
            // Out-of-range coordinates are silent no-ops.
            (_, PointerEvent::Down(None) | PointerEvent::Move(None) | PointerEvent::Up(None)) => {
                return false;
            }
            (_, PointerEvent::Down(Some(i))) => SelectionState::Dragging { start: i, end: i },
            (SelectionState::Dragging { start, end }, PointerEvent::Move(Some(i))) => {
                if i == end {
                    return false;
                }
                SelectionState::Dragging { start, end: i }
            }
            (SelectionState::Dragging { start, .. }, PointerEvent::Up(Some(i))) => {
                if i == start {
                    SelectionState::Idle
                } else {
                    SelectionState::Selected { start, end: i }
                }
            }
            (SelectionState::Dragging { .. }, PointerEvent::Leave) => SelectionState::Idle,
            // Moves, releases and leaves outside a drag don't touch the state.
            (state, _) => state,
        };
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Explicit "clear" action.
    pub fn clear(&mut self) -> bool {
        let changed = self.state != SelectionState::Idle;
        self.state = SelectionState::Idle;
        changed
    }

    /// The rendered data changed; indices no longer mean anything.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// Summarize the committed range over `values` (indexed like the chart).
    ///
    /// `None` unless a range is selected, both indices are in range, and both
    /// endpoints have a value.
    pub fn summarize(&self, values: &[Option<f64>]) -> Option<SelectionSummary> {
        let (lo, hi) = self.selected_range()?;
        SelectionSummary::between(values, lo, hi)
    }
}

/// Which gesture a raw pointer payload represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

/// Direction of a measured change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Trend::Up
        } else if delta < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    /// Display color: green up, red down, gray flat.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Trend::Up => (0, 255, 0),
            Trend::Down => (255, 0, 0),
            Trend::Flat => (160, 160, 160),
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "■",
        }
    }
}

/// Measured change between two points of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionSummary {
    pub start_index: usize,
    pub end_index: usize,
    pub start_value: f64,
    pub end_value: f64,
    pub delta: f64,
    /// `None` when the start value is zero.
    pub pct: Option<f64>,
    pub trend: Trend,
}

impl SelectionSummary {
    /// Change from `values[lo]` to `values[hi]`; `lo`/`hi` are sorted first.
    pub fn between(values: &[Option<f64>], a: usize, b: usize) -> Option<Self> {
        let (lo, hi) = (a.min(b), a.max(b));
        let start_value = (*values.get(lo)?)?;
        let end_value = (*values.get(hi)?)?;
        let delta = end_value - start_value;
        let pct = (start_value != 0.0).then(|| delta / start_value.abs() * 100.0);
        Some(Self {
            start_index: lo,
            end_index: hi,
            start_value,
            end_value,
            delta,
            pct,
            trend: Trend::of(delta),
        })
    }

    /// Dates of the endpoints, when the summary came from `series`.
    pub fn date_labels(&self, series: &ChartSeries) -> Option<(String, String)> {
        let a = series.dates.get(self.start_index)?;
        let b = series.dates.get(self.end_index)?;
        Some((a.format("%Y-%m").to_string(), b.format("%Y-%m").to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: [Option<f64>; 7] = [
        Some(10.0),
        Some(11.0),
        Some(12.0),
        Some(9.0),
        None,
        Some(15.0),
        Some(0.0),
    ];

    fn drag(sel: &mut RangeSelector, from: usize, to: usize) {
        sel.handle(PointerEvent::Down(Some(from)));
        sel.handle(PointerEvent::Move(Some(to)));
        sel.handle(PointerEvent::Up(Some(to)));
    }

    #[test]
    fn drag_commits_a_selection_with_summary() {
        let mut sel = RangeSelector::new();
        assert!(sel.handle(PointerEvent::Down(Some(2))));
        assert_eq!(sel.state(), SelectionState::Dragging { start: 2, end: 2 });
        assert!(sel.handle(PointerEvent::Move(Some(5))));
        assert!(sel.handle(PointerEvent::Up(Some(5))));
        assert_eq!(sel.state(), SelectionState::Selected { start: 2, end: 5 });

        let s = sel.summarize(&VALUES).unwrap();
        assert_eq!(s.delta, 15.0 - 12.0);
        assert_eq!(s.pct, Some(25.0));
        assert_eq!(s.trend, Trend::Up);
        assert_eq!(s.trend.rgb(), (0, 255, 0));
    }

    #[test]
    fn click_without_movement_clears_selection() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 2, 5);
        assert!(sel.selected_range().is_some());

        sel.handle(PointerEvent::Down(Some(2)));
        sel.handle(PointerEvent::Up(Some(2)));
        assert_eq!(sel.state(), SelectionState::Idle);
        assert!(sel.summarize(&VALUES).is_none());
    }

    #[test]
    fn reverse_drag_measures_from_the_earlier_index() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 5, 2);
        assert_eq!(sel.state(), SelectionState::Selected { start: 5, end: 2 });
        assert_eq!(sel.selected_range(), Some((2, 5)));
        let s = sel.summarize(&VALUES).unwrap();
        assert_eq!((s.start_index, s.end_index), (2, 5));
        assert_eq!(s.delta, 3.0);
    }

    #[test]
    fn redundant_moves_do_not_request_redraws() {
        let mut sel = RangeSelector::new();
        sel.handle(PointerEvent::Down(Some(1)));
        assert!(sel.handle(PointerEvent::Move(Some(3))));
        assert!(!sel.handle(PointerEvent::Move(Some(3))));
        assert_eq!(sel.highlight_range(), Some((1, 3)));
    }

    #[test]
    fn leaving_mid_drag_abandons_it() {
        let mut sel = RangeSelector::new();
        sel.handle(PointerEvent::Down(Some(1)));
        sel.handle(PointerEvent::Move(Some(4)));
        assert!(sel.handle(PointerEvent::Leave));
        assert_eq!(sel.state(), SelectionState::Idle);

        // A release after leaving is not a drag anymore.
        assert!(!sel.handle(PointerEvent::Up(Some(4))));
        assert_eq!(sel.state(), SelectionState::Idle);
    }

    #[test]
    fn leave_keeps_a_committed_selection() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 0, 3);
        assert!(!sel.handle(PointerEvent::Leave));
        assert_eq!(sel.selected_range(), Some((0, 3)));
        assert!(sel.clear());
        assert!(!sel.clear());
    }

    #[test]
    fn unresolved_coordinates_are_ignored() {
        let mut sel = RangeSelector::new();
        assert!(!sel.handle(PointerEvent::Down(None)));
        assert_eq!(sel.state(), SelectionState::Idle);

        sel.handle(PointerEvent::Down(Some(1)));
        assert!(!sel.handle(PointerEvent::Move(None)));
        assert!(!sel.handle(PointerEvent::Up(None)));
        assert_eq!(sel.state(), SelectionState::Dragging { start: 1, end: 1 });
    }

    #[test]
    fn new_press_replaces_selection() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 0, 3);
        sel.handle(PointerEvent::Down(Some(5)));
        assert_eq!(sel.state(), SelectionState::Dragging { start: 5, end: 5 });
        assert_eq!(sel.selected_range(), None);
    }

    #[test]
    fn missing_endpoint_suppresses_summary() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 1, 4);
        assert_eq!(sel.selected_range(), Some((1, 4)));
        assert!(sel.summarize(&VALUES).is_none());

        drag(&mut sel, 1, 40);
        assert!(sel.summarize(&VALUES).is_none());
    }

    #[test]
    fn zero_start_has_no_percentage() {
        let s = SelectionSummary::between(&VALUES, 6, 5).unwrap();
        assert_eq!(s.start_index, 5);
        assert_eq!(s.delta, -15.0);
        assert_eq!(s.trend, Trend::Down);

        let from_zero = SelectionSummary::between(&[Some(0.0), Some(2.0)], 0, 1).unwrap();
        assert_eq!(from_zero.pct, None);
        assert_eq!(from_zero.trend, Trend::Up);

        let flat = SelectionSummary::between(&[Some(-4.0), Some(-4.0)], 0, 1).unwrap();
        assert_eq!(flat.trend, Trend::Flat);
        assert_eq!(flat.pct, Some(0.0));
    }

    #[test]
    fn reset_on_new_data() {
        let mut sel = RangeSelector::new();
        drag(&mut sel, 0, 2);
        sel.reset();
        assert_eq!(sel.state(), SelectionState::Idle);
    }
}
