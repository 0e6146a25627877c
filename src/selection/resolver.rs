//! Mapping pointer coordinates to category indices.

/// Capability the controller needs from a rendering surface: "which data
/// index is under this pointer event, if any?"
pub trait IndexResolver<E> {
    fn resolve_index(&self, event: &E) -> Option<usize>;
}

/// Pointer position in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPointer {
    pub column: u16,
    pub row: u16,
}

/// Where a series was drawn, in terminal cells, and how many categories it has.
///
/// Categories are spread evenly across the width: index 0 at the left edge,
/// the last index at the right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub len: usize,
}

impl PlotArea {
    pub fn contains(&self, p: CellPointer) -> bool {
        p.column >= self.x
            && p.column < self.x.saturating_add(self.width)
            && p.row >= self.y
            && p.row < self.y.saturating_add(self.height)
    }

    /// Nearest category index for a column inside the area.
    pub fn index_at_column(&self, column: u16) -> Option<usize> {
        if self.len == 0 || self.width == 0 {
            return None;
        }
        if column < self.x || column >= self.x.saturating_add(self.width) {
            return None;
        }
        if self.len == 1 || self.width == 1 {
            return Some(0);
        }
        let u = f64::from(column - self.x) / f64::from(self.width - 1);
        let idx = (u * (self.len - 1) as f64).round() as usize;
        Some(idx.min(self.len - 1))
    }

    /// Column where category `index` is drawn.
    pub fn column_of(&self, index: usize) -> Option<u16> {
        if index >= self.len || self.width == 0 {
            return None;
        }
        if self.len == 1 {
            return Some(self.x);
        }
        let u = index as f64 / (self.len - 1) as f64;
        Some(self.x + (u * f64::from(self.width - 1)).round() as u16)
    }
}

impl IndexResolver<CellPointer> for PlotArea {
    fn resolve_index(&self, event: &CellPointer) -> Option<usize> {
        if !self.contains(*event) {
            return None;
        }
        self.index_at_column(event.column)
    }
}
