//! Reporting utilities: unit-aware numbers, cards, summaries, series tables.

pub mod format;

pub use format::*;
