//! Terminal plots for non-interactive output.

pub mod ascii;

pub use ascii::{fmt_tick, render_series_plot};
