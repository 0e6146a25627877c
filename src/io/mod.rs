//! Input/output helpers.
//!
//! - series exports (CSV) (`export`)

pub mod export;

pub use export::*;
