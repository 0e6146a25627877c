//! `panel-dash` library crate.
//!
//! The binary (`panel`) is a thin wrapper around this library so that:
//!
//! - the time-series engine (snapshots, axis scaling, range selection) is
//!   testable without a terminal
//! - the dashboard and the print commands share one implementation
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod axis;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod selection;
pub mod snapshot;
pub mod tui;
