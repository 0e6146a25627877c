//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - the observation record (`PanelPoint`) and its `Unit` tag
//! - derived views (`Snapshot`, `PctChange`) and the `PrevPolicy` switch
//! - the tab registry (`TabKey`) and per-metric `UnitScales`

pub mod types;

pub use types::*;
