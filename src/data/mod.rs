//! Dataset access.
//!
//! - `source`: where the bytes come from (HTTP host or local directory)
//! - `loader`: lenient/strict status and shape handling
//! - `fetch`: background loads with stale-result cancellation
//! - `sample`: deterministic synthetic datasets

pub mod fetch;
pub mod loader;
pub mod sample;
pub mod source;

pub use fetch::{CancelFlag, PendingLoad, Poll};
pub use loader::{LoadPolicy, Loader, decode_points};
pub use sample::{SampleConfig, generate_tab, write_sample_datasets};
pub use source::{DirSource, HttpSource, PanelSource, RawResponse};
