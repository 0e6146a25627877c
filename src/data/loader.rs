//! Dataset loading with the two failure policies the dashboard needs.
//!
//! - `load_lenient`: "not published yet" is fine. 404 and shape failures come
//!   back as an empty dataset; anything else is an error for the view.
//! - `load_strict`: every non-2xx (404 included) and every shape failure is an
//!   error the caller renders.
//!
//! There is no retry and no cache; each call re-fetches.

use std::sync::Arc;

use serde_json::Value;

use crate::data::source::PanelSource;
use crate::domain::{PanelPoint, UnitScales};
use crate::error::LoadError;

/// How a load treats missing or malformed datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Clone)]
pub struct Loader {
    source: Arc<dyn PanelSource>,
    scales: UnitScales,
}

impl Loader {
    pub fn new(source: Arc<dyn PanelSource>) -> Self {
        Self {
            source,
            scales: UnitScales::default(),
        }
    }

    pub fn with_unit_scales(mut self, scales: UnitScales) -> Self {
        self.scales = scales;
        self
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn load(&self, key: &str, policy: LoadPolicy) -> Result<Vec<PanelPoint>, LoadError> {
        match policy {
            LoadPolicy::Lenient => self.load_lenient(key),
            LoadPolicy::Strict => self.load_strict(key),
        }
    }

    pub fn load_strict(&self, key: &str) -> Result<Vec<PanelPoint>, LoadError> {
        let resp = self.source.fetch(key)?;
        if !resp.is_success() {
            return Err(LoadError::Status { status: resp.status });
        }
        let mut points = decode_points(&resp.body)?;
        self.scales.apply(&mut points);
        tracing::debug!(key, n = points.len(), "dataset loaded");
        Ok(points)
    }

    pub fn load_lenient(&self, key: &str) -> Result<Vec<PanelPoint>, LoadError> {
        match self.load_strict(key) {
            Ok(points) => Ok(points),
            Err(err) if err.is_not_found() => {
                tracing::debug!(key, "dataset not published yet");
                Ok(Vec::new())
            }
            Err(err) if err.is_shape_failure() => {
                tracing::warn!(key, error = %err, "ignoring malformed dataset");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Decode a dataset body. Only a JSON array is accepted.
pub fn decode_points(body: &str) -> Result<Vec<PanelPoint>, LoadError> {
    let value: Value = serde_json::from_str(body).map_err(|e| LoadError::Decode {
        message: format!("payload is not JSON: {e}"),
    })?;
    let Value::Array(items) = value else {
        return Err(LoadError::InvalidShape);
    };

    let mut points = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let point: PanelPoint = serde_json::from_value(item).map_err(|e| LoadError::Decode {
            message: format!("record {idx}: {e}"),
        })?;
        points.push(point);
    }
    Ok(points)
}
