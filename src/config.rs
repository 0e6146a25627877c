//! Where datasets come from, and how their levels are scaled.
//!
//! Resolution order: explicit CLI value, then `PANEL_DATA` (a `.env` file is
//! honored), then `data/processed`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data::{DirSource, HttpSource, Loader, PanelSource};
use crate::domain::UnitScales;
use crate::error::AppError;

pub const DATA_ENV_VAR: &str = "PANEL_DATA";
pub const DEFAULT_DATA_DIR: &str = "data/processed";

/// Dataset location: a dashboard host or a local directory of `{key}.json` files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    Http(String),
    Dir(PathBuf),
}

impl DataLocation {
    /// `http://` and `https://` values are hosts; everything else is a path.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::new(2, "Empty data location."));
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(Self::Http(raw.trim_end_matches('/').to_string()))
        } else {
            Ok(Self::Dir(PathBuf::from(raw)))
        }
    }
}

impl std::fmt::Display for DataLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(base) => write!(f, "{base}"),
            Self::Dir(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub location: DataLocation,
    pub unit_scales: UnitScales,
}

impl DataConfig {
    /// Resolve from CLI values, falling back to the environment.
    pub fn resolve(data: Option<&str>, unit_scales: Option<&Path>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let env_value = std::env::var(DATA_ENV_VAR).ok();
        Self::resolve_with(data, env_value.as_deref(), unit_scales)
    }

    /// Resolution without touching the process environment.
    pub fn resolve_with(
        data: Option<&str>,
        env_value: Option<&str>,
        unit_scales: Option<&Path>,
    ) -> Result<Self, AppError> {
        let raw = data
            .filter(|s| !s.trim().is_empty())
            .or(env_value.filter(|s| !s.trim().is_empty()))
            .unwrap_or(DEFAULT_DATA_DIR);
        let location = DataLocation::parse(raw)?;

        let unit_scales = match unit_scales {
            Some(path) => read_unit_scales(path)?,
            None => UnitScales::new(),
        };

        tracing::debug!(%location, scaled_metrics = !unit_scales.is_empty(), "resolved data config");
        Ok(Self { location, unit_scales })
    }

    /// Build the loader this configuration describes.
    pub fn loader(&self) -> Result<Loader, AppError> {
        let source: Arc<dyn PanelSource> = match &self.location {
            DataLocation::Http(base) => Arc::new(HttpSource::new(base.clone())?),
            DataLocation::Dir(dir) => Arc::new(DirSource::new(dir.clone())),
        };
        Ok(Loader::new(source).with_unit_scales(self.unit_scales.clone()))
    }
}

fn read_unit_scales(path: &Path) -> Result<UnitScales, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read unit scales '{}': {e}", path.display())))?;
    UnitScales::from_json(&text).map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "rejected unit scale table");
        AppError::new(2, format!("{}: {e}", path.display()))
    })
}
