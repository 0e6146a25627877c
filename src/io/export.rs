//! Export one series slice to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Change columns carry the resolved values; the `*_origin` columns say whether
//! a change came from the dataset or was derived here.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{PanelPoint, PctChange};
use crate::error::AppError;
use crate::snapshot::PointChanges;

const HEADER: [&str; 11] = [
    "date",
    "region",
    "segment",
    "metric",
    "value",
    "unit",
    "mom_pct",
    "mom_origin",
    "yoy_pct",
    "yoy_origin",
    "ma3",
];

/// Write a date-sorted slice and its resolved changes to a CSV file.
pub fn write_series_csv(path: &Path, points: &[&PanelPoint], changes: &[PointChanges]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    write_series_rows(&mut writer, points, changes)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), rows = points.len(), "wrote series export");
    Ok(())
}

/// Row writer shared by file and in-memory exports.
pub fn write_series_rows<W: Write>(
    writer: &mut csv::Writer<W>,
    points: &[&PanelPoint],
    changes: &[PointChanges],
) -> Result<(), csv::Error> {
    writer.write_record(HEADER)?;

    for (i, p) in points.iter().enumerate() {
        let (mom, yoy, ma3) = match changes.get(i) {
            Some(c) => (c.mom, c.yoy, c.ma3),
            None => (PctChange::Unavailable, PctChange::Unavailable, None),
        };
        writer.write_record([
            p.date.format("%Y-%m-%d").to_string(),
            p.region.clone(),
            p.segment.clone(),
            p.metric.clone(),
            opt_num(p.value),
            p.unit.tag().to_string(),
            opt_num(mom.value()),
            origin(mom).to_string(),
            opt_num(yoy.value()),
            origin(yoy).to_string(),
            opt_num(ma3),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn origin(change: PctChange) -> &'static str {
    match change {
        PctChange::Producer(_) => "dataset",
        PctChange::Derived(_) => "derived",
        PctChange::Unavailable => "",
    }
}
