//! Latest/previous values for summary cards.
//!
//! For each requested metric: filter to the region/segment slice, sort by
//! date, take the last observation as `latest`, and pick `prev` according to a
//! [`PrevPolicy`]. Metrics without data are left out; rendering an explicit
//! "not available" card is the view's job.

use crate::domain::{ALL_SEGMENTS, KNOWN_SEGMENTS, PanelPoint, PctChange, PrevPolicy, Snapshot};

pub mod changes;

pub use changes::{PointChanges, resolve_changes};

/// Resolve one snapshot per metric, in `metrics` order.
pub fn resolve(
    points: &[PanelPoint],
    region: &str,
    metrics: &[&str],
    segment: &str,
    policy: PrevPolicy,
) -> Vec<Snapshot> {
    metrics
        .iter()
        .filter_map(|&metric| resolve_metric(points, region, metric, segment, policy))
        .collect()
}

/// `resolve` with the unsegmented slice and the adjacent-previous policy.
pub fn resolve_default(points: &[PanelPoint], region: &str, metrics: &[&str]) -> Vec<Snapshot> {
    resolve(points, region, metrics, ALL_SEGMENTS, PrevPolicy::Adjacent)
}

/// Every point of one metric in a slice, date-sorted, missing values included.
pub fn series_points<'a>(
    points: &'a [PanelPoint],
    region: &str,
    metric: &str,
    segment: &str,
) -> Vec<&'a PanelPoint> {
    let mut subset: Vec<&PanelPoint> = points
        .iter()
        .filter(|p| p.metric == metric && p.in_slice(region, segment))
        .collect();
    // Stable: equal dates keep dataset order.
    subset.sort_by_key(|p| p.date);
    subset
}

/// Date-sorted observations of one metric in a slice. Points without a value
/// are not observations and are skipped.
pub fn observations<'a>(
    points: &'a [PanelPoint],
    region: &str,
    metric: &str,
    segment: &str,
) -> Vec<&'a PanelPoint> {
    let mut subset = series_points(points, region, metric, segment);
    subset.retain(|p| p.value.is_some());
    subset
}

fn resolve_metric(
    points: &[PanelPoint],
    region: &str,
    metric: &str,
    segment: &str,
    policy: PrevPolicy,
) -> Option<Snapshot> {
    let subset = observations(points, region, metric, segment);
    if has_duplicate_dates(&subset) {
        tracing::warn!(metric, region, segment, "slice spans several segments; previous value may share the latest date");
    }
    let (latest, earlier) = subset.split_last()?;

    let adjacent = earlier.last();
    let prev = match policy {
        PrevPolicy::Adjacent => adjacent,
        PrevPolicy::LastDifferent => earlier.iter().rev().find(|p| p.value != latest.value),
    };
    let prev_is_adjacent = matches!((prev, adjacent), (Some(p), Some(a)) if std::ptr::eq(*p, *a));

    Some(Snapshot {
        metric: metric.to_string(),
        latest: (*latest).clone(),
        prev: prev.map(|p| (*p).clone()),
        prev_is_adjacent,
    })
}

/// True when a date-sorted slice holds more than one point for some date.
///
/// Only a wildcard `all` slice over per-segment data can do this.
pub fn has_duplicate_dates(slice: &[&PanelPoint]) -> bool {
    slice.windows(2).any(|w| w[0].date == w[1].date)
}

/// Distinct segments of a dataset, known codes first (`all` leading).
pub fn available_segments(points: &[PanelPoint]) -> Vec<String> {
    rank_segments(points.iter().map(|p| p.segment.as_str()))
}

/// The segment to show for `region` when none was asked for.
///
/// `all` when the data publishes it, else the highest-ranked segment present,
/// so a dataset split by housing type never gets mixed into one series.
pub fn default_segment(points: &[PanelPoint], region: &str) -> String {
    rank_segments(points.iter().filter(|p| p.region == region).map(|p| p.segment.as_str()))
        .into_iter()
        .next()
        .unwrap_or_else(|| ALL_SEGMENTS.to_string())
}

fn rank_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = segments.map(str::to_string).collect();
    out.sort_by_key(|s| {
        let rank = KNOWN_SEGMENTS.iter().position(|k| *k == s.as_str()).unwrap_or(KNOWN_SEGMENTS.len());
        (rank, s.clone())
    });
    out.dedup();
    if out.is_empty() {
        out.push(ALL_SEGMENTS.to_string());
    }
    out
}

impl Snapshot {
    pub fn latest_value(&self) -> Option<f64> {
        self.latest.value
    }

    pub fn prev_value(&self) -> Option<f64> {
        self.prev.as_ref().and_then(|p| p.value)
    }

    /// `latest - prev`, when both exist.
    pub fn abs_delta(&self) -> Option<f64> {
        Some(self.latest_value()? - self.prev_value()?)
    }

    /// Producer `mom_pct` first, else derived from `prev`, else unavailable.
    ///
    /// `mom_pct` is a lag-1 change, so it is only used while `prev` is the
    /// adjacent observation; a further-back `prev` always gets a derived figure.
    pub fn pct_delta(&self) -> PctChange {
        let producer = match self.prev {
            Some(_) if !self.prev_is_adjacent => None,
            _ => self.latest.mom_pct,
        };
        PctChange::resolve(producer, self.latest_value(), self.prev_value())
    }
}
