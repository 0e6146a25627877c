//! The date-sorted series a chart renders.

use chrono::NaiveDate;

use crate::axis::{AxisBounds, compute_bounds};
use crate::domain::{PanelPoint, Unit};
use crate::snapshot::{has_duplicate_dates, series_points};

/// One metric in one region/segment slice, ready for plotting.
///
/// Indices into `dates`/`values` are the chart's category indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub metric: String,
    pub unit: Unit,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Build the series for a slice.
    ///
    /// Periods without a value stay in the series as gaps. Returns `None` when
    /// the slice has no observed value at all, or when it holds several points
    /// per date (a wildcard `all` over per-segment data); callers render an
    /// empty state instead of an interactive chart.
    pub fn from_points(points: &[PanelPoint], metric: &str, region: &str, segment: &str) -> Option<Self> {
        let slice = series_points(points, region, metric, segment);
        if has_duplicate_dates(&slice) {
            tracing::warn!(metric, region, segment, "slice has several points per date; not charting it");
            return None;
        }
        let unit = slice.iter().find(|p| p.value.is_some())?.unit;
        Some(Self {
            metric: metric.to_string(),
            unit,
            dates: slice.iter().map(|p| p.date).collect(),
            values: slice.iter().map(|p| p.value).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(index, value)` pairs for observed points.
    pub fn observed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    /// Runs of consecutive observed points, for drawing lines that break at gaps.
    pub fn segments(&self) -> Vec<Vec<(usize, f64)>> {
        let mut out: Vec<Vec<(usize, f64)>> = Vec::new();
        let mut current = Vec::new();
        for (i, v) in self.values.iter().enumerate() {
            match v {
                Some(v) => current.push((i, *v)),
                None if !current.is_empty() => out.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }

    /// Nice value-axis bounds.
    ///
    /// Units with a natural zero floor are clamped there, unless the data
    /// itself dips below zero (a negative inflation print, say).
    pub fn value_bounds(&self) -> Option<AxisBounds> {
        let values: Vec<f64> = self.observed().map(|(_, v)| v).collect();
        let non_negative = values.iter().all(|v| *v >= 0.0);
        compute_bounds(&values, non_negative && has_zero_floor(self.unit))
    }
}

/// Units with a natural zero floor: rates, counts, indices and ratios.
///
/// CAD amounts are left out since balances and net flows can go negative.
pub fn has_zero_floor(unit: Unit) -> bool {
    matches!(unit, Unit::Pct | Unit::Count | Unit::Index | Unit::Ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ALL_SEGMENTS;

    fn pt(month: u32, value: Option<f64>) -> PanelPoint {
        PanelPoint {
            date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            region: "canada".to_string(),
            segment: ALL_SEGMENTS.to_string(),
            metric: "m".to_string(),
            value,
            unit: Unit::Count,
            source: String::new(),
            mom_pct: None,
            yoy_pct: None,
            ma3: None,
        }
    }

    #[test]
    fn empty_slice_has_no_series() {
        assert!(ChartSeries::from_points(&[], "m", "canada", ALL_SEGMENTS).is_none());
        assert!(ChartSeries::from_points(&[pt(1, None)], "m", "canada", ALL_SEGMENTS).is_none());
        assert!(ChartSeries::from_points(&[pt(1, Some(1.0))], "m", "on", ALL_SEGMENTS).is_none());
    }

    #[test]
    fn keeps_missing_periods_as_gaps() {
        let s = ChartSeries::from_points(&[pt(2, None), pt(1, Some(1.0)), pt(3, Some(3.0))], "m", "canada", ALL_SEGMENTS)
            .unwrap();
        assert_eq!(s.values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn negative_data_is_never_clamped() {
        let mut a = pt(1, Some(-2.0));
        a.unit = Unit::Pct;
        let mut b = pt(2, Some(3.0));
        b.unit = Unit::Pct;
        let s = ChartSeries::from_points(&[a, b], "m", "canada", ALL_SEGMENTS).unwrap();
        assert!(s.value_bounds().unwrap().min < -2.0);
    }

    #[test]
    fn sorts_by_date() {
        let s = ChartSeries::from_points(&[pt(3, Some(3.0)), pt(1, Some(1.0))], "m", "canada", ALL_SEGMENTS)
            .unwrap();
        assert_eq!(s.values, vec![Some(1.0), Some(3.0)]);
        assert_eq!(s.dates[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn segments_break_at_gaps() {
        let s = ChartSeries {
            metric: "m".to_string(),
            unit: Unit::Index,
            dates: Vec::new(),
            values: vec![Some(1.0), Some(2.0), None, Some(4.0), None],
        };
        assert_eq!(s.segments(), vec![vec![(0, 1.0), (1, 2.0)], vec![(3, 4.0)]]);
        assert_eq!(s.observed().count(), 3);
    }

    #[test]
    fn mixed_segment_slice_is_not_charted() {
        let seg = |month, segment: &str| PanelPoint { segment: segment.to_string(), ..pt(month, Some(1.0)) };
        let points = [seg(1, "condo"), seg(1, "freehold"), seg(2, "condo"), seg(2, "freehold")];
        assert!(ChartSeries::from_points(&points, "m", "canada", ALL_SEGMENTS).is_none());

        let condo = ChartSeries::from_points(&points, "m", "canada", "condo").unwrap();
        assert_eq!(condo.len(), 2);
    }

    #[test]
    fn sample_prices_chart_one_point_per_date() {
        use crate::data::{SampleConfig, generate_tab};
        use crate::domain::TabKey;
        use crate::snapshot::default_segment;

        let points = generate_tab(TabKey::Prices, &SampleConfig::default()).unwrap();
        let segment = default_segment(&points, "canada");
        let s = ChartSeries::from_points(&points, "hpi_benchmark", "canada", &segment).unwrap();
        assert_eq!(s.len(), 36);
        assert!(s.dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn count_series_is_clamped_at_zero() {
        let s = ChartSeries::from_points(&[pt(1, Some(1.0)), pt(2, Some(9.0))], "m", "canada", ALL_SEGMENTS)
            .unwrap();
        let b = s.value_bounds().unwrap();
        assert!(b.min >= 0.0);
        assert!(b.max > 9.0);
    }

    #[test]
    fn cad_series_keeps_its_own_floor() {
        let points: Vec<_> = [(1, 1.0), (2, 9.0)]
            .into_iter()
            .map(|(m, v)| PanelPoint { unit: Unit::Cad, ..pt(m, Some(v)) })
            .collect();
        let s = ChartSeries::from_points(&points, "m", "canada", ALL_SEGMENTS).unwrap();
        let b = s.value_bounds().unwrap();
        assert!(b.min < 0.0, "{b:?}");

        assert!(!has_zero_floor(Unit::Cad));
        assert!(!has_zero_floor(Unit::Other));
        assert!(has_zero_floor(Unit::Count));
    }
}
