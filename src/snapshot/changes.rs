//! Period-over-period changes with producer-first precedence.
//!
//! The dataset pipeline usually ships `mom_pct`, `yoy_pct` and `ma3`. When a
//! field is missing we derive it from the sorted series; when that's not
//! possible either, it stays unavailable.

use crate::domain::{PanelPoint, PctChange};

/// Lag, in periods, used for year-over-year on monthly data.
pub const YOY_LAG: usize = 12;

/// Resolved change fields for one point of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointChanges {
    pub mom: PctChange,
    pub yoy: PctChange,
    pub ma3: Option<f64>,
}

/// Resolve change fields for every point of a date-sorted series.
///
/// Lags are positional, like the producer's: lag 1 is the previous element,
/// not "one calendar month earlier".
pub fn resolve_changes(series: &[&PanelPoint]) -> Vec<PointChanges> {
    series
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let lag = |k: usize| i.checked_sub(k).and_then(|j| series[j].value);
            PointChanges {
                mom: PctChange::resolve(p.mom_pct, p.value, lag(1)),
                yoy: PctChange::resolve(p.yoy_pct, p.value, lag(YOY_LAG)),
                ma3: p.ma3.or_else(|| trailing_mean(series, i, 3)),
            }
        })
        .collect()
}

fn trailing_mean(series: &[&PanelPoint], end: usize, window: usize) -> Option<f64> {
    let start = (end + 1).checked_sub(window)?;
    let values: Option<Vec<f64>> = series[start..=end].iter().map(|p| p.value).collect();
    let values = values?;
    Some(values.iter().sum::<f64>() / window as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{ALL_SEGMENTS, Unit};

    fn points(values: &[Option<f64>]) -> Vec<PanelPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| PanelPoint {
                date: NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap(),
                region: "canada".to_string(),
                segment: ALL_SEGMENTS.to_string(),
                metric: "m".to_string(),
                value,
                unit: Unit::Index,
                source: String::new(),
                mom_pct: None,
                yoy_pct: None,
                ma3: None,
            })
            .collect()
    }

    #[test]
    fn derives_missing_fields() {
        let pts = points(&[Some(100.0), Some(110.0), Some(99.0)]);
        let refs: Vec<_> = pts.iter().collect();
        let ch = resolve_changes(&refs);

        assert_eq!(ch[0].mom, PctChange::Unavailable);
        assert!(matches!(ch[1].mom, PctChange::Derived(v) if (v - 10.0).abs() < 1e-9));
        assert!(matches!(ch[2].mom, PctChange::Derived(v) if (v + 10.0).abs() < 1e-9));
        assert_eq!(ch[1].ma3, None);
        assert!((ch[2].ma3.unwrap() - 103.0).abs() < 1e-9);
        assert_eq!(ch[2].yoy, PctChange::Unavailable);
    }

    #[test]
    fn producer_fields_take_precedence() {
        let mut pts = points(&[Some(100.0), Some(110.0)]);
        pts[1].mom_pct = Some(7.0);
        pts[1].ma3 = Some(1.0);
        let refs: Vec<_> = pts.iter().collect();
        let ch = resolve_changes(&refs);
        assert_eq!(ch[1].mom, PctChange::Producer(7.0));
        assert_eq!(ch[1].ma3, Some(1.0));
    }

    #[test]
    fn yoy_uses_twelve_period_lag() {
        let values: Vec<Option<f64>> = (0..13).map(|i| Some(100.0 + i as f64)).collect();
        let pts = points(&values);
        let refs: Vec<_> = pts.iter().collect();
        let ch = resolve_changes(&refs);
        assert_eq!(ch[11].yoy, PctChange::Unavailable);
        assert!((ch[12].yoy.value().unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn gaps_break_derivation() {
        let pts = points(&[Some(100.0), None, Some(120.0), Some(0.0), Some(5.0)]);
        let refs: Vec<_> = pts.iter().collect();
        let ch = resolve_changes(&refs);
        assert_eq!(ch[1].mom, PctChange::Unavailable);
        assert_eq!(ch[2].mom, PctChange::Unavailable);
        assert_eq!(ch[2].ma3, None);
        // Zero base never yields a rate.
        assert_eq!(ch[4].mom, PctChange::Unavailable);
    }
}
