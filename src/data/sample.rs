//! Synthetic panel datasets for demos and offline development.
//!
//! Produces one JSON array per tab in the same format the real pipeline
//! writes, with producer-style `mom_pct`/`yoy_pct`/`ma3` filled in. Output is
//! fully determined by the seed.

use std::collections::HashMap;
use std::fs::{File, create_dir_all};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ALL_SEGMENTS, PanelPoint, PctChange, TabKey, Unit};
use crate::error::AppError;

/// Regions the sample covers, with a level offset (percent) per region.
const SAMPLE_REGIONS: &[(&str, f64)] = &[
    ("canada", 0.0),
    ("on", 5.0),
    ("bc", 7.0),
    ("gta", 8.0),
    ("metro_vancouver", 9.0),
];

/// Price series are published by housing type rather than as `all`.
const PRICE_SEGMENTS: &[&str] = &["composite", "condo", "freehold"];

/// Rate-like series are national only.
const NATIONAL_ONLY: &[TabKey] = &[TabKey::RatesBonds, TabKey::MarketRisk, TabKey::CreditStress];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub seed: u64,
    pub months: usize,
    pub start: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            months: 36,
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
        }
    }
}

/// Shape of one synthetic metric.
#[derive(Debug, Clone, Copy)]
struct MetricProfile {
    unit: Unit,
    level: f64,
    /// Monthly noise as a fraction of the level.
    vol: f64,
    /// Moves in 25bp steps a few times a year instead of drifting.
    step_like: bool,
}

fn profile(metric: &str) -> MetricProfile {
    let p = |unit, level, vol| MetricProfile {
        unit,
        level,
        vol,
        step_like: false,
    };
    match metric {
        "policy_rate" => MetricProfile {
            step_like: true,
            ..p(Unit::Pct, 4.5, 0.0)
        },
        "mortgage_5y" => p(Unit::Pct, 5.4, 0.02),
        "gov_2y_yield" | "gov_5y_yield" | "gov_10y_yield" => p(Unit::Pct, 3.4, 0.03),
        "mortgage_5y_spread" => p(Unit::Pct, 0.0, 0.0),
        "unemployment_rate" | "vacancy_rate" | "mortgage_arrears" | "consumer_delinquency" => {
            p(Unit::Pct, 4.0, 0.03)
        }
        "rent_inflation" => p(Unit::Pct, 5.0, 0.08),
        "hy_spread" => p(Unit::Pct, 4.2, 0.06),
        "avg_price" => p(Unit::Cad, 850_000.0, 0.01),
        "avg_rent" => p(Unit::Cad, 2_300.0, 0.008),
        "hpi_benchmark" | "teranet_hpi" | "rent_index" | "wage_index" | "risk_composite" => {
            p(Unit::Index, 300.0, 0.008)
        }
        "cpi_headline" | "cpi_shelter" | "cpi_rent" => p(Unit::Index, 155.0, 0.004),
        "tsx_index" => p(Unit::Index, 21_000.0, 0.03),
        "snlr" | "moi" => p(Unit::Ratio, 0.0, 0.0),
        "new_listings" => p(Unit::Count, 20_000.0, 0.06),
        "active_listings" => p(Unit::Count, 45_000.0, 0.04),
        _ => p(Unit::Count, 12_000.0, 0.06),
    }
}

fn month_series(start: NaiveDate, months: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(months);
    let (mut y, mut m) = (start.year(), start.month());
    for _ in 0..months {
        if let Some(d) = NaiveDate::from_ymd_opt(y, m, 1) {
            out.push(d);
        }
        m += 1;
        if m > 12 {
            m = 1;
            y += 1;
        }
    }
    out
}

/// Generate the points for one tab.
pub fn generate_tab(tab: TabKey, config: &SampleConfig) -> Result<Vec<PanelPoint>, AppError> {
    if config.months == 0 {
        return Err(AppError::new(2, "Sample month count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed ^ tab_salt(tab));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let dates = month_series(config.start, config.months);

    let regions: Vec<(&str, f64)> = if NATIONAL_ONLY.contains(&tab) {
        SAMPLE_REGIONS[..1].to_vec()
    } else {
        SAMPLE_REGIONS.to_vec()
    };
    let segments: &[&str] = if tab == TabKey::Prices {
        PRICE_SEGMENTS
    } else {
        &[ALL_SEGMENTS]
    };

    let mut out = Vec::new();
    for &(region, offset) in &regions {
        for (seg_idx, &segment) in segments.iter().enumerate() {
            let mut levels: HashMap<&str, Vec<f64>> = HashMap::new();
            for &metric in tab.metrics() {
                let prof = profile(metric);
                let series = match derived_levels(metric, &levels) {
                    Some(series) => series,
                    None => {
                        let base = prof.level * (1.0 + offset / 100.0) * (1.0 - 0.1 * seg_idx as f64);
                        if prof.step_like {
                            step_walk(&mut rng, base, dates.len())
                        } else {
                            random_walk(&mut rng, &normal, base, prof.vol, dates.len())
                        }
                    }
                };
                out.extend(with_changes(&dates, &series, region, segment, metric, prof.unit));
                levels.insert(metric, series);
            }
        }
    }
    Ok(out)
}

/// Metrics the pipeline computes from other series rather than ingesting:
/// sales-to-new-listings, months of inventory and the 5y mortgage spread.
///
/// `None` for ingested metrics, or when an input hasn't been generated.
fn derived_levels(metric: &str, levels: &HashMap<&str, Vec<f64>>) -> Option<Vec<f64>> {
    // Walks are floored above zero, so the ratio denominators are positive.
    match metric {
        "snlr" => combine(levels, "sales", "new_listings", |s, n| s / n),
        "moi" => combine(levels, "active_listings", "sales", |a, s| a / s),
        "mortgage_5y_spread" => combine(levels, "mortgage_5y", "gov_5y_yield", |m, g| m - g),
        _ => None,
    }
}

fn combine(
    levels: &HashMap<&str, Vec<f64>>,
    a: &str,
    b: &str,
    f: impl Fn(f64, f64) -> f64,
) -> Option<Vec<f64>> {
    let (a, b) = (levels.get(a)?, levels.get(b)?);
    Some(a.iter().zip(b).map(|(&x, &y)| round_to(f(x, y), 4)).collect())
}

/// Write every tab to `{dir}/{key}.json`. Returns the written paths.
pub fn write_sample_datasets(dir: &Path, config: &SampleConfig) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", dir.display())))?;

    let mut written = Vec::with_capacity(TabKey::ALL.len());
    for tab in TabKey::ALL {
        let points = generate_tab(tab, config)?;
        let path = dir.join(format!("{}.json", tab.key()));
        let file = File::create(&path)
            .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &points)
            .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
        tracing::info!(path = %path.display(), rows = points.len(), "wrote sample dataset");
        written.push(path);
    }
    Ok(written)
}

fn tab_salt(tab: TabKey) -> u64 {
    tab.key()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

fn random_walk(rng: &mut StdRng, normal: &Normal<f64>, base: f64, vol: f64, n: usize) -> Vec<f64> {
    let mut level = base;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        // Slight upward drift keeps the demo series trending like real levels.
        let shock = vol * normal.sample(rng) + vol * 0.1;
        level = (level * (1.0 + shock)).max(base * 0.05);
        out.push(round_to(level, 4));
    }
    out
}

fn step_walk(rng: &mut StdRng, base: f64, n: usize) -> Vec<f64> {
    let mut level = base;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        // Roughly two moves a year, 25bp at a time.
        if rng.gen_bool(1.0 / 6.0) {
            let dir = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            level = (level + dir * 0.25).max(0.25);
        }
        out.push(round_to(level, 2));
    }
    out
}

fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

/// Attach producer-style change fields the way the dataset pipeline does:
/// lag-1 and lag-12 percentage changes and a trailing 3-period mean.
fn with_changes(
    dates: &[NaiveDate],
    levels: &[f64],
    region: &str,
    segment: &str,
    metric: &str,
    unit: Unit,
) -> Vec<PanelPoint> {
    dates
        .iter()
        .zip(levels)
        .enumerate()
        .map(|(i, (&date, &value))| {
            let lag = |k: usize| i.checked_sub(k).map(|j| levels[j]);
            let ma3 = (i >= 2).then(|| round_to(levels[i - 2..=i].iter().sum::<f64>() / 3.0, 4));
            PanelPoint {
                date,
                region: region.to_string(),
                segment: segment.to_string(),
                metric: metric.to_string(),
                value: Some(value),
                unit,
                source: "sample".to_string(),
                mom_pct: PctChange::resolve(None, Some(value), lag(1)).value().map(|v| round_to(v, 4)),
                yoy_pct: PctChange::resolve(None, Some(value), lag(12)).value().map(|v| round_to(v, 4)),
                ma3,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::data::loader::Loader;
    use crate::data::source::DirSource;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let cfg = SampleConfig::default();
        let a = generate_tab(TabKey::Prices, &cfg).unwrap();
        let b = generate_tab(TabKey::Prices, &cfg).unwrap();
        assert_eq!(a, b);

        let other = SampleConfig { seed: 7, ..cfg };
        assert_ne!(a, generate_tab(TabKey::Prices, &other).unwrap());
    }

    #[test]
    fn keys_are_unique_and_metrics_covered() {
        let cfg = SampleConfig { months: 14, ..SampleConfig::default() };
        let points = generate_tab(TabKey::SalesListings, &cfg).unwrap();

        let mut seen = HashSet::new();
        for p in &points {
            assert!(seen.insert((p.date, p.region.clone(), p.segment.clone(), p.metric.clone())));
        }
        for metric in TabKey::SalesListings.metrics() {
            assert!(points.iter().any(|p| p.metric == *metric), "missing {metric}");
        }
    }

    #[test]
    fn producer_changes_follow_lags() {
        let cfg = SampleConfig { months: 13, ..SampleConfig::default() };
        let points: Vec<_> = generate_tab(TabKey::Rentals, &cfg)
            .unwrap()
            .into_iter()
            .filter(|p| p.metric == "avg_rent" && p.region == "canada")
            .collect();
        assert_eq!(points.len(), 13);
        assert!(points[0].mom_pct.is_none());
        assert!(points[1].mom_pct.is_some());
        assert!(points[1].ma3.is_none());
        assert!(points[2].ma3.is_some());
        assert!(points[11].yoy_pct.is_none());
        assert!(points[12].yoy_pct.is_some());
    }

    #[test]
    fn ratio_and_spread_metrics_are_derived_from_their_inputs() {
        let cfg = SampleConfig { months: 12, ..SampleConfig::default() };
        let value = |points: &[PanelPoint], metric: &str, date: NaiveDate| {
            points
                .iter()
                .find(|p| p.metric == metric && p.region == "gta" && p.date == date)
                .and_then(|p| p.value)
                .unwrap_or(f64::NAN)
        };

        let sales = generate_tab(TabKey::SalesListings, &cfg).unwrap();
        for date in month_series(cfg.start, cfg.months) {
            let (s, n, a) = (
                value(&sales, "sales", date),
                value(&sales, "new_listings", date),
                value(&sales, "active_listings", date),
            );
            assert!((value(&sales, "snlr", date) - s / n).abs() < 1e-4, "{date}");
            assert!((value(&sales, "moi", date) - a / s).abs() < 1e-4, "{date}");
        }

        let rates = generate_tab(TabKey::RatesBonds, &cfg).unwrap();
        let at = |metric: &str, date: NaiveDate| {
            rates
                .iter()
                .find(|p| p.metric == metric && p.date == date)
                .and_then(|p| p.value)
                .unwrap_or(f64::NAN)
        };
        for date in month_series(cfg.start, cfg.months) {
            let spread = at("mortgage_5y", date) - at("gov_5y_yield", date);
            assert!((at("mortgage_5y_spread", date) - spread).abs() < 1e-4, "{date}");
        }
    }

    #[test]
    fn policy_rate_moves_in_steps() {
        let cfg = SampleConfig { months: 60, ..SampleConfig::default() };
        let points = generate_tab(TabKey::RatesBonds, &cfg).unwrap();
        for p in points.iter().filter(|p| p.metric == "policy_rate") {
            let v = p.value.unwrap();
            assert!(((v * 4.0) - (v * 4.0).round()).abs() < 1e-9, "not a 25bp step: {v}");
        }
    }

    #[test]
    fn written_datasets_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SampleConfig { months: 6, ..SampleConfig::default() };
        let paths = write_sample_datasets(dir.path(), &cfg).unwrap();
        assert_eq!(paths.len(), TabKey::ALL.len());

        let loader = Loader::new(Arc::new(DirSource::new(dir.path())));
        let points = loader.load_strict("rates_bonds").unwrap();
        assert_eq!(points, generate_tab(TabKey::RatesBonds, &cfg).unwrap());
    }
}
