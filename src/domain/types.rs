//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded straight from the per-tab JSON datasets
//! - handed to the snapshot/axis/selection components by reference
//! - written back out by the sample generator and CSV export

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sentinel segment meaning "unsegmented".
pub const ALL_SEGMENTS: &str = "all";

/// Region codes produced by the dataset pipeline.
///
/// The loader does not reject other codes; this list only drives pickers.
pub const KNOWN_REGIONS: &[&str] = &[
    "canada",
    "on",
    "bc",
    "gta",
    "metro_vancouver",
    "hamilton",
    "halton",
    "niagara",
    "burnaby",
    "surrey",
    "richmond",
    "victoria",
];

/// Segment codes produced by the dataset pipeline (`all` first).
pub const KNOWN_SEGMENTS: &[&str] = &[ALL_SEGMENTS, "composite", "condo", "freehold"];

/// Semantic unit tag. Governs default formatting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pct,
    Cad,
    Index,
    Count,
    Ratio,
    /// Anything the producer emits that we don't know about yet.
    #[serde(other)]
    Other,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::Pct => "%",
            Unit::Cad => "CAD",
            Unit::Index => "index",
            Unit::Count => "count",
            Unit::Ratio => "ratio",
            Unit::Other => "",
        }
    }

    /// The dataset's `unit` tag, as it appears in JSON.
    pub fn tag(self) -> &'static str {
        match self {
            Unit::Pct => "pct",
            Unit::Cad => "cad",
            Unit::Index => "index",
            Unit::Count => "count",
            Unit::Ratio => "ratio",
            Unit::Other => "other",
        }
    }
}

/// One observation of one metric, for one region/segment, at one date.
///
/// `(date, region, segment, metric)` is unique within a dataset, but a dataset
/// carries no ordering guarantee: sort before deriving "latest"/"previous".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelPoint {
    #[serde(with = "month_date")]
    pub date: NaiveDate,
    pub region: String,
    pub segment: String,
    pub metric: String,
    /// `None` is "no observation" for that period.
    #[serde(default)]
    pub value: Option<f64>,
    pub unit: Unit,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub mom_pct: Option<f64>,
    #[serde(default)]
    pub yoy_pct: Option<f64>,
    #[serde(default)]
    pub ma3: Option<f64>,
}

impl PanelPoint {
    /// Does this point belong to the `region`/`segment` slice?
    ///
    /// Asking for [`ALL_SEGMENTS`] matches every segment.
    pub fn in_slice(&self, region: &str, segment: &str) -> bool {
        self.region == region && (segment == ALL_SEGMENTS || self.segment == segment)
    }
}

/// Dates in the datasets are month starts written as `YYYY-MM-DD`; some older
/// files use bare `YYYY-MM`. Both decode to a `NaiveDate`.
pub mod month_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Some(date);
        }
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").ok()
    }
}

/// Latest value plus a comparison "previous" value for one metric.
///
/// Built per render by the snapshot resolver; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub metric: String,
    pub latest: PanelPoint,
    pub prev: Option<PanelPoint>,
    /// `prev` is the observation right before `latest`.
    pub prev_is_adjacent: bool,
}

/// How a percentage change was obtained.
///
/// Producers sometimes ship `mom_pct`/`yoy_pct` and sometimes don't. The tag
/// keeps the precedence visible to whoever renders the number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PctChange {
    /// Supplied by the dataset producer.
    Producer(f64),
    /// Computed client-side from two observed levels.
    Derived(f64),
    /// No producer value and no usable base.
    Unavailable,
}

impl PctChange {
    pub fn value(self) -> Option<f64> {
        match self {
            PctChange::Producer(v) | PctChange::Derived(v) => Some(v),
            PctChange::Unavailable => None,
        }
    }

    /// Producer value if present, else `(current - base) / |base| * 100`.
    ///
    /// A zero or missing base never yields a rate.
    pub fn resolve(producer: Option<f64>, current: Option<f64>, base: Option<f64>) -> Self {
        if let Some(v) = producer.filter(|v| v.is_finite()) {
            return PctChange::Producer(v);
        }
        match (current, base) {
            (Some(cur), Some(base)) if base != 0.0 => {
                let pct = (cur - base) / base.abs() * 100.0;
                if pct.is_finite() {
                    PctChange::Derived(pct)
                } else {
                    PctChange::Unavailable
                }
            }
            _ => PctChange::Unavailable,
        }
    }
}

/// Which earlier observation a snapshot compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PrevPolicy {
    /// The observation right before the latest one.
    #[default]
    Adjacent,
    /// The most recent observation whose value differs from the latest.
    ///
    /// For step-like series (a policy rate held for months) so the displayed
    /// change is the last actual move instead of zero.
    LastDifferent,
}

impl PrevPolicy {
    pub fn display_name(self) -> &'static str {
        match self {
            PrevPolicy::Adjacent => "adjacent",
            PrevPolicy::LastDifferent => "last-different",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            PrevPolicy::Adjacent => PrevPolicy::LastDifferent,
            PrevPolicy::LastDifferent => PrevPolicy::Adjacent,
        }
    }
}

/// Dashboard tabs, one JSON dataset each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TabKey {
    Prices,
    SalesListings,
    SupplyPipeline,
    RatesBonds,
    InflationLabour,
    CreditStress,
    MarketRisk,
    Rentals,
}

impl TabKey {
    pub const ALL: [TabKey; 8] = [
        TabKey::Prices,
        TabKey::SalesListings,
        TabKey::SupplyPipeline,
        TabKey::RatesBonds,
        TabKey::InflationLabour,
        TabKey::CreditStress,
        TabKey::MarketRisk,
        TabKey::Rentals,
    ];

    /// Dataset key, also the file stem under `data/processed/`.
    pub fn key(self) -> &'static str {
        match self {
            TabKey::Prices => "prices",
            TabKey::SalesListings => "sales_listings",
            TabKey::SupplyPipeline => "supply_pipeline",
            TabKey::RatesBonds => "rates_bonds",
            TabKey::InflationLabour => "inflation_labour",
            TabKey::CreditStress => "credit_stress",
            TabKey::MarketRisk => "market_risk",
            TabKey::Rentals => "rentals",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TabKey::Prices => "Prices",
            TabKey::SalesListings => "Sales & Listings",
            TabKey::SupplyPipeline => "Supply",
            TabKey::RatesBonds => "Rates & Bonds",
            TabKey::InflationLabour => "Inflation & Labour",
            TabKey::CreditStress => "Credit",
            TabKey::MarketRisk => "Market",
            TabKey::Rentals => "Rentals",
        }
    }

    /// Card metrics, in display order.
    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            TabKey::Prices => &["hpi_benchmark", "avg_price", "teranet_hpi"],
            TabKey::SalesListings => &["sales", "new_listings", "active_listings", "snlr", "moi"],
            TabKey::SupplyPipeline => &["starts", "completions", "under_construction", "permits"],
            TabKey::RatesBonds => &[
                "policy_rate",
                "mortgage_5y",
                "gov_2y_yield",
                "gov_5y_yield",
                "gov_10y_yield",
                "mortgage_5y_spread",
            ],
            TabKey::InflationLabour => &[
                "cpi_headline",
                "cpi_shelter",
                "cpi_rent",
                "wage_index",
                "unemployment_rate",
            ],
            TabKey::CreditStress => &[
                "insolvencies",
                "bankruptcies",
                "mortgage_arrears",
                "consumer_delinquency",
            ],
            TabKey::MarketRisk => &["tsx_index", "hy_spread", "risk_composite"],
            TabKey::Rentals => &["avg_rent", "rent_index", "vacancy_rate", "rent_inflation"],
        }
    }

    /// Previous-value policy the tab's cards use unless overridden.
    pub fn default_prev_policy(self) -> PrevPolicy {
        match self {
            TabKey::RatesBonds => PrevPolicy::LastDifferent,
            _ => PrevPolicy::Adjacent,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-metric multipliers for series published in scaled units (e.g. millions).
///
/// Only level fields (`value`, `ma3`) are rescaled; percentage changes are
/// scale-free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitScales {
    factors: HashMap<String, f64>,
}

impl UnitScales {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a multiplier. Zero and non-finite factors are refused.
    pub fn insert(&mut self, metric: impl Into<String>, factor: f64) -> Result<(), String> {
        let metric = metric.into();
        if !factor.is_finite() || factor == 0.0 {
            return Err(format!("invalid unit scale {factor} for metric '{metric}'"));
        }
        self.factors.insert(metric, factor);
        Ok(())
    }

    /// Parse a `{"metric": factor}` JSON object.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let raw: HashMap<String, f64> =
            serde_json::from_str(text).map_err(|e| format!("invalid unit scale table: {e}"))?;
        let mut scales = Self::new();
        for (metric, factor) in raw {
            scales.insert(metric, factor)?;
        }
        Ok(scales)
    }

    pub fn factor(&self, metric: &str) -> f64 {
        self.factors.get(metric).copied().unwrap_or(1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn apply(&self, points: &mut [PanelPoint]) {
        if self.factors.is_empty() {
            return;
        }
        for p in points.iter_mut() {
            let Some(&factor) = self.factors.get(&p.metric) else {
                continue;
            };
            p.value = p.value.map(|v| v * factor);
            p.ma3 = p.ma3.map(|v| v * factor);
        }
    }
}
