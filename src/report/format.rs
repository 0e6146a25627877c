//! Text formatting for cards, selection summaries and series tables.
//!
//! We keep formatting code in one place so:
//! - the snapshot/selection code stays free of presentation concerns
//! - the CLI and the TUI show numbers the same way

use crate::domain::{PctChange, PrevPolicy, Snapshot, TabKey, Unit};
use crate::selection::{ChartSeries, SelectionSummary};
use crate::snapshot::PointChanges;

/// Card slice description for headers.
#[derive(Debug, Clone, Copy)]
pub struct CardContext<'a> {
    pub tab: TabKey,
    pub region: &'a str,
    pub segment: &'a str,
    pub policy: PrevPolicy,
}

/// Format a level according to its unit.
pub fn format_value(v: f64, unit: Unit) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    match unit {
        Unit::Pct => format!("{v:.2}%"),
        Unit::Cad => format_cad(v),
        Unit::Index => format!("{v:.1}"),
        Unit::Count => group_thousands(v.round() as i64),
        Unit::Ratio => format!("{v:.2}"),
        Unit::Other => format!("{v:.2}"),
    }
}

/// Signed absolute change. Percent-unit series change in percentage points.
pub fn format_delta(delta: f64, unit: Unit) -> String {
    if !delta.is_finite() {
        return "n/a".to_string();
    }
    let sign = if delta > 0.0 {
        "+"
    } else if delta < 0.0 {
        "-"
    } else {
        ""
    };
    let body = match unit {
        Unit::Pct => format!("{:.2} pp", delta.abs()),
        other => format_value(delta.abs(), other),
    };
    format!("{sign}{body}")
}

/// Signed percentage change. Client-derived values are marked with `*`.
pub fn format_pct_change(change: PctChange) -> String {
    match change {
        PctChange::Producer(v) => format!("{v:+.2}%"),
        PctChange::Derived(v) => format!("{v:+.2}%*"),
        PctChange::Unavailable => "n/a".to_string(),
    }
}

/// `policy_rate` -> `Policy rate`.
pub fn metric_label(metric: &str) -> String {
    let spaced = metric.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One card's lines: label, latest value with its date, change vs previous.
pub fn format_card(snapshot: &Snapshot) -> Vec<String> {
    let unit = snapshot.latest.unit;
    let latest = snapshot
        .latest_value()
        .map(|v| format_value(v, unit))
        .unwrap_or_else(|| "n/a".to_string());

    let mut lines = vec![
        metric_label(&snapshot.metric),
        format!("{latest}  ({})", snapshot.latest.date.format("%Y-%m")),
    ];

    match (&snapshot.prev, snapshot.abs_delta()) {
        (Some(prev), Some(delta)) => lines.push(format!(
            "{} {}  vs {}",
            format_delta(delta, unit),
            format_pct_change(snapshot.pct_delta()),
            prev.date.format("%Y-%m"),
        )),
        _ => lines.push(format!("{} no prior change", format_pct_change(snapshot.pct_delta()))),
    }
    lines
}

/// Table of cards for a tab. Metrics without data get an explicit row.
pub fn format_cards(ctx: CardContext<'_>, metrics: &[&str], snapshots: &[Snapshot]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} | region={} segment={} prev={} ===\n",
        ctx.tab.display_name(),
        ctx.region,
        ctx.segment,
        ctx.policy.display_name(),
    ));
    out.push_str(
        format!(
            "{:<24} {:>8} {:>16} {:>16} {:>16} {:>10}",
            "metric", "date", "latest", "prev", "change", "change %"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<24} {:-<8} {:-<16} {:-<16} {:-<16} {:-<10}\n",
        "", "", "", "", "", ""
    ));

    for &metric in metrics {
        let Some(snap) = snapshots.iter().find(|s| s.metric == metric) else {
            out.push_str(
                format!("{:<24} {:>8} {:>16}", truncate(&metric_label(metric), 24), "-", "not available").trim_end(),
            );
            out.push('\n');
            continue;
        };
        let unit = snap.latest.unit;
        let na = || "n/a".to_string();
        out.push_str(
            format!(
                "{:<24} {:>8} {:>16} {:>16} {:>16} {:>10}",
                truncate(&metric_label(metric), 24),
                snap.latest.date.format("%Y-%m").to_string(),
                snap.latest_value().map(|v| format_value(v, unit)).unwrap_or_else(na),
                snap.prev_value().map(|v| format_value(v, unit)).unwrap_or_else(na),
                snap.abs_delta().map(|d| format_delta(d, unit)).unwrap_or_else(na),
                format_pct_change(snap.pct_delta()),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// One-line summary of a measured range.
pub fn format_selection_summary(summary: &SelectionSummary, series: &ChartSeries) -> String {
    let (from, to) = summary
        .date_labels(series)
        .unwrap_or_else(|| (summary.start_index.to_string(), summary.end_index.to_string()));
    let pct = summary
        .pct
        .map(|p| format!("{p:+.2}%"))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} {from} → {to}: {} → {}  Δ {} ({pct})",
        summary.trend.arrow(),
        format_value(summary.start_value, series.unit),
        format_value(summary.end_value, series.unit),
        format_delta(summary.delta, series.unit),
    )
}

/// Series table with resolved change fields, newest last.
pub fn format_series_table(series: &ChartSeries, changes: &[PointChanges]) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:<8} {:>16} {:>10} {:>10} {:>16}", "date", "value", "mom", "yoy", "ma3").trim_end(),
    );
    out.push('\n');
    for (i, date) in series.dates.iter().enumerate() {
        let value = series.values[i]
            .map(|v| format_value(v, series.unit))
            .unwrap_or_else(|| "-".to_string());
        let (mom, yoy, ma3) = match changes.get(i) {
            Some(c) => (
                format_pct_change(c.mom),
                format_pct_change(c.yoy),
                c.ma3.map(|v| format_value(v, series.unit)).unwrap_or_else(|| "-".to_string()),
            ),
            None => ("n/a".to_string(), "n/a".to_string(), "-".to_string()),
        };
        out.push_str(
            format!("{:<8} {:>16} {:>10} {:>10} {:>16}", date.format("%Y-%m").to_string(), value, mom, yoy, ma3)
                .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn format_cad(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let a = v.abs();
    if a >= 1e9 {
        format!("{sign}${:.2}B", a / 1e9)
    } else if a >= 1e6 {
        format!("{sign}${:.2}M", a / 1e6)
    } else {
        format!("{sign}${}", group_thousands(a.round() as i64))
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{ALL_SEGMENTS, PanelPoint};
    use crate::selection::Trend;

    fn snap(values: &[f64], unit: Unit) -> Snapshot {
        let pts: Vec<PanelPoint> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| PanelPoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                region: "canada".to_string(),
                segment: ALL_SEGMENTS.to_string(),
                metric: "policy_rate".to_string(),
                value: Some(v),
                unit,
                source: String::new(),
                mom_pct: None,
                yoy_pct: None,
                ma3: None,
            })
            .collect();
        crate::snapshot::resolve_default(&pts, "canada", &["policy_rate"])
            .pop()
            .unwrap()
    }

    #[test]
    fn values_follow_units() {
        assert_eq!(format_value(4.5, Unit::Pct), "4.50%");
        assert_eq!(format_value(1_234_567.0, Unit::Count), "1,234,567");
        assert_eq!(format_value(-999.0, Unit::Count), "-999");
        assert_eq!(format_value(850_000.0, Unit::Cad), "$850,000");
        assert_eq!(format_value(2_500_000_000.0, Unit::Cad), "$2.50B");
        assert_eq!(format_value(3_100_000.0, Unit::Cad), "$3.10M");
        assert_eq!(format_value(101.26, Unit::Index), "101.3");
        assert_eq!(format_value(0.5555, Unit::Ratio), "0.56");
        assert_eq!(format_value(f64::NAN, Unit::Ratio), "n/a");
    }

    #[test]
    fn deltas_are_signed() {
        assert_eq!(format_delta(0.25, Unit::Pct), "+0.25 pp");
        assert_eq!(format_delta(-25_000.0, Unit::Cad), "-$25,000");
        assert_eq!(format_delta(0.0, Unit::Count), "0");
    }

    #[test]
    fn pct_change_marks_derived_values() {
        assert_eq!(format_pct_change(PctChange::Producer(1.234)), "+1.23%");
        assert_eq!(format_pct_change(PctChange::Derived(-2.0)), "-2.00%*");
        assert_eq!(format_pct_change(PctChange::Unavailable), "n/a");
    }

    #[test]
    fn metric_labels_are_readable() {
        assert_eq!(metric_label("policy_rate"), "Policy rate");
        assert_eq!(metric_label(""), "");
    }

    #[test]
    fn card_shows_change_against_prev() {
        let lines = format_card(&snap(&[4.75, 4.5], Unit::Pct));
        assert_eq!(lines[0], "Policy rate");
        assert_eq!(lines[1], "4.50%  (2024-02)");
        assert_eq!(lines[2], "-0.25 pp -5.26%*  vs 2024-01");
    }

    #[test]
    fn held_rate_card_derives_pct_against_last_change() {
        let mut pts: Vec<PanelPoint> = [4.75, 4.5, 4.5]
            .iter()
            .enumerate()
            .map(|(i, &v)| PanelPoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                region: "canada".to_string(),
                segment: ALL_SEGMENTS.to_string(),
                metric: "policy_rate".to_string(),
                value: Some(v),
                unit: Unit::Pct,
                source: String::new(),
                mom_pct: Some(0.0),
                yoy_pct: None,
                ma3: None,
            })
            .collect();
        pts[1].mom_pct = Some(-5.2632);
        let snap = crate::snapshot::resolve(
            &pts,
            "canada",
            &["policy_rate"],
            ALL_SEGMENTS,
            PrevPolicy::LastDifferent,
        )
        .pop()
        .unwrap();
        let lines = format_card(&snap);
        assert_eq!(lines[2], "-0.25 pp -5.26%*  vs 2024-01");
    }

    #[test]
    fn cards_table_lists_missing_metrics() {
        let s = snap(&[1.0, 2.0], Unit::Pct);
        let ctx = CardContext {
            tab: TabKey::RatesBonds,
            region: "canada",
            segment: ALL_SEGMENTS,
            policy: PrevPolicy::Adjacent,
        };
        let txt = format_cards(ctx, &["policy_rate", "gov_2y_yield"], &[s]);
        assert!(txt.starts_with("=== Rates & Bonds | region=canada segment=all prev=adjacent ===\n"));
        assert!(txt.contains("Policy rate"));
        assert!(txt.contains("+1.00 pp"));
        assert!(txt.contains("Gov 2y yield"));
        assert!(txt.contains("not available"));
    }

    #[test]
    fn selection_summary_line() {
        let series = ChartSeries {
            metric: "sales".to_string(),
            unit: Unit::Count,
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ],
            values: vec![Some(1000.0), Some(1100.0)],
        };
        let summary = SelectionSummary::between(&series.values, 0, 1).unwrap();
        assert_eq!(summary.trend, Trend::Up);
        assert_eq!(
            format_selection_summary(&summary, &series),
            "▲ 2024-01 → 2024-02: 1,000 → 1,100  Δ +100 (+10.00%)"
        );
    }
}
