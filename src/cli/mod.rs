//! Command-line parsing for the panel dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data and charting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{PrevPolicy, TabKey};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "panel", version, about = "Economic indicators panel dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    ///
    /// Tabs, region/segment pickers, snapshot cards and a chart with mouse
    /// drag range measurement.
    Tui(TuiArgs),
    /// Print snapshot cards for one tab.
    Cards(CardsArgs),
    /// Print an ASCII plot of one metric, optionally measuring a range.
    Plot(PlotArgs),
    /// Export one metric's series (with resolved changes) to CSV.
    Export(ExportArgs),
    /// Write deterministic synthetic datasets for every tab.
    Sample(SampleArgs),
}

/// Where data comes from. Shared by every command that loads datasets.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Dataset host (`http(s)://...`) or local directory. Falls back to `PANEL_DATA`.
    #[arg(long, value_name = "URL|DIR")]
    pub data: Option<String>,

    /// JSON table of per-metric multipliers, e.g. `{"household_credit": 1e6}`.
    #[arg(long, value_name = "JSON")]
    pub unit_scales: Option<PathBuf>,
}

/// Which slice of a tab to look at.
#[derive(Debug, Args, Clone)]
pub struct SliceArgs {
    /// Dataset (tab) key.
    #[arg(short = 't', long, value_enum)]
    pub tab: TabKey,

    /// Region code.
    #[arg(short = 'r', long, default_value = "canada")]
    pub region: String,

    /// Segment code. Defaults to `all` when the tab publishes it, else the
    /// first segment present (e.g. `composite` for prices).
    #[arg(short = 's', long)]
    pub segment: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Initial tab.
    #[arg(short = 't', long, value_enum, default_value_t = TabKey::Prices)]
    pub tab: TabKey,

    /// Initial region.
    #[arg(short = 'r', long, default_value = "canada")]
    pub region: String,

    /// Log file (the dashboard owns the terminal, so logs never go to stderr).
    #[arg(long, default_value = "panel.log")]
    pub log_file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct CardsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub slice: SliceArgs,

    /// Previous-value policy. Defaults to the tab's own policy.
    #[arg(long, value_enum)]
    pub policy: Option<PrevPolicy>,

    /// Treat a missing dataset or a malformed payload as an error.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub slice: SliceArgs,

    /// Metric to plot.
    #[arg(short = 'm', long)]
    pub metric: String,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Measure a range of category indices, e.g. `3:10`.
    #[arg(long, value_name = "A:B", value_parser = parse_range)]
    pub select: Option<(usize, usize)>,

    /// Force the value axis to start at zero or above.
    #[arg(long)]
    pub clamp_zero: bool,

    /// Also print the series table with resolved changes.
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub slice: SliceArgs,

    /// Metric to export.
    #[arg(short = 'm', long)]
    pub metric: String,

    /// Output CSV path.
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output directory (created if missing).
    #[arg(short = 'o', long, default_value = "data/processed")]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of monthly periods per series.
    #[arg(long, default_value_t = 36)]
    pub months: usize,
}

/// Parse `A:B` into a pair of category indices.
pub fn parse_range(raw: &str) -> Result<(usize, usize), String> {
    let (a, b) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected A:B, got '{raw}'"))?;
    let a = a.trim().parse::<usize>().map_err(|e| format!("bad start '{a}': {e}"))?;
    let b = b.trim().parse::<usize>().map_err(|e| format!("bad end '{b}': {e}"))?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges() {
        assert_eq!(parse_range("3:10"), Ok((3, 10)));
        assert_eq!(parse_range(" 7 : 2 "), Ok((7, 2)));
        assert!(parse_range("3").is_err());
        assert!(parse_range("a:2").is_err());
    }

    #[test]
    fn parses_plot_command() {
        let cli = Cli::parse_from([
            "panel", "plot", "--tab", "rates_bonds", "--metric", "policy_rate", "--select", "0:5",
        ]);
        let Command::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        assert_eq!(args.slice.tab, TabKey::RatesBonds);
        assert_eq!(args.slice.region, "canada");
        assert_eq!(args.slice.segment, None);
        assert_eq!(args.select, Some((0, 5)));
    }

    #[test]
    fn parses_cards_policy() {
        let cli = Cli::parse_from(["panel", "cards", "-t", "prices", "--policy", "last-different", "--strict"]);
        let Command::Cards(args) = cli.command else {
            panic!("expected cards");
        };
        assert_eq!(args.policy, Some(PrevPolicy::LastDifferent));
        assert!(args.strict);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
