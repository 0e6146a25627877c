//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs logging
//! - loads datasets through the configured source
//! - prints cards, plots and summaries, or launches the dashboard
//! - writes exports and sample datasets

use clap::Parser;

use crate::cli::{CardsArgs, Command, DataArgs, ExportArgs, PlotArgs, SampleArgs, SliceArgs, TuiArgs};
use crate::config::DataConfig;
use crate::data::{LoadPolicy, Loader, SampleConfig};
use crate::domain::PanelPoint;
use crate::error::AppError;
use crate::selection::{ChartSeries, PointerEvent, RangeSelector};

/// Entry point for the `panel` binary.
pub fn run() -> Result<(), AppError> {
    // We want `panel` and `panel -r on` to behave like `panel tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match &cli.command {
        Command::Tui(args) => crate::logging::init(Some(args.log_file.as_path()))?,
        _ => crate::logging::init(None)?,
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Cards(args) => handle_cards(args),
        Command::Plot(args) => handle_plot(args),
        Command::Export(args) => handle_export(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn build_loader(args: &DataArgs) -> Result<Loader, AppError> {
    let config = DataConfig::resolve(args.data.as_deref(), args.unit_scales.as_deref())?;
    config.loader()
}

fn load_slice(loader: &Loader, slice: &SliceArgs, policy: LoadPolicy) -> Result<Vec<PanelPoint>, AppError> {
    let points = loader.load(slice.tab.key(), policy)?;
    tracing::debug!(tab = %slice.tab, source = %loader.describe(), n = points.len(), "loaded tab");
    Ok(points)
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let loader = build_loader(&args.data)?;
    crate::tui::run(loader, args.tab, &args.region)
}

fn handle_cards(args: CardsArgs) -> Result<(), AppError> {
    let loader = build_loader(&args.data)?;
    let load_policy = if args.strict {
        LoadPolicy::Strict
    } else {
        LoadPolicy::Lenient
    };
    let points = load_slice(&loader, &args.slice, load_policy)?;

    let tab = args.slice.tab;
    let policy = args.policy.unwrap_or(tab.default_prev_policy());
    let metrics = tab.metrics();
    let segment = slice_segment(&args.slice, &points);
    ensure_single_segment(&points, &args.slice, &segment, metrics)?;
    let snapshots = crate::snapshot::resolve(&points, &args.slice.region, metrics, &segment, policy);

    let ctx = crate::report::CardContext {
        tab,
        region: &args.slice.region,
        segment: &segment,
        policy,
    };
    println!("{}", crate::report::format_cards(ctx, metrics, &snapshots));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let loader = build_loader(&args.data)?;
    let points = load_slice(&loader, &args.slice, LoadPolicy::Lenient)?;
    let slice = &args.slice;
    let segment = slice_segment(slice, &points);
    ensure_single_segment(&points, slice, &segment, &[args.metric.as_str()])?;

    let Some(series) = ChartSeries::from_points(&points, &args.metric, &slice.region, &segment) else {
        println!(
            "No data for {} in {} (region={} segment={}).",
            args.metric, slice.tab, slice.region, segment
        );
        return Ok(());
    };

    let bounds = if args.clamp_zero {
        let values: Vec<f64> = series.observed().map(|(_, v)| v).collect();
        crate::axis::compute_bounds(&values, true)
    } else {
        series.value_bounds()
    }
    .ok_or_else(|| AppError::new(4, format!("No finite values for {}.", args.metric)))?;

    let selector = match args.select {
        Some(range) => Some(select_range(&series, range)?),
        None => None,
    };
    let highlight = selector.as_ref().and_then(RangeSelector::highlight_range);

    println!(
        "{}",
        crate::plot::render_series_plot(&series, &bounds, args.width, args.height, highlight)
    );

    if let Some(selector) = &selector {
        match (selector.selected_range(), selector.summarize(&series.values)) {
            (_, Some(summary)) => println!("{}", crate::report::format_selection_summary(&summary, &series)),
            (Some(_), None) => println!("Selection endpoints have no value."),
            (None, None) => println!("Empty selection: start and end are the same period."),
        }
    }

    if args.table {
        let slice_points = crate::snapshot::series_points(&points, &slice.region, &args.metric, &segment);
        let changes = crate::snapshot::resolve_changes(&slice_points);
        println!("{}", crate::report::format_series_table(&series, &changes));
    }
    Ok(())
}

/// The requested segment, or the data's default for the region.
fn slice_segment(slice: &SliceArgs, points: &[PanelPoint]) -> String {
    match &slice.segment {
        Some(segment) => segment.clone(),
        None => {
            let segment = crate::snapshot::default_segment(points, &slice.region);
            tracing::debug!(tab = %slice.tab, region = %slice.region, %segment, "defaulted segment");
            segment
        }
    }
}

/// Refuse a wildcard slice that would put several segments on the same date.
fn ensure_single_segment(
    points: &[PanelPoint],
    slice: &SliceArgs,
    segment: &str,
    metrics: &[&str],
) -> Result<(), AppError> {
    for &metric in metrics {
        let series = crate::snapshot::series_points(points, &slice.region, metric, segment);
        if !crate::snapshot::has_duplicate_dates(&series) {
            continue;
        }
        let mut found: Vec<&str> = series.iter().map(|p| p.segment.as_str()).collect();
        found.sort_unstable();
        found.dedup();
        return Err(AppError::new(
            2,
            format!(
                "{metric} in {} (region={}) is split by segment ({}); pick one with --segment.",
                slice.tab,
                slice.region,
                found.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Drive a selector the way a pointer drag from `a` to `b` would.
fn select_range(series: &ChartSeries, (a, b): (usize, usize)) -> Result<RangeSelector, AppError> {
    let len = series.len();
    if a >= len || b >= len {
        return Err(AppError::new(
            2,
            format!("Selection {a}:{b} is outside the series (0..{len})."),
        ));
    }
    let mut selector = RangeSelector::new();
    selector.handle(PointerEvent::Down(Some(a)));
    selector.handle(PointerEvent::Move(Some(b)));
    selector.handle(PointerEvent::Up(Some(b)));
    Ok(selector)
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let loader = build_loader(&args.data)?;
    let points = load_slice(&loader, &args.slice, LoadPolicy::Lenient)?;
    let slice = &args.slice;
    let segment = slice_segment(slice, &points);
    ensure_single_segment(&points, slice, &segment, &[args.metric.as_str()])?;

    let slice_points = crate::snapshot::series_points(&points, &slice.region, &args.metric, &segment);
    if slice_points.is_empty() {
        tracing::warn!(tab = %slice.tab, metric = %args.metric, "exporting an empty slice");
    }
    let changes = crate::snapshot::resolve_changes(&slice_points);
    crate::io::export::write_series_csv(&args.out, &slice_points, &changes)?;
    println!("Wrote {} rows to {}", slice_points.len(), args.out.display());
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    if args.months == 0 {
        return Err(AppError::new(2, "--months must be at least 1."));
    }
    let config = SampleConfig {
        seed: args.seed,
        months: args.months,
        ..SampleConfig::default()
    };
    for path in crate::data::write_sample_datasets(&args.out, &config)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// Rewrite argv so `panel` defaults to `panel tui`.
///
/// Rules:
/// - `panel`                      -> `panel tui`
/// - `panel -r on ...`            -> `panel tui -r on ...`
/// - `panel --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "cards" | "plot" | "export" | "sample");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
