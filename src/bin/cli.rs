//! Greyhound feed CLI - build forecast tables and MarketFeeder imports

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use greyhound_feed::config::Settings;
use greyhound_feed::core::normalize::{
    clean_dog_name, normalize_category, normalize_spaces, normalize_track_name, TRACK_STEPS,
};
use greyhound_feed::dates::today_str;
#[cfg(feature = "html")]
use greyhound_feed::pipeline::{run_parse_pages, ParseReport};
use greyhound_feed::pipeline::{
    run_build_outputs, run_daily, run_export, BuildReport, ExportReport,
};

#[derive(Parser)]
#[command(name = "greyhound-feed")]
#[command(author, version, about = "Greyhound forecast to MarketFeeder pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides settings)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Race date (YYYY-MM-DD, default: today)
    #[arg(short, long, global = true)]
    date: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the stage report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Args, Default)]
struct ExportArgs {
    /// Append the #all_active# line
    #[arg(long)]
    keep_all_active: bool,

    /// Stake for BACK selections
    #[arg(long)]
    stake_back: Option<f64>,

    /// Stake for LAY selections
    #[arg(long)]
    stake_lay: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a saved card index and race pages into the raw table
    #[cfg(feature = "html")]
    Parse {
        /// Saved card index page
        index: PathBuf,

        /// Directory holding the saved race pages (default: the index's directory)
        #[arg(long)]
        pages_dir: Option<PathBuf>,
    },

    /// Build top3 and forecast tables from the raw scraped table
    Build {
        /// Keep races that already started
        #[arg(long)]
        include_past: bool,
    },

    /// Export the forecast table to MarketFeeder files
    Export {
        #[command(flatten)]
        args: ExportArgs,
    },

    /// Build then export
    Run {
        /// Keep races that already started
        #[arg(long)]
        include_past: bool,

        #[command(flatten)]
        args: ExportArgs,
    },

    /// Show how names are normalized
    Normalize {
        /// What the values are
        #[arg(short, long, value_enum, default_value = "track")]
        kind: NameKind,

        /// Print every track step
        #[arg(long)]
        steps: bool,

        values: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NameKind {
    Track,
    Dog,
    Category,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        settings.tracing_level()?
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let date = resolve_date(cli.date.as_deref())?;

    match cli.command {
        #[cfg(feature = "html")]
        Commands::Parse { index, pages_dir } => {
            let pages_dir = pages_dir
                .or_else(|| index.parent().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            let report = with_spinner("Parsing race pages...", || {
                run_parse_pages(&settings, &date, &index, &pages_dir)
            })
            .with_context(|| format!("Parse failed for {}", index.display()))?;
            print_report(&report, cli.json, print_parse)?;
        }
        Commands::Build { include_past } => {
            settings.skip_past_races &= !include_past;
            settings.validate()?;
            let report = with_spinner("Building forecast tables...", || {
                run_build_outputs(&settings, &date, Local::now().naive_local())
            })
            .with_context(|| format!("Build failed for {}", date))?;
            print_report(&report, cli.json, print_build)?;
        }
        Commands::Export { args } => {
            apply_export_args(&mut settings, &args);
            settings.validate()?;
            let report = with_spinner("Exporting selections...", || run_export(&settings, &date))
                .with_context(|| format!("Export failed for {}", date))?;
            print_report(&report, cli.json, print_export)?;
        }
        Commands::Run { include_past, args } => {
            settings.skip_past_races &= !include_past;
            apply_export_args(&mut settings, &args);
            settings.validate()?;
            let report = with_spinner("Running daily pipeline...", || {
                run_daily(&settings, &date, Local::now().naive_local())
            })
            .with_context(|| format!("Daily run failed for {}", date))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_build(&report.build);
                println!();
                print_export(&report.export);
            }
        }
        Commands::Normalize { kind, steps, values } => {
            if values.is_empty() {
                anyhow::bail!("No values to normalize");
            }
            for value in &values {
                show_normalized(kind, steps, value);
            }
        }
    }

    Ok(())
}

fn resolve_date(date: Option<&str>) -> Result<String> {
    match date {
        Some(d) => {
            let parsed = NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", d))?;
            Ok(parsed.format("%Y-%m-%d").to_string())
        }
        None => Ok(today_str()),
    }
}

fn apply_export_args(settings: &mut Settings, args: &ExportArgs) {
    settings.keep_all_active |= args.keep_all_active;
    if let Some(stake) = args.stake_back {
        settings.stake_back = stake;
    }
    if let Some(stake) = args.stake_lay {
        settings.stake_lay = stake;
    }
}

fn with_spinner<T, F>(message: &'static str, stage: F) -> Result<T>
where
    F: FnOnce() -> Result<T, greyhound_feed::PipelineError>,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);

    let result = stage();
    pb.finish_and_clear();
    Ok(result?)
}

fn print_report<T: serde::Serialize>(report: &T, json: bool, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print(report);
    }
    Ok(())
}

#[cfg(feature = "html")]
fn print_parse(report: &ParseReport) {
    println!("{}", "Parse:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("{:<28} {:>6}", "Race cards", report.cards);
    println!("{:<28} {:>6}", "Races parsed", report.races_parsed);
    println!("{:<28} {:>6}", "Pages not saved", report.missing_pages);

    match &report.raw_path {
        Some(path) => println!("{}: {}", "Saved".green(), path.display()),
        None => println!("{}", "No race pages parsed, nothing written.".yellow()),
    }
}

fn print_build(report: &BuildReport) {
    let s = &report.summary;
    println!("{}", "Build:".yellow().bold());
    println!("{}", "-".repeat(40));

    if report.forecast_path.is_none() {
        println!("{}", "No raw forecast rows for this date.".yellow());
        return;
    }

    println!("{:<28} {:>6}", "Raw races", s.raw_rows);
    println!("{:<28} {:>6}", "Skipped (already run)", s.skipped_past);
    println!("{:<28} {:>6}", "Top3 rows", s.top3_rows);
    println!("{:<28} {:>6}", "Forecast rows", s.forecast_rows);
    println!("{:<28} {:>6}", "Dropped: top3 incomplete", s.dropped_top3_incomplete);
    println!("{:<28} {:>6}", "Dropped: forecast empty", s.dropped_forecast_empty);
    println!(
        "{:<28} {:>6}",
        "Dropped: forecast incomplete", s.dropped_forecast_incomplete
    );

    for path in [&report.top3_path, &report.forecast_path].into_iter().flatten() {
        println!("{}: {}", "Saved".green(), path.display());
    }
}

fn print_export(report: &ExportReport) {
    let s = &report.summary;
    println!("{}", "Export:".yellow().bold());
    println!("{}", "-".repeat(40));

    if report.forecast_rows == 0 {
        println!("{}", "Forecast table empty or missing.".yellow());
        return;
    }

    println!("{:<28} {:>6}", "Forecast races", report.forecast_rows);
    println!("{:<28} {:>6}", "Races exported", s.races_exported);
    println!("{:<28} {:>6}", "Lines", s.total_lines);
    println!(
        "{:<28} {:>6}",
        "Skipped: forecast incomplete", s.skipped_forecast_incomplete
    );
    println!("{:<28} {:>6}", "Skipped: duplicate race", s.duplicate_races);
    println!(
        "{:<28} {:>6}",
        "Ignored by category", s.ignored_by_category_total
    );

    for (tag, races) in &s.races_by_strategy {
        let selections = s.selections_by_strategy.get(tag).copied().unwrap_or(0);
        println!("  {:<6} {} races, {} selections", tag.to_string().cyan(), races, selections);
    }
    if !s.ignored_category_counts.is_empty() {
        let ignored: Vec<String> = s
            .ignored_category_counts
            .iter()
            .map(|(cat, n)| format!("{}={}", if cat.is_empty() { "<none>" } else { cat }, n))
            .collect();
        println!("  {} {}", "ignored:".dimmed(), ignored.join(", "));
    }

    match &report.paths {
        Some(paths) => {
            for path in [&paths.fixed, &paths.history, &paths.audit] {
                println!("{}: {}", "Saved".green(), path.display());
            }
        }
        None => println!("{}", "No eligible selections, nothing written.".yellow()),
    }
}

fn show_normalized(kind: NameKind, steps: bool, value: &str) {
    match kind {
        NameKind::Track => {
            println!("{:?} -> {}", value, normalize_track_name(value).green());
            if steps {
                let mut current = normalize_spaces(value);
                for step in TRACK_STEPS {
                    let next = step.apply(&current);
                    if next != current {
                        println!("  {:<24} {:?}", step.name.dimmed(), next);
                    }
                    current = next;
                }
            }
        }
        NameKind::Dog => println!("{:?} -> {}", value, clean_dog_name(value).green()),
        NameKind::Category => println!("{:?} -> {}", value, normalize_category(value).green()),
    }
}
