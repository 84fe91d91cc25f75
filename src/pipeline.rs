//! Daily pipeline stages
//!
//! - parse: saved card index and race pages -> raw scraped table
//! - build: raw scraped table -> top3 and forecast tables
//! - export: forecast table -> MarketFeeder import, history copy and audit
//!
//! A missing or empty input table is not an error; the stage logs a warning and
//! reports that nothing was written.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Settings;
use crate::data::builder::{BuildSummary, ForecastRecordBuilder, PastRaceFilter};
use crate::data::csv_loader::{forecast_frame, load_forecast_table, load_raw_forecast, top3_frame};
use crate::data::files::write_frame_atomic;
use crate::error::PipelineError;
use crate::export::exporter::{ExportSummary, SelectionExporter};
use crate::export::writer::{write_export_files, ExportPaths};
#[cfg(feature = "html")]
use crate::{
    data::csv_loader::raw_frame,
    scraper::{parse_race_cards, parse_race_page, TIMEFORM_BASE_URL},
};
#[cfg(feature = "html")]
use std::path::Path;

/// Result of the parse stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParseReport {
    pub cards: usize,
    pub races_parsed: usize,
    pub missing_pages: usize,
    pub raw_path: Option<PathBuf>,
}

/// Result of the build stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub summary: BuildSummary,
    pub top3_path: Option<PathBuf>,
    pub forecast_path: Option<PathBuf>,
}

/// Result of the export stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub forecast_rows: usize,
    pub summary: ExportSummary,
    /// `None` when nothing was written
    pub paths: Option<ExportPaths>,
}

/// Result of a full daily run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DailyReport {
    pub date: String,
    pub build: BuildReport,
    pub export: ExportReport,
}

/// Parse a saved card index and its race pages into the raw table for `date`.
///
/// Each race page is looked up in `pages_dir` under
/// [`RaceCard::page_file_name`](crate::scraper::RaceCard::page_file_name);
/// races without a saved page are skipped. Nothing is written when no page
/// could be parsed.
#[cfg(feature = "html")]
pub fn run_parse_pages(
    settings: &Settings,
    date: &str,
    index_path: &Path,
    pages_dir: &Path,
) -> Result<ParseReport, PipelineError> {
    let index_html =
        std::fs::read_to_string(index_path).map_err(|e| PipelineError::io(index_path, e))?;
    let cards = parse_race_cards(&index_html, TIMEFORM_BASE_URL)?;
    info!("Race cards found: {}", cards.len());

    let mut report = ParseReport {
        cards: cards.len(),
        ..ParseReport::default()
    };
    let mut rows = Vec::with_capacity(cards.len());
    for card in &cards {
        let page_path = pages_dir.join(card.page_file_name());
        if !page_path.exists() {
            warn!("Race page not saved: {} {} ({})", card.track_name, card.hhmm, page_path.display());
            report.missing_pages += 1;
            continue;
        }
        let html =
            std::fs::read_to_string(&page_path).map_err(|e| PipelineError::io(&page_path, e))?;
        rows.push(parse_race_page(&html, card, date)?);
    }
    report.races_parsed = rows.len();

    if rows.is_empty() {
        warn!("No race pages parsed for {}", date);
        return Ok(report);
    }

    let raw_path = settings.raw_path(date);
    write_frame_atomic(&raw_path, &mut raw_frame(&rows)?)?;
    info!("Raw table saved: {}", raw_path.display());
    report.raw_path = Some(raw_path);

    Ok(report)
}

/// Build the top3 and forecast tables for `date` from the raw table.
///
/// The past-race filter only applies when `date` is `now`'s day.
pub fn run_build_outputs(
    settings: &Settings,
    date: &str,
    now: NaiveDateTime,
) -> Result<BuildReport, PipelineError> {
    let raw_path = settings.raw_path(date);
    let raw = load_raw_forecast(&raw_path)?;
    if raw.is_empty() {
        warn!("No raw forecast rows to build from: {}", raw_path.display());
        return Ok(BuildReport::default());
    }

    let mut builder = ForecastRecordBuilder::new(date);
    if settings.skip_past_races && now.format("%Y-%m-%d").to_string() == date {
        builder = builder.with_past_race_filter(PastRaceFilter {
            now,
            grace_minutes: settings.past_race_grace_minutes,
        });
    }
    let output = builder.build(&raw);

    let top3_path = settings.top3_path(date);
    write_frame_atomic(&top3_path, &mut top3_frame(&output.top3)?)?;
    info!("Top3 table saved: {}", top3_path.display());

    let forecast_path = settings.forecast_path(date);
    write_frame_atomic(&forecast_path, &mut forecast_frame(&output.forecast)?)?;
    info!("Forecast table saved: {}", forecast_path.display());

    Ok(BuildReport {
        summary: output.summary,
        top3_path: Some(top3_path),
        forecast_path: Some(forecast_path),
    })
}

/// Export the forecast table for `date` to the MarketFeeder files.
///
/// Files are only written when the export produced at least one line. With
/// `keep_all_active` on, the sentinel alone replaces the previous import file.
pub fn run_export(settings: &Settings, date: &str) -> Result<ExportReport, PipelineError> {
    let rules = settings.category_rules()?;

    let forecast_path = settings.forecast_path(date);
    let rows = load_forecast_table(&forecast_path)?;
    if rows.is_empty() {
        warn!("Forecast table empty or missing: {}", forecast_path.display());
        return Ok(ExportReport::default());
    }

    let output = SelectionExporter::new(rules)
        .with_keep_all_active(settings.keep_all_active)
        .export(&rows, date);

    let summary = &output.summary;
    info!("Selections by strategy: {:?}", summary.selections_by_strategy);
    info!("Exported categories: {:?}", summary.exported_category_counts);
    info!(
        "Races ignored by category: {} | categories: {:?}",
        summary.ignored_by_category_total, summary.ignored_category_counts
    );

    if output.lines.is_empty() {
        warn!("No eligible selections to export for {}", date);
        return Ok(ExportReport {
            forecast_rows: rows.len(),
            summary: output.summary,
            paths: None,
        });
    }

    let paths = settings.export_paths(date);
    write_export_files(&paths, &output)?;

    Ok(ExportReport {
        forecast_rows: rows.len(),
        summary: output.summary,
        paths: Some(paths),
    })
}

/// Build then export
pub fn run_daily(
    settings: &Settings,
    date: &str,
    now: NaiveDateTime,
) -> Result<DailyReport, PipelineError> {
    let build = run_build_outputs(settings, date, now)?;
    let export = run_export(settings, date)?;

    info!(
        "Summary: races exported={} | skipped past={} | skipped forecast incomplete={} | selections={}",
        export.summary.races_exported,
        build.summary.skipped_past,
        export.summary.skipped_forecast_incomplete,
        export.summary.total_lines
    );

    Ok(DailyReport {
        date: date.to_string(),
        build,
        export,
    })
}
