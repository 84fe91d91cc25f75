//! Greyhound Feed - greyhound forecast to MarketFeeder import pipeline
//!
//! This library provides:
//! - Track, dog and category name normalization
//! - Category-based BACK/LAY strategy routing
//! - Top3 and forecast table building from scraped race rows
//! - MarketFeeder selection export with audit output and atomic writes
//!
//! # Example
//!
//! ```no_run
//! use greyhound_feed::config::Settings;
//! use greyhound_feed::pipeline::run_daily;
//!
//! let settings = Settings::load(None).unwrap();
//! let now = chrono::Local::now().naive_local();
//! let report = run_daily(&settings, "2025-01-14", now).unwrap();
//! println!("Selections: {}", report.export.summary.total_lines);
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod dates;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod scraper;

// Re-export commonly used types
pub use crate::core::normalize::{
    clean_dog_name, normalize_category, normalize_spaces, normalize_track_name,
};
pub use crate::core::strategy::{CategoryRules, StrategyDecision, StrategyTag};
pub use config::Settings;
pub use data::builder::{BuildSummary, ForecastRecordBuilder};
pub use error::{ConfigError, PipelineError};
pub use export::exporter::{ExportOutput, ExportSummary, SelectionExporter};
pub use models::{AuditRecord, ForecastEntry, ForecastRow, RawForecastRow, Selection, Top3Row};
