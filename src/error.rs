use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::strategy::StrategyTag;
use crate::scraper::ScraperError;

/// Invalid configuration, detected when settings are loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("category prefix `{back}` (BACK) overlaps `{lay}` (LAY)")]
    OverlappingPrefixes { back: String, lay: String },

    #[error("empty category prefix in the {list} list")]
    EmptyPrefix { list: &'static str },

    #[error("stake for {tag} must be positive, got {stake}")]
    NonPositiveStake { tag: StrategyTag, stake: f64 },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pipeline stage errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] PolarsError),

    #[error("Page parsing error: {0}")]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
