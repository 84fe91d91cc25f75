//! CSV loading and frame building for the pipeline tables
//!
//! Every read disables schema inference, so all columns come back as text and
//! numeric-looking or empty cells never change a column's type. A missing file
//! reads as an empty table.

use polars::prelude::*;
use std::path::Path;
use tracing::warn;

use crate::core::normalize::{normalize_category, normalize_spaces, normalize_track_name};
use crate::models::{AuditRecord, ForecastEntry, ForecastRow, RaceFields, RawForecastRow, Top3Row};

/// Race columns shared by the top3 and forecast tables
pub const RACE_COLUMNS: [&str; 6] = [
    "date",
    "track",
    "track_key",
    "hhmm",
    "category_raw",
    "category_norm",
];

pub const TOP3_COLUMNS: [&str; 3] = ["dog_1", "dog_2", "dog_3"];
pub const FORECAST_NAME_COLUMNS: [&str; 3] = ["forecast_1", "forecast_2", "forecast_3"];
pub const FORECAST_ODDS_COLUMNS: [&str; 3] =
    ["forecast_1_odds", "forecast_2_odds", "forecast_3_odds"];

const RAW_TOP3_COLUMNS: [&str; 3] = ["TimeformTop1", "TimeformTop2", "TimeformTop3"];
const RAW_FORECAST_COLUMNS: [&str; 3] = ["Forecast1", "Forecast2", "Forecast3"];
const RAW_FORECAST_ODDS_COLUMNS: [&str; 3] = ["Forecast1Odds", "Forecast2Odds", "Forecast3Odds"];

/// Read a CSV file with every column as text; `None` when the file is absent
fn read_text_csv(path: &Path) -> Result<Option<DataFrame>, PolarsError> {
    if !path.exists() {
        warn!("Table not found, treating as empty: {}", path.display());
        return Ok(None);
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(Some(df))
}

/// Text column accessor that tolerates missing columns
struct TextColumns<'a> {
    df: &'a DataFrame,
}

impl<'a> TextColumns<'a> {
    fn new(df: &'a DataFrame) -> Self {
        Self { df }
    }

    fn column(&self, name: &str) -> Option<&'a StringChunked> {
        self.df.column(name).ok().and_then(|s| s.str().ok())
    }

    /// Cell text, trimmed; missing column, null and blank all give `None`
    fn get(&self, name: &str, row: usize) -> Option<String> {
        self.column(name)
            .and_then(|col| col.get(row))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn get_or_empty(&self, name: &str, row: usize) -> String {
        self.get(name, row).unwrap_or_default()
    }

    fn race_fields(&self, row: usize) -> RaceFields {
        RaceFields {
            date: self.get_or_empty("date", row),
            track: self.get_or_empty("track", row),
            track_key: self.get_or_empty("track_key", row),
            hhmm: self.get_or_empty("hhmm", row),
            category_raw: self.get_or_empty("category_raw", row),
            category_norm: self.get_or_empty("category_norm", row),
        }
    }
}

/// Load the raw scraped table
pub fn load_raw_forecast(path: &Path) -> Result<Vec<RawForecastRow>, PolarsError> {
    let Some(df) = read_text_csv(path)? else {
        return Ok(Vec::new());
    };
    let cols = TextColumns::new(&df);

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let top3 = RAW_TOP3_COLUMNS
            .iter()
            .map(|c| cols.get_or_empty(c, i))
            .collect();

        let mut forecast = Vec::with_capacity(3);
        for (name_col, odds_col) in RAW_FORECAST_COLUMNS.iter().zip(RAW_FORECAST_ODDS_COLUMNS) {
            let name = cols.get_or_empty(name_col, i);
            if name.is_empty() {
                break;
            }
            forecast.push(ForecastEntry::new(name, cols.get(odds_col, i).as_deref()));
        }

        rows.push(RawForecastRow {
            date: cols.get("date", i),
            track: cols.get_or_empty("track", i),
            hhmm: cols.get_or_empty("hhmm", i),
            race_time_iso: cols.get("race_time_iso", i),
            category_raw: cols.get_or_empty("category_raw", i),
            top3,
            forecast,
        });
    }

    Ok(rows)
}

/// Load a top3 table written by [`top3_frame`]
pub fn load_top3_table(path: &Path) -> Result<Vec<Top3Row>, PolarsError> {
    let Some(df) = read_text_csv(path)? else {
        return Ok(Vec::new());
    };
    let cols = TextColumns::new(&df);

    Ok((0..df.height())
        .map(|i| Top3Row {
            race: cols.race_fields(i),
            dogs: TOP3_COLUMNS.map(|c| cols.get_or_empty(c, i)),
        })
        .collect())
}

/// Load a forecast table written by [`forecast_frame`]. Odds cells that are
/// not plain decimals load as `None`.
pub fn load_forecast_table(path: &Path) -> Result<Vec<ForecastRow>, PolarsError> {
    let Some(df) = read_text_csv(path)? else {
        return Ok(Vec::new());
    };
    let cols = TextColumns::new(&df);

    Ok((0..df.height())
        .map(|i| ForecastRow {
            race: cols.race_fields(i),
            names: FORECAST_NAME_COLUMNS.map(|c| normalize_spaces(&cols.get_or_empty(c, i))),
            odds: FORECAST_ODDS_COLUMNS
                .map(|c| cols.get(c, i).and_then(|s| s.parse::<f64>().ok())),
        })
        .collect())
}

fn race_series<'a>(races: impl Iterator<Item = &'a RaceFields> + Clone) -> Vec<Series> {
    let field = |name: &str, get: fn(&RaceFields) -> &str| {
        Series::new(name, races.clone().map(get).collect::<Vec<_>>())
    };

    vec![
        field("date", |r| &r.date),
        field("track", |r| &r.track),
        field("track_key", |r| &r.track_key),
        field("hhmm", |r| &r.hhmm),
        field("category_raw", |r| &r.category_raw),
        field("category_norm", |r| &r.category_norm),
    ]
}

/// Frame for the raw scraped table, in the layout [`load_raw_forecast`] reads.
/// Missing picks and forecast positions are written as empty cells.
pub fn raw_frame(rows: &[RawForecastRow]) -> Result<DataFrame, PolarsError> {
    let text = |name: &str, get: &dyn Fn(&RawForecastRow) -> Option<&str>| {
        Series::new(name, rows.iter().map(get).collect::<Vec<_>>())
    };
    let owned = |name: &str, get: fn(&RawForecastRow) -> String| {
        Series::new(name, rows.iter().map(get).collect::<Vec<_>>())
    };

    let mut columns = vec![
        text("date", &|r| r.date.as_deref()),
        text("track", &|r| Some(r.track.as_str())),
        owned("track_key", |r| normalize_track_name(&r.track)),
        text("hhmm", &|r| Some(r.hhmm.as_str())),
        text("race_time_iso", &|r| r.race_time_iso.as_deref()),
        text("category_raw", &|r| Some(r.category_raw.as_str())),
        owned("category_norm", |r| normalize_category(&r.category_raw)),
    ];
    for (idx, name) in RAW_TOP3_COLUMNS.iter().enumerate() {
        columns.push(text(name, &|r| r.top3.get(idx).map(String::as_str)));
    }
    for (idx, name) in RAW_FORECAST_COLUMNS.iter().enumerate() {
        columns.push(text(name, &|r| r.forecast.get(idx).map(|e| e.name.as_str())));
    }
    for (idx, name) in RAW_FORECAST_ODDS_COLUMNS.iter().enumerate() {
        columns.push(text(name, &|r| {
            r.forecast.get(idx).and_then(|e| e.odds_text.as_deref())
        }));
    }
    DataFrame::new(columns)
}

/// Frame for the top3 table
pub fn top3_frame(rows: &[Top3Row]) -> Result<DataFrame, PolarsError> {
    let mut columns = race_series(rows.iter().map(|r| &r.race));
    for (idx, name) in TOP3_COLUMNS.iter().enumerate() {
        let dogs: Vec<&str> = rows.iter().map(|r| r.dogs[idx].as_str()).collect();
        columns.push(Series::new(name, dogs));
    }
    DataFrame::new(columns)
}

/// Frame for the forecast table
pub fn forecast_frame(rows: &[ForecastRow]) -> Result<DataFrame, PolarsError> {
    let mut columns = race_series(rows.iter().map(|r| &r.race));
    for (idx, name) in FORECAST_NAME_COLUMNS.iter().enumerate() {
        let names: Vec<&str> = rows.iter().map(|r| r.names[idx].as_str()).collect();
        columns.push(Series::new(name, names));
    }
    for (idx, name) in FORECAST_ODDS_COLUMNS.iter().enumerate() {
        let odds: Vec<Option<f64>> = rows.iter().map(|r| r.odds[idx]).collect();
        columns.push(Series::new(name, odds));
    }
    DataFrame::new(columns)
}

/// Frame for the export audit CSV
pub fn audit_frame(records: &[AuditRecord]) -> Result<DataFrame, PolarsError> {
    let text = |name: &str, get: fn(&AuditRecord) -> &str| {
        Series::new(name, records.iter().map(get).collect::<Vec<_>>())
    };

    DataFrame::new(vec![
        text("date", |r| &r.date),
        text("track", |r| &r.track),
        text("hhmm", |r| &r.hhmm),
        text("category_raw", |r| &r.category_raw),
        text("category_norm", |r| &r.category_norm),
        text("dog_name", |r| &r.dog_name),
        text("strategy_tag", |r| r.strategy_tag.as_str()),
        Series::new("stake", records.iter().map(|r| r.stake).collect::<Vec<f64>>()),
    ])
}
