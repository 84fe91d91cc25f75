//! Forecast record building
//!
//! Normalizes raw scraped races and splits them into the two output tables.
//! Each table has its own completeness gate, so one race can land in the top3
//! table and not in the forecast table, or the other way round:
//!
//! - top3 table: all three verdict picks present after cleaning
//! - forecast table: first forecast name present, and then the second and
//!   third as well

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::core::normalize::{clean_dog_name, normalize_category, normalize_spaces, normalize_track_name};
use crate::core::odds::parse_odds;
use crate::dates::{is_past_race, iso_to_hhmm, normalize_hhmm};
use crate::models::{ForecastRow, RaceFields, RawForecastRow, Top3Row};

/// Why a race was left out of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Top3Incomplete,
    ForecastEmpty,
    ForecastIncomplete,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DropReason::Top3Incomplete => "top3 incomplete",
            DropReason::ForecastEmpty => "forecast empty",
            DropReason::ForecastIncomplete => "forecast incomplete",
        };
        f.write_str(reason)
    }
}

/// Skip races that started before `now - grace_minutes`
#[derive(Debug, Clone, Copy)]
pub struct PastRaceFilter {
    pub now: NaiveDateTime,
    pub grace_minutes: i64,
}

/// Counters for one build run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub raw_rows: usize,
    pub skipped_past: usize,
    pub top3_rows: usize,
    pub forecast_rows: usize,
    pub dropped_top3_incomplete: usize,
    pub dropped_forecast_empty: usize,
    pub dropped_forecast_incomplete: usize,
}

/// Both output tables plus counters
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub top3: Vec<Top3Row>,
    pub forecast: Vec<ForecastRow>,
    pub summary: BuildSummary,
}

/// Builds the top3 and forecast tables from raw races
#[derive(Debug, Clone)]
pub struct ForecastRecordBuilder {
    default_date: String,
    past_filter: Option<PastRaceFilter>,
}

impl ForecastRecordBuilder {
    /// `default_date` is used for raw rows without a date
    pub fn new(default_date: impl Into<String>) -> Self {
        Self {
            default_date: default_date.into(),
            past_filter: None,
        }
    }

    pub fn with_past_race_filter(mut self, filter: PastRaceFilter) -> Self {
        self.past_filter = Some(filter);
        self
    }

    /// Zero-padded race time, taken from `race_time_iso` when `hhmm` is blank
    pub fn race_hhmm(&self, raw: &RawForecastRow) -> String {
        if raw.hhmm.trim().is_empty() {
            raw.race_time_iso
                .as_deref()
                .and_then(iso_to_hhmm)
                .unwrap_or_default()
        } else {
            normalize_hhmm(&raw.hhmm)
        }
    }

    /// Normalize the shared race fields
    pub fn race_fields(&self, raw: &RawForecastRow) -> RaceFields {
        let hhmm = self.race_hhmm(raw);

        let date = raw
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.default_date)
            .to_string();

        RaceFields {
            date,
            track: normalize_spaces(&raw.track),
            track_key: normalize_track_name(&raw.track),
            hhmm,
            category_raw: normalize_spaces(&raw.category_raw),
            category_norm: normalize_category(&raw.category_raw),
        }
    }

    /// Top3 row, or why the race is not in the top3 table
    pub fn build_top3(&self, raw: &RawForecastRow) -> Result<Top3Row, DropReason> {
        let dogs = cleaned_triple(raw.top3.iter().map(String::as_str));
        if dogs.iter().any(String::is_empty) {
            return Err(DropReason::Top3Incomplete);
        }

        Ok(Top3Row {
            race: self.race_fields(raw),
            dogs,
        })
    }

    /// Forecast row, or why the race is not in the forecast table
    pub fn build_forecast(&self, raw: &RawForecastRow) -> Result<ForecastRow, DropReason> {
        let names = cleaned_triple(raw.forecast.iter().map(|e| e.name.as_str()));
        if names[0].is_empty() {
            return Err(DropReason::ForecastEmpty);
        }
        if names[1].is_empty() || names[2].is_empty() {
            return Err(DropReason::ForecastIncomplete);
        }

        let mut odds = [None; 3];
        for (slot, entry) in odds.iter_mut().zip(raw.forecast.iter()) {
            *slot = entry.odds_text.as_deref().and_then(parse_odds);
        }

        Ok(ForecastRow {
            race: self.race_fields(raw),
            names,
            odds,
        })
    }

    /// Build both tables
    pub fn build(&self, rows: &[RawForecastRow]) -> BuildOutput {
        let mut out = BuildOutput::default();
        out.summary.raw_rows = rows.len();

        for raw in rows {
            if let Some(filter) = &self.past_filter {
                if is_past_race(&self.race_hhmm(raw), filter.now, filter.grace_minutes) {
                    out.summary.skipped_past += 1;
                    continue;
                }
            }

            match self.build_top3(raw) {
                Ok(row) => out.top3.push(row),
                Err(reason) => {
                    warn!("Race dropped from top3 ({}): {} {}", reason, raw.track, raw.hhmm);
                    out.summary.dropped_top3_incomplete += 1;
                }
            }

            match self.build_forecast(raw) {
                Ok(row) => out.forecast.push(row),
                Err(reason) => {
                    warn!("Race dropped from forecast ({}): {} {}", reason, raw.track, raw.hhmm);
                    match reason {
                        DropReason::ForecastEmpty => out.summary.dropped_forecast_empty += 1,
                        _ => out.summary.dropped_forecast_incomplete += 1,
                    }
                }
            }
        }

        out.summary.top3_rows = out.top3.len();
        out.summary.forecast_rows = out.forecast.len();
        out
    }
}

/// First three names, cleaned; missing positions are empty strings
fn cleaned_triple<'a>(names: impl Iterator<Item = &'a str>) -> [String; 3] {
    let mut out: [String; 3] = Default::default();
    for (slot, name) in out.iter_mut().zip(names) {
        *slot = clean_dog_name(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastEntry;
    use chrono::NaiveDate;

    fn raw(top3: &[&str], forecast: &[(&str, &str)]) -> RawForecastRow {
        RawForecastRow {
            date: Some("2025-01-14".to_string()),
            track: "SIS - Romford  3rd Jan".to_string(),
            hhmm: "13:10".to_string(),
            race_time_iso: None,
            category_raw: " a-4 ".to_string(),
            top3: top3.iter().map(|s| s.to_string()).collect(),
            forecast: forecast
                .iter()
                .map(|(name, odds)| ForecastEntry::new(*name, Some(*odds)))
                .collect(),
        }
    }

    fn full() -> RawForecastRow {
        raw(
            &["Fast Eddie (IRE)", "blue moon", "Swift Lad"],
            &[("Blue Moon", "6/4"), ("Fast Eddie (IRE)", "2/1"), ("Swift Lad", "junk")],
        )
    }

    #[test]
    fn test_race_fields_normalized() {
        let fields = ForecastRecordBuilder::new("2000-01-01").race_fields(&full());
        assert_eq!(fields.date, "2025-01-14");
        assert_eq!(fields.track, "SIS - Romford 3rd Jan");
        assert_eq!(fields.track_key, "Romford");
        assert_eq!(fields.hhmm, "13:10");
        assert_eq!(fields.category_raw, "a-4");
        assert_eq!(fields.category_norm, "A4");
    }

    #[test]
    fn test_race_fields_fallbacks() {
        let mut row = full();
        row.date = None;
        row.hhmm = String::new();
        row.race_time_iso = Some("2025-01-14T09:05:00".to_string());

        let fields = ForecastRecordBuilder::new("2025-01-15").race_fields(&row);
        assert_eq!(fields.date, "2025-01-15");
        assert_eq!(fields.hhmm, "09:05");
    }

    #[test]
    fn test_hhmm_zero_padded() {
        let mut row = full();
        row.hhmm = "9:05".to_string();
        let fields = ForecastRecordBuilder::new("2025-01-14").race_fields(&row);
        assert_eq!(fields.hhmm, "09:05");
    }

    #[test]
    fn test_build_top3_cleans_names() {
        let row = ForecastRecordBuilder::new("2025-01-14").build_top3(&full()).unwrap();
        assert_eq!(row.dogs, ["Fast Eddie", "Blue Moon", "Swift Lad"]);
    }

    #[test]
    fn test_build_top3_incomplete() {
        let builder = ForecastRecordBuilder::new("2025-01-14");
        let row = raw(&["A", "B"], &[]);
        assert_eq!(builder.build_top3(&row), Err(DropReason::Top3Incomplete));

        let row = raw(&["A", "  ", "C"], &[]);
        assert_eq!(builder.build_top3(&row), Err(DropReason::Top3Incomplete));
    }

    #[test]
    fn test_build_forecast_odds() {
        let row = ForecastRecordBuilder::new("2025-01-14")
            .build_forecast(&full())
            .unwrap();
        assert_eq!(row.names, ["Blue Moon", "Fast Eddie", "Swift Lad"]);
        assert_eq!(row.odds, [Some(2.5), Some(3.0), None]);
    }

    #[test]
    fn test_build_forecast_gates() {
        let builder = ForecastRecordBuilder::new("2025-01-14");

        let empty = raw(&["A", "B", "C"], &[]);
        assert_eq!(builder.build_forecast(&empty), Err(DropReason::ForecastEmpty));

        let two = raw(&["A", "B", "C"], &[("One", "2/1"), ("Two", "3/1")]);
        assert_eq!(builder.build_forecast(&two), Err(DropReason::ForecastIncomplete));
    }

    #[test]
    fn test_build_splits_tables_independently() {
        let rows = vec![
            full(),
            // forecast only
            raw(&["A", "B"], &[("One", "2/1"), ("Two", "3/1"), ("Three", "4/1")]),
            // top3 only
            raw(&["A", "B", "C"], &[("One", "2/1")]),
            // neither
            raw(&[], &[]),
        ];

        let out = ForecastRecordBuilder::new("2025-01-14").build(&rows);
        assert_eq!(out.top3.len(), 2);
        assert_eq!(out.forecast.len(), 2);
        assert_eq!(
            out.summary,
            BuildSummary {
                raw_rows: 4,
                skipped_past: 0,
                top3_rows: 2,
                forecast_rows: 2,
                dropped_top3_incomplete: 2,
                dropped_forecast_empty: 1,
                dropped_forecast_incomplete: 1,
            }
        );
    }

    #[test]
    fn test_build_skips_past_races() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let mut late = full();
        late.hhmm = "19:30".to_string();

        let out = ForecastRecordBuilder::new("2025-01-14")
            .with_past_race_filter(PastRaceFilter {
                now,
                grace_minutes: 2,
            })
            .build(&[full(), late]);

        assert_eq!(out.summary.skipped_past, 1);
        assert_eq!(out.forecast.len(), 1);
        assert_eq!(out.forecast[0].race.hhmm, "19:30");
    }

    #[test]
    fn test_past_filter_uses_iso_time_when_hhmm_blank() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 14)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        let mut early = full();
        early.hhmm = String::new();
        early.race_time_iso = Some("2025-01-14T09:05".to_string());
        let mut late = full();
        late.hhmm = " ".to_string();
        late.race_time_iso = Some("2025-01-14T19:30:00".to_string());

        let out = ForecastRecordBuilder::new("2025-01-14")
            .with_past_race_filter(PastRaceFilter {
                now,
                grace_minutes: 2,
            })
            .build(&[early, late]);

        assert_eq!(out.summary.skipped_past, 1);
        assert_eq!(out.forecast.len(), 1);
        assert_eq!(out.forecast[0].race.hhmm, "19:30");
    }

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(DropReason::Top3Incomplete.to_string(), "top3 incomplete");
        assert_eq!(DropReason::ForecastEmpty.to_string(), "forecast empty");
        assert_eq!(DropReason::ForecastIncomplete.to_string(), "forecast incomplete");
    }
}
