use serde::{Deserialize, Serialize};

use crate::core::strategy::StrategyTag;

/// One entry of a race's betting forecast, as scraped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub name: String,
    /// Odds text such as `"5/2"` or `"evs"`; decimal odds are accepted too
    pub odds_text: Option<String>,
}

impl ForecastEntry {
    pub fn new(name: impl Into<String>, odds_text: Option<&str>) -> Self {
        Self {
            name: name.into(),
            odds_text: odds_text.map(str::to_string),
        }
    }
}

/// One race as handed over by the scraping stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawForecastRow {
    pub date: Option<String>,
    pub track: String,
    /// Race time, `HH:MM` 24h
    pub hhmm: String,
    pub race_time_iso: Option<String>,
    pub category_raw: String,
    /// Verdict picks, best first
    pub top3: Vec<String>,
    /// Betting forecast, favourite first
    pub forecast: Vec<ForecastEntry>,
}

/// Race identity and normalized race fields shared by the output tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceFields {
    pub date: String,
    /// Display name, whitespace-collapsed
    pub track: String,
    /// Fully normalized lookup key
    pub track_key: String,
    pub hhmm: String,
    pub category_raw: String,
    pub category_norm: String,
}

/// Row of the top3 table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Top3Row {
    #[serde(flatten)]
    pub race: RaceFields,
    pub dogs: [String; 3],
}

/// Row of the forecast table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    #[serde(flatten)]
    pub race: RaceFields,
    pub names: [String; 3],
    pub odds: [Option<f64>; 3],
}

/// One exported trading instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub track: String,
    pub hhmm: String,
    pub dog_name: String,
    pub strategy_tag: StrategyTag,
    pub stake: f64,
    /// Forecast rank, 0 for the favourite
    pub order: u8,
    pub category_raw: String,
    pub category_norm: String,
}

impl Selection {
    /// Format as a MarketFeeder import line:
    /// `[<hhmm> <track>]<dog>\t"<TAG>"\t<stake>`.
    ///
    /// Tabs and brackets inside the track or dog name are written as is.
    pub fn to_line(&self) -> String {
        format!(
            "[{} {}]{}\t\"{}\"\t{}",
            self.hhmm,
            self.track,
            self.dog_name,
            self.strategy_tag,
            format_stake(self.stake)
        )
    }

    pub fn to_audit(&self, date: &str) -> AuditRecord {
        AuditRecord {
            date: date.to_string(),
            track: self.track.clone(),
            hhmm: self.hhmm.clone(),
            category_raw: self.category_raw.clone(),
            category_norm: self.category_norm.clone(),
            dog_name: self.dog_name.clone(),
            strategy_tag: self.strategy_tag,
            stake: self.stake,
        }
    }
}

/// Audit CSV row, one per exported selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub date: String,
    pub track: String,
    pub hhmm: String,
    pub category_raw: String,
    pub category_norm: String,
    pub dog_name: String,
    pub strategy_tag: StrategyTag,
    pub stake: f64,
}

/// Stakes keep one decimal place when whole (`1.0`, not `1`)
pub fn format_stake(stake: f64) -> String {
    if stake.fract() == 0.0 && stake.is_finite() {
        format!("{:.1}", stake)
    } else {
        format!("{}", stake)
    }
}
