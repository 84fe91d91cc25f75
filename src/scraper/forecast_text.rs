//! Text extraction from race page text
//!
//! Handles the "Betting Forecast" paragraph and the grade label. Both work on
//! plain text so they can be fed from any page source.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ForecastEntry;

const FORECAST_MARKER: &str = "Betting Forecast";

static GRADE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Grade:\s*\(([A-Z]{1,3}\d{0,2})\)").unwrap());
static ODDS_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<odd>[0-9]+\s*/\s*[0-9]+|evs|evens)\s+(?P<name>.+)$").unwrap()
});
static NAME_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<name>.+?)\s+(?P<odd>[0-9]+\s*/\s*[0-9]+|evs|evens)$").unwrap()
});

/// Grade reported when the page carries none
pub const UNKNOWN_GRADE: &str = "UNK";

/// Parse the betting forecast out of page text.
///
/// Reads the first line after the `Betting Forecast` marker (or the whole text
/// when the marker is absent) and splits it on commas. Each item is either
/// `<odds> <name>` or `<name> <odds>`; items matching neither are skipped.
/// Names are returned as scraped.
///
/// # Example
///
/// ```
/// use greyhound_feed::scraper::parse_forecast_text;
///
/// let entries = parse_forecast_text("Betting Forecast: 2/1 Dog One, Dog Two 5/2, evs Dog Three");
/// assert_eq!(entries.len(), 3);
/// assert_eq!(entries[1].name, "Dog Two");
/// assert_eq!(entries[1].odds_text.as_deref(), Some("5/2"));
/// ```
pub fn parse_forecast_text(text: &str) -> Vec<ForecastEntry> {
    let raw = match text.split_once(FORECAST_MARKER) {
        Some((_, after)) => after,
        None => text,
    };
    let raw = raw.trim_start().trim_start_matches(':').trim();
    let line = raw.lines().next().unwrap_or("").trim();

    line.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(parse_forecast_item)
        .collect()
}

fn parse_forecast_item(part: &str) -> Option<ForecastEntry> {
    let caps = ODDS_FIRST_RE
        .captures(part)
        .or_else(|| NAME_FIRST_RE.captures(part))?;

    Some(ForecastEntry::new(
        caps["name"].trim(),
        Some(caps["odd"].trim()),
    ))
}

/// Extract the grade code from page text.
///
/// `"Grade: (A3)"` gives `"A3"`; pages without a grade label that mention an
/// open race give `"OR"`; anything else gives [`UNKNOWN_GRADE`].
pub fn extract_grade(text: &str) -> String {
    if let Some(caps) = GRADE_RE.captures(text) {
        return caps[1].to_uppercase().replace(' ', "");
    }
    if text.to_lowercase().contains("open race") {
        return "OR".to_string();
    }
    UNKNOWN_GRADE.to_string()
}
