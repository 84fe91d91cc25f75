//! Saved race-card page parsing
//!
//! Parses the HTML of the day's card index (meetings and race links) and of a
//! single race page (verdict picks, grade and betting forecast). Fetching the
//! pages is left to the browser driving the site.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use super::forecast_text::{extract_grade, parse_forecast_text};
use super::ScraperError;
use crate::core::normalize::{normalize_spaces, normalize_track_name};
use crate::dates::hhmm_to_iso;
use crate::models::RawForecastRow;

/// Base URL race links are resolved against
pub const TIMEFORM_BASE_URL: &str = "https://www.timeform.com/greyhound-racing/";

/// A race link from the card index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceCard {
    pub track_name: String,
    pub track_key: String,
    pub hhmm: String,
    pub url: Option<String>,
}

impl RaceCard {
    /// File name a saved copy of this race page is looked up under,
    /// e.g. `shelbourne-park_1958.html`
    pub fn page_file_name(&self) -> String {
        let mut slug = String::with_capacity(self.track_key.len());
        for c in self.track_key.chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        let slug = slug.trim_end_matches('-');
        let time: String = self.hhmm.chars().filter(char::is_ascii_digit).collect();
        format!("{}_{}.html", slug, time)
    }
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::ParseError(e.to_string()))
}

fn element_text(el: &ElementRef) -> String {
    normalize_spaces(&el.text().collect::<String>())
}

fn parse_url(link: &str, base: Option<&Url>) -> Result<Url, ScraperError> {
    let parsed = match base {
        Some(base) => base.join(link),
        None => Url::parse(link),
    };
    parsed.map_err(|e| ScraperError::InvalidUrl {
        link: link.to_string(),
        reason: e.to_string(),
    })
}

fn resolve_link(base: &Url, el: &ElementRef) -> Result<Option<String>, ScraperError> {
    let href = el
        .value()
        .attr("href")
        .or_else(|| el.value().attr("ng-href"));

    match href {
        Some(h) if h.starts_with("http") => Ok(Some(h.to_string())),
        Some(h) => Ok(Some(parse_url(h, Some(base))?.to_string())),
        None => Ok(None),
    }
}

/// Parse race cards from the card index page.
///
/// Meetings are read from `.wfr-bytrack-content .wfr-meeting`; when that
/// layout is absent the older `.w-cards-results section` layout is tried.
pub fn parse_race_cards(html: &str, base_url: &str) -> Result<Vec<RaceCard>, ScraperError> {
    let document = Html::parse_document(html);
    let base = parse_url(base_url, None)?;

    let layouts = [
        (".wfr-bytrack-content .wfr-meeting", "b.wfr-track", "ul li a.wfr-race"),
        (".w-cards-results section", "h3", "li a"),
    ];

    for (meeting_css, track_css, link_css) in layouts {
        let meeting_sel = selector(meeting_css)?;
        let track_sel = selector(track_css)?;
        let link_sel = selector(link_css)?;

        let mut cards = Vec::new();
        for meeting in document.select(&meeting_sel) {
            let Some(track_el) = meeting.select(&track_sel).next() else {
                continue;
            };
            let track_name = element_text(&track_el);
            if track_name.is_empty() {
                continue;
            }
            let track_key = normalize_track_name(&track_name);

            for link in meeting.select(&link_sel) {
                cards.push(RaceCard {
                    track_name: track_name.clone(),
                    track_key: track_key.clone(),
                    hhmm: element_text(&link),
                    url: resolve_link(&base, &link)?,
                });
            }
        }

        if !cards.is_empty() {
            return Ok(cards);
        }
    }

    Ok(Vec::new())
}

/// Verdict picks, best first, at most three
fn extract_top3(document: &Html) -> Result<Vec<String>, ScraperError> {
    let selection_sel = selector(".rpf-verdict-container .rpf-verdict-selection")?;
    let name_sel = selector(".rpf-verdict-selection-name a")?;

    Ok(document
        .select(&selection_sel)
        .take(3)
        .filter_map(|sel| sel.select(&name_sel).next())
        .map(|el| element_text(&el))
        .filter(|name| !name.is_empty())
        .collect())
}

fn extract_forecast_paragraph(document: &Html) -> Result<Option<String>, ScraperError> {
    let p_sel = selector("p")?;
    Ok(document
        .select(&p_sel)
        .map(|p| p.text().collect::<String>())
        .find(|text| text.contains("Betting Forecast")))
}

fn body_text(document: &Html) -> Result<String, ScraperError> {
    let body_sel = selector("body")?;
    Ok(document
        .select(&body_sel)
        .next()
        .map(|b| b.text().collect::<Vec<_>>().join("\n"))
        .unwrap_or_default())
}

/// Parse a race page into a raw forecast row for `card`
pub fn parse_race_page(
    html: &str,
    card: &RaceCard,
    date: &str,
) -> Result<RawForecastRow, ScraperError> {
    let document = Html::parse_document(html);

    let top3 = extract_top3(&document)?;
    let body = body_text(&document)?;
    let category_raw = extract_grade(&body);

    let forecast = match extract_forecast_paragraph(&document)? {
        Some(text) => parse_forecast_text(&text),
        None if body.contains("Betting Forecast") => parse_forecast_text(&body),
        None => Vec::new(),
    };

    if forecast.is_empty() {
        tracing::warn!("Betting forecast not found: {} {}", card.track_name, card.hhmm);
    }

    let race_time_iso = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|day| hhmm_to_iso(&card.hhmm, day));

    Ok(RawForecastRow {
        date: Some(date.to_string()),
        track: card.track_name.clone(),
        hhmm: card.hhmm.clone(),
        race_time_iso,
        category_raw,
        top3,
        forecast,
    })
}
