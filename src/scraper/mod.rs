//! Race-card text and page parsing
//!
//! Turns what the browser collects from the racing site into
//! [`RawForecastRow`](crate::models::RawForecastRow)s. Page navigation,
//! cookie banners and retries belong to the browser automation driving the
//! site, not to this module.
//!
//! # Example
//!
//! ```no_run
//! use greyhound_feed::scraper::{parse_race_cards, parse_race_page, TIMEFORM_BASE_URL};
//!
//! # fn main() -> Result<(), greyhound_feed::scraper::ScraperError> {
//! let index_html = std::fs::read_to_string("cards.html").unwrap();
//! for card in parse_race_cards(&index_html, TIMEFORM_BASE_URL)? {
//!     let page = std::fs::read_to_string(card.page_file_name()).unwrap();
//!     let row = parse_race_page(&page, &card, "2025-01-14")?;
//!     println!("{} {}: {} forecast entries", row.track, row.hhmm, row.forecast.len());
//! }
//! # Ok(())
//! # }
//! ```

mod forecast_text;
#[cfg(feature = "html")]
mod race_page;

pub use forecast_text::{extract_grade, parse_forecast_text, UNKNOWN_GRADE};
#[cfg(feature = "html")]
pub use race_page::{parse_race_cards, parse_race_page, RaceCard, TIMEFORM_BASE_URL};

use thiserror::Error;

/// Page parsing errors
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("Invalid race link {link:?}: {reason}")]
    InvalidUrl { link: String, reason: String },
}
