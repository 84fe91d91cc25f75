//! Betting odds parsing
//!
//! Forecast odds are scraped as fractional text (`"5/2"`, `"evs"`). They are
//! stored as decimal odds rounded to two places. Text that does not match the
//! grammar is treated as absent odds, never as an error.

use regex::Regex;
use std::sync::LazyLock;

static FRACTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*/\s*([0-9]+)$").unwrap());
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").unwrap());

/// Convert fractional odds text to decimal odds
///
/// # Examples
/// ```
/// use greyhound_feed::core::odds::fractional_to_decimal;
/// assert_eq!(fractional_to_decimal("5/2"), Some(3.5));
/// assert_eq!(fractional_to_decimal("Evens"), Some(2.0));
/// assert_eq!(fractional_to_decimal("n/a"), None);
/// ```
pub fn fractional_to_decimal(text: &str) -> Option<f64> {
    let txt = text.trim().to_lowercase();
    if txt.is_empty() {
        return None;
    }
    if txt == "evs" || txt == "evens" {
        return Some(2.0);
    }

    let caps = FRACTIONAL_RE.captures(&txt)?;
    let num: u64 = caps[1].parse().ok()?;
    let den: u64 = match caps[2].parse().ok()? {
        0 => 1,
        d => d,
    };

    Some(round2(num as f64 / den as f64 + 1.0))
}

/// Parse an odds cell from a stored table.
///
/// Accepts fractional text as well as decimal odds already converted by an
/// earlier stage. Decimal odds below 1.0 are not valid odds.
pub fn parse_odds(text: &str) -> Option<f64> {
    if let Some(odds) = fractional_to_decimal(text) {
        return Some(odds);
    }

    let txt = text.trim();
    if !DECIMAL_RE.is_match(txt) {
        return None;
    }
    let odds: f64 = txt.parse().ok()?;
    (odds >= 1.0).then_some(round2(odds))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_to_decimal() {
        assert_eq!(fractional_to_decimal("5/2"), Some(3.5));
        assert_eq!(fractional_to_decimal("11 / 4"), Some(3.75));
        assert_eq!(fractional_to_decimal("1/3"), Some(1.33));
        assert_eq!(fractional_to_decimal(" 2/1 "), Some(3.0));
    }

    #[test]
    fn test_evens() {
        assert_eq!(fractional_to_decimal("evs"), Some(2.0));
        assert_eq!(fractional_to_decimal("EVENS"), Some(2.0));
    }

    #[test]
    fn test_zero_denominator_treated_as_one() {
        assert_eq!(fractional_to_decimal("4/0"), Some(5.0));
    }

    #[test]
    fn test_malformed_odds_are_absent() {
        assert_eq!(fractional_to_decimal(""), None);
        assert_eq!(fractional_to_decimal("5-2"), None);
        assert_eq!(fractional_to_decimal("abc"), None);
        assert_eq!(fractional_to_decimal("5/2 fav"), None);
    }

    #[test]
    fn test_parse_odds_accepts_decimal_cells() {
        assert_eq!(parse_odds("3.5"), Some(3.5));
        assert_eq!(parse_odds("4"), Some(4.0));
        assert_eq!(parse_odds("7/4"), Some(2.75));
        assert_eq!(parse_odds("0.5"), None);
        assert_eq!(parse_odds("-2"), None);
        assert_eq!(parse_odds(""), None);
    }
}
