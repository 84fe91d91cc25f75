//! Text normalization for scraped race-card strings
//!
//! Turns noisy track names, dog names and grade strings into canonical keys
//! used for joining, deduplication and strategy routing.
//!
//! Track names go through an explicit ordered list of [`TrackStep`]s. The
//! order matters: provider prefixes are stripped before date tokens so that a
//! provider code carrying digits is never read as a day number, and separators
//! are replaced before any token is matched.
//!
//! # Example
//!
//! ```
//! use greyhound_feed::core::normalize::{clean_dog_name, normalize_category, normalize_track_name};
//!
//! assert_eq!(normalize_track_name("SIS - Sheffield 3rd Dec Matinee"), "Sheffield");
//! assert_eq!(clean_dog_name("Fast Eddie (IRE)"), "Fast Eddie");
//! assert_eq!(normalize_category(" a-1 "), "A1");
//! ```

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static COUNTRY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([A-Z]{2,3})\)\s*$").unwrap());
static APOSTROPHES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{2019}\x{2018}']+").unwrap());
static NON_ALNUM_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z\s]+").unwrap());
static PARENTHESIS_CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());
static EMBEDDED_DAY_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})(?:st|nd|rd|th)").unwrap());
static NUMERIC_CAMEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\D)(\d)").unwrap());
static PROVIDER_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:SIS(?:\s+TV)?|TRP|RPGTV|SKY\s+SPORTS(?:\s+RACING)?|SPORTY\s+STUFF|PREM\.?\s*GH(?:\s*RACING)?|PREMIER\s+GREYHOUNDS|RACING\s+POST|TIMEFORM\s+TV|IGOBF|ISGB|BAGS|VC|RCE)\s*(?:-|/)?\s*",
    )
    .unwrap()
});
static COUNTRY_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Aus|Australia|Ire|Ireland|Nz|New\s+Zealand|Uk|United\s+Kingdom)\b\s*")
        .unwrap()
});
static DATE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\b").unwrap());
static MONTH_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\b",
    )
    .unwrap()
});
static DAY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Mon|Tue(?:s)?|Wed(?:nes)?|Thu(?:rs)?|Fri|Sat(?:ur)?|Sun)(?:day)?\b")
        .unwrap()
});
static SESSION_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:Matinee|Morning|Early|Late|Afternoon|Evening|Midnight|Night|Eve)\b")
        .unwrap()
});
static YEAR_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static TRAILING_DOGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:Dogs?|Dg)\b\s*$").unwrap());
static LEADING_THE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*The\s+").unwrap());
static VENUE_WORDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bGreyhound\s+Stadium\b|\bStadium\b|\bRacecourse\b").unwrap()
});
static VALLEY_TYPO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bValey\b").unwrap());

/// Known aliases mapped to the canonical track name
const CANONICAL_OVERRIDES: &[(&str, &str)] = &[
    ("Shelbourne", "Shelbourne Park"),
    ("Shelbourn", "Shelbourne Park"),
];

/// Collapse runs of whitespace into single spaces and trim both ends
pub fn normalize_spaces(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Remove ASCII and curly apostrophes
pub fn remove_apostrophes(text: &str) -> String {
    APOSTROPHES_RE.replace_all(text, "").into_owned()
}

/// Drop accents: NFKD decomposition with the combining marks removed
/// (é -> e, ñ -> n). Letters without a decomposition, like `ß`, are kept.
pub fn strip_accents(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Title-case every word: first letter of a run of letters upper-cased, the
/// rest lower-cased. A digit ends a word, so `"3rd"` becomes `"3Rd"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}

/// Canonical form of a race grade / category code.
///
/// Removes `/`, `\` and `-`, then trims, collapses whitespace and upper-cases.
/// Total and idempotent: `normalize_category(&normalize_category(x)) == normalize_category(x)`.
pub fn normalize_category(raw: &str) -> String {
    let cat: String = raw
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '-'))
        .collect();
    normalize_spaces(&cat).to_uppercase()
}

/// Clean a dog name scraped from a race card.
///
/// Strips a trailing country code such as `" (IRE)"`, removes apostrophes and
/// accents, turns any remaining punctuation into spaces and title-cases the
/// result. Whitespace-only input gives an empty string.
pub fn clean_dog_name(raw: &str) -> String {
    let name = COUNTRY_SUFFIX_RE.replace(raw, "");
    let name = normalize_spaces(&name);
    let name = remove_apostrophes(&name);
    let name = strip_accents(&name);
    let name = NON_ALNUM_SPACE_RE.replace_all(&name, " ");
    title_case(&normalize_spaces(&name))
}

/// A single named transform of the track-name pipeline
#[derive(Clone, Copy)]
pub struct TrackStep {
    pub name: &'static str,
    apply: fn(&str) -> String,
}

impl TrackStep {
    /// Run this step on its own
    pub fn apply(&self, input: &str) -> String {
        (self.apply)(input)
    }
}

impl std::fmt::Debug for TrackStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TrackStep").field(&self.name).finish()
    }
}

fn replace_separators(s: &str) -> String {
    s.replace(['/', '\\', '-'], " ")
}

fn strip_ordinal_suffix(s: &str) -> String {
    EMBEDDED_DAY_SUFFIX_RE.replace_all(s, "${1}").into_owned()
}

fn split_digit_boundary(s: &str) -> String {
    NUMERIC_CAMEL_RE.replace_all(s, "${1} ${2}").into_owned()
}

fn strip_provider_prefixes(s: &str) -> String {
    // Twice, for stacked prefixes like "SIS / TRP Romford"
    let once = PROVIDER_PREFIX_RE.replace(s, "");
    PROVIDER_PREFIX_RE.replace(&once, "").into_owned()
}

fn strip_country_prefix(s: &str) -> String {
    COUNTRY_PREFIX_RE.replace(s, "").into_owned()
}

fn strip_parenthesized(s: &str) -> String {
    PARENTHESIS_CONTENT_RE.replace_all(s, "").into_owned()
}

fn strip_day_numbers(s: &str) -> String {
    DATE_TOKEN_RE.replace_all(s, " ").into_owned()
}

fn strip_month_names(s: &str) -> String {
    MONTH_TOKEN_RE.replace_all(s, " ").into_owned()
}

fn strip_day_names(s: &str) -> String {
    DAY_TOKEN_RE.replace_all(s, " ").into_owned()
}

fn strip_session_tokens(s: &str) -> String {
    SESSION_TOKEN_RE.replace_all(s, " ").into_owned()
}

fn strip_years(s: &str) -> String {
    YEAR_TOKEN_RE.replace_all(s, " ").into_owned()
}

fn strip_dogs_suffix(s: &str) -> String {
    TRAILING_DOGS_RE.replace(s, " ").into_owned()
}

fn strip_leading_the(s: &str) -> String {
    LEADING_THE_RE.replace(s, "").into_owned()
}

fn fold_to_ascii(s: &str) -> String {
    let s = normalize_spaces(s);
    let s = remove_apostrophes(&s);
    strip_accents(&s)
}

fn strip_venue_words(s: &str) -> String {
    VENUE_WORDS_RE.replace_all(s, "").into_owned()
}

fn keep_alphanumeric(s: &str) -> String {
    let s = NON_ALNUM_SPACE_RE.replace_all(s, " ");
    title_case(&normalize_spaces(&s))
}

fn fix_known_typos(s: &str) -> String {
    VALLEY_TYPO_RE.replace_all(s, "Valley").into_owned()
}

fn apply_canonical_override(s: &str) -> String {
    CANONICAL_OVERRIDES
        .iter()
        .find(|(alias, _)| *alias == s)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| s.to_string())
}

/// Track-name pipeline, applied in this order after the initial whitespace
/// collapse and empty check
pub static TRACK_STEPS: &[TrackStep] = &[
    TrackStep { name: "replace_separators", apply: replace_separators },
    TrackStep { name: "strip_ordinal_suffix", apply: strip_ordinal_suffix },
    TrackStep { name: "split_digit_boundary", apply: split_digit_boundary },
    TrackStep { name: "strip_provider_prefixes", apply: strip_provider_prefixes },
    TrackStep { name: "strip_country_prefix", apply: strip_country_prefix },
    TrackStep { name: "strip_parenthesized", apply: strip_parenthesized },
    TrackStep { name: "strip_day_numbers", apply: strip_day_numbers },
    TrackStep { name: "strip_month_names", apply: strip_month_names },
    TrackStep { name: "strip_day_names", apply: strip_day_names },
    TrackStep { name: "strip_session_tokens", apply: strip_session_tokens },
    TrackStep { name: "strip_years", apply: strip_years },
    TrackStep { name: "strip_dogs_suffix", apply: strip_dogs_suffix },
    TrackStep { name: "strip_leading_the", apply: strip_leading_the },
    TrackStep { name: "fold_to_ascii", apply: fold_to_ascii },
    TrackStep { name: "strip_venue_words", apply: strip_venue_words },
    TrackStep { name: "keep_alphanumeric", apply: keep_alphanumeric },
    TrackStep { name: "fix_known_typos", apply: fix_known_typos },
    TrackStep { name: "apply_canonical_override", apply: apply_canonical_override },
];

/// Look up a track step by name
pub fn track_step(name: &str) -> Option<&'static TrackStep> {
    TRACK_STEPS.iter().find(|step| step.name == name)
}

/// Normalize a scraped track name into its lookup key.
///
/// Never returns an empty string for non-empty input: when every token is
/// stripped, the whitespace-collapsed, title-cased raw name is returned.
pub fn normalize_track_name(raw: &str) -> String {
    let collapsed = normalize_spaces(raw);
    if collapsed.is_empty() {
        return String::new();
    }

    let name = TRACK_STEPS
        .iter()
        .fold(collapsed.clone(), |acc, step| step.apply(&acc));

    if name.is_empty() {
        return title_case(&collapsed);
    }
    name
}
