//! Category strategy routing
//!
//! Maps a normalized grade code to a trading strategy (`BACK` or `LAY`) and a
//! stake by plain string-prefix matching against two configured lists.
//!
//! The two lists must be disjoint: no prefix of one list may be a prefix of
//! (or equal to) a prefix of the other, otherwise a single category could match
//! both. [`CategoryRules::new`] rejects such configurations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize::normalize_category;
use crate::error::ConfigError;

/// Trading strategy attached to an exported selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StrategyTag {
    Back,
    Lay,
}

impl StrategyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::Back => "BACK",
            StrategyTag::Lay => "LAY",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved strategy for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub tag: StrategyTag,
    pub stake: f64,
}

/// Prefix lists and stakes used to route categories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRules {
    back_prefixes: Vec<String>,
    lay_prefixes: Vec<String>,
    stake_back: f64,
    stake_lay: f64,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            back_prefixes: vec!["A".to_string(), "OR".to_string()],
            lay_prefixes: vec!["D".to_string(), "HP".to_string()],
            stake_back: 1.0,
            stake_lay: 1.0,
        }
    }
}

impl CategoryRules {
    /// Build validated rules.
    ///
    /// Prefixes are normalized like categories so that `"or"` and `"OR"` are
    /// the same rule.
    ///
    /// # Errors
    /// * [`ConfigError::EmptyPrefix`] - a prefix normalizes to an empty string
    /// * [`ConfigError::OverlappingPrefixes`] - a BACK and a LAY prefix can both match one category
    /// * [`ConfigError::NonPositiveStake`] - a stake is zero, negative or NaN
    pub fn new<S: AsRef<str>>(
        back_prefixes: &[S],
        lay_prefixes: &[S],
        stake_back: f64,
        stake_lay: f64,
    ) -> Result<Self, ConfigError> {
        let rules = Self {
            back_prefixes: normalize_prefixes(back_prefixes),
            lay_prefixes: normalize_prefixes(lay_prefixes),
            stake_back,
            stake_lay,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn back_prefixes(&self) -> &[String] {
        &self.back_prefixes
    }

    pub fn lay_prefixes(&self) -> &[String] {
        &self.lay_prefixes
    }

    pub fn stake(&self, tag: StrategyTag) -> f64 {
        match tag {
            StrategyTag::Back => self.stake_back,
            StrategyTag::Lay => self.stake_lay,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (list, prefixes) in [("BACK", &self.back_prefixes), ("LAY", &self.lay_prefixes)] {
            if prefixes.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::EmptyPrefix { list });
            }
        }

        for back in &self.back_prefixes {
            for lay in &self.lay_prefixes {
                if back.starts_with(lay.as_str()) || lay.starts_with(back.as_str()) {
                    return Err(ConfigError::OverlappingPrefixes {
                        back: back.clone(),
                        lay: lay.clone(),
                    });
                }
            }
        }

        for tag in [StrategyTag::Back, StrategyTag::Lay] {
            let stake = self.stake(tag);
            if stake.is_nan() || stake <= 0.0 {
                return Err(ConfigError::NonPositiveStake { tag, stake });
            }
        }

        Ok(())
    }

    /// Resolve the strategy for a category.
    ///
    /// BACK prefixes are checked first, then LAY. `None` means the race is not
    /// eligible for export.
    pub fn resolve(&self, category: &str) -> Option<StrategyDecision> {
        let cat = normalize_category(category);
        if cat.is_empty() {
            return None;
        }

        let tag = if self.back_prefixes.iter().any(|p| cat.starts_with(p.as_str())) {
            StrategyTag::Back
        } else if self.lay_prefixes.iter().any(|p| cat.starts_with(p.as_str())) {
            StrategyTag::Lay
        } else {
            return None;
        };

        Some(StrategyDecision {
            tag,
            stake: self.stake(tag),
        })
    }
}

fn normalize_prefixes<S: AsRef<str>>(prefixes: &[S]) -> Vec<String> {
    prefixes
        .iter()
        .map(|p| normalize_category(p.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_rules() {
        let rules = CategoryRules::default();

        let back = rules.resolve("A1").unwrap();
        assert_eq!(back.tag, StrategyTag::Back);
        assert!((back.stake - 1.0).abs() < 1e-9);

        let lay = rules.resolve("D3").unwrap();
        assert_eq!(lay.tag, StrategyTag::Lay);
        assert!((lay.stake - 1.0).abs() < 1e-9);

        assert_eq!(rules.resolve("XYZ"), None);
        assert_eq!(rules.resolve(""), None);
    }

    #[test]
    fn test_resolve_open_race_and_hurdles() {
        let rules = CategoryRules::default();
        assert_eq!(rules.resolve("OR").unwrap().tag, StrategyTag::Back);
        assert_eq!(rules.resolve("OR3").unwrap().tag, StrategyTag::Back);
        assert_eq!(rules.resolve("HP").unwrap().tag, StrategyTag::Lay);
        assert_eq!(rules.resolve("H1"), None);
        assert_eq!(rules.resolve("S4"), None);
    }

    #[test]
    fn test_resolve_normalizes_input() {
        let rules = CategoryRules::default();
        assert_eq!(rules.resolve(" a-1 ").unwrap().tag, StrategyTag::Back);
        assert_eq!(rules.resolve("hp/2").unwrap().tag, StrategyTag::Lay);
    }

    #[test]
    fn test_custom_stakes() {
        let rules = CategoryRules::new(&["A"], &["D"], 2.5, 0.5).unwrap();
        assert!((rules.resolve("A4").unwrap().stake - 2.5).abs() < 1e-9);
        assert!((rules.resolve("D1").unwrap().stake - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_prefixes_are_normalized() {
        let rules = CategoryRules::new(&["or", "a"], &["d"], 1.0, 1.0).unwrap();
        assert_eq!(rules.back_prefixes(), &["OR".to_string(), "A".to_string()]);
        assert_eq!(rules.resolve("OR1").unwrap().tag, StrategyTag::Back);
    }

    #[test]
    fn test_overlapping_prefixes_rejected() {
        let err = CategoryRules::new(&["A"], &["A1"], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingPrefixes { .. }));

        let err = CategoryRules::new(&["OR"], &["OR"], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingPrefixes { .. }));

        let err = CategoryRules::new(&["HP1"], &["H"], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingPrefixes { .. }));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let err = CategoryRules::new(&["A", " "], &["D"], 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPrefix { list: "BACK" }));
    }

    #[test]
    fn test_non_positive_stake_rejected() {
        let err = CategoryRules::new(&["A"], &["D"], 0.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositiveStake {
                tag: StrategyTag::Back,
                ..
            }
        ));
        assert!(CategoryRules::new(&["A"], &["D"], 1.0, f64::NAN).is_err());
    }

    #[test]
    fn test_strategy_tag_display() {
        assert_eq!(StrategyTag::Back.to_string(), "BACK");
        assert_eq!(StrategyTag::Lay.as_str(), "LAY");
        assert_eq!(serde_json::to_string(&StrategyTag::Lay).unwrap(), "\"LAY\"");
    }
}
