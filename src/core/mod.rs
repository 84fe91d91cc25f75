//! Core business logic modules

pub mod normalize;
pub mod odds;
pub mod strategy;

// Re-export commonly used types
pub use normalize::{clean_dog_name, normalize_category, normalize_spaces, normalize_track_name};
pub use odds::{fractional_to_decimal, parse_odds};
pub use strategy::{CategoryRules, StrategyDecision, StrategyTag};
