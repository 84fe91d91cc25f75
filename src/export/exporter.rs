//! Selection export
//!
//! Turns the day's forecast table into MarketFeeder import lines. Each
//! eligible race contributes its three forecast dogs, all carrying the race's
//! strategy tag and stake. Lines are ordered by race time, then track, then
//! forecast rank.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::core::normalize::{normalize_category, normalize_spaces};
use crate::core::strategy::{CategoryRules, StrategyTag};
use crate::dates::normalize_hhmm;
use crate::models::{AuditRecord, ForecastRow, Selection};

/// Trailing line telling MarketFeeder to keep every selection active
pub const ALL_ACTIVE_SENTINEL: &str = "#all_active#";

/// Counters for one export run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Lines produced, sentinel included
    pub total_lines: usize,
    pub races_exported: usize,
    pub skipped_forecast_incomplete: usize,
    pub selections_by_strategy: BTreeMap<StrategyTag, usize>,
    pub races_by_strategy: BTreeMap<StrategyTag, usize>,
    pub exported_category_counts: BTreeMap<String, usize>,
    pub ignored_by_category_total: usize,
    pub ignored_category_counts: BTreeMap<String, usize>,
    pub duplicate_races: usize,
}

/// Export result: sorted selections, their formatted lines and audit rows
#[derive(Debug, Clone, Default)]
pub struct ExportOutput {
    pub selections: Vec<Selection>,
    pub lines: Vec<String>,
    pub audit: Vec<AuditRecord>,
    pub summary: ExportSummary,
}

impl ExportOutput {
    /// Import file content, lines joined with `\n`
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether any selection was produced
    pub fn has_selections(&self) -> bool {
        !self.selections.is_empty()
    }
}

/// Builds import selections from forecast rows
#[derive(Debug, Clone, Default)]
pub struct SelectionExporter {
    rules: CategoryRules,
    keep_all_active: bool,
}

impl SelectionExporter {
    pub fn new(rules: CategoryRules) -> Self {
        Self {
            rules,
            keep_all_active: false,
        }
    }

    /// Append [`ALL_ACTIVE_SENTINEL`] after the selections
    pub fn with_keep_all_active(mut self, keep: bool) -> Self {
        self.keep_all_active = keep;
        self
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Export the forecast rows for `date`
    pub fn export(&self, rows: &[ForecastRow], date: &str) -> ExportOutput {
        let mut summary = ExportSummary::default();
        let mut selections = Vec::with_capacity(rows.len() * 3);
        let mut seen = HashSet::new();

        for row in rows {
            let track = normalize_spaces(&row.race.track);
            let hhmm = normalize_hhmm(&row.race.hhmm);

            let category_norm = if row.race.category_norm.trim().is_empty() {
                normalize_category(&row.race.category_raw)
            } else {
                normalize_category(&row.race.category_norm)
            };

            let Some(decision) = self.rules.resolve(&category_norm) else {
                debug!("Race ignored by category: {} {}", track, category_norm);
                summary.ignored_by_category_total += 1;
                *summary
                    .ignored_category_counts
                    .entry(category_norm)
                    .or_default() += 1;
                continue;
            };

            let dogs = row.names.clone().map(|name| normalize_spaces(&name));
            if dogs.iter().any(String::is_empty) {
                info!("Race ignored, forecast incomplete: {} {}", track, hhmm);
                summary.skipped_forecast_incomplete += 1;
                continue;
            }

            if !seen.insert((hhmm.clone(), track.clone())) {
                debug!("Duplicate race skipped: {} {}", track, hhmm);
                summary.duplicate_races += 1;
                continue;
            }

            summary.races_exported += 1;
            *summary.races_by_strategy.entry(decision.tag).or_default() += 1;
            *summary
                .exported_category_counts
                .entry(category_norm.clone())
                .or_default() += 1;
            *summary.selections_by_strategy.entry(decision.tag).or_default() += dogs.len();

            let category_raw = normalize_spaces(&row.race.category_raw);
            for (order, dog_name) in (0u8..).zip(dogs) {
                selections.push(Selection {
                    track: track.clone(),
                    hhmm: hhmm.clone(),
                    dog_name,
                    strategy_tag: decision.tag,
                    stake: decision.stake,
                    order,
                    category_raw: category_raw.clone(),
                    category_norm: category_norm.clone(),
                });
            }
        }

        selections.sort_by(|a, b| {
            (a.hhmm.as_str(), a.track.as_str(), a.order)
                .cmp(&(b.hhmm.as_str(), b.track.as_str(), b.order))
        });

        let mut lines: Vec<String> = selections.iter().map(Selection::to_line).collect();
        if self.keep_all_active {
            lines.push(ALL_ACTIVE_SENTINEL.to_string());
        }
        let audit = selections.iter().map(|s| s.to_audit(date)).collect();

        summary.total_lines = lines.len();

        ExportOutput {
            selections,
            lines,
            audit,
            summary,
        }
    }
}
