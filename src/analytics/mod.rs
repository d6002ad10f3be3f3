//! Match-history analytics. [AnalysisPipeline::run] is the only entry point that orders the
//! stages: match selection, per-capsule performance, pair tallies, pair enrichment against
//! the performance map, and AI-strategy compatibility. Every run recomputes from scratch.

pub mod ai_strategy;
pub mod performance;
pub mod synergy;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::data::{Catalog, MatchCorpus, MatchRecord};

pub use ai_strategy::{aggregate_ai_compatibility, match_base_score, AiCompatibility, StrategyPerformance};
pub use performance::{aggregate_performance, composite_score, CapsulePerformance, PerformanceMap};
pub use synergy::{
    accumulate_pairs, PairKey, PairStats, PairSynergy, PairTally, SynergyMap, SynergyRules,
    SynergyType,
};

/// A participating match reduced to the catalog capsules it equipped.
#[derive(Debug, Clone)]
pub struct CountedMatch<'a> {
    pub character: &'a str,
    pub record: &'a MatchRecord,
    pub capsules: Vec<&'a str>,
}

/// Running totals shared by per-capsule and per-pair statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchTally {
    pub matches: u32,
    pub wins: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub characters: BTreeSet<String>,
    pub teams: BTreeSet<String>,
    pub ai_strategies: BTreeSet<String>,
}

impl MatchTally {
    pub fn record(&mut self, counted: &CountedMatch<'_>) {
        let entry = counted.record;
        self.matches += 1;
        if entry.won {
            self.wins += 1;
        }
        self.damage_dealt += entry.damage_dealt;
        self.damage_taken += entry.damage_taken;
        // Look up before inserting so names already seen don't allocate a String.
        if !counted.character.is_empty() && !self.characters.contains(counted.character) {
            self.characters.insert(counted.character.to_string());
        }
        if let Some(team) = entry.team_label() {
            if !self.teams.contains(team) {
                self.teams.insert(team.to_string());
            }
        }
        if let Some(strategy) = entry.ai_strategy_label() {
            if !self.ai_strategies.contains(strategy) {
                self.ai_strategies.insert(strategy.to_string());
            }
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            (f64::from(self.wins) / f64::from(self.matches) * 100.0).clamp(0.0, 100.0)
        }
    }

    pub fn avg_damage_dealt(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.damage_dealt / f64::from(self.matches)
        }
    }

    pub fn avg_damage_taken(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.damage_taken / f64::from(self.matches)
        }
    }

    pub fn damage_efficiency(&self) -> f64 {
        if self.damage_taken == 0.0 {
            0.0
        } else {
            (self.damage_dealt / self.damage_taken).max(0.0)
        }
    }
}

/// Read-only output of one analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub counted_matches: usize,
    pub skipped_unknown_ids: usize,
    pub performance: PerformanceMap,
    pub synergy: SynergyMap,
    pub ai_compatibility: AiCompatibility,
}

impl AnalysisSnapshot {
    /// Capsules by composite score, best first.
    pub fn top_capsules(&self, limit: usize) -> Vec<&CapsulePerformance> {
        let mut ranked: Vec<&CapsulePerformance> = self.performance.values().collect();
        ranked.sort_by(|left, right| {
            right
                .composite_score
                .total_cmp(&left.composite_score)
                .then_with(|| right.total_matches.cmp(&left.total_matches))
                .then_with(|| left.capsule_id.cmp(&right.capsule_id))
        });
        ranked.truncate(limit);
        ranked
    }

    pub fn top_synergies(&self, limit: usize, min_appearances: u32) -> Vec<&PairSynergy> {
        self.synergy.top(limit, min_appearances)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisPipeline<'a> {
    catalog: &'a Catalog,
    rules: SynergyRules,
    character_filter: Option<Vec<String>>,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(catalog: &'a Catalog, rules: SynergyRules) -> Self {
        Self {
            catalog,
            rules,
            character_filter: None,
        }
    }

    /// Restrict every stage to the named characters (case-insensitive).
    pub fn with_character_filter<I, S>(mut self, characters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = characters
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        self.character_filter = if names.is_empty() { None } else { Some(names) };
        self
    }

    fn includes_character(&self, character: &str) -> bool {
        match &self.character_filter {
            None => true,
            Some(names) => names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(character.trim())),
        }
    }

    /// Counted matches restricted to catalog capsules, plus the number of unknown ids dropped.
    pub fn select_matches<'c>(&self, corpus: &'c MatchCorpus) -> (Vec<CountedMatch<'c>>, usize) {
        let mut skipped = 0usize;
        let mut selected = Vec::new();
        for (record, entry) in corpus.counted_matches() {
            if !self.includes_character(&record.character) {
                continue;
            }
            let (known, unknown): (Vec<&str>, Vec<&str>) = entry
                .equipped()
                .into_iter()
                .partition(|id| self.catalog.contains(id));
            skipped += unknown.len();
            if known.is_empty() {
                continue;
            }
            selected.push(CountedMatch {
                character: record.character.trim(),
                record: entry,
                capsules: known,
            });
        }
        (selected, skipped)
    }

    pub fn run(&self, corpus: &MatchCorpus) -> AnalysisSnapshot {
        let (matches, skipped_unknown_ids) = self.select_matches(corpus);
        if skipped_unknown_ids > 0 {
            debug!(skipped_unknown_ids, "analysis: ignoring capsule ids missing from catalog");
        }

        let performance = aggregate_performance(self.catalog, &matches);
        let pair_tally = accumulate_pairs(self.catalog, &self.rules, &matches);
        let synergy = pair_tally.enrich(&performance);
        let ai_compatibility = aggregate_ai_compatibility(&matches);

        info!(
            counted_matches = matches.len(),
            capsules = performance.len(),
            pairs = synergy.len(),
            "analysis pass complete"
        );

        AnalysisSnapshot {
            counted_matches: matches.len(),
            skipped_unknown_ids,
            performance,
            synergy,
            ai_compatibility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MatchTally;

    #[test]
    fn empty_tally_is_all_zero() {
        let tally = MatchTally::default();
        assert_eq!(tally.win_rate(), 0.0);
        assert_eq!(tally.avg_damage_dealt(), 0.0);
        assert_eq!(tally.damage_efficiency(), 0.0);
    }
}
