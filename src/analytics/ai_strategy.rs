//! Capsule performance conditioned on the AI behaviour label active in each match.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::CountedMatch;
use crate::data::MatchRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyPerformance {
    pub usage: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub total_damage_dealt: f64,
    pub total_damage_taken: f64,
    pub avg_damage_dealt: f64,
    pub avg_damage_taken: f64,
    /// Mean per-match [match_base_score], clamped to [0, 100] and rounded to one decimal.
    pub composite_score: f64,
    #[serde(skip)]
    score_sum: f64,
}

impl StrategyPerformance {
    fn record(&mut self, entry: &MatchRecord, base_score: f64) {
        self.usage += 1;
        if entry.won {
            self.wins += 1;
        }
        self.total_damage_dealt += entry.damage_dealt;
        self.total_damage_taken += entry.damage_taken;
        self.score_sum += base_score;
    }

    fn finish(&mut self) {
        if self.usage == 0 {
            return;
        }
        let usage = f64::from(self.usage);
        self.win_rate = (f64::from(self.wins) / usage * 100.0).clamp(0.0, 100.0);
        self.avg_damage_dealt = self.total_damage_dealt / usage;
        self.avg_damage_taken = self.total_damage_taken / usage;
        self.composite_score = round_one_decimal((self.score_sum / usage).clamp(0.0, 100.0));
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Single-match performance score used for strategy-specific composites. Unbounded; the
/// composite clamps the mean.
pub fn match_base_score(entry: &MatchRecord) -> f64 {
    let dealt = entry.damage_dealt;
    let volume = dealt / 100_000.0 * 35.0;
    let trade = dealt / entry.damage_taken.max(1.0) * 25.0;
    let pace = dealt / entry.battle_time.max(1.0) / 1000.0 * 25.0;
    let survival = if entry.hp_max > 0.0 {
        entry.hp_remaining / entry.hp_max
    } else {
        0.0
    };
    volume + trade + pace + survival * 15.0
}

/// Strategy label -> capsule id -> statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AiCompatibility {
    strategies: BTreeMap<String, BTreeMap<String, StrategyPerformance>>,
}

impl AiCompatibility {
    pub fn get(&self, strategy: &str, capsule_id: &str) -> Option<&StrategyPerformance> {
        self.strategies.get(strategy)?.get(capsule_id)
    }

    pub fn composite_score(&self, strategy: &str, capsule_id: &str) -> Option<f64> {
        self.get(strategy, capsule_id)
            .map(|performance| performance.composite_score)
    }

    pub fn strategy(&self, strategy: &str) -> Option<&BTreeMap<String, StrategyPerformance>> {
        self.strategies.get(strategy)
    }

    pub fn strategy_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Matches without a strategy label are left out.
pub fn aggregate_ai_compatibility(matches: &[CountedMatch<'_>]) -> AiCompatibility {
    let mut strategies: BTreeMap<String, BTreeMap<String, StrategyPerformance>> = BTreeMap::new();
    for counted in matches {
        let Some(label) = counted.record.ai_strategy_label() else {
            continue;
        };
        let base_score = match_base_score(counted.record);
        let group = strategies.entry(label.to_string()).or_default();
        for &capsule_id in &counted.capsules {
            group
                .entry(capsule_id.to_string())
                .or_default()
                .record(counted.record, base_score);
        }
    }

    for group in strategies.values_mut() {
        for performance in group.values_mut() {
            performance.finish();
        }
    }
    AiCompatibility { strategies }
}

#[cfg(test)]
mod tests {
    use super::{match_base_score, round_one_decimal, StrategyPerformance};
    use crate::data::MatchRecord;

    #[test]
    fn base_score_guards_zero_denominators() {
        let entry = MatchRecord {
            damage_dealt: 100_000.0,
            damage_taken: 0.0,
            battle_time: 0.0,
            hp_remaining: 50.0,
            hp_max: 0.0,
            ..MatchRecord::default()
        };
        // 35 + 100000 * 25 + 100 * 25 + 0
        assert_eq!(match_base_score(&entry), 35.0 + 2_500_000.0 + 2_500.0);
    }

    #[test]
    fn base_score_blends_all_terms() {
        let entry = MatchRecord {
            damage_dealt: 50_000.0,
            damage_taken: 25_000.0,
            battle_time: 100.0,
            hp_remaining: 30.0,
            hp_max: 60.0,
            ..MatchRecord::default()
        };
        let expected = 0.5 * 35.0 + 2.0 * 25.0 + 0.5 * 25.0 + 0.5 * 15.0;
        assert!((match_base_score(&entry) - expected).abs() < 1e-9);
    }

    #[test]
    fn composite_stays_within_percent_range() {
        let blowout = MatchRecord {
            won: true,
            damage_dealt: 50_000.0,
            damage_taken: 0.0,
            battle_time: 90.0,
            hp_remaining: 40_000.0,
            hp_max: 40_000.0,
            ..MatchRecord::default()
        };
        let mut performance = StrategyPerformance::default();
        performance.record(&blowout, match_base_score(&blowout));
        performance.finish();
        assert_eq!(performance.composite_score, 100.0);

        let mut idle = StrategyPerformance::default();
        idle.record(&MatchRecord::default(), -5.0);
        idle.finish();
        assert_eq!(idle.composite_score, 0.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_one_decimal(12.34), 12.3);
        assert_eq!(round_one_decimal(12.36), 12.4);
    }
}
