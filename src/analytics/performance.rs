//! Per-capsule usage, win and damage statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analytics::{CountedMatch, MatchTally};
use crate::data::Catalog;

/// Keyed by capsule id. Capsules that never appear in a counted match have no entry.
pub type PerformanceMap = BTreeMap<String, CapsulePerformance>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapsulePerformance {
    pub capsule_id: String,
    pub name: String,
    pub appearances: u32,
    pub total_matches: u32,
    pub wins: u32,
    /// Percentage in [0, 100].
    pub win_rate: f64,
    pub total_damage_dealt: f64,
    pub total_damage_taken: f64,
    pub avg_damage_dealt: f64,
    pub avg_damage_taken: f64,
    pub damage_efficiency: f64,
    /// Blend of win rate and damage efficiency in [0, 100].
    pub composite_score: f64,
    pub characters: BTreeSet<String>,
    pub teams: BTreeSet<String>,
    pub ai_strategies: BTreeSet<String>,
}

impl CapsulePerformance {
    fn from_tally(capsule_id: &str, name: &str, tally: MatchTally) -> Self {
        let win_rate = tally.win_rate();
        let damage_efficiency = tally.damage_efficiency();
        Self {
            capsule_id: capsule_id.to_string(),
            name: name.to_string(),
            appearances: tally.matches,
            total_matches: tally.matches,
            wins: tally.wins,
            win_rate,
            total_damage_dealt: tally.damage_dealt,
            total_damage_taken: tally.damage_taken,
            avg_damage_dealt: tally.avg_damage_dealt(),
            avg_damage_taken: tally.avg_damage_taken(),
            damage_efficiency,
            composite_score: composite_score(win_rate, damage_efficiency),
            characters: tally.characters,
            teams: tally.teams,
            ai_strategies: tally.ai_strategies,
        }
    }
}

/// `50 + (win_rate - 50) + (damage_efficiency - 1) * 20`, clamped to [0, 100].
pub fn composite_score(win_rate: f64, damage_efficiency: f64) -> f64 {
    (50.0 + (win_rate - 50.0) + (damage_efficiency - 1.0) * 20.0).clamp(0.0, 100.0)
}

pub fn aggregate_performance(catalog: &Catalog, matches: &[CountedMatch<'_>]) -> PerformanceMap {
    let mut tallies: BTreeMap<&str, MatchTally> = BTreeMap::new();
    for counted in matches {
        for &capsule_id in &counted.capsules {
            tallies.entry(capsule_id).or_default().record(counted);
        }
    }

    tallies
        .into_iter()
        .filter(|(_, tally)| tally.matches > 0)
        .map(|(capsule_id, tally)| {
            let name = catalog
                .get(capsule_id)
                .map(|capsule| capsule.name.as_str())
                .unwrap_or_default();
            (
                capsule_id.to_string(),
                CapsulePerformance::from_tally(capsule_id, name, tally),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::composite_score;

    #[test]
    fn composite_score_is_clamped() {
        assert_eq!(composite_score(60.0, 2.0), 80.0);
        assert_eq!(composite_score(100.0, 5.0), 100.0);
        assert_eq!(composite_score(0.0, 0.0), 0.0);
        assert_eq!(composite_score(50.0, 1.0), 50.0);
    }
}
