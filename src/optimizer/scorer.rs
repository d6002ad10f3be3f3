//! Weighted multi-factor build score.
//!
//! | term                   | weight |
//! |------------------------|--------|
//! | individual performance | 0.40   |
//! | pair synergy           | 0.30   |
//! | AI strategy match      | 0.15   |
//! | archetype alignment    | 0.10   |
//! | cost efficiency        | 0.05   |
//!
//! Cost efficiency grows with budget use: a build spending the whole cap scores the full term.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::{AiCompatibility, AnalysisSnapshot, PerformanceMap, SynergyMap};
use crate::classify::Archetype;
use crate::data::{Capsule, Ruleset};

pub const INDIVIDUAL_WEIGHT: f64 = 0.4;
pub const SYNERGY_WEIGHT: f64 = 0.3;
pub const AI_MATCH_WEIGHT: f64 = 0.15;
pub const ARCHETYPE_WEIGHT: f64 = 0.1;
pub const COST_WEIGHT: f64 = 0.05;

/// The three read-only analytics maps every scorer consults.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub performance: &'a PerformanceMap,
    pub synergy: &'a SynergyMap,
    pub ai: &'a AiCompatibility,
}

impl<'a> From<&'a AnalysisSnapshot> for ScoringContext<'a> {
    fn from(snapshot: &'a AnalysisSnapshot) -> Self {
        Self {
            performance: &snapshot.performance,
            synergy: &snapshot.synergy,
            ai: &snapshot.ai_compatibility,
        }
    }
}

impl ScoringContext<'_> {
    pub fn composite_score(&self, capsule_id: &str) -> Option<f64> {
        self.performance
            .get(capsule_id)
            .map(|performance| performance.composite_score)
    }

    pub fn strategy_score(&self, strategy: &str, capsule_id: &str) -> Option<f64> {
        self.ai.composite_score(strategy, capsule_id)
    }

    /// Synergy bonuses of `capsule` against each of `others` that has a recorded pair.
    pub fn pair_bonuses(&self, capsule: &Capsule, others: &[&Capsule]) -> Vec<f64> {
        others
            .iter()
            .filter(|other| other.id != capsule.id)
            .filter_map(|other| self.synergy.bonus(&capsule.id, &other.id))
            .collect()
    }
}

/// Optional goals a build is scored against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTarget {
    pub strategy: Option<String>,
    pub archetype: Option<Archetype>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub individual_performance: f64,
    pub synergy_bonus: f64,
    pub ai_strategy_match: f64,
    pub archetype_alignment: f64,
    pub cost_efficiency: f64,
    pub total_score: f64,
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Most common non-utility archetype tag and its count. Ties go to the earlier archetype.
pub fn dominant_archetype(capsules: &[&Capsule]) -> Option<(Archetype, usize)> {
    let mut counts: BTreeMap<Archetype, usize> = BTreeMap::new();
    for capsule in capsules {
        for &tag in &capsule.archetype.tags {
            if tag != Archetype::Utility {
                *counts.entry(tag).or_default() += 1;
            }
        }
    }
    let mut dominant: Option<(Archetype, usize)> = None;
    for archetype in Archetype::ALL {
        let Some(&count) = counts.get(&archetype) else {
            continue;
        };
        if dominant.map_or(true, |(_, best)| count > best) {
            dominant = Some((archetype, count));
        }
    }
    dominant
}

pub fn score_build(
    capsules: &[&Capsule],
    context: ScoringContext<'_>,
    ruleset: &Ruleset,
    target: &ScoreTarget,
) -> ScoreBreakdown {
    if capsules.is_empty() {
        return ScoreBreakdown::default();
    }

    let composites: Vec<f64> = capsules
        .iter()
        .filter_map(|capsule| context.composite_score(&capsule.id))
        .collect();
    let individual_performance = mean(&composites).unwrap_or(0.0) * INDIVIDUAL_WEIGHT;

    let mut pair_bonuses = Vec::new();
    for (index, a) in capsules.iter().enumerate() {
        for b in &capsules[index + 1..] {
            if let Some(bonus) = context.synergy.bonus(&a.id, &b.id) {
                pair_bonuses.push(bonus.max(0.0));
            }
        }
    }
    let synergy_bonus = mean(&pair_bonuses).unwrap_or(0.0) * SYNERGY_WEIGHT;

    let ai_strategy_match = target
        .strategy
        .as_deref()
        .and_then(|strategy| {
            let scores: Vec<f64> = capsules
                .iter()
                .filter_map(|capsule| context.strategy_score(strategy, &capsule.id))
                .collect();
            mean(&scores)
        })
        .unwrap_or(0.0)
        * AI_MATCH_WEIGHT;

    let dominant = dominant_archetype(capsules);
    let archetype_alignment = match (target.archetype, dominant) {
        (Some(wanted), Some((archetype, _))) if wanted == archetype => 100.0 * ARCHETYPE_WEIGHT,
        (Some(_), _) => 0.0,
        (None, Some((_, count))) => count as f64 / capsules.len() as f64 * 100.0 * ARCHETYPE_WEIGHT,
        (None, None) => 0.0,
    };

    let total_cost: u32 = capsules.iter().map(|capsule| capsule.cost).sum();
    let cost_efficiency = if ruleset.max_cost == 0 {
        0.0
    } else {
        f64::from(total_cost) / f64::from(ruleset.max_cost) * 100.0 * COST_WEIGHT
    };

    ScoreBreakdown {
        individual_performance,
        synergy_bonus,
        ai_strategy_match,
        archetype_alignment,
        cost_efficiency,
        total_score: individual_performance
            + synergy_bonus
            + ai_strategy_match
            + archetype_alignment
            + cost_efficiency,
    }
}

#[cfg(test)]
mod tests {
    use super::{dominant_archetype, mean, score_build, ScoreTarget, ScoringContext};
    use crate::analytics::{AiCompatibility, PerformanceMap, SynergyMap};
    use crate::classify::{Archetype, Classifiers};
    use crate::data::{CapsuleDefinition, Catalog, Ruleset};

    fn catalog() -> Catalog {
        let classifiers = Classifiers::standard().expect("tables compile");
        Catalog::classify(
            vec![
                CapsuleDefinition::new("x", "X", 3, "Increases damage"),
                CapsuleDefinition::new("x2", "X2", 2, "Boosts attack power"),
                CapsuleDefinition::new("z", "Z", 1, "Ki cost"),
                CapsuleDefinition::new("u", "U", 1, ""),
            ],
            &classifiers,
        )
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn dominant_ignores_utility() {
        let catalog = catalog();
        let (build, _) = catalog.resolve(&["x", "x2", "z", "u"]);
        assert_eq!(dominant_archetype(&build), Some((Archetype::Aggressive, 2)));
        let (only_utility, _) = catalog.resolve(&["u"]);
        assert_eq!(dominant_archetype(&only_utility), None);
    }

    #[test]
    fn empty_maps_leave_only_composition_terms() {
        let catalog = catalog();
        let (build, _) = catalog.resolve(&["x", "x2", "z", "u"]);
        let performance = PerformanceMap::new();
        let synergy = SynergyMap::default();
        let ai = AiCompatibility::default();
        let context = ScoringContext {
            performance: &performance,
            synergy: &synergy,
            ai: &ai,
        };
        let ruleset = Ruleset::new(14, 7);

        let cohesive = score_build(&build, context, &ruleset, &ScoreTarget::default());
        assert_eq!(cohesive.individual_performance, 0.0);
        assert_eq!(cohesive.synergy_bonus, 0.0);
        assert_eq!(cohesive.ai_strategy_match, 0.0);
        assert!((cohesive.archetype_alignment - 5.0).abs() < 1e-9);
        assert!((cohesive.cost_efficiency - 2.5).abs() < 1e-9);
        assert!((cohesive.total_score - 7.5).abs() < 1e-9);

        let targeted = ScoreTarget {
            strategy: Some("Rush".into()),
            archetype: Some(Archetype::Technical),
        };
        let off_target = score_build(&build, context, &ruleset, &targeted);
        assert_eq!(off_target.archetype_alignment, 0.0);

        let empty = score_build(&[], context, &ruleset, &targeted);
        assert_eq!(empty.total_score, 0.0);
    }
}
