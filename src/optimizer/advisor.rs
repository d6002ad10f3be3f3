use serde::Serialize;

use crate::analytics::{PerformanceMap, SynergyMap};
use crate::data::{Capsule, Ruleset};
use crate::optimizer::scorer::mean;
use crate::optimizer::{serialize_summary, CapsuleSummary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementSuggestion<'a> {
    #[serde(serialize_with = "serialize_summary")]
    pub capsule: &'a Capsule,
    pub impact_score: f64,
    /// Current members with a recorded pair against this capsule.
    pub synergy_count: usize,
    pub avg_synergy_bonus: f64,
    pub new_total_cost: u32,
}

impl ImprovementSuggestion<'_> {
    pub fn summary(&self) -> CapsuleSummary<'_> {
        CapsuleSummary::from(self.capsule)
    }
}

/// Rank single-capsule additions to `current`, best first.
///
/// Nothing is suggested once the build fills every slot. Capsules already equipped, banned,
/// bound to another character, or pushing the cost past the cap are skipped.
pub fn suggest_build_improvements<'a>(
    current: &[&Capsule],
    pool: impl IntoIterator<Item = &'a Capsule>,
    synergy: &SynergyMap,
    performance: &PerformanceMap,
    ruleset: &Ruleset,
    character: Option<&str>,
) -> Vec<ImprovementSuggestion<'a>> {
    if current.len() >= ruleset.max_capsules {
        return Vec::new();
    }
    let current_cost: u32 = current.iter().map(|capsule| capsule.cost).sum();

    let mut suggestions: Vec<ImprovementSuggestion<'a>> = pool
        .into_iter()
        .filter(|capsule| !current.iter().any(|member| member.id == capsule.id))
        .filter(|capsule| !ruleset.is_banned(&capsule.id))
        .filter(|capsule| capsule.is_available_to(character))
        .filter_map(|capsule| {
            let new_total_cost = current_cost.checked_add(capsule.cost)?;
            if new_total_cost > ruleset.max_cost {
                return None;
            }
            let bonuses: Vec<f64> = current
                .iter()
                .filter_map(|member| synergy.bonus(&capsule.id, &member.id))
                .collect();
            let avg_synergy_bonus = mean(&bonuses).unwrap_or(0.0);
            let composite = performance
                .get(&capsule.id)
                .map_or(0.0, |stats| stats.composite_score);
            Some(ImprovementSuggestion {
                capsule,
                impact_score: composite + 0.5 * avg_synergy_bonus,
                synergy_count: bonuses.len(),
                avg_synergy_bonus,
                new_total_cost,
            })
        })
        .collect();

    suggestions.sort_by(|left, right| {
        right
            .impact_score
            .total_cmp(&left.impact_score)
            .then_with(|| left.capsule.id.cmp(&right.capsule.id))
    });
    suggestions
}

#[cfg(test)]
mod tests {
    use super::suggest_build_improvements;
    use crate::analytics::{PerformanceMap, SynergyMap};
    use crate::classify::Classifiers;
    use crate::data::{CapsuleDefinition, Catalog, Ruleset};

    fn catalog() -> Catalog {
        let classifiers = Classifiers::standard().expect("tables compile");
        Catalog::classify(
            vec![
                CapsuleDefinition::new("x", "X", 3, "Increases damage"),
                CapsuleDefinition::new("y", "Y", 2, "Reduces damage taken"),
                CapsuleDefinition::new("z", "Z", 1, "Ki cost"),
                CapsuleDefinition::new("w", "W", 4, ""),
            ],
            &classifiers,
        )
    }

    #[test]
    fn skips_members_and_over_budget_capsules() {
        let catalog = catalog();
        let (current, _) = catalog.resolve(&["x"]);
        let suggestions = suggest_build_improvements(
            &current,
            catalog.capsules(),
            &SynergyMap::default(),
            &PerformanceMap::new(),
            &Ruleset::new(6, 7),
            None,
        );
        let ids: Vec<&str> = suggestions.iter().map(|s| s.capsule.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "z"]);
        assert!(suggestions.iter().all(|s| s.impact_score == 0.0 && s.synergy_count == 0));
        assert_eq!(suggestions[0].new_total_cost, 5);
    }

    #[test]
    fn full_build_gets_no_suggestions() {
        let catalog = catalog();
        let (current, _) = catalog.resolve(&["x", "y"]);
        let suggestions = suggest_build_improvements(
            &current,
            catalog.capsules(),
            &SynergyMap::default(),
            &PerformanceMap::new(),
            &Ruleset::new(50, 2),
            None,
        );
        assert!(suggestions.is_empty());
    }
}
