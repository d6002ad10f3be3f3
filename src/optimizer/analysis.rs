//! Full evaluation of a caller-supplied build: validation, composition and score.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::{Archetype, BuildType};
use crate::data::{Capsule, Catalog, Ruleset};
use crate::optimizer::scorer::{dominant_archetype, score_build, ScoreBreakdown, ScoreTarget, ScoringContext};
use crate::optimizer::validator::{validate_build, ValidationResult};
use crate::optimizer::CapsuleSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildComposition {
    /// Capsules per primary archetype.
    pub archetype_counts: BTreeMap<Archetype, usize>,
    pub dominant_archetype: Option<Archetype>,
    pub build_type_counts: BTreeMap<BuildType, usize>,
    pub primary_build_type: Option<BuildType>,
}

impl BuildComposition {
    pub fn of(capsules: &[&Capsule]) -> Self {
        let mut archetype_counts = BTreeMap::new();
        let mut build_type_counts: BTreeMap<BuildType, usize> = BTreeMap::new();
        for capsule in capsules {
            *archetype_counts.entry(capsule.primary_archetype()).or_default() += 1;
            *build_type_counts.entry(capsule.build_type.primary).or_default() += 1;
        }
        // Earliest build type wins ties; utility only when nothing else is present.
        let primary_build_type = build_type_counts
            .iter()
            .filter(|(kind, _)| **kind != BuildType::Utility)
            .fold(None, |best: Option<(BuildType, usize)>, (&kind, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((kind, count)),
            })
            .map(|(kind, _)| kind)
            .or_else(|| build_type_counts.contains_key(&BuildType::Utility).then_some(BuildType::Utility));

        Self {
            archetype_counts,
            dominant_archetype: dominant_archetype(capsules).map(|(archetype, _)| archetype),
            build_type_counts,
            primary_build_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildAnalysis<'a> {
    pub capsules: Vec<CapsuleSummary<'a>>,
    /// Requested ids missing from the catalog; they take no part in the evaluation.
    pub unknown_ids: Vec<String>,
    pub validation: ValidationResult,
    pub composition: BuildComposition,
    pub score: ScoreBreakdown,
}

pub fn analyze_build<'a, S: AsRef<str>>(
    ids: &[S],
    catalog: &'a Catalog,
    context: ScoringContext<'_>,
    ruleset: &Ruleset,
    target: &ScoreTarget,
) -> BuildAnalysis<'a> {
    let (capsules, unknown_ids) = catalog.resolve(ids);
    BuildAnalysis {
        validation: validate_build(&capsules, ruleset),
        composition: BuildComposition::of(&capsules),
        score: score_build(&capsules, context, ruleset, target),
        capsules: capsules.into_iter().map(CapsuleSummary::from).collect(),
        unknown_ids,
    }
}
