use serde::Serialize;

use crate::data::{Capsule, Ruleset};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Violations {
    pub cost_exceeded: bool,
    pub too_many_capsules: bool,
    pub below_min_cost: bool,
    pub banned_present: Vec<String>,
    pub missing_required: Vec<String>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        !self.cost_exceeded
            && !self.too_many_capsules
            && !self.below_min_cost
            && self.banned_present.is_empty()
            && self.missing_required.is_empty()
    }
}

/// Outcome of checking a build against a [Ruleset]. Remainders go negative when exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Violations,
    pub total_cost: u32,
    pub capsule_count: usize,
    pub remaining_cost: i64,
    pub remaining_slots: i64,
}

pub fn validate_build(capsules: &[&Capsule], ruleset: &Ruleset) -> ValidationResult {
    let total_cost: u32 = capsules.iter().map(|capsule| capsule.cost).sum();
    let capsule_count = capsules.len();

    let banned_present: Vec<String> = capsules
        .iter()
        .filter(|capsule| ruleset.is_banned(&capsule.id))
        .map(|capsule| capsule.id.clone())
        .collect();
    let missing_required: Vec<String> = ruleset
        .required_capsules
        .iter()
        .filter(|required| !capsules.iter().any(|capsule| &capsule.id == *required))
        .cloned()
        .collect();

    let violations = Violations {
        cost_exceeded: total_cost > ruleset.max_cost,
        too_many_capsules: capsule_count > ruleset.max_capsules,
        below_min_cost: ruleset.min_cost.is_some_and(|min_cost| total_cost < min_cost),
        banned_present,
        missing_required,
    };

    ValidationResult {
        valid: violations.is_empty(),
        violations,
        total_cost,
        capsule_count,
        remaining_cost: i64::from(ruleset.max_cost) - i64::from(total_cost),
        remaining_slots: ruleset.max_capsules as i64 - capsule_count as i64,
    }
}
