pub mod advisor;
pub mod analysis;
pub mod build_generator;
pub mod scorer;
pub mod validator;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::classify::{Archetype, BuildType};
use crate::data::Capsule;

pub use advisor::{suggest_build_improvements, ImprovementSuggestion};
pub use analysis::{analyze_build, BuildAnalysis, BuildComposition};
pub use build_generator::{sort_candidates, BuildGenerator, GeneratorSettings};
pub use scorer::{dominant_archetype, score_build, ScoreBreakdown, ScoreTarget, ScoringContext};
pub use validator::{validate_build, ValidationResult, Violations};

/// Compact view of a capsule for reports.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CapsuleSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub cost: u32,
    pub archetype: Archetype,
    pub build_type: BuildType,
}

impl<'a> From<&'a Capsule> for CapsuleSummary<'a> {
    fn from(capsule: &'a Capsule) -> Self {
        Self {
            id: &capsule.id,
            name: &capsule.name,
            cost: capsule.cost,
            archetype: capsule.primary_archetype(),
            build_type: capsule.build_type.primary,
        }
    }
}

pub(crate) fn serialize_summary<S: Serializer>(
    capsule: &&Capsule,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    CapsuleSummary::from(*capsule).serialize(serializer)
}

/// A generated build that passed validation, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildCandidate<'a> {
    capsules: Vec<&'a Capsule>,
    pub score: ScoreBreakdown,
    pub validation: ValidationResult,
}

impl<'a> BuildCandidate<'a> {
    /// Members are kept sorted by id so equal sets compare and key equal.
    pub fn new(mut capsules: Vec<&'a Capsule>, score: ScoreBreakdown, validation: ValidationResult) -> Self {
        capsules.sort_by(|left, right| left.id.cmp(&right.id));
        Self {
            capsules,
            score,
            validation,
        }
    }

    pub fn capsules(&self) -> &[&'a Capsule] {
        &self.capsules
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.capsules.iter().map(|capsule| capsule.id.as_str()).collect()
    }

    /// Order-independent identity of the member set.
    pub fn key(&self) -> String {
        self.ids().join(",")
    }

    pub fn total_cost(&self) -> u32 {
        self.validation.total_cost
    }

    pub fn capsule_count(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_valid(&self) -> bool {
        self.validation.valid
    }
}

impl Serialize for BuildCandidate<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let summaries: Vec<CapsuleSummary<'_>> =
            self.capsules.iter().map(|&capsule| CapsuleSummary::from(capsule)).collect();
        let mut state = serializer.serialize_struct("BuildCandidate", 6)?;
        state.serialize_field("capsule_ids", &self.ids())?;
        state.serialize_field("capsules", &summaries)?;
        state.serialize_field("total_cost", &self.total_cost())?;
        state.serialize_field("capsule_count", &self.capsule_count())?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("score", &self.score)?;
        state.end()
    }
}
