pub mod archetype;
pub mod build_type;
pub mod rules;

pub use archetype::{archetype_table, Archetype};
pub use build_type::{build_type_table, BuildType};
pub use rules::{
    CategoryRule, Classification, Exclusive, RuleClassifier, RuleTable, Suppression, TieBreak,
};

/// Both taxonomies, each a [RuleClassifier] over its own table.
#[derive(Debug, Clone)]
pub struct Classifiers {
    pub archetype: RuleClassifier<Archetype>,
    pub build_type: RuleClassifier<BuildType>,
}

impl Classifiers {
    pub fn new(archetype: RuleClassifier<Archetype>, build_type: RuleClassifier<BuildType>) -> Self {
        Self {
            archetype,
            build_type,
        }
    }

    /// Classifiers over the built-in tables.
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new(
            RuleClassifier::new(archetype_table()?),
            RuleClassifier::new(build_type_table()?),
        ))
    }
}
