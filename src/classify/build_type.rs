use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::rules::RuleTable;

/// Reporting taxonomy describing which part of a fighter's kit a capsule feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildType {
    Melee,
    Blast,
    KiBlast,
    Defense,
    Skill,
    KiEfficiency,
    Utility,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Blast => "blast",
            Self::KiBlast => "ki-blast",
            Self::Defense => "defense",
            Self::Skill => "skill",
            Self::KiEfficiency => "ki-efficiency",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const KI_BLAST: &str = r"\bki[- ]?blasts?\b";
const GENERIC_BLAST: &str = r"\bblasts?\b";

/// Default build-type rules. A "ki blast" mention always wins and keeps its "blast" from
/// also counting as a generic blast; beams and super attacks still count.
pub fn build_type_table() -> Result<RuleTable<BuildType>, regex::Error> {
    RuleTable::new(BuildType::Utility)
        .category(
            BuildType::Melee,
            &[
                r"\bmelee\b",
                r"\b(rush|combo|punch|kick|strike|smash)",
            ],
        )?
        .category(
            BuildType::Blast,
            &[GENERIC_BLAST, r"\bbeam\b", r"\bwave\b", r"\bultimate\b", r"super attack"],
        )?
        .category(BuildType::KiBlast, &[KI_BLAST, r"\benergy (shot|volley)"])?
        .category(
            BuildType::Defense,
            &[
                r"damage (taken|received)",
                r"\b(guard|defen[cs]e|armou?r|block)",
                r"\b(health|hp|heal|recover)",
            ],
        )?
        .category(BuildType::Skill, &[r"\bskill", r"\bsparking\b"])?
        .category(
            BuildType::KiEfficiency,
            &[
                r"\bki (cost|consumption|recovery|charge|gauge)",
                r"\bcharg(e|ing) speed",
            ],
        )?
        .exclusive(KI_BLAST, BuildType::KiBlast)?
        .suppress(KI_BLAST, BuildType::Blast, GENERIC_BLAST)
}

#[cfg(test)]
mod tests {
    use super::BuildType;

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&BuildType::KiEfficiency).expect("serialize");
        assert_eq!(json, "\"ki-efficiency\"");
        assert_eq!(BuildType::KiBlast.to_string(), "ki-blast");
    }
}
