use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::rules::RuleTable;

/// Coarse combat role of a capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    Aggressive,
    Defensive,
    Technical,
    Utility,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Aggressive,
        Archetype::Defensive,
        Archetype::Technical,
        Archetype::Utility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Technical => "technical",
            Self::Utility => "utility",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Archetype::ALL
            .into_iter()
            .find(|archetype| archetype.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown archetype '{s}'"))
    }
}

/// Default archetype rules. Category order is also the tie priority:
/// aggressive, then defensive, then technical.
pub fn archetype_table() -> Result<RuleTable<Archetype>, regex::Error> {
    RuleTable::new(Archetype::Utility)
        .category(
            Archetype::Aggressive,
            &[
                r"(increase|boost|raise|enhance)[sd]?\b.*\b(damage|attack|power)",
                r"damage (dealt|output)",
                r"\battack power\b",
                r"\bcritical\b",
                r"\b(rush|strike|smash|combo)",
                r"\bmelee\b",
            ],
        )?
        .category(
            Archetype::Defensive,
            &[
                r"damage (taken|received)",
                r"(reduce|decrease|lower|cut)[sd]?\b.*\bdamage",
                r"\b(health|hp)\b",
                r"\b(recover|restore|regenerat|heal)",
                r"\b(guard|defen[cs]e|armou?r|block)",
                r"\b(counter|revenge)",
            ],
        )?
        .category(
            Archetype::Technical,
            &[
                r"\bki\b",
                r"\bsparking\b",
                r"\bskill (count|stock|gauge|point)",
                r"\b(charge|charging)\b",
                r"\bcost\b",
                r"\b(vanish|teleport|z-?counter|perception)",
            ],
        )?
        .tie_break(r"\bcounter", None, Archetype::Defensive)?
        .tie_break(
            r"\bsparking\b",
            Some(r"sparking\b.*\bdamage|\bdamage\b.*sparking"),
            Archetype::Technical,
        )?
        .tie_break(r"\b(standby|switch|tag)\b", None, Archetype::Defensive)
}
