//! Match history: per-character records of equipped capsules and fight outcomes.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{parse_json, read_to_string, DataError};

/// Maximum capsules a character can equip in one match.
pub const MAX_EQUIPPED: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(default, alias = "equippedCapsules")]
    pub capsules: Vec<String>,
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub damage_dealt: f64,
    #[serde(default)]
    pub damage_taken: f64,
    #[serde(default)]
    pub hp_remaining: f64,
    #[serde(default)]
    pub hp_max: f64,
    #[serde(default)]
    pub battle_time: f64,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub ai_strategy: Option<String>,
}

impl MatchRecord {
    /// The character actually fought in this match.
    pub fn participated(&self) -> bool {
        self.battle_time > 0.0
    }

    /// Participating matches with at least one capsule feed every aggregate.
    pub fn is_counted(&self) -> bool {
        self.participated() && self.capsules.iter().any(|id| !id.trim().is_empty())
    }

    /// Equipped ids in order, trimmed, with blanks and repeats removed.
    pub fn equipped(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.capsules
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .collect()
    }

    pub fn ai_strategy_label(&self) -> Option<&str> {
        self.ai_strategy
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    pub fn team_label(&self) -> Option<&str> {
        self.team
            .as_deref()
            .map(str::trim)
            .filter(|team| !team.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(alias = "name")]
    pub character: String,
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CorpusFile")]
pub struct MatchCorpus {
    pub characters: Vec<CharacterRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    List(Vec<CharacterRecord>),
    Wrapped { characters: Vec<CharacterRecord> },
}

impl From<CorpusFile> for MatchCorpus {
    fn from(file: CorpusFile) -> Self {
        match file {
            CorpusFile::List(characters) | CorpusFile::Wrapped { characters } => {
                Self { characters }
            }
        }
    }
}

impl MatchCorpus {
    pub fn new(characters: Vec<CharacterRecord>) -> Self {
        Self { characters }
    }

    /// Every counted match paired with its character.
    pub fn counted_matches(&self) -> impl Iterator<Item = (&CharacterRecord, &MatchRecord)> + '_ {
        self.characters.iter().flat_map(|record| {
            record
                .matches
                .iter()
                .filter(|entry| entry.is_counted())
                .map(move |entry| (record, entry))
        })
    }

    pub fn match_count(&self) -> usize {
        self.characters.iter().map(|record| record.matches.len()).sum()
    }
}

pub fn load_corpus(path: impl AsRef<Path>) -> Result<MatchCorpus, DataError> {
    let path = path.as_ref();
    let raw = read_to_string(path)?;
    let corpus: MatchCorpus = parse_json(path, &raw)?;
    debug!(
        path = %path.display(),
        characters = corpus.characters.len(),
        matches = corpus.match_count(),
        "match corpus loaded"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::{MatchCorpus, MatchRecord};

    #[test]
    fn participation_requires_positive_battle_time_and_capsules() {
        let mut entry = MatchRecord {
            capsules: vec!["a".into()],
            battle_time: 0.0,
            ..MatchRecord::default()
        };
        assert!(!entry.is_counted());
        entry.battle_time = 12.5;
        assert!(entry.is_counted());
        entry.capsules = vec!["  ".into()];
        assert!(!entry.is_counted());
    }

    #[test]
    fn equipped_drops_repeats() {
        let entry = MatchRecord {
            capsules: vec!["a".into(), "b".into(), " a".into(), "".into()],
            ..MatchRecord::default()
        };
        assert_eq!(entry.equipped(), vec!["a", "b"]);
    }

    #[test]
    fn corpus_accepts_list_or_wrapped_json() {
        let list = r#"[{"character":"Goku","matches":[{"capsules":["a"],"won":true,"battleTime":30,"aiStrategy":"Rush"}]}]"#;
        let wrapped = r#"{"characters":[{"name":"Goku","matches":[{"capsules":["a"],"won":true,"battleTime":30,"aiStrategy":"Rush"}]}]}"#;
        let a: MatchCorpus = serde_json::from_str(list).expect("list parses");
        let b: MatchCorpus = serde_json::from_str(wrapped).expect("wrapped parses");
        assert_eq!(a, b);
        assert_eq!(a.characters[0].matches[0].ai_strategy_label(), Some("Rush"));
        assert_eq!(a.counted_matches().count(), 1);
    }
}
