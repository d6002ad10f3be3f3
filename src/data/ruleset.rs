use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{parse_json, parse_yaml, read_to_string, DataError, FileFormat, MAX_EQUIPPED};

pub const DEFAULT_MAX_COST: u32 = 20;

/// Constraints a build must satisfy. `min_cost: None` means no lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    #[serde(default = "default_max_cost")]
    pub max_cost: u32,
    #[serde(default = "default_max_capsules")]
    pub max_capsules: usize,
    #[serde(default)]
    pub min_cost: Option<u32>,
    #[serde(default)]
    pub banned_capsules: Vec<String>,
    #[serde(default)]
    pub required_capsules: Vec<String>,
}

fn default_max_cost() -> u32 {
    DEFAULT_MAX_COST
}

fn default_max_capsules() -> usize {
    MAX_EQUIPPED
}

impl Default for Ruleset {
    fn default() -> Self {
        Self {
            max_cost: default_max_cost(),
            max_capsules: default_max_capsules(),
            min_cost: None,
            banned_capsules: Vec::new(),
            required_capsules: Vec::new(),
        }
    }
}

impl Ruleset {
    pub fn new(max_cost: u32, max_capsules: usize) -> Self {
        Self {
            max_cost,
            max_capsules,
            ..Self::default()
        }
    }

    pub fn is_banned(&self, id: &str) -> bool {
        self.banned_capsules.iter().any(|banned| banned == id)
    }

    pub fn is_required(&self, id: &str) -> bool {
        self.required_capsules.iter().any(|required| required == id)
    }
}

/// Load a ruleset from a JSON or YAML file.
pub fn load_ruleset(path: impl AsRef<Path>) -> Result<Ruleset, DataError> {
    let path = path.as_ref();
    let raw = read_to_string(path)?;
    match FileFormat::of(path)? {
        FileFormat::Json => parse_json(path, &raw),
        FileFormat::Yaml => parse_yaml(path, &raw),
        FileFormat::Csv => Err(DataError::UnsupportedFormat(path.display().to_string())),
    }
}
