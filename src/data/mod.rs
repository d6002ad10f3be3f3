//! Plain input data: capsule catalog, match corpus and rulesets, plus their file loaders.
//! Loaders are the only fallible part of the crate; everything downstream works on the
//! in-memory values and never returns errors.

pub mod capsule;
pub mod matches;
pub mod ruleset;
pub mod validate;

use std::fs;
use std::path::Path;

use thiserror::Error;

pub use capsule::{load_capsule_definitions, Capsule, CapsuleDefinition, Catalog};
pub use matches::{load_corpus, CharacterRecord, MatchCorpus, MatchRecord, MAX_EQUIPPED};
pub use ruleset::{load_ruleset, Ruleset};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("unable to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse json '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to parse csv '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("unable to parse yaml '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported file extension for '{0}' (expected .json, .csv, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("invalid classification pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileFormat {
    Json,
    Csv,
    Yaml,
}

impl FileFormat {
    pub(crate) fn of(path: &Path) -> Result<Self, DataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, DataError> {
    fs::read_to_string(path).map_err(|source| DataError::Read {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    raw: &str,
) -> Result<T, DataError> {
    serde_json::from_str(raw).map_err(|source| DataError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn parse_yaml<T: serde::de::DeserializeOwned>(
    path: &Path,
    raw: &str,
) -> Result<T, DataError> {
    serde_yaml::from_str(raw).map_err(|source| DataError::Yaml {
        path: path.display().to_string(),
        source,
    })
}
