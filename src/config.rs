//! Application configuration loading and validation.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::capsule::DEFAULT_CAPSULE_TYPE;
use crate::data::Ruleset;
use crate::optimizer::build_generator::DEFAULT_MIN_CAPSULES;
use crate::optimizer::GeneratorSettings;

pub const CONFIG_ENV: &str = "LOADOUT_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "loadout.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Where input files live and which catalog rows count as capsules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    #[serde(default = "default_capsule_type")]
    pub capsule_type: String,
}

fn default_capsule_type() -> String {
    DEFAULT_CAPSULE_TYPE.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            corpus_path: None,
            capsule_type: default_capsule_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_max_builds")]
    pub max_builds: usize,

    #[serde(default = "default_min_capsules")]
    pub min_capsules: usize,

    #[serde(default = "default_prefer_synergy")]
    pub prefer_synergy: bool,

    /// Fixed seed for reproducible runs. Drawn from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Worker threads for generation. 0 uses one per core.
    #[serde(default)]
    pub workers: usize,
}

fn default_max_builds() -> usize {
    5
}

fn default_min_capsules() -> usize {
    DEFAULT_MIN_CAPSULES
}

fn default_prefer_synergy() -> bool {
    true
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_builds: default_max_builds(),
            min_capsules: default_min_capsules(),
            prefer_synergy: default_prefer_synergy(),
            seed: None,
            workers: 0,
        }
    }
}

impl GeneratorConfig {
    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            max_builds: self.max_builds,
            min_capsules: self.min_capsules,
            prefer_synergy: self.prefer_synergy,
            ..GeneratorSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub ruleset: Ruleset,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data: DataConfig::default(),
            ruleset: Ruleset::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, then `$LOADOUT_CONFIG`, then `loadout.yaml` if present, then defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ruleset(&self.ruleset, Some(self.generator.min_capsules))?;

        if self.generator.max_builds == 0 {
            return Err(ConfigError::Validation(
                "generator.max_builds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Rejects rulesets no build can satisfy. `min_capsules` is the generator's lower bound, when
/// builds will be generated under this ruleset.
pub fn validate_ruleset(ruleset: &Ruleset, min_capsules: Option<usize>) -> Result<(), ConfigError> {
    if ruleset.max_capsules == 0 {
        return Err(ConfigError::Validation(
            "ruleset.maxCapsules must be greater than 0".to_string(),
        ));
    }

    if let Some(min_capsules) = min_capsules.filter(|min| *min > ruleset.max_capsules) {
        return Err(ConfigError::Validation(format!(
            "generator.min_capsules ({min_capsules}) exceeds ruleset.maxCapsules ({})",
            ruleset.max_capsules
        )));
    }

    if let Some(min_cost) = ruleset.min_cost {
        if min_cost > ruleset.max_cost {
            return Err(ConfigError::Validation(format!(
                "ruleset.minCost ({min_cost}) exceeds ruleset.maxCost ({})",
                ruleset.max_cost
            )));
        }
    }

    Ok(())
}
