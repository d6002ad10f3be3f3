//! Capsule catalog: raw definitions as loaded, and the classified, id-indexed [Catalog].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{Archetype, BuildType, Classification, Classifiers};
use crate::data::{parse_json, read_to_string, DataError, FileFormat};

pub const DEFAULT_CAPSULE_TYPE: &str = "capsule";

/// One catalog row as supplied by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cost: u32,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub exclusive_to: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
}

impl CapsuleDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, cost: u32, effect: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            effect: effect.into(),
            exclusive_to: None,
            item_type: None,
        }
    }

    pub fn exclusive_to(mut self, character: impl Into<String>) -> Self {
        self.exclusive_to = Some(character.into());
        self
    }

    /// Rows without a type are treated as capsules.
    pub fn is_of_type(&self, capsule_type: &str) -> bool {
        self.item_type
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map_or(true, |kind| kind.eq_ignore_ascii_case(capsule_type))
    }

    fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.exclusive_to = self
            .exclusive_to
            .map(|character| character.trim().to_string())
            .filter(|character| !character.is_empty());
        self
    }
}

/// A catalog entry tagged with both taxonomies. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capsule {
    pub id: String,
    pub name: String,
    pub cost: u32,
    pub effect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_to: Option<String>,
    pub archetype: Classification<Archetype>,
    pub build_type: Classification<BuildType>,
}

impl Capsule {
    pub fn classify(definition: CapsuleDefinition, classifiers: &Classifiers) -> Self {
        let archetype = classifiers
            .archetype
            .classify(&definition.effect, &definition.name);
        let build_type = classifiers
            .build_type
            .classify(&definition.effect, &definition.name);
        Self {
            id: definition.id,
            name: definition.name,
            cost: definition.cost,
            effect: definition.effect,
            exclusive_to: definition.exclusive_to,
            archetype,
            build_type,
        }
    }

    pub fn primary_archetype(&self) -> Archetype {
        self.archetype.primary
    }

    /// Unbound capsules are available to everyone; bound ones only to their character.
    /// Without a character, every capsule is considered available.
    pub fn is_available_to(&self, character: Option<&str>) -> bool {
        match (self.exclusive_to.as_deref(), character) {
            (Some(owner), Some(character)) => owner.eq_ignore_ascii_case(character),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    capsules: Vec<Capsule>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Classify every definition once. Duplicate ids keep the first row.
    pub fn classify(definitions: Vec<CapsuleDefinition>, classifiers: &Classifiers) -> Self {
        let mut catalog = Self::default();
        for definition in definitions {
            let definition = definition.normalized();
            if definition.id.is_empty() {
                warn!("catalog: skipping capsule row with empty id");
                continue;
            }
            if catalog.index.contains_key(&definition.id) {
                warn!(id = %definition.id, "catalog: duplicate capsule id; keeping first row");
                continue;
            }
            catalog
                .index
                .insert(definition.id.clone(), catalog.capsules.len());
            catalog
                .capsules
                .push(Capsule::classify(definition, classifiers));
        }
        debug!(capsules = catalog.capsules.len(), "catalog classified");
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&Capsule> {
        self.index.get(id).map(|&position| &self.capsules[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn capsules(&self) -> &[Capsule] {
        &self.capsules
    }

    pub fn len(&self) -> usize {
        self.capsules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capsules.is_empty()
    }

    /// Resolve ids to capsules, dropping repeats. Unknown ids are returned separately.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> (Vec<&Capsule>, Vec<String>) {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut unknown = Vec::new();
        for id in ids {
            let id = id.as_ref().trim();
            if !seen.insert(id) {
                continue;
            }
            match self.get(id) {
                Some(capsule) => found.push(capsule),
                None => unknown.push(id.to_string()),
            }
        }
        (found, unknown)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<CapsuleDefinition>),
    Wrapped { capsules: Vec<CapsuleDefinition> },
}

/// Load catalog rows from JSON or CSV, keeping only rows of `capsule_type`.
pub fn load_capsule_definitions(
    path: impl AsRef<Path>,
    capsule_type: &str,
) -> Result<Vec<CapsuleDefinition>, DataError> {
    let path = path.as_ref();
    let rows = match FileFormat::of(path)? {
        FileFormat::Json => {
            let raw = read_to_string(path)?;
            match parse_json::<CatalogFile>(path, &raw)? {
                CatalogFile::List(rows) | CatalogFile::Wrapped { capsules: rows } => rows,
            }
        }
        FileFormat::Csv => read_csv_rows(path)?,
        FileFormat::Yaml => return Err(DataError::UnsupportedFormat(path.display().to_string())),
    };

    let total = rows.len();
    let capsules: Vec<CapsuleDefinition> = rows
        .into_iter()
        .filter(|row| row.is_of_type(capsule_type))
        .collect();
    debug!(
        path = %path.display(),
        rows = total,
        capsules = capsules.len(),
        "catalog rows loaded"
    );
    Ok(capsules)
}

fn read_csv_rows(path: &Path) -> Result<Vec<CapsuleDefinition>, DataError> {
    let csv_error = |source| DataError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;
    reader
        .deserialize()
        .collect::<Result<Vec<CapsuleDefinition>, csv::Error>>()
        .map_err(csv_error)
}

#[cfg(test)]
mod tests {
    use super::{CapsuleDefinition, Catalog};
    use crate::classify::{Archetype, Classifiers};

    fn catalog() -> Catalog {
        let classifiers = Classifiers::standard().expect("tables compile");
        Catalog::classify(
            vec![
                CapsuleDefinition::new("x", "Power Up", 3, "Increases damage"),
                CapsuleDefinition::new(" y ", "Iron Wall", 2, "Reduces damage taken"),
                CapsuleDefinition::new("x", "Duplicate", 1, ""),
                CapsuleDefinition::new("", "Nameless", 1, ""),
            ],
            &classifiers,
        )
    }

    #[test]
    fn classify_indexes_and_skips_duplicates() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("x").map(|c| c.name.as_str()), Some("Power Up"));
        assert_eq!(catalog.get("y").map(|c| c.primary_archetype()), Some(Archetype::Defensive));
    }

    #[test]
    fn resolve_splits_unknown_and_drops_repeats() {
        let catalog = catalog();
        let (found, unknown) = catalog.resolve(&["x", "q", "x", "y"]);
        assert_eq!(found.len(), 2);
        assert_eq!(unknown, vec!["q".to_string()]);
    }

    #[test]
    fn type_filter_accepts_untyped_rows() {
        let mut row = CapsuleDefinition::new("a", "A", 1, "");
        assert!(row.is_of_type("capsule"));
        row.item_type = Some("Costume".into());
        assert!(!row.is_of_type("capsule"));
        row.item_type = Some("CAPSULE".into());
        assert!(row.is_of_type("capsule"));
    }

    #[test]
    fn exclusive_capsules_follow_character() {
        let classifiers = Classifiers::standard().expect("tables compile");
        let catalog = Catalog::classify(
            vec![CapsuleDefinition::new("k", "Kaioken", 2, "").exclusive_to("Goku")],
            &classifiers,
        );
        let capsule = catalog.get("k").expect("present");
        assert!(capsule.is_available_to(Some("goku")));
        assert!(!capsule.is_available_to(Some("Vegeta")));
        assert!(capsule.is_available_to(None));
    }
}
