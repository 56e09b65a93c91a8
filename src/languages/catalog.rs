use super::LanguagePatternDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("builtin.yaml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    languages: Vec<LanguagePatternDefinition>,
}

/// Name-unique collection of language definitions, sorted by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCatalog {
    definitions: Vec<LanguagePatternDefinition>,
}

impl LanguageCatalog {
    pub fn from_definitions(
        mut definitions: Vec<LanguagePatternDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if definition.name.trim().is_empty() {
                return Err(CatalogError::Invalid(
                    "language definition without a name".to_string(),
                ));
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate language definition: {}",
                    definition.name
                )));
            }
        }

        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { definitions })
    }

    /// Definitions bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_yaml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_definitions(file.languages)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_definitions(file.languages)
    }

    /// Loads a catalog file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        debug!(path = %path.display(), "Loading language catalog");
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn definitions(&self) -> &[LanguagePatternDefinition] {
        &self.definitions
    }

    pub fn into_definitions(self) -> Vec<LanguagePatternDefinition> {
        self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&LanguagePatternDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn language_names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
