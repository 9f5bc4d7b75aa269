//! Settings for building graphs and loading directories of RDF files.

use crate::errors::{Error, Result};
use crate::format;
use derive_builder::Builder;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufReader, Write};
use std::path::Path;
use std::str::FromStr;

/// Which [`Store`](crate::store::Store) implementation backs new graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Append,
    #[default]
    Index,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "append" => Ok(StoreKind::Append),
            "index" => Ok(StoreKind::Index),
            other => Err(Error::Config(format!("unknown store kind '{}'", other))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreKind::Append => write!(f, "append"),
            StoreKind::Index => write!(f, "index"),
        }
    }
}

fn default_blank_node_prefix() -> String {
    "b".to_string()
}

/// One `*.ext` pattern per registered extension.
pub fn default_includes() -> Vec<String> {
    format::all()
        .iter()
        .flat_map(|f| f.extensions())
        .map(|ext| format!("*.{}", ext))
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[builder(setter(into), default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreKind,
    /// Extra `base -> name` bindings added to every new graph.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    #[serde(default = "default_blank_node_prefix")]
    pub blank_node_prefix: String,
    /// Glob patterns for files picked up when loading a directory.
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Fail on the first source that cannot be loaded.
    #[serde(default)]
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreKind::default(),
            prefixes: BTreeMap::new(),
            blank_node_prefix: default_blank_node_prefix(),
            includes: default_includes(),
            excludes: Vec::new(),
            strict: false,
        }
    }
}

impl From<ConfigBuilderError> for Error {
    fn from(e: ConfigBuilderError) -> Self {
        Error::Config(e.to_string())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Config(e.to_string()))
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Compile the include and exclude patterns.
    pub fn build_globsets(&self) -> Result<(GlobSet, GlobSet)> {
        Ok((build_globset(&self.includes)?, build_globset(&self.excludes)?))
    }

    /// Whether a directory walk should pick up `path`. Excludes win; an empty
    /// include list includes everything.
    pub fn is_included(&self, path: &Path) -> Result<bool> {
        let (include_set, exclude_set) = self.build_globsets()?;
        Ok(matches(&include_set, &exclude_set, self.includes.is_empty(), path))
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)?;
        config.build_globsets()?;
        Ok(config)
    }
}

pub(crate) fn matches(
    include_set: &GlobSet,
    exclude_set: &GlobSet,
    includes_empty: bool,
    path: &Path,
) -> bool {
    if exclude_set.is_match(path) {
        return false;
    }
    includes_empty || include_set.is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builder_fills_defaults() {
        let config = Config::builder()
            .store(StoreKind::Append)
            .strict(true)
            .build()
            .unwrap();
        assert_eq!(config.store, StoreKind::Append);
        assert!(config.strict);
        assert_eq!(config.blank_node_prefix, "b");
        assert!(config.includes.contains(&"*.ttl".to_string()));
    }

    #[test]
    fn globs_include_and_exclude() {
        let config = Config::builder()
            .includes(vec!["*.ttl".to_string(), "*.nt".to_string()])
            .excludes(vec!["**/drafts/**".to_string()])
            .build()
            .unwrap();
        assert!(config.is_included(Path::new("data/a.ttl")).unwrap());
        assert!(config.is_included(Path::new("data/A.TTL")).unwrap());
        assert!(!config.is_included(Path::new("data/a.json")).unwrap());
        assert!(!config.is_included(Path::new("data/drafts/a.ttl")).unwrap());

        let everything = Config::builder().includes(Vec::<String>::new()).build().unwrap();
        assert!(everything.is_included(Path::new("notes.md")).unwrap());
    }

    #[test]
    fn bad_glob_is_a_config_error() {
        let config = Config::builder()
            .excludes(vec!["a{".to_string()])
            .build()
            .unwrap();
        assert!(matches!(config.build_globsets(), Err(Error::Config(_))));
    }

    #[test]
    fn file_roundtrip_and_partial_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trine.json");
        let mut config = Config::default();
        config
            .prefixes
            .insert("http://ex.org/".to_string(), "ex".to_string());
        config.save_to_file(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);

        std::fs::write(&path, r#"{"store": "append"}"#).unwrap();
        let partial = Config::from_file(&path).unwrap();
        assert_eq!(partial.store, StoreKind::Append);
        assert_eq!(partial.includes, default_includes());
    }

    #[test]
    fn store_kind_parses() {
        assert_eq!("Append".parse::<StoreKind>().unwrap(), StoreKind::Append);
        assert_eq!(StoreKind::Index.to_string(), "index");
        assert!("btree".parse::<StoreKind>().is_err());
    }
}
