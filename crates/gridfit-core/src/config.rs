//! Topology flavor configuration.
//!
//! A flavor names an ordered list of node-label keys, coarse to fine, that
//! define the topology hierarchy (e.g. block, rack, host). The finest level
//! is always the per-host label. An optional exact-match node-label filter
//! restricts the flavor to a slice of the fleet.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating a flavor spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlavorSpecError {
    #[error("flavor {0:?} declares no topology levels")]
    EmptyLevels(String),

    #[error("flavor {flavor:?} repeats level key: {level}")]
    DuplicateLevel { flavor: String, level: String },
}

/// Configuration of one topology flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorSpec {
    /// Flavor name; appears verbatim in unfit reasons.
    pub name: String,
    /// Level label keys, coarse to fine. The last entry is the per-host
    /// label.
    pub levels: Vec<String>,
    /// Exact-match node-label filter; empty means no filtering.
    #[serde(default)]
    pub node_label_filter: BTreeMap<String, String>,
}

impl FlavorSpec {
    pub fn new(name: impl Into<String>, levels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            levels,
            node_label_filter: BTreeMap::new(),
        }
    }

    /// Builder-style filter entry.
    pub fn with_node_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_label_filter.insert(key.into(), value.into());
        self
    }

    /// Load a flavor spec from a TOML file and validate it.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let spec: FlavorSpec = toml::from_str(&content)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), FlavorSpecError> {
        if self.levels.is_empty() {
            return Err(FlavorSpecError::EmptyLevels(self.name.clone()));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if self.levels[..i].contains(level) {
                return Err(FlavorSpecError::DuplicateLevel {
                    flavor: self.name.clone(),
                    level: level.clone(),
                });
            }
        }
        Ok(())
    }

    /// Position of a level key in the hierarchy, coarse to fine.
    pub fn level_index(&self, key: &str) -> Option<usize> {
        self.levels.iter().position(|level| level == key)
    }
}
