//! The ordered class label set.
//!
//! Label `i` names the model's output score `i`. Nothing in the model artifact
//! records this ordering, so the set is checked against the engine's declared
//! output width when the pipeline is built.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_LABELS: [&str; 10] = [
    "battery",
    "biological",
    "cardboard",
    "clothes",
    "glass",
    "metal",
    "paper",
    "plastic",
    "shoes",
    "trash",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Arc<[String]>,
}

/// Accepted label file layouts: a plain array, or an index-keyed object such
/// as `{"0": "battery", "1": "biological"}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Indexed(IndexedEntries),
}

/// Object entries in file order, repeated keys included.
struct IndexedEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for IndexedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = IndexedEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping indices to label names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(IndexedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Default for ClassLabels {
    fn default() -> Self {
        ClassLabels {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClassLabels {
    pub fn new(labels: Vec<String>) -> ConfigResult<Self> {
        if labels.is_empty() {
            return Err(ConfigError::Labels("label set is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if label.trim().is_empty() {
                return Err(ConfigError::Labels("label names must not be blank".to_string()));
            }
            if !seen.insert(label.as_str()) {
                return Err(ConfigError::Labels(format!("duplicate label '{}'", label)));
            }
        }
        Ok(ClassLabels {
            labels: labels.into(),
        })
    }

    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let parsed: LabelFile = serde_json::from_str(text)
            .map_err(|e| ConfigError::Labels(format!("invalid label JSON: {}", e)))?;
        match parsed {
            LabelFile::List(labels) => Self::new(labels),
            LabelFile::Indexed(IndexedEntries(entries)) => {
                let mut indexed = Vec::with_capacity(entries.len());
                for (key, label) in entries {
                    // Canonical decimal only, so "01" or "+1" cannot alias "1".
                    let index = key
                        .parse::<usize>()
                        .ok()
                        .filter(|index| index.to_string() == key)
                        .ok_or_else(|| {
                            ConfigError::Labels(format!("label key '{}' is not an index", key))
                        })?;
                    indexed.push((index, label));
                }
                indexed.sort_by_key(|(index, _)| *index);
                if let Some(pair) = indexed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
                    return Err(ConfigError::Labels(format!(
                        "duplicate label index {}",
                        pair[0].0
                    )));
                }
                for (position, (index, _)) in indexed.iter().enumerate() {
                    if *index != position {
                        return Err(ConfigError::Labels(format!(
                            "label indices must be contiguous from 0, missing index {}",
                            position
                        )));
                    }
                }
                Self::new(indexed.into_iter().map(|(_, label)| label).collect())
            }
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
