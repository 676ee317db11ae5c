//! Entity kind → index resolution
//!
//! Built once, read-only afterwards. No index name is ever invented for a
//! kind that was not registered.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::SearchConfig;

/// A type stored as one document per value in a search index
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Entity kind name, the key used for index resolution
    const KIND: &'static str;

    /// Engine document id
    fn id(&self) -> String;
}

/// Resolved entity kind → index name table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapping {
    indices: BTreeMap<String, String>,
}

impl IndexMapping {
    pub fn builder() -> IndexMappingBuilder {
        IndexMappingBuilder::new()
    }

    pub fn index_for(&self, kind: &str) -> Option<&str> {
        self.indices.get(kind).map(String::as_str)
    }

    pub fn index_of<T: Document>(&self) -> Option<&str> {
        self.index_for(T::KIND)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// (kind, index) pairs in kind order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.indices.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Collects registrations, then applies config overrides and the prefix
#[derive(Debug, Clone, Default)]
pub struct IndexMappingBuilder {
    registered: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
    prefix: String,
}

impl IndexMappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `T` to its lower-cased kind name
    pub fn register<T: Document>(self) -> Self {
        let index = T::KIND.to_lowercase();
        self.register_kind(T::KIND, index)
    }

    /// Maps `T` to an explicit index name
    pub fn register_as<T: Document>(self, index: impl Into<String>) -> Self {
        self.register_kind(T::KIND, index)
    }

    /// Registration by kind name, for callers without a concrete type
    pub fn register_kind(mut self, kind: impl Into<String>, index: impl Into<String>) -> Self {
        self.registered.insert(kind.into(), index.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Applies the prefix and `indices` overrides from configuration.
    /// Overrides for kinds that are never registered are ignored.
    pub fn with_config(mut self, config: &SearchConfig) -> Self {
        self.prefix = config.index_prefix.clone();
        self.overrides = config.indices.clone();
        self
    }

    pub fn build(self) -> IndexMapping {
        let Self {
            registered,
            overrides,
            prefix,
        } = self;

        let indices = registered
            .into_iter()
            .map(|(kind, index)| {
                let name = overrides.get(&kind).cloned().unwrap_or(index);
                (kind, format!("{}{}", prefix, name))
            })
            .collect();

        IndexMapping { indices }
    }
}
