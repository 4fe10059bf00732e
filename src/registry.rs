//! The metadata graph, keyed by resource name.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::class::TypeRegistry;
use crate::config::Configuration;
use crate::driver::Driver;
use crate::error::MetadataError;
use crate::types::ResourceMetadata;

/// Every resource known to the process.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    resources: BTreeMap<String, Arc<ResourceMetadata>>,
    by_type: HashMap<TypeId, String>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every configured source, in order.
    ///
    /// # Errors
    ///
    /// The first failing source aborts the build; no registry is returned.
    pub fn build(configuration: &Configuration, types: &TypeRegistry) -> Result<Self, MetadataError> {
        let mut registry = Self::new();
        for source in &configuration.sources {
            let driver = source.driver();
            registry.extend_with(driver.as_ref(), types)?;
        }
        Ok(registry)
    }

    /// Load one driver batch. Returns the number of resources added.
    ///
    /// # Errors
    ///
    /// On any error, including a name already taken, the registry is left
    /// untouched.
    pub fn extend_with(
        &mut self,
        driver: &dyn Driver,
        types: &TypeRegistry,
    ) -> Result<usize, MetadataError> {
        let batch = driver.load(types)?;

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for metadata in &batch {
            let first = self
                .resources
                .get(&metadata.name)
                .map(|existing| existing.class.name())
                .or_else(|| seen.get(metadata.name.as_str()).copied());
            if let Some(first) = first {
                return Err(MetadataError::DuplicateResource {
                    name: metadata.name.clone(),
                    first: first.to_string(),
                    second: metadata.class.name().to_string(),
                });
            }
            seen.insert(&metadata.name, metadata.class.name());
        }

        let count = batch.len();
        for metadata in batch {
            self.store(metadata);
        }

        tracing::info!(driver = driver.kind(), resources = count, "metadata loaded");
        Ok(count)
    }

    /// Add a single resource.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::DuplicateResource` if the name is taken.
    pub fn insert(&mut self, metadata: ResourceMetadata) -> Result<(), MetadataError> {
        if let Some(existing) = self.resources.get(&metadata.name) {
            return Err(MetadataError::DuplicateResource {
                name: metadata.name.clone(),
                first: existing.class.name().to_string(),
                second: metadata.class.name().to_string(),
            });
        }
        self.store(metadata);
        Ok(())
    }

    fn store(&mut self, metadata: ResourceMetadata) {
        self.by_type
            .entry(metadata.class.type_id())
            .or_insert_with(|| metadata.name.clone());
        self.resources
            .insert(metadata.name.clone(), Arc::new(metadata));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ResourceMetadata>> {
        self.resources.get(name)
    }

    /// Metadata for the class of a Rust type. If one class backs several
    /// resources, the first one registered wins.
    pub fn for_type(&self, type_id: TypeId) -> Option<&Arc<ResourceMetadata>> {
        self.by_type
            .get(&type_id)
            .and_then(|name| self.resources.get(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<ResourceMetadata>)> {
        self.resources
            .iter()
            .map(|(name, metadata)| (name.as_str(), metadata))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Serialize for MetadataRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.resources.len()))?;
        for (name, metadata) in &self.resources {
            map.serialize_entry(name, metadata.as_ref())?;
        }
        map.end()
    }
}
