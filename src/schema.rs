//! Schema adapters - read wire values off live resources.
//!
//! [`Schema`] is the capability the encoder consumes. [`GenericSchema`] is
//! the implementation every resource gets without writing one by hand: it is
//! driven entirely by [`ResourceMetadata`] and the class's registered getters.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::class::FieldValue;
use crate::error::SchemaError;
use crate::resolver::EncoderContext;
use crate::types::ResourceMetadata;

/// Relationship self links are shown unless a relationship opts out.
pub const DEFAULT_SHOW_SELF_LINK: bool = true;
/// Relationship related links are shown unless a relationship opts out.
pub const DEFAULT_SHOW_RELATED_LINK: bool = true;

/// What an encoder needs from a schema.
pub trait Schema {
    /// Wire resource type.
    fn resource_type(&self) -> &str;

    fn id(&self, resource: &dyn Any) -> Result<String, SchemaError>;

    /// Attributes, restricted to `fields` when given.
    fn attributes(
        &self,
        resource: &dyn Any,
        fields: Option<&BTreeSet<String>>,
    ) -> Result<Map<String, Value>, SchemaError>;

    /// Relationships named in `include`, each readable lazily.
    fn relationships<'a>(
        &'a self,
        resource: &'a dyn Any,
        is_primary: bool,
        include: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Relationship<'a>>, SchemaError>;

    fn default_include_paths(&self) -> Vec<String> {
        Vec::new()
    }

    fn self_url(&self, resource: &dyn Any) -> Result<String, SchemaError> {
        Ok(format!("/{}/{}", self.resource_type(), self.id(resource)?))
    }
}

/// A relationship whose data is read only when asked for.
pub struct Relationship<'a> {
    pub show_self_link: bool,
    pub show_related_link: bool,
    data: Box<dyn Fn() -> Result<FieldValue, SchemaError> + 'a>,
}

impl<'a> Relationship<'a> {
    pub fn new(
        show_self_link: bool,
        show_related_link: bool,
        data: impl Fn() -> Result<FieldValue, SchemaError> + 'a,
    ) -> Self {
        Self {
            show_self_link,
            show_related_link,
            data: Box::new(data),
        }
    }

    /// Invoke the relationship getter, forcing deferred values.
    pub fn data(&self) -> Result<FieldValue, SchemaError> {
        (self.data)().map(FieldValue::force)
    }
}

impl fmt::Debug for Relationship<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relationship")
            .field("show_self_link", &self.show_self_link)
            .field("show_related_link", &self.show_related_link)
            .finish_non_exhaustive()
    }
}

/// Metadata-driven schema used when a resource has no schema of its own.
///
/// The encoding group is fixed at construction; fields outside it are
/// neither read nor rendered.
#[derive(Debug, Clone)]
pub struct GenericSchema {
    metadata: Arc<ResourceMetadata>,
    group: Option<String>,
}

impl GenericSchema {
    pub fn new(
        _context: &EncoderContext,
        metadata: Arc<ResourceMetadata>,
        group: Option<&str>,
    ) -> Self {
        Self {
            metadata,
            group: group.map(String::from),
        }
    }

    pub fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn check_instance(&self, resource: &dyn Any) -> Result<(), SchemaError> {
        if self.metadata.class.info().is_instance(resource) {
            Ok(())
        } else {
            Err(SchemaError::TypeMismatch {
                resource: self.metadata.name.clone(),
                expected: self.metadata.class.name().to_string(),
            })
        }
    }

    fn read(&self, resource: &dyn Any, getter: &str) -> Result<FieldValue, SchemaError> {
        let class = self.metadata.class.info();
        class
            .method(getter)
            .filter(|m| m.is_public() && m.arity == 0)
            .and_then(|m| m.invoke(resource))
            .ok_or_else(|| SchemaError::MissingAccessor {
                class: class.name().to_string(),
                accessor: getter.to_string(),
            })
    }
}

impl Schema for GenericSchema {
    fn resource_type(&self) -> &str {
        &self.metadata.name
    }

    fn id(&self, resource: &dyn Any) -> Result<String, SchemaError> {
        self.check_instance(resource)?;
        let value = self.read(resource, &self.metadata.identifier.getter)?;
        match value.force() {
            FieldValue::Json(Value::String(s)) => Ok(s),
            FieldValue::Json(Value::Number(n)) => Ok(n.to_string()),
            FieldValue::Json(Value::Bool(b)) => Ok(b.to_string()),
            other => Err(SchemaError::InvalidIdentifier {
                resource: self.metadata.name.clone(),
                actual: format!("{:?}", other),
            }),
        }
    }

    fn attributes(
        &self,
        resource: &dyn Any,
        fields: Option<&BTreeSet<String>>,
    ) -> Result<Map<String, Value>, SchemaError> {
        self.check_instance(resource)?;
        let group = self.group();
        let mut attributes = Map::new();

        for (name, attribute) in &self.metadata.attributes {
            if !attribute.field.is_visible(group) {
                continue;
            }
            if fields.is_some_and(|fields| !fields.contains(name)) {
                continue;
            }
            let value = self
                .read(resource, &attribute.field.getter)?
                .into_json()
                .ok_or_else(|| SchemaError::UnsupportedAttributeValue {
                    resource: self.metadata.name.clone(),
                    attribute: name.clone(),
                })?;
            attributes.insert(name.clone(), value);
        }

        Ok(attributes)
    }

    fn relationships<'a>(
        &'a self,
        resource: &'a dyn Any,
        _is_primary: bool,
        include: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Relationship<'a>>, SchemaError> {
        if include.is_empty() {
            return Ok(BTreeMap::new());
        }

        let missing: Vec<String> = include
            .iter()
            .filter(|name| !self.metadata.relationships.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::UnknownRelationshipRequest {
                resource: self.metadata.name.clone(),
                names: missing,
            });
        }

        self.check_instance(resource)?;
        let group = self.group();
        let mut relationships = BTreeMap::new();

        for name in include {
            let metadata = &self.metadata.relationships[name];
            if !metadata.field.is_visible(group) {
                continue;
            }
            let getter = metadata.field.getter.as_str();
            relationships.insert(
                name.clone(),
                Relationship::new(
                    metadata.link_self.unwrap_or(DEFAULT_SHOW_SELF_LINK),
                    metadata.link_related.unwrap_or(DEFAULT_SHOW_RELATED_LINK),
                    move || self.read(resource, getter),
                ),
            );
        }

        Ok(relationships)
    }

    fn default_include_paths(&self) -> Vec<String> {
        self.metadata.default_include_paths(self.group())
    }

    fn self_url(&self, resource: &dyn Any) -> Result<String, SchemaError> {
        let id = self.id(resource)?;
        Ok(match &self.metadata.prefix {
            Some(prefix) => format!(
                "/{}/{}/{}",
                prefix.trim_matches('/'),
                self.metadata.name,
                id
            ),
            None => format!("/{}/{}", self.metadata.name, id),
        })
    }
}
