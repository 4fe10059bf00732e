//! Schema resolution - binds resource metadata to a schema adapter.
//!
//! Resolution is deferred: [`resolve`] only decides which schema class to use
//! and hands back a [`SchemaFactory`]. Whether that class really is a schema
//! is checked the first time the factory is invoked, so resource types that
//! are never encoded never have their schema looked at.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::class::TypeRegistry;
use crate::config::Configuration;
use crate::error::ResolveError;
use crate::registry::MetadataRegistry;
use crate::schema::Schema;
use crate::types::ResourceMetadata;

/// Encoder state passed through to schema constructors. Opaque to this crate.
#[derive(Debug, Clone, Default)]
pub struct EncoderContext {
    options: Map<String, Value>,
}

impl EncoderContext {
    pub fn new(options: Map<String, Value>) -> Self {
        Self { options }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}

type BasicFn = dyn Fn(&EncoderContext) -> Box<dyn Schema> + Send + Sync;
type MetadataAwareFn =
    dyn Fn(&EncoderContext, Arc<ResourceMetadata>, Option<&str>) -> Box<dyn Schema> + Send + Sync;

/// How a registered schema class is constructed.
#[derive(Clone)]
pub enum SchemaConstructor {
    /// Hand-written schema that only needs the encoder context.
    Basic(Arc<BasicFn>),
    /// Schema that also takes the resource metadata and encoding group.
    MetadataAware(Arc<MetadataAwareFn>),
}

impl SchemaConstructor {
    pub fn basic<F>(constructor: F) -> Self
    where
        F: Fn(&EncoderContext) -> Box<dyn Schema> + Send + Sync + 'static,
    {
        SchemaConstructor::Basic(Arc::new(constructor))
    }

    pub fn metadata_aware<F>(constructor: F) -> Self
    where
        F: Fn(&EncoderContext, Arc<ResourceMetadata>, Option<&str>) -> Box<dyn Schema>
            + Send
            + Sync
            + 'static,
    {
        SchemaConstructor::MetadataAware(Arc::new(constructor))
    }

    pub fn accepts_metadata(&self) -> bool {
        matches!(self, SchemaConstructor::MetadataAware(_))
    }
}

impl fmt::Debug for SchemaConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaConstructor::Basic(_) => f.write_str("Basic(..)"),
            SchemaConstructor::MetadataAware(_) => f.write_str("MetadataAware(..)"),
        }
    }
}

/// Deferred construction of a schema for one resource type and group.
///
/// Every [`create`](SchemaFactory::create) call returns a new instance.
#[derive(Debug, Clone)]
pub struct SchemaFactory {
    metadata: Arc<ResourceMetadata>,
    schema_class: String,
    group: Option<String>,
    types: Arc<TypeRegistry>,
}

impl SchemaFactory {
    pub fn metadata(&self) -> &Arc<ResourceMetadata> {
        &self.metadata
    }

    /// Effective schema class after group variants and the configured default.
    pub fn schema_class(&self) -> &str {
        &self.schema_class
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Build a schema instance.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::SchemaConformance` if the effective schema class
    /// is not a registered schema.
    pub fn create(&self, context: &EncoderContext) -> Result<Box<dyn Schema>, ResolveError> {
        let constructor = self.types.schema(&self.schema_class).ok_or_else(|| {
            ResolveError::SchemaConformance {
                resource: self.metadata.name.clone(),
                schema_class: self.schema_class.clone(),
            }
        })?;

        tracing::debug!(
            resource = %self.metadata.name,
            schema_class = %self.schema_class,
            group = ?self.group,
            "creating schema"
        );

        Ok(match constructor {
            SchemaConstructor::Basic(construct) => (**construct)(context),
            SchemaConstructor::MetadataAware(construct) => (**construct)(
                context,
                Arc::clone(&self.metadata),
                self.group.as_deref(),
            ),
        })
    }
}

/// Resolve the schema factory for one resource.
///
/// The schema class is the group variant, else the resource's own override,
/// else `configuration.default_schema_class`. Nothing is constructed or
/// checked until the factory is invoked.
pub fn resolve(
    metadata: &Arc<ResourceMetadata>,
    configuration: &Configuration,
    types: &Arc<TypeRegistry>,
    group: Option<&str>,
) -> SchemaFactory {
    bind(metadata, &configuration.default_schema_class, types, group)
}

fn bind(
    metadata: &Arc<ResourceMetadata>,
    default_schema_class: &str,
    types: &Arc<TypeRegistry>,
    group: Option<&str>,
) -> SchemaFactory {
    let schema_class = metadata
        .schema_class_for(group)
        .unwrap_or(default_schema_class)
        .to_string();
    SchemaFactory {
        metadata: Arc::clone(metadata),
        schema_class,
        group: group.map(String::from),
        types: Arc::clone(types),
    }
}

/// Resolves factories for every resource of a registry.
///
/// Built once at startup; lookups are plain map reads and the resolver can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct SchemaResolver {
    registry: Arc<MetadataRegistry>,
    types: Arc<TypeRegistry>,
    default_schema_class: String,
}

impl SchemaResolver {
    pub fn new(
        registry: Arc<MetadataRegistry>,
        types: Arc<TypeRegistry>,
        configuration: &Configuration,
    ) -> Self {
        Self {
            registry,
            types,
            default_schema_class: configuration.default_schema_class.clone(),
        }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Factory for the resource named `name`.
    pub fn factory(&self, name: &str, group: Option<&str>) -> Result<SchemaFactory, ResolveError> {
        let metadata = self
            .registry
            .get(name)
            .ok_or_else(|| ResolveError::UnknownResource {
                name: name.to_string(),
            })?;
        Ok(bind(metadata, &self.default_schema_class, &self.types, group))
    }

    /// Factory for the resource backed by `T`.
    pub fn factory_for<T: Any>(&self, group: Option<&str>) -> Result<SchemaFactory, ResolveError> {
        self.factory_for_type(TypeId::of::<T>(), std::any::type_name::<T>(), group)
    }

    /// Factory for the resource `resource` is an instance of.
    pub fn factory_for_resource(
        &self,
        resource: &dyn Any,
        group: Option<&str>,
    ) -> Result<SchemaFactory, ResolveError> {
        self.factory_for_type(resource.type_id(), "<dynamic>", group)
    }

    /// Factories for all resources, keyed by resource name.
    pub fn factories(&self, group: Option<&str>) -> BTreeMap<String, SchemaFactory> {
        self.registry
            .iter()
            .map(|(name, metadata)| {
                (
                    name.to_string(),
                    bind(metadata, &self.default_schema_class, &self.types, group),
                )
            })
            .collect()
    }

    fn factory_for_type(
        &self,
        type_id: TypeId,
        type_name: &str,
        group: Option<&str>,
    ) -> Result<SchemaFactory, ResolveError> {
        let metadata =
            self.registry
                .for_type(type_id)
                .ok_or_else(|| ResolveError::UnknownResourceType {
                    type_name: type_name.to_string(),
                })?;
        Ok(bind(metadata, &self.default_schema_class, &self.types, group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, FieldType, GENERIC_SCHEMA};
    use crate::marker::{FieldMarker, ResourceMarker};
    use crate::normalize::{normalize, RawClassDescriptor};

    struct Note {
        id: String,
    }

    fn note(resource: ResourceMarker) -> (Arc<ResourceMetadata>, Arc<TypeRegistry>) {
        let class = ClassBuilder::<Note>::new("Note")
            .field("id", FieldType::String, [])
            .getter("getId", |n| n.id.clone().into())
            .build();
        let types = TypeRegistry::new().with_class(class);
        let raw = RawClassDescriptor::new("Note", resource).field("id", FieldMarker::id());
        let metadata = normalize(raw, &types).unwrap();
        (Arc::new(metadata), Arc::new(types))
    }

    #[test]
    fn falls_back_to_default_schema() {
        let (metadata, types) = note(ResourceMarker::new());
        let factory = resolve(&metadata, &Configuration::default(), &types, None);
        assert_eq!(factory.schema_class(), GENERIC_SCHEMA);

        let schema = factory.create(&EncoderContext::default()).unwrap();
        assert_eq!(schema.resource_type(), "note");
        let note = Note { id: "n1".into() };
        assert_eq!(schema.id(&note).unwrap(), "n1");
    }

    #[test]
    fn variant_wins_for_its_group() {
        let (metadata, types) = note(
            ResourceMarker::new()
                .schema_class(GENERIC_SCHEMA)
                .variant("admin", "Note"),
        );
        let config = Configuration::default();
        assert_eq!(
            resolve(&metadata, &config, &types, Some("admin")).schema_class(),
            "Note"
        );
        assert_eq!(
            resolve(&metadata, &config, &types, Some("public")).schema_class(),
            GENERIC_SCHEMA
        );
    }

    #[test]
    fn conformance_is_checked_on_first_use() {
        let (metadata, types) = note(ResourceMarker::new().schema_class("Note"));
        let factory = resolve(&metadata, &Configuration::default(), &types, None);

        let err = factory.create(&EncoderContext::default()).err().unwrap();
        assert!(matches!(
            err,
            ResolveError::SchemaConformance { ref schema_class, .. } if schema_class == "Note"
        ));
    }

    #[test]
    fn encoder_options_are_readable() {
        let mut options = Map::new();
        options.insert("pretty".into(), Value::Bool(true));
        let ctx = EncoderContext::new(options);
        assert_eq!(ctx.option("pretty"), Some(&Value::Bool(true)));
        assert!(ctx.option("missing").is_none());
    }
}
