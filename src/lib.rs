//! JSON:API Resource Metadata
//!
//! Builds one canonical description of every domain type exposed as a JSON:API
//! resource, whatever the declarations were written in, and binds each
//! resource to a schema adapter at encode time.
//!
//! Declarations come from drivers:
//!
//! | Driver | Source |
//! |--------|--------|
//! | [`AnnotationDriver`] | markers attached with [`ClassBuilder`] |
//! | [`DocumentDriver`] | JSON or YAML descriptor files and URLs |
//! | [`RecordDriver`] | [`ResourceDescriptor`] records built in code |
//!
//! All of them feed [`normalize`], so equivalent declarations produce equal
//! [`ResourceMetadata`].
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! use jsonapi_metadata::{
//!     resolve, ClassBuilder, Configuration, EncoderContext, FieldMarker, FieldType,
//!     MetadataRegistry, ResourceMarker, SourceLocator, TypeRegistry,
//! };
//!
//! struct Article {
//!     uuid: String,
//!     title: String,
//! }
//!
//! let class = ClassBuilder::<Article>::new("blog::Article")
//!     .resource(ResourceMarker::new())
//!     .field("uuid", FieldType::String, [FieldMarker::id()])
//!     .field("title", FieldType::String, [FieldMarker::attribute()])
//!     .getter("getUuid", |a| a.uuid.clone().into())
//!     .getter("getTitle", |a| a.title.clone().into())
//!     .build();
//! let types = Arc::new(TypeRegistry::new().with_class(class));
//!
//! let config = Configuration::new().with_source(SourceLocator::Annotations { classes: None });
//! let registry = MetadataRegistry::build(&config, &types).unwrap();
//!
//! let metadata = registry.get("article").unwrap();
//! assert_eq!(metadata.identifier.getter, "getUuid");
//!
//! let schema = resolve(metadata, &config, &types, None)
//!     .create(&EncoderContext::default())
//!     .unwrap();
//! let article = Article {
//!     uuid: "a1".into(),
//!     title: "Hello".into(),
//! };
//! assert_eq!(schema.resource_type(), "article");
//! assert_eq!(schema.id(&article).unwrap(), "a1");
//! assert_eq!(schema.attributes(&article, None).unwrap()["title"], "Hello");
//! assert!(schema.relationships(&article, true, &BTreeSet::new()).unwrap().is_empty());
//! ```
//!
//! # Accessor Defaults
//!
//! | Field | Declared type | Getter | Setter |
//! |-------|---------------|--------|--------|
//! | `name` | any | `getName` | `setName` |
//! | `active` | [`FieldType::Bool`] | `isActive` | `setActive` |
//! | `created_at` | any | `getCreatedAt` | `setCreatedAt` |
//!
//! Explicitly named accessors must exist on the class and be public; getters
//! take no argument and setters take one.

mod annotation;
mod class;
mod config;
mod descriptor;
mod driver;
mod error;
mod loader;
mod marker;
mod normalize;
mod registry;
mod resolver;
mod schema;
mod types;
mod validator;

pub use annotation::AnnotationDriver;
pub use class::{
    ClassBuilder, ClassInfo, FieldInfo, FieldType, FieldValue, Invoker, MethodInfo, ResourceRef,
    TypeRegistry, Visibility, GENERIC_SCHEMA,
};
pub use config::{Configuration, Source, SourceLocator};
pub use descriptor::{
    parse_descriptors, DocumentDriver, DocumentFormat, FieldDescriptor, LinkDescriptor,
    RecordDriver, ResourceDescriptor,
};
pub use driver::Driver;
pub use error::{AccessorFailure, MetadataError, ResolveError, SchemaError, Violation};
pub use loader::{is_url, load_document_auto, parse_document, read_document};
pub use marker::{FieldMarker, LinkMarker, ResourceMarker};
pub use normalize::{default_getter, default_setter, normalize, RawClassDescriptor};
pub use registry::MetadataRegistry;
pub use resolver::{resolve, EncoderContext, SchemaConstructor, SchemaFactory, SchemaResolver};
pub use schema::{
    GenericSchema, Relationship, Schema, DEFAULT_SHOW_RELATED_LINK, DEFAULT_SHOW_SELF_LINK,
};
pub use types::{
    AttributeMetadata, ClassHandle, FieldKind, FieldMetadata, IdentifierMetadata, LinkKey,
    LinkMetadata, Links, Meta, RelationshipMetadata, ResourceMetadata,
};
pub use validator::{descriptor_schema, validate_descriptor};

#[cfg(feature = "remote")]
pub use loader::fetch_document;
