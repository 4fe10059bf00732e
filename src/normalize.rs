//! Normalization - turns raw per-class declarations into [`ResourceMetadata`].
//!
//! Every driver funnels its declarations through [`normalize`], so equivalent
//! declarations produce equal metadata regardless of where they came from.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::class::{ClassInfo, FieldType, TypeRegistry};
use crate::error::{AccessorFailure, MetadataError};
use crate::marker::{FieldMarker, LinkMarker, ResourceMarker};
use crate::types::{
    is_numeric_key, lcfirst, pascal_case, simple_name, AttributeMetadata, ClassHandle, FieldKind,
    FieldMetadata, IdentifierMetadata, LinkKey, LinkMetadata, Links, Meta, RelationshipMetadata,
    ResourceMetadata,
};

/// Declarations extracted by a driver for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassDescriptor {
    /// Registered class name.
    pub class: String,
    /// Class-level declarations, links and meta already in declaration order.
    pub resource: ResourceMarker,
    /// Field declarations in declaration order.
    pub fields: Vec<(String, FieldMarker)>,
}

impl RawClassDescriptor {
    pub fn new(class: impl Into<String>, resource: ResourceMarker) -> Self {
        Self {
            class: class.into(),
            resource,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, marker: FieldMarker) -> Self {
        self.fields.push((name.into(), marker));
        self
    }
}

/// Normalize one class's declarations into resource metadata.
///
/// # Errors
///
/// Returns `MetadataError` when the class is unknown, the identifier count is
/// not exactly one, an explicit accessor cannot be used, a link has no href,
/// a meta key is numeric, or a schema class override is not registered.
pub fn normalize(
    raw: RawClassDescriptor,
    types: &TypeRegistry,
) -> Result<ResourceMetadata, MetadataError> {
    let info = types
        .class(&raw.class)
        .ok_or_else(|| MetadataError::UnknownClass {
            class: raw.class.clone(),
        })?;
    let class = ClassHandle::new(Arc::clone(info));
    let RawClassDescriptor {
        resource, fields, ..
    } = raw;

    let name = resource
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| lcfirst(simple_name(info.name())));

    let id_fields: Vec<String> = fields
        .iter()
        .filter(|(_, marker)| marker.kind == FieldKind::Id)
        .map(|(field, _)| field.clone())
        .collect();
    if id_fields.len() != 1 {
        return Err(MetadataError::IdentifierCardinality {
            resource: name,
            class: info.name().to_string(),
            fields: id_fields,
        });
    }

    // The identifier field cannot also be an attribute or relationship.
    if let Some((field, _)) = fields
        .iter()
        .find(|(field, marker)| marker.kind != FieldKind::Id && id_fields.contains(field))
    {
        return Err(MetadataError::ConflictingMarkers {
            class: info.name().to_string(),
            field: field.clone(),
        });
    }

    let mut identifier = None;
    let mut attributes = BTreeMap::new();
    let mut relationships = BTreeMap::new();

    for (field, marker) in fields {
        let owner = format!("field '{}' of {}", field, info.name());
        // Checked for every kind, kept only where the kind carries them.
        let links = merge_links(&owner, marker.links)?;
        let meta = merge_meta(&owner, marker.meta)?;
        let getter = resolve_getter(info, &field, marker.getter.as_deref())?;
        let setter = resolve_setter(info, &field, marker.setter.as_deref())?;
        let base = FieldMetadata {
            class: class.clone(),
            name: field.clone(),
            getter,
            setter,
            groups: marker.groups.iter().cloned().collect(),
        };

        match marker.kind {
            FieldKind::Id => {
                identifier = Some(IdentifierMetadata {
                    class: base.class,
                    name: base.name,
                    getter: base.getter,
                    setter: base.setter,
                    meta,
                });
            }
            FieldKind::Attribute => {
                let redeclared = relationships.remove(&field).is_some();
                if attributes
                    .insert(field.clone(), AttributeMetadata { field: base })
                    .is_some()
                    || redeclared
                {
                    tracing::warn!(resource = %name, field = %field, "field re-declared, keeping the last declaration");
                }
            }
            FieldKind::Relationship => {
                let relationship = RelationshipMetadata {
                    field: base,
                    link_self: marker.link_self,
                    link_related: marker.link_related,
                    include_default: marker.include_default,
                    links,
                    meta,
                };
                let redeclared = attributes.remove(&field).is_some();
                if relationships.insert(field.clone(), relationship).is_some() || redeclared {
                    tracing::warn!(resource = %name, field = %field, "field re-declared, keeping the last declaration");
                }
            }
        }
    }

    let owner = format!("resource '{}'", name);
    let links = merge_links(&owner, resource.links)?;
    let meta = merge_meta(&owner, resource.meta)?;

    for schema_class in resource
        .schema_class
        .iter()
        .chain(resource.schema_variants.values())
    {
        if !types.contains(schema_class) {
            return Err(MetadataError::UnknownSchemaClass {
                resource: name,
                schema_class: schema_class.clone(),
            });
        }
    }

    let identifier = identifier.ok_or_else(|| MetadataError::IdentifierCardinality {
        resource: name.clone(),
        class: info.name().to_string(),
        fields: Vec::new(),
    })?;

    tracing::debug!(
        resource = %name,
        class = %info.name(),
        attributes = attributes.len(),
        relationships = relationships.len(),
        "normalized resource"
    );

    Ok(ResourceMetadata {
        class,
        name,
        identifier,
        attributes,
        relationships,
        links,
        meta,
        schema_class: resource.schema_class,
        schema_variants: resource.schema_variants,
        prefix: resource.prefix.filter(|p| !p.trim_matches('/').is_empty()),
    })
}

/// Getter used when none is declared: `is<Field>` for booleans, else `get<Field>`.
pub fn default_getter(class: &ClassInfo, field: &str) -> String {
    let prefix = match class.field(field).map(|f| f.ty) {
        Some(FieldType::Bool) => "is",
        _ => "get",
    };
    format!("{}{}", prefix, pascal_case(field))
}

/// Setter used when none is declared.
pub fn default_setter(field: &str) -> String {
    format!("set{}", pascal_case(field))
}

fn resolve_getter(
    class: &ClassInfo,
    field: &str,
    explicit: Option<&str>,
) -> Result<String, MetadataError> {
    match explicit {
        Some(accessor) => {
            check_accessor(class, field, accessor, 0)?;
            Ok(accessor.to_string())
        }
        None => Ok(default_getter(class, field)),
    }
}

fn resolve_setter(
    class: &ClassInfo,
    field: &str,
    explicit: Option<&str>,
) -> Result<String, MetadataError> {
    match explicit {
        Some(accessor) => {
            check_accessor(class, field, accessor, 1)?;
            Ok(accessor.to_string())
        }
        None => Ok(default_setter(field)),
    }
}

fn check_accessor(
    class: &ClassInfo,
    field: &str,
    accessor: &str,
    arity: usize,
) -> Result<(), MetadataError> {
    let failure = match class.method(accessor) {
        None => Some(AccessorFailure::Missing),
        Some(method) if !method.is_public() => Some(AccessorFailure::NotPublic),
        Some(method) if method.arity != arity => Some(AccessorFailure::WrongArity {
            expected: arity,
            actual: method.arity,
        }),
        Some(_) => None,
    };

    match failure {
        None => Ok(()),
        Some(reason) => Err(MetadataError::AccessorResolution {
            class: class.name().to_string(),
            field: field.to_string(),
            accessor: accessor.to_string(),
            reason,
        }),
    }
}

/// Key links by title, or by position among the untitled ones.
fn merge_links(owner: &str, declared: Vec<LinkMarker>) -> Result<Links, MetadataError> {
    let mut links = Links::new();
    let mut position = 0;

    for link in declared {
        let key = match &link.title {
            Some(title) => LinkKey::Title(title.clone()),
            None => {
                position += 1;
                LinkKey::Position(position - 1)
            }
        };
        if link.href.trim().is_empty() {
            return Err(MetadataError::Descriptor {
                owner: owner.to_string(),
                message: format!("link '{}' has no href", key),
            });
        }
        let meta = merge_meta(&format!("link '{}' of {}", key, owner), link.meta)?;
        links.insert(
            key,
            LinkMetadata {
                href: link.href,
                title: link.title,
                meta,
            },
        );
    }

    Ok(links)
}

fn merge_meta(owner: &str, declared: Vec<(String, Value)>) -> Result<Meta, MetadataError> {
    let mut meta = Meta::new();
    for (key, value) in declared {
        if is_numeric_key(&key) {
            return Err(MetadataError::InvalidMetaKey {
                owner: owner.to_string(),
                key,
            });
        }
        meta.insert(key, value);
    }
    Ok(meta)
}
