//! Structured descriptors: documents on disk or over HTTP, and in-code records.
//!
//! Both drivers share one record shape, [`ResourceDescriptor`], which mirrors
//! the descriptor document format field for field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::class::TypeRegistry;
use crate::driver::Driver;
use crate::error::MetadataError;
use crate::loader::{load_document_auto, parse_document};
use crate::marker::{FieldMarker, LinkMarker, ResourceMarker};
use crate::normalize::RawClassDescriptor;
use crate::types::FieldKind;
use crate::validator::validate_descriptor;

pub use crate::loader::DocumentFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LinkDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub href: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl LinkDescriptor {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            title: None,
            href: href.into(),
            meta: Map::new(),
        }
    }

    pub fn titled(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new(href)
        }
    }
}

impl From<LinkDescriptor> for LinkMarker {
    fn from(link: LinkDescriptor) -> Self {
        LinkMarker {
            title: link.title,
            href: link.href,
            meta: link.meta.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_self: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_related: Option<bool>,
    #[serde(default)]
    pub include_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDescriptor>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            getter: None,
            setter: None,
            groups: Vec::new(),
            link_self: None,
            link_related: None,
            include_default: false,
            links: Vec::new(),
            meta: Map::new(),
        }
    }

    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Id)
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Attribute)
    }

    pub fn relationship(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Relationship)
    }

    pub fn getter(mut self, getter: impl Into<String>) -> Self {
        self.getter = Some(getter.into());
        self
    }

    pub fn setter(mut self, setter: impl Into<String>) -> Self {
        self.setter = Some(setter.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn link_self(mut self, show: bool) -> Self {
        self.link_self = Some(show);
        self
    }

    pub fn link_related(mut self, show: bool) -> Self {
        self.link_related = Some(show);
        self
    }

    pub fn include_default(mut self) -> Self {
        self.include_default = true;
        self
    }

    pub fn link(mut self, link: LinkDescriptor) -> Self {
        self.links.push(link);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

impl From<FieldDescriptor> for FieldMarker {
    fn from(field: FieldDescriptor) -> Self {
        FieldMarker {
            kind: field.kind,
            getter: field.getter,
            setter: field.setter,
            groups: field.groups,
            link_self: field.link_self,
            link_related: field.link_related,
            include_default: field.include_default,
            links: field.links.into_iter().map(LinkMarker::from).collect(),
            meta: field.meta.into_iter().collect(),
        }
    }
}

/// Declarations for one resource class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceDescriptor {
    /// Registered class name.
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_class: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schema_variants: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkDescriptor>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl ResourceDescriptor {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: None,
            schema_class: None,
            schema_variants: BTreeMap::new(),
            prefix: None,
            links: Vec::new(),
            meta: Map::new(),
            fields: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn schema_class(mut self, class: impl Into<String>) -> Self {
        self.schema_class = Some(class.into());
        self
    }

    pub fn variant(mut self, group: impl Into<String>, class: impl Into<String>) -> Self {
        self.schema_variants.insert(group.into(), class.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn link(mut self, link: LinkDescriptor) -> Self {
        self.links.push(link);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

impl From<ResourceDescriptor> for RawClassDescriptor {
    fn from(descriptor: ResourceDescriptor) -> Self {
        let resource = ResourceMarker {
            name: descriptor.name,
            schema_class: descriptor.schema_class,
            schema_variants: descriptor.schema_variants,
            prefix: descriptor.prefix,
            links: descriptor.links.into_iter().map(LinkMarker::from).collect(),
            meta: descriptor.meta.into_iter().collect(),
        };
        RawClassDescriptor {
            class: descriptor.class,
            resource,
            fields: descriptor
                .fields
                .into_iter()
                .map(|field| (field.name.clone(), FieldMarker::from(field)))
                .collect(),
        }
    }
}

/// Parse, check and deserialize the resources of one descriptor document.
///
/// # Errors
///
/// Returns a parse error for malformed content, or
/// `MetadataError::InvalidDescriptor` if the document has the wrong shape.
pub fn parse_descriptors(
    content: &str,
    format: DocumentFormat,
    location: &str,
) -> Result<Vec<ResourceDescriptor>, MetadataError> {
    let document = parse_document(content, format, location)?;
    validate_descriptor(&document, location)?;

    let descriptors = if document.is_array() {
        serde_json::from_value::<Vec<ResourceDescriptor>>(document)
    } else {
        serde_json::from_value::<ResourceDescriptor>(document).map(|one| vec![one])
    };
    descriptors.map_err(|source| MetadataError::InvalidJson {
        location: location.to_string(),
        source,
    })
}

/// Driver over descriptor documents, by file path or URL.
///
/// The format of each document follows its extension unless forced.
#[derive(Debug, Clone)]
pub struct DocumentDriver {
    locations: Vec<String>,
    format: Option<DocumentFormat>,
}

impl DocumentDriver {
    pub fn new(locations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            locations: locations.into_iter().map(Into::into).collect(),
            format: None,
        }
    }

    /// Parse every document as `format` regardless of extension.
    pub fn format(mut self, format: DocumentFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }
}

impl Driver for DocumentDriver {
    fn kind(&self) -> &'static str {
        "documents"
    }

    fn declarations(&self, _types: &TypeRegistry) -> Result<Vec<RawClassDescriptor>, MetadataError> {
        let mut declarations = Vec::new();
        for location in &self.locations {
            let content = load_document_auto(location)?;
            let format = self
                .format
                .unwrap_or_else(|| DocumentFormat::detect(location));
            let descriptors = parse_descriptors(&content, format, location)?;
            tracing::debug!(
                location = %location,
                resources = descriptors.len(),
                "descriptor document read"
            );
            declarations.extend(descriptors.into_iter().map(RawClassDescriptor::from));
        }
        Ok(declarations)
    }
}

/// Driver over descriptor records built in code.
#[derive(Debug, Clone, Default)]
pub struct RecordDriver {
    records: Vec<ResourceDescriptor>,
}

impl RecordDriver {
    pub fn new(records: impl IntoIterator<Item = ResourceDescriptor>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn with(mut self, record: ResourceDescriptor) -> Self {
        self.records.push(record);
        self
    }
}

impl Driver for RecordDriver {
    fn kind(&self) -> &'static str {
        "records"
    }

    fn declarations(&self, _types: &TypeRegistry) -> Result<Vec<RawClassDescriptor>, MetadataError> {
        Ok(self
            .records
            .iter()
            .cloned()
            .map(RawClassDescriptor::from)
            .collect())
    }
}
