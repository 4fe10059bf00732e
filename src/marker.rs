//! Declarative markers.
//!
//! Markers are the source-agnostic form of a declaration. The annotation
//! driver reads them straight off a [`ClassInfo`](crate::ClassInfo); the
//! descriptor drivers convert their records into the same markers before
//! normalization.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::FieldKind;

/// A link declaration. `href` is required; `title` becomes the link key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkMarker {
    pub title: Option<String>,
    pub href: String,
    pub meta: Vec<(String, Value)>,
}

impl LinkMarker {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    pub fn titled(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            href: href.into(),
            meta: Vec::new(),
        }
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }
}

/// Class-level declaration marking a type as a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceMarker {
    pub name: Option<String>,
    pub schema_class: Option<String>,
    pub schema_variants: BTreeMap<String, String>,
    pub prefix: Option<String>,
    pub links: Vec<LinkMarker>,
    pub meta: Vec<(String, Value)>,
}

impl ResourceMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn schema_class(mut self, class: impl Into<String>) -> Self {
        self.schema_class = Some(class.into());
        self
    }

    /// Use `class` as the schema when encoding for `group`.
    pub fn variant(mut self, group: impl Into<String>, class: impl Into<String>) -> Self {
        self.schema_variants.insert(group.into(), class.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn link(mut self, link: LinkMarker) -> Self {
        self.links.push(link);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }
}

/// Field-level declaration: identifier, attribute or relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMarker {
    pub kind: FieldKind,
    pub getter: Option<String>,
    pub setter: Option<String>,
    pub groups: Vec<String>,
    pub link_self: Option<bool>,
    pub link_related: Option<bool>,
    pub include_default: bool,
    pub links: Vec<LinkMarker>,
    pub meta: Vec<(String, Value)>,
}

impl FieldMarker {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            getter: None,
            setter: None,
            groups: Vec::new(),
            link_self: None,
            link_related: None,
            include_default: false,
            links: Vec::new(),
            meta: Vec::new(),
        }
    }

    pub fn id() -> Self {
        Self::new(FieldKind::Id)
    }

    pub fn attribute() -> Self {
        Self::new(FieldKind::Attribute)
    }

    pub fn relationship() -> Self {
        Self::new(FieldKind::Relationship)
    }

    pub fn getter(mut self, name: impl Into<String>) -> Self {
        self.getter = Some(name.into());
        self
    }

    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.setter = Some(name.into());
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

    pub fn link(mut self, link: LinkMarker) -> Self {
        self.links.push(link);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }
}
