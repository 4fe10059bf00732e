//! The canonical metadata graph produced by normalization.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::class::ClassInfo;

/// String-keyed meta map; key order follows declaration order.
pub type Meta = Map<String, Value>;

/// Links keyed by title or declaration position.
pub type Links = BTreeMap<LinkKey, LinkMetadata>;

/// Classification of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Id,
    Attribute,
    Relationship,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Id => "id",
            FieldKind::Attribute => "attribute",
            FieldKind::Relationship => "relationship",
        })
    }
}

/// Opaque handle on the domain class owning a piece of metadata.
///
/// Two handles are equal when they point at the same Rust type.
#[derive(Clone)]
pub struct ClassHandle(Arc<ClassInfo>);

impl ClassHandle {
    pub(crate) fn new(info: Arc<ClassInfo>) -> Self {
        Self(info)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn type_id(&self) -> TypeId {
        self.0.type_id()
    }

    pub fn info(&self) -> &ClassInfo {
        &self.0
    }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id() && self.name() == other.name()
    }
}

impl Eq for ClassHandle {}

impl fmt::Debug for ClassHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassHandle").field(&self.name()).finish()
    }
}

impl Serialize for ClassHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Key of a link: its explicit title, or its position among untitled links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKey {
    Position(usize),
    Title(String),
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKey::Position(i) => write!(f, "{i}"),
            LinkKey::Title(t) => f.write_str(t),
        }
    }
}

impl Serialize for LinkKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkMetadata {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierMetadata {
    pub class: ClassHandle,
    pub name: String,
    pub getter: String,
    pub setter: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

/// Shape shared by attributes and relationships.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetadata {
    pub class: ClassHandle,
    pub name: String,
    pub getter: String,
    pub setter: String,
    /// Empty means visible in every group.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub groups: BTreeSet<String>,
}

impl FieldMetadata {
    /// Whether the field is rendered for the given encoding group.
    ///
    /// Without an active group every field is visible.
    pub fn is_visible(&self, group: Option<&str>) -> bool {
        match group {
            None => true,
            Some(group) => self.groups.is_empty() || self.groups.contains(group),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeMetadata {
    #[serde(flatten)]
    pub field: FieldMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetadata {
    #[serde(flatten)]
    pub field: FieldMetadata,
    /// `None` inherits the schema default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_related: Option<bool>,
    pub include_default: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub links: Links,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

/// Everything needed to render one domain class as a wire resource.
///
/// Built once per class during the startup scan and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub class: ClassHandle,
    pub name: String,
    pub identifier: IdentifierMetadata,
    pub attributes: BTreeMap<String, AttributeMetadata>,
    pub relationships: BTreeMap<String, RelationshipMetadata>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub links: Links,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_class: Option<String>,
    /// Schema class per encoding group.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub schema_variants: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl ResourceMetadata {
    /// Schema class to use for `group`, before falling back to the configured default.
    pub fn schema_class_for(&self, group: Option<&str>) -> Option<&str> {
        group
            .and_then(|g| self.schema_variants.get(g))
            .or(self.schema_class.as_ref())
            .map(String::as_str)
    }

    /// Relationship names included when the client requests none.
    pub fn default_include_paths(&self, group: Option<&str>) -> Vec<String> {
        self.relationships
            .values()
            .filter(|r| r.include_default && r.field.is_visible(group))
            .map(|r| r.field.name.clone())
            .collect()
    }
}

/// Upper-case the first character.
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `created_at` → `CreatedAt`, `firstName` → `FirstName`.
pub fn pascal_case(field: &str) -> String {
    field
        .split(|c: char| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(ucfirst)
        .collect()
}

/// Lower-case the first character.
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Last path segment of a class name (`blog::Article` → `Article`).
pub fn simple_name(class: &str) -> &str {
    class
        .rsplit(|c: char| c == ':' || c == '\\' || c == '.')
        .next()
        .unwrap_or(class)
}

/// Whether a meta key would read as an integer index.
pub fn is_numeric_key(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_helpers() {
        assert_eq!(ucfirst("name"), "Name");
        assert_eq!(ucfirst(""), "");
        assert_eq!(lcfirst("Article"), "article");
        assert_eq!(lcfirst("URLShortener"), "uRLShortener");
        assert_eq!(pascal_case("created_at"), "CreatedAt");
        assert_eq!(pascal_case("firstName"), "FirstName");
        assert_eq!(pascal_case("uuid"), "Uuid");
    }

    #[test]
    fn simple_name_strips_paths() {
        assert_eq!(simple_name("blog::model::Article"), "Article");
        assert_eq!(simple_name("App\\Entity\\Article"), "Article");
        assert_eq!(simple_name("com.example.Article"), "Article");
        assert_eq!(simple_name("Article"), "Article");
    }

    #[test]
    fn numeric_keys() {
        assert!(is_numeric_key("0"));
        assert!(is_numeric_key("12"));
        assert!(is_numeric_key("-3"));
        assert!(!is_numeric_key("1.5"));
        assert!(!is_numeric_key("nan"));
        assert!(!is_numeric_key("version"));
        assert!(!is_numeric_key("v1"));
        assert!(!is_numeric_key(""));
    }

    #[test]
    fn link_keys_order_positions_first() {
        let mut keys = vec![
            LinkKey::Title("docs".into()),
            LinkKey::Position(1),
            LinkKey::Position(0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                LinkKey::Position(0),
                LinkKey::Position(1),
                LinkKey::Title("docs".into())
            ]
        );
    }
}
