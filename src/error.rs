//! Error types for metadata normalization, schema resolution and schema reads.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning descriptor sources into metadata.
///
/// Any of these aborts the whole driver invocation that produced it.
#[derive(Debug, Error)]
pub enum MetadataError {
    // IO errors
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors
    #[error("invalid JSON in {location}: {source}")]
    InvalidJson {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {location}: {source}")]
    InvalidYaml {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid descriptor {location}: {} violation(s)", violations.len())]
    InvalidDescriptor {
        location: String,
        violations: Vec<Violation>,
    },

    // Declaration errors
    #[error("malformed descriptor for {owner}: {message}")]
    Descriptor { owner: String, message: String },

    #[error("unknown class '{class}'")]
    UnknownClass { class: String },

    #[error(
        "resource '{resource}' ({class}) must declare exactly one identifier, found {}{}",
        fields.len(),
        format_field_list(fields)
    )]
    IdentifierCardinality {
        resource: String,
        class: String,
        fields: Vec<String>,
    },

    #[error("cannot use {accessor}() for field '{field}' of {class}: {reason}")]
    AccessorResolution {
        class: String,
        field: String,
        accessor: String,
        reason: AccessorFailure,
    },

    #[error("field '{field}' of {class} carries more than one of id/attribute/relationship")]
    ConflictingMarkers { class: String, field: String },

    #[error("meta of {owner} has invalid key {key}: keys must be non-numeric strings")]
    InvalidMetaKey { owner: String, key: String },

    #[error("resource '{resource}' references unknown schema class '{schema_class}'")]
    UnknownSchemaClass {
        resource: String,
        schema_class: String,
    },

    #[error("resource name '{name}' is declared by both {first} and {second}")]
    DuplicateResource {
        name: String,
        first: String,
        second: String,
    },
}

/// Why an explicitly named accessor was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorFailure {
    Missing,
    NotPublic,
    WrongArity { expected: usize, actual: usize },
}

impl fmt::Display for AccessorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorFailure::Missing => write!(f, "no such method"),
            AccessorFailure::NotPublic => write!(f, "method is not public"),
            AccessorFailure::WrongArity { expected, actual } => {
                write!(f, "method takes {actual} argument(s), expected {expected}")
            }
        }
    }
}

/// Single descriptor schema violation with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Violation {
    /// JSON Pointer (RFC 6901) to the offending value.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors raised while binding metadata to a schema adapter.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no resource named '{name}' is registered")]
    UnknownResource { name: String },

    #[error("no resource is registered for type {type_name}")]
    UnknownResourceType { type_name: String },

    #[error("schema class '{schema_class}' of resource '{resource}' is not a registered schema")]
    SchemaConformance {
        resource: String,
        schema_class: String,
    },
}

/// Errors raised while a schema reads a live resource.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("resource '{resource}' expects an instance of {expected}")]
    TypeMismatch { resource: String, expected: String },

    #[error("{class} has no invocable accessor {accessor}()")]
    MissingAccessor { class: String, accessor: String },

    #[error("identifier of resource '{resource}' is not a string or number: {actual}")]
    InvalidIdentifier { resource: String, actual: String },

    #[error("attribute '{attribute}' of resource '{resource}' is not a JSON value")]
    UnsupportedAttributeValue { resource: String, attribute: String },

    #[error(
        "resource '{resource}' has no relationship(s) named {}",
        names.join(", ")
    )]
    UnknownRelationshipRequest {
        resource: String,
        names: Vec<String>,
    },
}

fn format_field_list(fields: &[String]) -> String {
    if fields.is_empty() {
        String::new()
    } else {
        format!(" ({})", fields.join(", "))
    }
}
