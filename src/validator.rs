//! Descriptor document validation against the bundled descriptor schema.

use serde_json::{json, Value};

use crate::error::{MetadataError, Violation};

/// JSON Schema every descriptor document must satisfy.
///
/// A document is either one resource object or an array of them.
pub fn descriptor_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "if": { "type": "object" },
        "then": { "$ref": "#/$defs/resource" },
        "else": {
            "type": "array",
            "items": { "$ref": "#/$defs/resource" }
        },
        "$defs": {
            "meta": { "type": "object" },
            "link": {
                "type": "object",
                "required": ["href"],
                "properties": {
                    "title": { "type": "string" },
                    "href": { "type": "string", "minLength": 1 },
                    "meta": { "$ref": "#/$defs/meta" }
                },
                "additionalProperties": false
            },
            "links": {
                "type": "array",
                "items": { "$ref": "#/$defs/link" }
            },
            "field": {
                "type": "object",
                "required": ["name", "kind"],
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "kind": { "enum": ["id", "attribute", "relationship"] },
                    "getter": { "type": "string", "minLength": 1 },
                    "setter": { "type": "string", "minLength": 1 },
                    "groups": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "linkSelf": { "type": "boolean" },
                    "linkRelated": { "type": "boolean" },
                    "includeDefault": { "type": "boolean" },
                    "links": { "$ref": "#/$defs/links" },
                    "meta": { "$ref": "#/$defs/meta" }
                },
                "additionalProperties": false
            },
            "resource": {
                "type": "object",
                "required": ["class"],
                "properties": {
                    "class": { "type": "string", "minLength": 1 },
                    "name": { "type": "string" },
                    "schemaClass": { "type": "string", "minLength": 1 },
                    "schemaVariants": {
                        "type": "object",
                        "additionalProperties": { "type": "string", "minLength": 1 }
                    },
                    "prefix": { "type": "string" },
                    "links": { "$ref": "#/$defs/links" },
                    "meta": { "$ref": "#/$defs/meta" },
                    "fields": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/field" }
                    }
                },
                "additionalProperties": false
            }
        }
    })
}

/// Validate a parsed descriptor document.
///
/// # Errors
///
/// Returns `MetadataError::InvalidDescriptor` listing every violation with
/// the JSON pointer of the offending value.
pub fn validate_descriptor(document: &Value, location: &str) -> Result<(), MetadataError> {
    let schema = descriptor_schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| {
        MetadataError::InvalidDescriptor {
            location: location.to_string(),
            violations: vec![Violation {
                path: String::new(),
                message: format!("descriptor schema failed to compile: {}", e),
            }],
        }
    })?;

    let violations: Vec<Violation> = validator
        .iter_errors(document)
        .map(|e| Violation {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(MetadataError::InvalidDescriptor {
            location: location.to_string(),
            violations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(document: Value) -> Vec<Violation> {
        match validate_descriptor(&document, "test") {
            Err(MetadataError::InvalidDescriptor { violations, .. }) => violations,
            other => panic!("expected InvalidDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn accepts_single_resource() {
        let document = json!({
            "class": "blog::Article",
            "links": [{ "href": "/articles" }],
            "meta": { "version": "1" },
            "fields": [
                { "name": "uuid", "kind": "id", "getter": "getUuid" },
                { "name": "author", "kind": "relationship", "linkSelf": false }
            ]
        });
        assert!(validate_descriptor(&document, "test").is_ok());
    }

    #[test]
    fn accepts_array_of_resources() {
        let document = json!([
            { "class": "blog::Article", "fields": [] },
            { "class": "blog::Person" }
        ]);
        assert!(validate_descriptor(&document, "test").is_ok());
    }

    #[test]
    fn missing_class_is_reported() {
        let found = violations(json!({ "fields": [] }));
        assert!(!found.is_empty());
        assert!(found.iter().all(|v| v.path.is_empty()));
    }

    #[test]
    fn unknown_kind_is_reported_with_path() {
        let found = violations(json!({
            "class": "blog::Article",
            "fields": [{ "name": "uuid", "kind": "identifier" }]
        }));
        assert!(found.iter().any(|v| v.path == "/fields/0/kind"));
    }

    #[test]
    fn link_without_href_is_reported() {
        let found = violations(json!({
            "class": "blog::Article",
            "links": [{ "title": "self" }]
        }));
        assert!(found.iter().any(|v| v.path == "/links/0"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let found = violations(json!({ "class": "blog::Article", "type": "article" }));
        assert!(!found.is_empty());
    }

    #[test]
    fn every_array_item_is_checked() {
        let found = violations(json!([
            { "class": "blog::Article" },
            { "class": "" },
            { "fields": [] }
        ]));
        assert!(found.iter().any(|v| v.path.starts_with("/1")));
        assert!(found.iter().any(|v| v.path.starts_with("/2")));
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(!violations(json!("blog::Article")).is_empty());
    }
}
