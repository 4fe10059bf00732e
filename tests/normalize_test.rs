//! Integration tests for metadata normalization across drivers.

use std::io::Write;
use std::sync::Arc;

use jsonapi_metadata::{
    AnnotationDriver, ClassBuilder, ClassInfo, Configuration, DocumentDriver, Driver,
    FieldDescriptor, FieldMarker, FieldType, FieldValue, LinkDescriptor, LinkKey,
    LinkMarker, MetadataError, MetadataRegistry, RecordDriver, ResourceDescriptor,
    ResourceMarker, ResourceMetadata, SourceLocator, TypeRegistry,
};
use tempfile::{Builder, NamedTempFile};

struct Person {
    id: u64,
}

struct Article {
    uuid: String,
    title: String,
    published: bool,
    author: Arc<Person>,
}

fn article_class() -> ClassInfo {
    ClassBuilder::<Article>::new("blog::Article")
        .resource(
            ResourceMarker::new()
                .link(LinkMarker::titled("self", "/articles/{id}"))
                .link(LinkMarker::new("/feed"))
                .meta("version", "1"),
        )
        .field("uuid", FieldType::String, [FieldMarker::id().getter("getUuid")])
        .field(
            "title",
            FieldType::String,
            [FieldMarker::attribute().group("public")],
        )
        .field("published", FieldType::Bool, [FieldMarker::attribute()])
        .field(
            "author",
            FieldType::Object,
            [FieldMarker::relationship()
                .link_self(false)
                .meta("cardinality", "one")],
        )
        .getter("getUuid", |a| a.uuid.clone().into())
        .getter("getTitle", |a| a.title.clone().into())
        .getter("isPublished", |a| a.published.into())
        .getter("getAuthor", |a| FieldValue::resource(Arc::clone(&a.author)))
        .setter("setTitle")
        .build()
}

fn person_class() -> ClassInfo {
    ClassBuilder::<Person>::new("blog::Person")
        .field("id", FieldType::Int, [])
        .getter("getId", |p| p.id.into())
        .build()
}

fn types() -> TypeRegistry {
    TypeRegistry::new()
        .with_class(article_class())
        .with_class(person_class())
}

const ARTICLE_JSON: &str = r#"{
    "class": "blog::Article",
    "links": [
        { "title": "self", "href": "/articles/{id}" },
        { "href": "/feed" }
    ],
    "meta": { "version": "1" },
    "fields": [
        { "name": "uuid", "kind": "id", "getter": "getUuid" },
        { "name": "title", "kind": "attribute", "groups": ["public"] },
        { "name": "published", "kind": "attribute" },
        { "name": "author", "kind": "relationship", "linkSelf": false,
          "meta": { "cardinality": "one" } }
    ]
}"#;

const ARTICLE_YAML: &str = "\
class: blog::Article
links:
  - title: self
    href: /articles/{id}
  - href: /feed
meta:
  version: '1'
fields:
  - name: uuid
    kind: id
    getter: getUuid
  - name: title
    kind: attribute
    groups: [public]
  - name: published
    kind: attribute
  - name: author
    kind: relationship
    linkSelf: false
    meta:
      cardinality: one
";

fn article_record() -> ResourceDescriptor {
    ResourceDescriptor::new("blog::Article")
        .link(LinkDescriptor::titled("self", "/articles/{id}"))
        .link(LinkDescriptor::new("/feed"))
        .meta("version", "1")
        .field(FieldDescriptor::id("uuid").getter("getUuid"))
        .field(FieldDescriptor::attribute("title").group("public"))
        .field(FieldDescriptor::attribute("published"))
        .field(
            FieldDescriptor::relationship("author")
                .link_self(false)
                .meta("cardinality", "one"),
        )
}

fn document(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn load_one(driver: &dyn Driver, types: &TypeRegistry) -> ResourceMetadata {
    let mut loaded = driver.load(types).unwrap();
    assert_eq!(loaded.len(), 1, "{} driver", driver.kind());
    loaded.remove(0)
}

// === Cross-driver equivalence ===

mod equivalence {
    use super::*;

    #[test]
    fn every_driver_yields_the_same_metadata() {
        let types = types();
        let json = document(".json", ARTICLE_JSON);
        let yaml = document(".yaml", ARTICLE_YAML);

        let annotated = load_one(&AnnotationDriver::new(["blog::Article"]), &types);
        let from_json = load_one(
            &DocumentDriver::new([json.path().display().to_string()]),
            &types,
        );
        let from_yaml = load_one(
            &DocumentDriver::new([yaml.path().display().to_string()]),
            &types,
        );
        let from_records = load_one(&RecordDriver::new([article_record()]), &types);

        assert_eq!(annotated, from_json);
        assert_eq!(annotated, from_yaml);
        assert_eq!(annotated, from_records);
    }

    #[test]
    fn serialized_forms_match() {
        let types = types();
        let annotated = load_one(&AnnotationDriver::all(), &types);
        let from_records = load_one(&RecordDriver::new([article_record()]), &types);
        assert_eq!(
            serde_json::to_value(&annotated).unwrap(),
            serde_json::to_value(&from_records).unwrap()
        );
    }
}

// === Article scenario ===

mod article {
    use super::*;

    #[test]
    fn normalized_shape() {
        let metadata = load_one(&AnnotationDriver::all(), &types());

        assert_eq!(metadata.name, "article");
        assert_eq!(metadata.identifier.name, "uuid");
        assert_eq!(metadata.identifier.getter, "getUuid");
        assert_eq!(metadata.identifier.setter, "setUuid");

        assert_eq!(
            metadata.attributes.keys().collect::<Vec<_>>(),
            ["published", "title"]
        );
        assert_eq!(metadata.attributes["title"].field.getter, "getTitle");
        assert_eq!(metadata.attributes["title"].field.setter, "setTitle");
        assert_eq!(metadata.attributes["published"].field.getter, "isPublished");

        let author = &metadata.relationships["author"];
        assert_eq!(author.field.getter, "getAuthor");
        assert_eq!(author.link_self, Some(false));
        assert_eq!(author.link_related, None);
        assert_eq!(author.meta["cardinality"], "one");

        assert_eq!(metadata.links.len(), 2);
        assert_eq!(
            metadata.links[&LinkKey::Title("self".into())].href,
            "/articles/{id}"
        );
        assert_eq!(metadata.links[&LinkKey::Position(0)].href, "/feed");
        assert_eq!(metadata.meta["version"], "1");
        assert!(metadata.default_include_paths(None).is_empty());
    }

    #[test]
    fn registry_from_configuration() {
        let json = document(".json", ARTICLE_JSON);
        let config: Configuration = format!(
            r#"{{ "sources": [{{ "driver": "documents", "paths": [{}] }}] }}"#,
            serde_json::to_string(&json.path().display().to_string()).unwrap()
        )
        .parse()
        .unwrap();

        let registry = MetadataRegistry::build(&config, &types()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.for_type(std::any::TypeId::of::<Article>()).unwrap().name,
            "article"
        );
    }
}

// === Validation failures ===

mod failures {
    use super::*;

    #[test]
    fn missing_identifier() {
        let record = ResourceDescriptor::new("blog::Person").field(FieldDescriptor::attribute("id"));
        match RecordDriver::new([record]).load(&types()) {
            Err(MetadataError::IdentifierCardinality {
                resource, fields, ..
            }) => {
                assert_eq!(resource, "person");
                assert!(fields.is_empty());
            }
            other => panic!("expected IdentifierCardinality, got {:?}", other),
        }
    }

    #[test]
    fn two_identifiers() {
        let yaml = document(
            ".yaml",
            "class: blog::Article\nname: post\nfields:\n  - {name: uuid, kind: id}\n  - {name: title, kind: id}\n",
        );
        let result = DocumentDriver::new([yaml.path().display().to_string()]).load(&types());
        match result {
            Err(err @ MetadataError::IdentifierCardinality { .. }) => {
                let message = err.to_string();
                assert!(message.contains("'post'"), "{}", message);
                assert!(message.contains("uuid, title"), "{}", message);
            }
            other => panic!("expected IdentifierCardinality, got {:?}", other),
        }
    }

    #[test]
    fn explicit_getter_must_exist() {
        let record = ResourceDescriptor::new("blog::Person")
            .field(FieldDescriptor::id("id").getter("fetchId"));
        assert!(matches!(
            RecordDriver::new([record]).load(&types()),
            Err(MetadataError::AccessorResolution { accessor, .. }) if accessor == "fetchId"
        ));
    }

    #[test]
    fn explicit_setter_must_take_one_argument() {
        let record = ResourceDescriptor::new("blog::Person")
            .field(FieldDescriptor::id("id").setter("getId"));
        assert!(matches!(
            RecordDriver::new([record]).load(&types()),
            Err(MetadataError::AccessorResolution { .. })
        ));
    }

    #[test]
    fn numeric_meta_key() {
        let json = document(
            ".json",
            r#"{ "class": "blog::Person", "meta": { "0": "zero" }, "fields": [{ "name": "id", "kind": "id" }] }"#,
        );
        assert!(matches!(
            DocumentDriver::new([json.path().display().to_string()]).load(&types()),
            Err(MetadataError::InvalidMetaKey { key, .. }) if key == "0"
        ));
    }

    #[test]
    fn identifier_redeclared_as_attribute_in_record() {
        let record = ResourceDescriptor::new("blog::Person")
            .field(FieldDescriptor::id("id"))
            .field(FieldDescriptor::attribute("id"));
        assert!(matches!(
            RecordDriver::new([record]).load(&types()),
            Err(MetadataError::ConflictingMarkers { field, .. }) if field == "id"
        ));
    }

    #[test]
    fn identifier_redeclared_as_relationship_in_document() {
        let json = document(
            ".json",
            r#"{ "class": "blog::Person", "fields": [
                { "name": "id", "kind": "id" },
                { "name": "id", "kind": "relationship" }
            ] }"#,
        );
        assert!(matches!(
            DocumentDriver::new([json.path().display().to_string()]).load(&types()),
            Err(MetadataError::ConflictingMarkers { field, .. }) if field == "id"
        ));
    }

    #[test]
    fn numeric_meta_key_on_attribute() {
        let record = ResourceDescriptor::new("blog::Article")
            .field(FieldDescriptor::id("uuid"))
            .field(FieldDescriptor::attribute("title").meta("0", "zero"));
        assert!(matches!(
            RecordDriver::new([record]).load(&types()),
            Err(MetadataError::InvalidMetaKey { key, .. }) if key == "0"
        ));
    }

    #[test]
    fn unknown_schema_class() {
        let record = ResourceDescriptor::new("blog::Person")
            .schema_class("PersonSchema")
            .field(FieldDescriptor::id("id"));
        assert!(matches!(
            RecordDriver::new([record]).load(&types()),
            Err(MetadataError::UnknownSchemaClass { schema_class, .. }) if schema_class == "PersonSchema"
        ));
    }

    #[test]
    fn malformed_document() {
        let json = document(".json", r#"{ "class": "blog::Person", "fields": [{ "kind": "id" }] }"#);
        match DocumentDriver::new([json.path().display().to_string()]).load(&types()) {
            Err(MetadataError::InvalidDescriptor { violations, .. }) => {
                assert!(violations.iter().any(|v| v.path == "/fields/0"));
            }
            other => panic!("expected InvalidDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let good = document(".json", ARTICLE_JSON);
        let bad = document(".json", r#"{ "class": "blog::Person" }"#);
        let config = Configuration::new().with_source(SourceLocator::Documents {
                paths: vec![
                    good.path().display().to_string(),
                    bad.path().display().to_string(),
                ],
                format: None,
            });

        assert!(matches!(
            MetadataRegistry::build(&config, &types()),
            Err(MetadataError::IdentifierCardinality { .. })
        ));

        let mut registry = MetadataRegistry::new();
        let driver = DocumentDriver::new([
            good.path().display().to_string(),
            bad.path().display().to_string(),
        ]);
        assert!(registry.extend_with(&driver, &types()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn redeclared_field_keeps_last_kind() {
        let record = ResourceDescriptor::new("blog::Article")
            .field(FieldDescriptor::id("uuid"))
            .field(FieldDescriptor::attribute("author"))
            .field(FieldDescriptor::relationship("author"));
        let metadata = load_one(&RecordDriver::new([record]), &types());
        assert!(!metadata.attributes.contains_key("author"));
        assert_eq!(metadata.relationships["author"].field.getter, "getAuthor");
    }
}
