//! Descriptor document loading from various sources.
//!
//! Handles reading documents from files and HTTP URLs, and parsing JSON or
//! YAML content into a JSON value.

use std::path::Path;

use serde_json::Value;

use crate::error::MetadataError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Guess the format from a path or URL extension. Defaults to JSON.
    pub fn detect(location: &str) -> Self {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Json
        }
    }
}

/// Read a document from a file path.
///
/// # Errors
///
/// Returns `MetadataError::FileNotFound` if the file doesn't exist,
/// or `MetadataError::ReadError` if it can't be read.
pub fn read_document(path: &Path) -> Result<String, MetadataError> {
    if !path.exists() {
        return Err(MetadataError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| MetadataError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetch a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `MetadataError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn fetch_document(url: &str) -> Result<String, MetadataError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|source| MetadataError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    let response = client
        .get(url)
        .send()
        .map_err(|source| MetadataError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    // Check for HTTP errors before reading the body
    let response = response
        .error_for_status()
        .map_err(|source| MetadataError::NetworkError {
            url: url.to_string(),
            source,
        })?;

    response.text().map_err(|source| MetadataError::NetworkError {
        url: url.to_string(),
        source,
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Read a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(location: &str) -> Result<String, MetadataError> {
    if is_url(location) {
        #[cfg(feature = "remote")]
        {
            fetch_document(location)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(MetadataError::FileNotFound {
                path: std::path::PathBuf::from(location),
            })
        }
    } else {
        read_document(Path::new(location))
    }
}

/// Parse document content into a JSON value.
///
/// YAML meta maps must have string keys; other non-string keys are a YAML
/// error since descriptors are JSON-shaped.
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    location: &str,
) -> Result<Value, MetadataError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|source| MetadataError::InvalidJson {
                location: location.to_string(),
                source,
            })
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|source| MetadataError::InvalidYaml {
                    location: location.to_string(),
                    source,
                })?;
            check_yaml_meta_keys(&yaml, location, "")?;
            serde_yaml::from_value(yaml).map_err(|source| MetadataError::InvalidYaml {
                location: location.to_string(),
                source,
            })
        }
    }
}

fn check_yaml_meta_keys(
    value: &serde_yaml::Value,
    location: &str,
    path: &str,
) -> Result<(), MetadataError> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                let key_str = yaml_key_display(key);
                let child_path = format!("{}/{}", path, key_str);
                if key.as_str() == Some("meta") {
                    if let serde_yaml::Value::Mapping(meta) = child {
                        if let Some(bad) = meta.keys().find(|k| !k.is_string()) {
                            return Err(MetadataError::InvalidMetaKey {
                                owner: format!("{}#{}", location, child_path),
                                key: yaml_key_display(bad),
                            });
                        }
                    }
                }
                check_yaml_meta_keys(child, location, &child_path)?;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                check_yaml_meta_keys(item, location, &format!("{}/{}", path, i))?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn yaml_key_display(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn read_document_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"class": "Article"}}"#).unwrap();

        let content = read_document(file.path()).unwrap();
        assert!(content.contains("Article"));
    }

    #[test]
    fn read_document_file_not_found() {
        let result = read_document(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(MetadataError::FileNotFound { .. })));
    }

    #[test]
    fn parse_invalid_json() {
        let result = parse_document("not valid json", DocumentFormat::Json, "inline");
        assert!(matches!(result, Err(MetadataError::InvalidJson { location, .. }) if location == "inline"));
    }

    #[test]
    fn parse_yaml_into_json_value() {
        let value = parse_document(
            "class: Article\nfields:\n  - name: uuid\n    kind: id\n",
            DocumentFormat::Yaml,
            "article.yaml",
        )
        .unwrap();
        assert_eq!(value["class"], "Article");
        assert_eq!(value["fields"][0]["kind"], "id");
    }

    #[test]
    fn parse_invalid_yaml() {
        let result = parse_document("class: [unclosed", DocumentFormat::Yaml, "bad.yaml");
        assert!(matches!(result, Err(MetadataError::InvalidYaml { .. })));
    }

    #[test]
    fn yaml_meta_requires_string_keys() {
        let content = "class: Article\nfields:\n  - name: uuid\n    kind: id\n    meta:\n      1: one\n";
        match parse_document(content, DocumentFormat::Yaml, "article.yaml") {
            Err(MetadataError::InvalidMetaKey { owner, key }) => {
                assert_eq!(key, "1");
                assert_eq!(owner, "article.yaml#/fields/0/meta");
            }
            other => panic!("expected InvalidMetaKey, got {:?}", other),
        }
    }

    #[test]
    fn detect_format() {
        assert_eq!(DocumentFormat::detect("a/b.yaml"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::detect("a/b.YML"), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::detect("a/b.json"), DocumentFormat::Json);
        assert_eq!(
            DocumentFormat::detect("https://example.com/r.yml?v=2"),
            DocumentFormat::Yaml
        );
        assert_eq!(DocumentFormat::detect("resources"), DocumentFormat::Json);
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/article.json"));
    }

    #[test]
    fn is_url_http() {
        assert!(is_url("http://example.com/article.json"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/article.json"));
        assert!(!is_url("./article.json"));
        assert!(!is_url("article.json"));
    }

    #[test]
    fn load_document_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "class: Article").unwrap();

        let content = load_document_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(content.trim(), "class: Article");
    }

    // Remote tests run against a local mock server
    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn fetch_document_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/article.json")
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(r#"{"class": "Article"}"#)
                .create();

            let url = format!("{}/article.json", server.url());
            let content = load_document_auto(&url).unwrap();
            assert!(content.contains("Article"));
            mock.assert();
        }

        #[test]
        fn fetch_document_404() {
            let mut server = mockito::Server::new();
            let _mock = server.mock("GET", "/missing.json").with_status(404).create();

            let url = format!("{}/missing.json", server.url());
            let result = fetch_document(&url);
            assert!(matches!(result, Err(MetadataError::NetworkError { .. })));
        }
    }
}
