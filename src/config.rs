//! Configuration recognized by the metadata engine.
//!
//! ```json
//! {
//!   "sources": [
//!     { "driver": "annotations", "classes": ["blog::Article"] },
//!     { "driver": "documents", "paths": ["resources/person.yaml"] }
//!   ],
//!   "defaultSchemaClass": "GenericSchema",
//!   "encoder": { "prettyPrint": true }
//! }
//! ```
//!
//! Keys other than `sources` and `defaultSchemaClass` are kept verbatim in
//! [`Configuration::extra`] for the encoder layer.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::annotation::AnnotationDriver;
use crate::class::GENERIC_SCHEMA;
use crate::descriptor::{DocumentDriver, DocumentFormat};
use crate::driver::Driver;
use crate::error::MetadataError;
use crate::loader::read_document;

/// Where metadata comes from, as written in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum SourceLocator {
    /// Classes registered with annotation markers. No list means every
    /// registered class carrying a resource marker.
    Annotations {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        classes: Option<Vec<String>>,
    },
    /// Descriptor documents by path or URL.
    Documents {
        paths: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<DocumentFormat>,
    },
}

impl SourceLocator {
    pub fn driver(&self) -> Arc<dyn Driver> {
        match self {
            SourceLocator::Annotations { classes: None } => Arc::new(AnnotationDriver::all()),
            SourceLocator::Annotations {
                classes: Some(classes),
            } => Arc::new(AnnotationDriver::new(classes.iter().cloned())),
            SourceLocator::Documents { paths, format } => {
                let mut driver = DocumentDriver::new(paths.iter().cloned());
                if let Some(format) = format {
                    driver = driver.format(*format);
                }
                Arc::new(driver)
            }
        }
    }
}

/// A configured source: a locator, or a driver supplied in code.
#[derive(Clone)]
pub enum Source {
    Locator(SourceLocator),
    Driver(Arc<dyn Driver>),
}

impl Source {
    pub fn driver(&self) -> Arc<dyn Driver> {
        match self {
            Source::Locator(locator) => locator.driver(),
            Source::Driver(driver) => Arc::clone(driver),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Locator(locator) => f.debug_tuple("Locator").field(locator).finish(),
            Source::Driver(driver) => f.debug_tuple("Driver").field(&driver.kind()).finish(),
        }
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SourceLocator::deserialize(deserializer).map(Source::Locator)
    }
}

impl From<SourceLocator> for Source {
    fn from(locator: SourceLocator) -> Self {
        Source::Locator(locator)
    }
}

fn default_schema_class() -> String {
    GENERIC_SCHEMA.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Schema class for resources without an override.
    #[serde(default = "default_schema_class")]
    pub default_schema_class: String,
    /// Options for other layers, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            default_schema_class: default_schema_class(),
            extra: Map::new(),
        }
    }

    pub fn with_source(mut self, locator: SourceLocator) -> Self {
        self.sources.push(Source::Locator(locator));
        self
    }

    pub fn with_driver(mut self, driver: impl Driver + 'static) -> Self {
        self.sources.push(Source::Driver(Arc::new(driver)));
        self
    }

    pub fn with_default_schema_class(mut self, class: impl Into<String>) -> Self {
        self.default_schema_class = class.into();
        self
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::FileNotFound`/`ReadError` if the file can't be
    /// read, or `MetadataError::InvalidJson` if it isn't a valid configuration.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = read_document(path)?;
        serde_json::from_str(&content).map_err(|source| MetadataError::InvalidJson {
            location: path.display().to_string(),
            source,
        })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Configuration {
    type Err = MetadataError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(content).map_err(|source| MetadataError::InvalidJson {
            location: "<configuration>".to_string(),
            source,
        })
    }
}
