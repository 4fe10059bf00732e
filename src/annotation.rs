//! Annotation driver - reads markers attached to registered classes.

use crate::class::{ClassInfo, TypeRegistry};
use crate::driver::Driver;
use crate::error::MetadataError;
use crate::normalize::RawClassDescriptor;

/// Driver over classes registered with markers via [`ClassBuilder`](crate::ClassBuilder).
#[derive(Debug, Clone, Default)]
pub struct AnnotationDriver {
    classes: Option<Vec<String>>,
}

impl AnnotationDriver {
    /// Scan only the listed classes. Classes without a resource marker are
    /// skipped.
    pub fn new(classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            classes: Some(classes.into_iter().map(Into::into).collect()),
        }
    }

    /// Scan every registered class carrying a resource marker.
    pub fn all() -> Self {
        Self { classes: None }
    }

    fn describe(class: &ClassInfo) -> Result<Option<RawClassDescriptor>, MetadataError> {
        let Some(marker) = class.resource_marker() else {
            return Ok(None);
        };

        let mut resource = marker.clone();
        resource.links.extend(class.link_markers().iter().cloned());
        resource.meta.extend(class.meta_markers().iter().cloned());

        let mut raw = RawClassDescriptor::new(class.name(), resource);
        for field in class.fields() {
            // A re-declared field shadows the inherited one.
            let shadowed = class
                .field(&field.name)
                .is_some_and(|last| !std::ptr::eq(last, field));
            if shadowed {
                continue;
            }
            match field.markers.as_slice() {
                [] => {}
                [marker] => raw.fields.push((field.name.clone(), marker.clone())),
                _ => {
                    return Err(MetadataError::ConflictingMarkers {
                        class: class.name().to_string(),
                        field: field.name.clone(),
                    })
                }
            }
        }

        Ok(Some(raw))
    }
}

impl Driver for AnnotationDriver {
    fn kind(&self) -> &'static str {
        "annotations"
    }

    fn declarations(&self, types: &TypeRegistry) -> Result<Vec<RawClassDescriptor>, MetadataError> {
        let mut declarations = Vec::new();

        match &self.classes {
            Some(names) => {
                for name in names {
                    let class = types
                        .class(name)
                        .ok_or_else(|| MetadataError::UnknownClass { class: name.clone() })?;
                    match Self::describe(class)? {
                        Some(raw) => declarations.push(raw),
                        None => tracing::debug!(class = %name, "class has no resource marker, skipping"),
                    }
                }
            }
            None => {
                for class in types.classes() {
                    if let Some(raw) = Self::describe(class)? {
                        declarations.push(raw);
                    }
                }
            }
        }

        Ok(declarations)
    }
}
