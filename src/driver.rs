//! The driver seam: one implementation per kind of metadata source.

use std::fmt;

use crate::class::TypeRegistry;
use crate::error::MetadataError;
use crate::normalize::{normalize, RawClassDescriptor};
use crate::types::ResourceMetadata;

/// Extracts raw declarations from one kind of source.
///
/// Drivers only read their source. Validation and defaulting happen in
/// [`normalize`], which every driver shares.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Short source kind, used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Raw declarations for every class this driver covers, in source order.
    fn declarations(&self, types: &TypeRegistry) -> Result<Vec<RawClassDescriptor>, MetadataError>;

    /// Extract and normalize the whole batch.
    ///
    /// # Errors
    ///
    /// The first failing declaration aborts the batch; nothing normalized
    /// before it is returned.
    fn load(&self, types: &TypeRegistry) -> Result<Vec<ResourceMetadata>, MetadataError> {
        let declarations = self.declarations(types)?;
        let resources = declarations
            .into_iter()
            .map(|raw| normalize(raw, types))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            driver = self.kind(),
            resources = resources.len(),
            "driver batch normalized"
        );
        Ok(resources)
    }
}
