pub mod content;

pub use content::ContentResolver;

use crate::error::ForwardError;
use log::{debug, error};
use std::io::Read;

/// Fallback display name pattern, used when the reference has no metadata.
pub const FALLBACK_NAME_FORMAT: &str = "%Y%m%d_%H%M%S";

pub type ResourceStream = Box<dyn Read + Send>;

/// Host access to opaque resource references.
pub trait ResourceResolver: Send + Sync {
    /// Open the referenced resource for reading.
    fn open(&self, reference: &str) -> std::io::Result<ResourceStream>;

    /// Canonical display name, if the reference supports metadata queries.
    fn display_name(&self, reference: &str) -> Option<String>;
}

pub struct ResolvedResource {
    pub stream: ResourceStream,
    pub display_name: String,
}

/// Open `reference` and work out the name it should be staged under.
pub fn resolve(
    resolver: &dyn ResourceResolver,
    reference: &str,
) -> Result<ResolvedResource, ForwardError> {
    let stream = resolver.open(reference).map_err(|e| {
        error!("Cannot open {}: {}", reference, e);
        ForwardError::ResourceNotFound(reference.to_string())
    })?;
    let display_name = resolver
        .display_name(reference)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(fallback_name);
    debug!("Resolved {} as {}", reference, display_name);
    Ok(ResolvedResource {
        stream,
        display_name,
    })
}

fn fallback_name() -> String {
    chrono::Local::now().format(FALLBACK_NAME_FORMAT).to_string()
}
