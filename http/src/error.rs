use kinetic_core::{BoxError, ResolveError};
use thiserror::Error;

use crate::flash::FlashError;

/// Everything that can stop a page from being rendered.
///
/// Version conflicts and external redirects are responses, not errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Flash(#[from] FlashError),

    #[error("root view failed to render: {0}")]
    View(#[source] BoxError),

    #[error("page could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("response could not be built: {0}")]
    Http(#[from] http::Error),
}
