//! Kinetic facade crate.
//!
//! Re-exports the resolution engine and the HTTP adapter behind a single
//! entry point. `Kinetic` renders pages; it does not route requests.

pub use kinetic_core as core;
#[cfg(feature = "http")]
pub use kinetic_http as http;

pub use kinetic_core::{PageDefinition, Prop, PropValue, RenderRequest, ResolvedPage};
#[cfg(feature = "http")]
pub use kinetic_http::{Kinetic, KineticConfig, KineticService, serve};

pub mod prelude {
    pub use kinetic_core::prelude::*;
    #[cfg(feature = "http")]
    pub use kinetic_http::prelude::*;
}
