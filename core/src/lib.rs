//! # Kinetic Core
//!
//! Protocol-agnostic half of Kinetic: prop descriptors, page definitions, the
//! request intent record and the prop-resolution engine. Nothing here knows
//! about HTTP; header parsing and response assembly live in `kinetic-http`.

pub mod error;
pub mod intent;
pub mod page;
pub mod prop;
pub mod resolve;
pub mod schema;
pub mod value;

pub use error::{BoxError, ResolveError, SchemaError};
pub use intent::RequestIntent;
pub use page::{OnceMetadata, ResolvedPage, ScrollMetadata};
pub use prop::{MergeDirection, MergeStrategy, Prop, PropDescriptor, PropKind, Visibility};
pub use resolve::{Decision, PropResolver, decide, resolve};
pub use schema::{PageDefinition, PageSchema};
pub use value::{BoxFuture, PropValue, RenderRequest};

pub mod prelude {
    pub use crate::error::{BoxError, ResolveError, SchemaError};
    pub use crate::intent::RequestIntent;
    pub use crate::page::ResolvedPage;
    pub use crate::prop::Prop;
    pub use crate::schema::PageDefinition;
    pub use crate::value::{PropValue, RenderRequest};
}
