use thiserror::Error;

/// Boxed error returned by prop resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid prop or page definitions, reported when the schema is built.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("a prop cannot be both optional and always included")]
    OptionalAndAlways,

    #[error("a prop cannot be both deferred and always included")]
    DeferredAndAlways,

    #[error("`{0}` only applies to merge props")]
    NotMergeable(&'static str),

    #[error("prop `{0}` is declared more than once")]
    DuplicateProp(String),
}

/// Failures while resolving the props of a single render.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resolver for prop `{prop}` failed: {source}")]
    Resolver {
        prop: String,
        #[source]
        source: BoxError,
    },

    #[error("prop `{0}` is included but no value was supplied")]
    MissingValue(String),

    #[error("shared prop `{0}` is required by the page but was not supplied")]
    MissingSharedProp(String),

    #[error("prop `{prop}` could not be serialized: {source}")]
    Serialize {
        prop: String,
        #[source]
        source: serde_json::Error,
    },
}
