//! Global settings for a [`Kinetic`](crate::Kinetic) instance.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use kinetic_core::BoxFuture;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid kinetic configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not read configuration file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Settings shared by every render.
///
/// Every field has a default, so an empty TOML document is a valid config:
///
/// ```toml
/// version = "2024-06-01"
/// encrypt_history = true
/// root_id = "app"
/// title = "Admin"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KineticConfig {
    /// Static asset version. Replaced by [`VersionSource::Provider`] when one is set.
    pub version: String,
    pub encrypt_history: bool,
    pub clear_history: bool,
    /// `id` of the element the client application mounts on.
    pub root_id: String,
    /// Bag that errors are staged under when no bag is named.
    pub default_error_bag: String,
    pub title: String,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            encrypt_history: false,
            clear_history: false,
            root_id: "app".to_string(),
            default_error_bag: "default".to_string(),
            title: String::new(),
        }
    }
}

impl KineticConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

type VersionProvider = Arc<dyn Fn() -> BoxFuture<'static, String> + Send + Sync>;

/// Where the current asset version comes from.
#[derive(Clone)]
pub enum VersionSource {
    Static(String),
    /// Asked on every render, e.g. to hash a manifest that may change on deploy.
    Provider(VersionProvider),
}

impl VersionSource {
    pub fn provider<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        VersionSource::Provider(Arc::new(move || Box::pin(f())))
    }

    pub async fn current(&self) -> String {
        match self {
            VersionSource::Static(version) => version.clone(),
            VersionSource::Provider(provider) => provider().await,
        }
    }
}

impl fmt::Debug for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Static(version) => f.debug_tuple("Static").field(version).finish(),
            VersionSource::Provider(_) => f.write_str("Provider(<fn>)"),
        }
    }
}

impl From<String> for VersionSource {
    fn from(version: String) -> Self {
        VersionSource::Static(version)
    }
}

impl From<&str> for VersionSource {
    fn from(version: &str) -> Self {
        VersionSource::Static(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = KineticConfig::from_toml_str("").unwrap();
        assert_eq!(config, KineticConfig::default());
        assert_eq!(config.root_id, "app");
        assert_eq!(config.default_error_bag, "default");
    }

    #[test]
    fn test_toml_overrides() {
        let config = KineticConfig::from_toml_str(
            r#"
            version = "build-42"
            encrypt_history = true
            title = "Admin"
            "#,
        )
        .unwrap();
        assert_eq!(config.version, "build-42");
        assert!(config.encrypt_history);
        assert!(!config.clear_history);
        assert_eq!(config.title, "Admin");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = KineticConfig::from_toml_str("encrypt_history = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[tokio::test]
    async fn test_version_provider_is_called_each_time() {
        use std::sync::atomic::{AtomicU32, Ordering};
        let counter = Arc::new(AtomicU32::new(0));
        let source = {
            let counter = counter.clone();
            VersionSource::provider(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { format!("v{n}") }
            })
        };

        assert_eq!(source.current().await, "v0");
        assert_eq!(source.current().await, "v1");
        assert_eq!(VersionSource::from("fixed").current().await, "fixed");
    }
}
