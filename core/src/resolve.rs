//! # Resolve: the prop-resolution pass
//!
//! One pass per request. For every declared prop the resolver decides whether
//! it is sent, deferred or skipped, evaluates only the included ones (all
//! resolvers concurrently) and fills the reconciliation metadata the client
//! needs.
//!
//! Precedence, highest first:
//!
//! 1. once props the client already holds (`except_once_props`) are skipped
//! 2. `always` props are included
//! 3. names in a matching partial reload's except list are excluded
//! 4. a matching partial reload's only list includes exactly what it names
//! 5. optional and deferred props are excluded
//! 6. everything else is included
//!
//! Deferred props excluded by rules 3–5 are listed under their group.

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ResolveError;
use crate::intent::RequestIntent;
use crate::page::{OnceMetadata, ResolvedPage, ScrollMetadata};
use crate::prop::{MergeDirection, MergeStrategy, PropDescriptor};
use crate::schema::{PageDefinition, PageSchema};
use crate::value::{PropValue, RenderRequest};

/// Where a single prop ends up for this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    Include,
    Exclude,
    Defer(&'a str),
    /// A once prop the client reported as already cached.
    Cached,
}

/// Decides the fate of one prop. Pure; never touches values.
pub fn decide<'a>(name: &str, descriptor: &'a PropDescriptor, intent: &RequestIntent, partial: bool) -> Decision<'a> {
    if descriptor.is_once() && intent.has_once(name) {
        return Decision::Cached;
    }
    if descriptor.is_always() {
        return Decision::Include;
    }

    let excluded = if partial && intent.excludes(name) {
        true
    } else if partial && !intent.partial_include.is_empty() {
        !intent.includes(name)
    } else {
        descriptor.is_optional() || descriptor.is_deferred()
    };

    match (excluded, descriptor.deferred_group()) {
        (false, _) => Decision::Include,
        (true, Some(group)) => Decision::Defer(group),
        (true, None) => Decision::Exclude,
    }
}

/// Resolves the props of one page definition.
///
/// # Example
///
/// ```rust,ignore
/// let page = PropResolver::new(&dashboard)
///     .with_shared(&shared)
///     .resolve(&intent, request, "v1")
///     .await?;
/// ```
pub struct PropResolver<'a> {
    definition: &'a PageDefinition,
    shared: Option<&'a PageSchema>,
}

impl<'a> PropResolver<'a> {
    pub fn new(definition: &'a PageDefinition) -> Self {
        Self {
            definition,
            shared: None,
        }
    }

    /// Props declared once for every page, e.g. the authenticated user.
    ///
    /// A page schema entry with the same name takes precedence.
    pub fn with_shared(mut self, shared: &'a PageSchema) -> Self {
        self.shared = Some(shared);
        self
    }

    pub async fn resolve(
        &self,
        intent: &RequestIntent,
        mut request: RenderRequest,
        version: &str,
    ) -> Result<ResolvedPage, ResolveError> {
        let component = self.definition.component();
        let partial = intent.is_partial_for(component);
        debug!(
            component,
            partial,
            prefetch = intent.is_prefetch,
            "Resolving page props"
        );

        for key in self.definition.required_shared() {
            if !request.contains(key) {
                return Err(ResolveError::MissingSharedProp(key.clone()));
            }
        }

        let url = request.url.take().unwrap_or_else(|| "/".to_string());
        let mut page = ResolvedPage::new(component, url, version);
        page.encrypt_history = request.encrypt_history;
        page.clear_history = request.clear_history;

        let plain = PropDescriptor::plain();
        let schema = self.definition.schema();
        let shared = self
            .shared
            .into_iter()
            .flat_map(|shared| shared.iter())
            .filter(|(name, _)| !schema.contains(name));
        let mut declared: Vec<(String, &PropDescriptor)> = shared
            .chain(schema.iter())
            .map(|(name, descriptor)| (name.to_string(), descriptor))
            .collect();

        // Values nobody declared behave like plain props.
        let mut undeclared: Vec<String> = request
            .values
            .keys()
            .filter(|name| !declared.iter().any(|(n, _)| n == *name))
            .cloned()
            .collect();
        undeclared.sort();
        declared.extend(undeclared.into_iter().map(|name| (name, &plain)));

        let mut included: Vec<(String, &PropDescriptor, PropValue)> = Vec::new();
        for (name, descriptor) in declared {
            if let Some(once) = descriptor.once_options() {
                page.once_props.insert(
                    name.clone(),
                    OnceMetadata {
                        prop: name.clone(),
                        expires_at: once.expires_at,
                    },
                );
            }

            let decision = decide(&name, descriptor, intent, partial);
            trace!(prop = %name, ?decision, "Prop decision");
            match decision {
                Decision::Include => {
                    let value = request
                        .values
                        .remove(&name)
                        .ok_or_else(|| ResolveError::MissingValue(name.clone()))?;
                    included.push((name, descriptor, value));
                }
                Decision::Defer(group) => {
                    page.deferred_props
                        .entry(group.to_string())
                        .or_default()
                        .push(name);
                }
                Decision::Exclude | Decision::Cached => {}
            }
        }
        // Whatever is left was not included; its resolvers are dropped uninvoked.
        drop(request.values);

        let mut metadata = Vec::with_capacity(included.len());
        let evaluations = included.into_iter().map(|(name, descriptor, value)| {
            metadata.push((name.clone(), descriptor));
            async move {
                match value.evaluate().await {
                    Ok(resolved) => Ok::<(String, Value), ResolveError>((name, resolved)),
                    Err(source) => Err(ResolveError::Resolver { prop: name, source }),
                }
            }
        });
        let evaluations: Vec<_> = evaluations.collect();
        let resolved = try_join_all(evaluations).await?;
        page.props.extend(resolved);

        for (name, descriptor) in metadata {
            self.record_merge(&mut page, &name, descriptor, intent);
            if let Some(scroll) = descriptor.scroll_options() {
                let current = request
                    .current_pages
                    .get(&scroll.page_name)
                    .copied()
                    .unwrap_or(1);
                let has_more = request.has_more.get(&name).copied().unwrap_or(false);
                page.scroll_props.insert(
                    name,
                    ScrollMetadata::new(scroll.page_name.clone(), current, has_more),
                );
            }
        }

        debug!(
            component,
            props = page.props.len(),
            deferred = page.deferred_props.len(),
            "Resolved page props"
        );
        Ok(page)
    }

    fn record_merge(&self, page: &mut ResolvedPage, name: &str, descriptor: &PropDescriptor, intent: &RequestIntent) {
        let Some(merge) = descriptor.merge_options() else {
            return;
        };
        let direction = match (descriptor.scroll_options(), intent.scroll_merge_direction) {
            (Some(_), Some(requested)) => requested,
            _ => merge.direction,
        };

        match merge.strategy {
            MergeStrategy::Shallow => page.merge_props.push(name.to_string()),
            MergeStrategy::Deep => page.deep_merge_props.push(name.to_string()),
        }
        if direction == MergeDirection::Prepend {
            page.prepend_props.push(name.to_string());
        }
        if let Some(path) = &merge.match_on {
            page.match_props_on.push(format!("{name}.{path}"));
        }
    }
}

/// Shorthand for [`PropResolver::resolve`] without shared props.
pub async fn resolve(
    definition: &PageDefinition,
    intent: &RequestIntent,
    request: RenderRequest,
    version: &str,
) -> Result<ResolvedPage, ResolveError> {
    PropResolver::new(definition)
        .resolve(intent, request, version)
        .await
}
