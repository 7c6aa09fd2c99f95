//! # Responder: protocol-correct HTTP responses
//!
//! `Kinetic` turns a page definition plus a [`RenderRequest`] into an
//! `http::Response`:
//!
//! * protocol visits get the page as JSON
//! * first visits get the root view's HTML document
//! * stale clients get `409` with `X-Inertia-Location` so they reload
//! * redirects get the status the client's method requires

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION, REFERER, VARY};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use kinetic_core::{
    PageDefinition, PageSchema, Prop, PropDescriptor, PropResolver, RenderRequest, RequestIntent,
    SchemaError,
};
use serde_json::{Map, Value};
use tracing::Instrument;

use crate::config::{KineticConfig, VersionSource};
use crate::error::RenderError;
use crate::flash::{self, FlashError, FlashStore};
use crate::headers::{X_INERTIA, X_INERTIA_LOCATION, parse_intent};
use crate::view::{DefaultRootView, RootView};

/// Shared prop carrying validation errors.
pub const ERRORS_PROP: &str = "errors";

const JSON: &str = "application/json";
const HTML: &str = "text/html; charset=utf-8";

/// Response body used throughout Kinetic.
pub type KineticResponse = Response<Full<Bytes>>;

/// Configured protocol responder, built once and shared by all handlers.
pub struct Kinetic<V = DefaultRootView> {
    config: KineticConfig,
    version: VersionSource,
    view: V,
    shared: PageSchema,
}

impl Kinetic<DefaultRootView> {
    /// Responder using the built-in HTML shell.
    pub fn new(config: KineticConfig) -> Self {
        let view = DefaultRootView::new(config.root_id.clone()).with_title(config.title.clone());
        Self::with_view(config, view)
    }
}

impl<V: RootView> Kinetic<V> {
    pub fn with_view(config: KineticConfig, view: V) -> Self {
        Self {
            version: VersionSource::Static(config.version.clone()),
            config,
            view,
            shared: PageSchema::with_prop(ERRORS_PROP, PropDescriptor::always()),
        }
    }

    /// Replaces the static version from the config.
    pub fn version(mut self, version: impl Into<VersionSource>) -> Self {
        self.version = version.into();
        self
    }

    /// Declares a prop every page may receive, such as the signed-in user.
    pub fn share(mut self, name: impl Into<String>, prop: Prop) -> Result<Self, SchemaError> {
        self.shared.insert(name, prop.build()?)?;
        Ok(self)
    }

    pub fn config(&self) -> &KineticConfig {
        &self.config
    }

    pub async fn current_version(&self) -> String {
        self.version.current().await
    }

    /// Renders `definition` for `req`.
    ///
    /// Staged error bags are read from `flash` and exposed as the `errors`
    /// prop, unless the render supplies its own. They are cleared once the
    /// page has resolved.
    pub async fn render<B>(
        &self,
        req: &Request<B>,
        definition: &PageDefinition,
        render: RenderRequest,
        flash: Option<&dyn FlashStore>,
    ) -> Result<KineticResponse, RenderError> {
        let intent = parse_intent(req.headers());
        let url = current_url(req);
        let span = tracing::info_span!(
            "KineticRender",
            kinetic.http.method = %req.method(),
            kinetic.http.path = %req.uri().path(),
            kinetic.component = %definition.component(),
            kinetic.request_id = %uuid::Uuid::new_v4()
        );

        self.render_page(intent, url, definition, render, flash)
            .instrument(span)
            .await
    }

    async fn render_page(
        &self,
        intent: RequestIntent,
        url: String,
        definition: &PageDefinition,
        mut render: RenderRequest,
        flash: Option<&dyn FlashStore>,
    ) -> Result<KineticResponse, RenderError> {
        let version = self.current_version().await;
        if intent.is_protocol_request && intent.version_conflicts(&version) {
            tracing::info!(
                client = ?intent.client_version,
                server = %version,
                "Asset version changed, forcing a full reload"
            );
            return Ok(conflict(&url)?);
        }

        // Staged bags are cleared only once the page resolved, so a failed
        // render leaves them for the next one.
        let consumed = if render.contains(ERRORS_PROP) {
            None
        } else {
            let bags = match flash {
                Some(store) => flash::staged_errors(store).await?,
                None => Map::new(),
            };
            render.insert(
                ERRORS_PROP,
                flash::scope_errors(bags, intent.error_bag.as_deref()),
            );
            flash
        };
        if render.url_override().is_none() {
            render = render.url(url);
        }

        let mut page = PropResolver::new(definition)
            .with_shared(&self.shared)
            .resolve(&intent, render, &version)
            .await?;
        if let Some(store) = consumed {
            flash::clear_errors(store).await?;
        }
        page.encrypt_history = Some(page.encrypt_history.unwrap_or(self.config.encrypt_history));
        page.clear_history = Some(page.clear_history.unwrap_or(self.config.clear_history));
        let json = page.to_json()?;

        if intent.is_protocol_request {
            tracing::debug!(bytes = json.len(), "Responding with page JSON");
            return Ok(Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, JSON)
                .header(X_INERTIA, "true")
                .header(VARY, "X-Inertia")
                .body(Full::new(Bytes::from(json)))?);
        }

        let html = self
            .view
            .render(&page, &json)
            .await
            .map_err(RenderError::View)?;
        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, HTML)
            .header(VARY, "X-Inertia")
            .body(Full::new(Bytes::from(html)))?)
    }

    /// Stages validation errors for the next render under `bag`, or under the
    /// configured default bag.
    pub async fn stage_errors(
        &self,
        store: &dyn FlashStore,
        bag: Option<&str>,
        errors: Map<String, Value>,
    ) -> Result<(), FlashError> {
        let bag = bag.unwrap_or(&self.config.default_error_bag);
        flash::stage_errors(store, bag, errors).await
    }

    /// Redirect after handling a `method` request.
    pub fn redirect(&self, method: &Method, location: &str) -> Result<KineticResponse, http::Error> {
        self.redirect_with(method, location, None)
    }

    /// Like [`Kinetic::redirect`], with a preferred status for methods that
    /// do not mandate `303`.
    pub fn redirect_with(
        &self,
        method: &Method,
        location: &str,
        preferred: Option<StatusCode>,
    ) -> Result<KineticResponse, http::Error> {
        Response::builder()
            .status(redirect_status(method, preferred))
            .header(LOCATION, location)
            .body(Full::new(Bytes::new()))
    }

    /// Redirect back to the referring page, or `/` without a referer.
    pub fn back<B>(&self, req: &Request<B>) -> Result<KineticResponse, http::Error> {
        let target = req
            .headers()
            .get(REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("/")
            .to_string();
        self.redirect(req.method(), &target)
    }

    /// Sends the client to a URL outside the application, e.g. an OAuth
    /// provider. The client performs a full browser navigation.
    pub fn location(&self, target: &str) -> Result<KineticResponse, http::Error> {
        conflict(target)
    }
}

/// `303` for PUT, PATCH and DELETE so the browser follows with GET; `302`
/// (or `preferred`) for everything else.
pub fn redirect_status(method: &Method, preferred: Option<StatusCode>) -> StatusCode {
    match *method {
        Method::PUT | Method::PATCH | Method::DELETE => StatusCode::SEE_OTHER,
        _ => preferred.unwrap_or(StatusCode::FOUND),
    }
}

fn conflict(location: &str) -> Result<KineticResponse, http::Error> {
    Response::builder()
        .status(StatusCode::CONFLICT)
        .header(X_INERTIA_LOCATION, HeaderValue::from_str(location)?)
        .body(Full::new(Bytes::new()))
}

fn current_url<B>(req: &Request<B>) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_status_by_method() {
        assert_eq!(redirect_status(&Method::GET, None), StatusCode::FOUND);
        assert_eq!(redirect_status(&Method::POST, None), StatusCode::FOUND);
        assert_eq!(redirect_status(&Method::HEAD, None), StatusCode::FOUND);
        assert_eq!(redirect_status(&Method::PUT, None), StatusCode::SEE_OTHER);
        assert_eq!(redirect_status(&Method::PATCH, None), StatusCode::SEE_OTHER);
        assert_eq!(redirect_status(&Method::DELETE, None), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_preferred_status_only_for_unmandated_methods() {
        let preferred = Some(StatusCode::MOVED_PERMANENTLY);
        assert_eq!(redirect_status(&Method::GET, preferred), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(redirect_status(&Method::POST, preferred), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(redirect_status(&Method::PUT, preferred), StatusCode::SEE_OTHER);
        assert_eq!(redirect_status(&Method::DELETE, preferred), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_current_url_keeps_query() {
        let req = Request::builder()
            .uri("http://example.test/users?page=2")
            .body(())
            .unwrap();
        assert_eq!(current_url(&req), "/users?page=2");
    }
}
