//! # kinetic-test
//!
//! Assertions over Kinetic responses without a browser. A [`PageProbe`] reads
//! the page object back out of either response shape (JSON for protocol
//! visits, the `data-page` attribute for first visits) and can build the
//! follow-up request a client would send for a deferred group.
//!
//! ```rust,ignore
//! let probe = PageProbe::from_response(response).await?;
//! assert_eq!(probe.component(), Some("Dashboard"));
//! let follow_up = probe.deferred_request("default")?;
//! ```

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use kinetic_core::BoxError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unexpected content type `{0}`")]
    UnexpectedContentType(String),

    #[error("no data-page attribute found")]
    MissingDataPage,

    #[error("page object is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("no deferred group named `{0}`")]
    UnknownDeferredGroup(String),

    #[error("response body could not be read: {0}")]
    Body(#[source] BoxError),

    #[error("follow-up request could not be built: {0}")]
    Request(#[from] http::Error),
}

/// A protocol visit to `uri`, as the client sends it after the first load.
pub fn protocol_request(uri: &str, version: &str) -> http::request::Builder {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("X-Inertia", "true")
        .header("X-Inertia-Version", version)
}

/// Page object and response metadata captured from a rendered response.
#[derive(Debug, Clone)]
pub struct PageProbe {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    page: Option<Value>,
}

impl PageProbe {
    /// Reads the whole body and extracts the page object when there is one.
    ///
    /// Redirects and conflicts have no page; [`PageProbe::page`] is `None`
    /// for them.
    pub async fn from_response<B>(response: Response<B>) -> Result<Self, ProbeError>
    where
        B: http_body::Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|err| ProbeError::Body(err.into()))?
            .to_bytes();

        let page = if body.is_empty() {
            None
        } else {
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            Some(parse_page(content_type, &body)?)
        };

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
            page,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn page(&self) -> Option<&Value> {
        self.page.as_ref()
    }

    pub fn component(&self) -> Option<&str> {
        self.page.as_ref()?.get("component")?.as_str()
    }

    pub fn url(&self) -> Option<&str> {
        self.page.as_ref()?.get("url")?.as_str()
    }

    pub fn version(&self) -> Option<&str> {
        self.page.as_ref()?.get("version")?.as_str()
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.page.as_ref()?.get("props")?.get(name)
    }

    /// Prop names, sorted.
    pub fn prop_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .page
            .as_ref()
            .and_then(|page| page.get("props"))
            .and_then(Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Names listed under `field` (e.g. `mergeProps`); empty when omitted.
    pub fn metadata_list(&self, field: &str) -> Vec<String> {
        string_list(self.page.as_ref().and_then(|page| page.get(field)))
    }

    pub fn deferred_groups(&self) -> Vec<String> {
        self.page
            .as_ref()
            .and_then(|page| page.get("deferredProps"))
            .and_then(Value::as_object)
            .map(|groups| groups.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn deferred_group(&self, group: &str) -> Result<Vec<String>, ProbeError> {
        self.page
            .as_ref()
            .and_then(|page| page.get("deferredProps"))
            .and_then(|groups| groups.get(group))
            .map(|names| string_list(Some(names)))
            .ok_or_else(|| ProbeError::UnknownDeferredGroup(group.to_string()))
    }

    /// The partial reload a client sends to load `group` after mounting.
    pub fn deferred_request(&self, group: &str) -> Result<Request<()>, ProbeError> {
        let names = self.deferred_group(group)?;
        Ok(protocol_request(
            self.url().unwrap_or("/"),
            self.version().unwrap_or_default(),
        )
        .header("X-Inertia-Partial-Component", self.component().unwrap_or_default())
        .header("X-Inertia-Partial-Data", names.join(","))
        .body(())?)
    }
}

fn parse_page(content_type: &str, body: &[u8]) -> Result<Value, ProbeError> {
    if content_type.starts_with("application/json") {
        return Ok(serde_json::from_slice(body)?);
    }
    if content_type.starts_with("text/html") {
        let html = String::from_utf8_lossy(body);
        let attribute = extract_data_page(&html).ok_or(ProbeError::MissingDataPage)?;
        return Ok(serde_json::from_str(&unescape_html(attribute))?);
    }
    Err(ProbeError::UnexpectedContentType(content_type.to_string()))
}

fn extract_data_page(html: &str) -> Option<&str> {
    const MARKER: &str = "data-page=\"";
    let start = html.find(MARKER)? + MARKER.len();
    let len = html[start..].find('"')?;
    Some(&html[start..start + len])
}

fn unescape_html(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response(content_type: &str, body: &str) -> Response<Full<Bytes>> {
        Response::builder()
            .header(CONTENT_TYPE, content_type)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_reads_json_page() {
        let probe = PageProbe::from_response(response(
            "application/json",
            r#"{"component":"Home","props":{"b":1,"a":2},"url":"/","version":"v1","deferredProps":{"default":["stats"]}}"#,
        ))
        .await
        .unwrap();

        assert_eq!(probe.component(), Some("Home"));
        assert_eq!(probe.prop_names(), vec!["a", "b"]);
        assert_eq!(probe.deferred_group("default").unwrap(), vec!["stats"]);
        assert!(matches!(
            probe.deferred_group("sidebar"),
            Err(ProbeError::UnknownDeferredGroup(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_html_data_page() {
        let html = r#"<div id="app" data-page="{&quot;component&quot;:&quot;Home&quot;,&quot;props&quot;:{&quot;q&quot;:&quot;&lt;a&gt; &amp; &#039;b&#039;&quot;},&quot;url&quot;:&quot;/&quot;,&quot;version&quot;:&quot;&quot;}"></div>"#;
        let probe = PageProbe::from_response(response("text/html; charset=utf-8", html))
            .await
            .unwrap();
        assert_eq!(probe.prop("q"), Some(&Value::from("<a> & 'b'")));
    }

    #[tokio::test]
    async fn test_html_without_page_is_an_error() {
        let err = PageProbe::from_response(response("text/html", "<p>hello</p>"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no data-page attribute found");
    }

    #[tokio::test]
    async fn test_plain_text_is_an_unexpected_content_type() {
        let err = PageProbe::from_response(response("text/plain", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::UnexpectedContentType(ref t) if t == "text/plain"));
        assert_eq!(err.to_string(), "unexpected content type `text/plain`");
    }

    #[tokio::test]
    async fn test_deferred_request_headers() {
        let probe = PageProbe::from_response(response(
            "application/json",
            r#"{"component":"Dashboard","props":{},"url":"/dash?tab=1","version":"v9","deferredProps":{"default":["stats","feed"]}}"#,
        ))
        .await
        .unwrap();

        let req = probe.deferred_request("default").unwrap();
        assert_eq!(req.uri(), "/dash?tab=1");
        assert_eq!(req.headers()["X-Inertia"], "true");
        assert_eq!(req.headers()["X-Inertia-Version"], "v9");
        assert_eq!(req.headers()["X-Inertia-Partial-Component"], "Dashboard");
        assert_eq!(req.headers()["X-Inertia-Partial-Data"], "stats,feed");
    }
}
