//! Root view: the HTML document served on a first visit.
//!
//! The page object is embedded as an HTML-escaped JSON `data-page` attribute
//! on the element the client application mounts on.

use async_trait::async_trait;
use kinetic_core::{BoxError, ResolvedPage};

/// Render callback producing the full HTML document.
#[async_trait]
pub trait RootView: Send + Sync {
    /// `page_json` is the serialized page, not yet escaped.
    async fn render(&self, page: &ResolvedPage, page_json: &str) -> Result<String, BoxError>;
}

/// Adapts a synchronous closure into a [`RootView`].
pub struct FnView<F>(F);

/// Build a [`RootView`] from a closure.
///
/// # Example
///
/// ```rust,ignore
/// let view = view_fn(|_page, json| format!("<body>{}</body>", root_element("app", json)));
/// ```
pub fn view_fn<F>(f: F) -> FnView<F>
where
    F: Fn(&ResolvedPage, &str) -> String + Send + Sync,
{
    FnView(f)
}

#[async_trait]
impl<F> RootView for FnView<F>
where
    F: Fn(&ResolvedPage, &str) -> String + Send + Sync,
{
    async fn render(&self, page: &ResolvedPage, page_json: &str) -> Result<String, BoxError> {
        Ok((self.0)(page, page_json))
    }
}

/// Minimal HTML shell with a configurable title and script tag.
#[derive(Debug, Clone)]
pub struct DefaultRootView {
    root_id: String,
    title: String,
    script_src: Option<String>,
}

impl DefaultRootView {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            title: String::new(),
            script_src: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Client bundle loaded with `type="module"`.
    pub fn with_script(mut self, src: impl Into<String>) -> Self {
        self.script_src = Some(src.into());
        self
    }
}

#[async_trait]
impl RootView for DefaultRootView {
    async fn render(&self, _page: &ResolvedPage, page_json: &str) -> Result<String, BoxError> {
        let script = self
            .script_src
            .as_deref()
            .map(|src| format!("\n    <script type=\"module\" src=\"{}\"></script>", escape_html(src)))
            .unwrap_or_default();
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\">\n    <title>{title}</title>{script}\n  </head>\n  <body>\n    {root}\n  </body>\n</html>\n",
            title = escape_html(&self.title),
            root = root_element(&self.root_id, page_json),
        ))
    }
}

/// The mount element carrying the page object.
pub fn root_element(root_id: &str, page_json: &str) -> String {
    format!(
        "<div id=\"{}\" data-page=\"{}\"></div>",
        escape_html(root_id),
        escape_html(page_json)
    )
}

/// Escapes text for use in element content or a double-quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"{"a":"<b> & 'c'"}"#),
            "{&quot;a&quot;:&quot;&lt;b&gt; &amp; &#039;c&#039;&quot;}"
        );
    }

    #[tokio::test]
    async fn test_default_view_embeds_page() {
        let page = ResolvedPage::new("Home", "/", "v1");
        let json = page.to_json().unwrap();
        let html = DefaultRootView::new("app")
            .with_title("Kinetic <Demo>")
            .with_script("/assets/app.js")
            .render(&page, &json)
            .await
            .unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Kinetic &lt;Demo&gt;</title>"));
        assert!(html.contains(r#"<script type="module" src="/assets/app.js"></script>"#));
        assert!(html.contains(r#"<div id="app" data-page="{&quot;component&quot;:&quot;Home&quot;"#));
    }

    #[tokio::test]
    async fn test_fn_view() {
        let view = view_fn(|page: &ResolvedPage, json: &str| {
            format!("<main>{}</main>{}", page.component, root_element("root", json))
        });
        let page = ResolvedPage::new("About", "/about", "v1");
        let html = view.render(&page, "{}").await.unwrap();
        assert_eq!(html, r#"<main>About</main><div id="root" data-page="{}"></div>"#);
    }
}
