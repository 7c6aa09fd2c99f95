//! hello-pages
//!
//! A small Kinetic application served with hyper. Set `KINETIC_CONFIG` to a
//! TOML file to override the defaults, and `RUST_LOG` to change verbosity.
//!
//! Routes:
//! * `GET /` home page with deferred, optional and once props
//! * `GET /posts?page=N` infinite-scroll feed
//! * `POST /login` stages a validation error and redirects back
//! * `GET /old-home` redirects to `/`
//! * `GET /docs` external redirect

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use kinetic::http::{KineticResponse, MemoryFlash, RenderError};
use kinetic::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

const POSTS_PER_PAGE: u32 = 5;
const LAST_PAGE: u32 = 4;

struct App {
    kinetic: Kinetic,
    // Single-visitor demo: one flash store stands in for a session.
    flash: MemoryFlash,
    home: PageDefinition,
    posts: PageDefinition,
}

impl App {
    fn new(config: KineticConfig) -> Result<Self> {
        let kinetic = Kinetic::new(config).share("auth", Prop::plain())?;
        let home = PageDefinition::builder("Home")
            .prop("title", Prop::plain())
            .prop("stats", Prop::plain().deferred())
            .prop("activity", Prop::plain().deferred_in("sidebar"))
            .prop("heavyData", Prop::plain().optional())
            .prop("countries", Prop::plain().once())
            .require_shared("auth")
            .build()?;
        let posts = PageDefinition::builder("Posts/Index")
            .prop("title", Prop::plain())
            .prop("posts", Prop::merge().match_on("id").scroll())
            .build()?;

        Ok(Self {
            kinetic,
            flash: MemoryFlash::new(),
            home,
            posts,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::var("KINETIC_CONFIG") {
        Ok(path) => KineticConfig::from_file(&path)?,
        Err(_) => KineticConfig {
            version: "dev".to_string(),
            title: "Hello Pages".to_string(),
            ..KineticConfig::default()
        },
    };
    tracing::info!(version = %config.version, "Loaded configuration");

    let app = Arc::new(App::new(config)?);
    let addr: SocketAddr = ([127, 0, 0, 1], 3000).into();

    kinetic::serve(addr, move |req| {
        let app = app.clone();
        async move { handle(app, req).await }
    })
    .await
    .map_err(|err| anyhow::anyhow!(err))
}

async fn handle(app: Arc<App>, req: Request<Incoming>) -> Result<KineticResponse, RenderError> {
    // No route reads a body.
    let (parts, _body) = req.into_parts();
    let req = Request::from_parts(parts, ());

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/") => {
            app.kinetic
                .render(&req, &app.home, home_values(), Some(&app.flash))
                .await
        }
        (&Method::GET, "/posts") => {
            let page = query_page(&req);
            app.kinetic
                .render(&req, &app.posts, post_values(page), Some(&app.flash))
                .await
        }
        (&Method::POST, "/login") => {
            let mut errors = Map::new();
            errors.insert("email".to_string(), json!("The email field is required."));
            app.kinetic
                .stage_errors(&app.flash, Some("login"), errors)
                .await?;
            Ok(app.kinetic.back(&req)?)
        }
        (&Method::GET, "/old-home") => Ok(app.kinetic.redirect(req.method(), "/")?),
        (&Method::GET, "/docs") => Ok(app.kinetic.location("https://inertiajs.com")?),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from_static(b"Not Found")))?),
    }
}

fn shared() -> RenderRequest {
    RenderRequest::new().prop("auth", json!({"user": {"name": "Ada"}}))
}

fn home_values() -> RenderRequest {
    shared()
        .prop("title", json!("Hello, Kinetic"))
        .prop(
            "stats",
            PropValue::resolve(|| async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                Ok::<_, BoxError>(json!({"visits": 1024, "signups": 12}))
            }),
        )
        .prop(
            "activity",
            PropValue::resolve(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok::<_, BoxError>(json!(["Ada signed in", "Grace left a comment"]))
            }),
        )
        .prop(
            "heavyData",
            PropValue::lazy(|| Ok::<_, BoxError>((1..=1000).collect::<Vec<u32>>())),
        )
        .prop(
            "countries",
            PropValue::lazy(|| {
                tracing::debug!("Loading country list");
                Ok::<_, BoxError>(json!(["Estonia", "Japan", "Kenya", "Peru"]))
            }),
        )
}

fn post_values(page: u32) -> RenderRequest {
    let first = (page - 1) * POSTS_PER_PAGE + 1;
    let posts: Vec<Value> = (first..first + POSTS_PER_PAGE)
        .map(|id| json!({"id": id, "title": format!("Post #{id}")}))
        .collect();

    shared()
        .prop("title", json!("Posts"))
        .prop("posts", Value::Array(posts))
        .has_more("posts", page < LAST_PAGE)
        .current_page("page", page)
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

/// `page` query parameter, clamped to `1..=LAST_PAGE`.
fn query_page<B>(req: &Request<B>) -> u32 {
    let query: PageQuery = req
        .uri()
        .query()
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();
    query.page.unwrap_or(1).clamp(1, LAST_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_page() {
        let req = |uri: &str| Request::get(uri).body(()).unwrap();
        assert_eq!(query_page(&req("/posts")), 1);
        assert_eq!(query_page(&req("/posts?page=3")), 3);
        assert_eq!(query_page(&req("/posts?sort=new&page=2")), 2);
        assert_eq!(query_page(&req("/posts?page=0")), 1);
        assert_eq!(query_page(&req("/posts?page=99")), LAST_PAGE);
        assert_eq!(query_page(&req("/posts?page=abc")), 1);
        assert_eq!(query_page(&req("/posts?page=%32")), 2);
    }

    #[test]
    fn test_app_definitions_build() {
        let app = App::new(KineticConfig::default()).unwrap();
        assert_eq!(app.home.component(), "Home");
        assert_eq!(app.posts.schema().len(), 2);
    }
}
