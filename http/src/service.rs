//! # KineticService - Tower Service Adapter
//!
//! Wraps a page handler into a `tower::Service`, so Kinetic handlers run on
//! any Tower-compatible stack. Render failures become a logged `500`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Request, Response, StatusCode};
use http_body_util::Full;
use tower::Service;

use crate::error::RenderError;
use crate::responder::KineticResponse;

#[derive(Clone)]
pub struct KineticService<H> {
    handler: H,
}

impl<H> KineticService<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<B, H, Fut> Service<Request<B>> for KineticService<H>
where
    B: Send + 'static,
    H: Fn(Request<B>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<KineticResponse, RenderError>> + Send + 'static,
{
    type Response = KineticResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let fut = (self.handler)(req);
        Box::pin(async move {
            match fut.await {
                Ok(response) => Ok(response),
                Err(err) => {
                    tracing::error!(error = %err, "Page render failed");
                    Ok(internal_error())
                }
            }
        })
    }
}

fn internal_error() -> KineticResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, http::HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_core::ResolveError;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_render_error_becomes_500() {
        let svc = KineticService::new(|_req: Request<()>| async {
            Err::<KineticResponse, _>(RenderError::Resolve(ResolveError::MissingValue(
                "title".into(),
            )))
        });
        let response = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let svc = KineticService::new(|_req: Request<()>| async {
            Ok::<_, RenderError>(Response::new(Full::new(Bytes::from_static(b"ok"))))
        });
        let response = svc.oneshot(Request::new(())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
