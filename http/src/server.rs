//! Minimal hyper server for Kinetic handlers.
//!
//! Production apps usually mount [`KineticService`] in their own stack; this
//! is enough for demos and tests.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use kinetic_core::BoxError;
use tokio::net::TcpListener;
use tower::ServiceBuilder;

use crate::error::RenderError;
use crate::responder::KineticResponse;
use crate::service::KineticService;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serve `handler` over HTTP/1 on `addr`.
///
/// Only binding can fail; accept errors are logged and the loop continues.
///
/// # Example
/// ```ignore
/// let kinetic = Arc::new(Kinetic::new(KineticConfig::default()));
/// kinetic_http::serve(([127, 0, 0, 1], 3000).into(), move |req| {
///     let kinetic = kinetic.clone();
///     async move { kinetic.render(&req, &HOME, RenderRequest::new(), None).await }
/// })
/// .await?;
/// ```
pub async fn serve<H, Fut>(addr: SocketAddr, handler: H) -> Result<(), BoxError>
where
    H: Fn(Request<Incoming>) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<KineticResponse, RenderError>> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Kinetic server listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                // e.g. EMFILE; back off and keep serving.
                tracing::warn!(error = %err, "Failed to accept connection");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let handler = handler.clone();

        tokio::task::spawn(async move {
            let svc = ServiceBuilder::new().service(KineticService::new(handler));
            let svc = TowerToHyperService::new(svc);

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!(%peer, error = ?err, "Error serving connection");
            }
        });
    }
}
