//! HTTP health endpoint polled by the discovery backend

use crate::aggregator::HealthAggregator;
use crate::error::{HealthError, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, body::Incoming as IncomingBody, header};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Serves the aggregated [`HealthStatus`](crate::HealthStatus) as JSON.
///
/// `GET`/`HEAD` on the configured path answers 200 when healthy and 503
/// otherwise; every other request gets a 404.
pub struct HealthServer {
    listener: TcpListener,
    aggregator: Arc<HealthAggregator>,
    path: Arc<str>,
}

impl HealthServer {
    /// Bind the endpoint without serving yet
    pub async fn bind(
        addr: SocketAddr,
        aggregator: Arc<HealthAggregator>,
        path: impl Into<String>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HealthError::Bind { addr, source })?;

        Ok(Self {
            listener,
            aggregator,
            path: Arc::from(path.into()),
        })
    }

    /// The bound address (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, path = %self.path, "Health endpoint listening");

        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => {
                    info!(%addr, "Health endpoint stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => accepted?,
            };

            let io = TokioIo::new(stream);
            let aggregator = Arc::clone(&self.aggregator);
            let path = Arc::clone(&self.path);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let aggregator = Arc::clone(&aggregator);
                    let path = Arc::clone(&path);
                    async move { handle_request(req, aggregator, path).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(%peer, error = %err, "Error serving health connection");
                }
            });
        }
    }
}

async fn handle_request(
    req: Request<IncomingBody>,
    aggregator: Arc<HealthAggregator>,
    path: Arc<str>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let is_probe = matches!(*req.method(), Method::GET | Method::HEAD);
    if !is_probe || req.uri().path() != &*path {
        return Ok(empty(StatusCode::NOT_FOUND));
    }

    let status = aggregator.aggregate().await;
    debug!(healthy = status.healthy, detail = ?status.detail, "Health probe served");

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = match serde_json::to_vec(&status) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Failed to serialize health status");
            return Ok(empty(StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = code;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

fn empty(code: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = code;
    response
}
