//! HTTP Server
//!
//! Thin hyper HTTP/1 front end over [`StatsService`]. Every accepted
//! connection is served on its own task; requests are independent.

mod routes;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::stats::StatsService;

pub use routes::{handle, SERVICE_NAME};

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    service: Arc<StatsService>,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind stats server: {}", e)))?;

    info!("Stats server listening on {}", addr);
    serve_listener(listener, service, shutdown).await
}

/// Serve connections from an already-bound listener until `shutdown` is
/// cancelled. In-flight connections finish on their own tasks.
pub async fn serve_listener(
    listener: TcpListener,
    service: Arc<StatsService>,
    shutdown: CancellationToken,
) -> Result<()> {
    loop {
        let (stream, peer) = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Stats server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted
                .map_err(|e| Error::Internal(format!("Stats server accept error: {}", e)))?,
        };

        debug!(%peer, "Accepted connection");
        let io = TokioIo::new(stream);
        let service = service.clone();

        tokio::spawn(async move {
            let handler = service_fn(move |req: Request<Incoming>| {
                let service = service.clone();
                async move {
                    let response = handle(&service, req.method(), req.uri().path()).await;
                    Ok::<_, Infallible>(response)
                }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, handler).await {
                error!("Stats server connection error: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryGuidanceStore, InMemorySnapshotCache, InMemorySubmissionStore};
    use crate::stats::ServiceConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serves_over_tcp_and_shuts_down() {
        let service = Arc::new(
            StatsService::new(
                ServiceConfig::default(),
                Arc::new(InMemorySubmissionStore::new()),
                Arc::new(InMemoryGuidanceStore::new()),
                Arc::new(InMemorySnapshotCache::new()),
            )
            .unwrap(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(serve_listener(listener, service, shutdown.clone()));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.contains("\"status\":\"healthy\""));

        shutdown.cancel();
        server.await.unwrap().unwrap();
    }
}
