//! HTTP server implementation.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing::{error, info};

use super::admission::{admit, AdmissionState};
use crate::error::Result;

/// HTTP server wrapping the downstream handlers with admission control.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// Shared admission state
    state: AdmissionState,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, state: AdmissionState) -> Self {
        Self { addr, state }
    }

    /// Build the router: admission-controlled application routes plus a
    /// health endpoint outside the limiter.
    pub fn router(state: AdmissionState) -> Router {
        let admitted = Router::new()
            .route("/hello", get(hello))
            .layer(axum::middleware::from_fn_with_state(state, admit));

        Router::new()
            .route("/health", get(health))
            .merge(admitted)
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = Self::router(self.state);

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!(error = %e, "HTTP server failed");
            e.into()
        })
    }
}

/// Trivial downstream handler standing in for the wrapped application.
async fn hello() -> &'static str {
    "Hello, World!"
}

/// Liveness probe; not subject to admission control.
async fn health() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limiter::{LimiterEngine, Quota, QuotaResolver, ResolverPolicy};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AdmissionState {
        AdmissionState {
            engine: Arc::new(LimiterEngine::new(Arc::new(MemoryStore::new()))),
            resolver: Arc::new(QuotaResolver::new(
                Quota::new(Duration::from_secs(10), 10),
                ResolverPolicy::CredentialSplit {
                    authenticated: Quota::new(Duration::from_secs(10), 10),
                    anonymous: Quota::new(Duration::from_secs(10), 10),
                },
            )),
            credential_header: "x-api-key".to_string(),
        }
    }

    #[tokio::test]
    async fn health_bypasses_admission() {
        let app = HttpServer::router(state());

        // No ConnectInfo extension at all: the health route must still
        // answer because it sits outside the middleware.
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn hello_served_through_admission() {
        let app = HttpServer::router(state());

        let mut req = Request::builder().uri("/hello").body(Body::empty()).unwrap();
        req.extensions_mut().insert(axum::extract::ConnectInfo(
            "192.0.2.9:5000".parse::<SocketAddr>().unwrap(),
        ));

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
