//! Admission middleware.
//!
//! Wires the identity deriver, quota resolver, and limiter engine into the
//! request pipeline. Requests within quota are forwarded untouched; the
//! middleware owns only the two terminal responses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use crate::limiter::{ClientIdentity, LimiterEngine, QuotaResolver};

/// Body of the rate-limit-exceeded response.
const OVER_LIMIT_BODY: &str =
    "you have reached the maximum number of requests or actions allowed within a certain time frame";
/// Body of the indeterminate-decision response. Store errors are logged,
/// never echoed to the caller.
const FAILURE_BODY: &str = "internal server error";

/// Shared state for the admission middleware.
#[derive(Clone)]
pub struct AdmissionState {
    pub engine: Arc<LimiterEngine>,
    pub resolver: Arc<QuotaResolver>,
    /// Name of the header carrying the caller credential.
    pub credential_header: String,
}

/// Decide whether a request may proceed to the downstream handler.
pub async fn admit(State(state): State<AdmissionState>, req: Request, next: Next) -> Response {
    let remote_addr = match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ci) => ci.0.to_string(),
        None => {
            // Requires serving with into_make_service_with_connect_info;
            // without it every address-keyed caller lands in one bucket.
            warn!("Request carries no connection info, anonymous callers share one bucket");
            String::new()
        }
    };

    let credential = req
        .headers()
        .get(state.credential_header.as_str())
        .and_then(|v| v.to_str().ok());
    let forwarded_for = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());

    let key = ClientIdentity::from_parts(credential, forwarded_for, &remote_addr).key();
    let resolved = state.resolver.resolve(credential);

    match state.engine.allowed(&key, resolved.quota()).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            debug!(key = %key, "Request rejected, quota exhausted");
            (StatusCode::TOO_MANY_REQUESTS, OVER_LIMIT_BODY).into_response()
        }
        Err(e) => {
            error!(key = %key, error = %e, "Admission decision indeterminate");
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
        }
    }
}
