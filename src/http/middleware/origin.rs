//! Origin policy middleware.
//! Runs ahead of method dispatch, so preflights are gated too.

use axum::{
    body::Body,
    extract::State,
    http::{header::ORIGIN, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::observability::metrics;
use crate::security::OriginPolicy;

pub async fn origin_policy_middleware(
    State(policy): State<Arc<OriginPolicy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match policy.check(req.headers()) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            let origin = req
                .headers()
                .get(ORIGIN)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("<none>");
            tracing::warn!(
                origin = %origin,
                method = %req.method(),
                reason = e.reason(),
                "Request rejected by origin policy"
            );
            metrics::record_rejection(e.reason());
            e.into_response()
        }
    }
}
