//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway handler
//! - Wire up middleware (origin policy, request ID, tracing, timeout)
//! - Dispatch preflights and proxied requests
//! - Serve plain TCP or TLS with graceful shutdown

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderValue, Method, Request, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::client::UpstreamClient;
use crate::http::cors::CorsHeaders;
use crate::http::error::GatewayError;
use crate::http::middleware::origin_policy_middleware;
use crate::http::request::OutboundRequest;
use crate::http::response::ResponseHandler;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::TargetResolver;
use crate::security::OriginPolicy;

/// Methods the gateway forwards. OPTIONS is answered locally.
const FORWARDED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_SECS: u64 = 10;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: TargetResolver,
    pub client: UpstreamClient,
    pub responses: ResponseHandler,
    pub max_body_size: usize,
}

/// HTTP server for the CORS gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = UpstreamClient::new(&config.upstream)?;
        let resolver = TargetResolver::new(config.policy.normalize_urls);
        let responses = ResponseHandler::new(
            client.clone(),
            resolver,
            CorsHeaders::new(config.policy.cors_max_age),
            config.policy.max_redirects,
        );

        let state = AppState {
            resolver,
            client,
            responses,
            max_body_size: config.security.max_body_size,
        };
        let policy = Arc::new(OriginPolicy::new(&config.policy));

        let router = Self::build_router(&config, state, policy);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState, policy: Arc<OriginPolicy>) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(policy, origin_policy_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::if_not_present(
                        header::ACCESS_CONTROL_ALLOW_ORIGIN,
                        HeaderValue::from_static("*"),
                    ))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            drain.graceful_shutdown(Some(Duration::from_secs(TLS_DRAIN_SECS)));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Answers preflights, otherwise validates the target and forwards.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
        "Gateway request"
    );

    let response = match forward(&state, request, &request_id).await {
        Ok(response) => response,
        Err(e) => {
            match e {
                GatewayError::Upstream { .. } => metrics::record_upstream_error(),
                _ => metrics::record_rejection(e.reason()),
            }
            tracing::warn!(
                request_id = %request_id,
                status = %e.status(),
                error = %e,
                "Request failed"
            );
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(
    state: &AppState,
    request: Request<Body>,
    request_id: &str,
) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();

    if parts.method == Method::OPTIONS {
        tracing::debug!(request_id = %request_id, "Answering preflight");
        return Ok(state.responses.preflight(&parts.headers));
    }
    if !FORWARDED_METHODS.contains(&parts.method) {
        return Err(GatewayError::MethodNotAllowed(parts.method));
    }

    let target = state.resolver.resolve(url_param(&parts.uri).as_deref())?;
    let requested = target.url().clone();

    let body = to_bytes(body, state.max_body_size)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge(state.max_body_size))?;

    let outbound = OutboundRequest::build(parts.method.clone(), &parts.headers, body, target);
    let first = state.client.send(outbound).await?;
    let resolved = state.responses.follow_redirects(first).await?;

    tracing::info!(
        request_id = %request_id,
        method = %parts.method,
        target_url = %requested,
        status = %resolved.response.status,
        upstream_calls = resolved.upstream_calls,
        "Proxied request"
    );

    Ok(state
        .responses
        .finalize(resolved, &parts.method, &parts.headers, &requested))
}

/// Extract the percent-decoded `url` query parameter.
fn url_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
}
