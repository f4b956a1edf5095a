//! HTTP server implementation using axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::request::Parts;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use relay_executor::{RelayOutcome, ORDER_PATH};
use relay_telemetry::Metrics;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::auth::AuthRequest;
use crate::config::AuthMode;
use crate::error::{RelayError, ServerError, ServerResult};
use crate::proxy::ProxyRequest;
use crate::state::AppState;
use crate::whitelist::ApiWhitelist;

#[derive(Debug, Clone, Copy)]
enum Route {
    Alert,
    Proxy,
}

impl Route {
    fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Proxy => "proxy",
        }
    }
}

/// Create the axum router.
///
/// Relay routes accept any method so that a non-POST request is answered
/// with 405 after the caller and whitelist checks, not before.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/alert", any(alert))
        .route("/alert/{token}", any(alert_with_token))
        .route("/proxy", any(proxy))
        .route("/proxy/{token}", any(proxy_with_token))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn alert(State(state): State<AppState>, request: Request) -> Response {
    dispatch(state, Route::Alert, None, request).await
}

async fn alert_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    request: Request,
) -> Response {
    dispatch(state, Route::Alert, Some(token), request).await
}

async fn proxy(State(state): State<AppState>, request: Request) -> Response {
    dispatch(state, Route::Proxy, None, request).await
}

async fn proxy_with_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    request: Request,
) -> Response {
    dispatch(state, Route::Proxy, Some(token), request).await
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> Response {
    match Metrics::gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Run one relay request inside its own correlation span.
async fn dispatch(
    state: AppState,
    route: Route,
    token: Option<String>,
    request: Request,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("request", %request_id, route = route.as_str());

    async move {
        let result = match route {
            Route::Alert => handle_alert(&state, token.as_deref(), request).await,
            Route::Proxy => handle_proxy(&state, token.as_deref(), request).await,
        };
        result.unwrap_or_else(IntoResponse::into_response)
    }
    .instrument(span)
    .await
}

async fn handle_alert(
    state: &AppState,
    token: Option<&str>,
    request: Request,
) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();
    let services = state.services();

    let whitelist = admit(state, &parts)?;
    let authenticator = services
        .authenticator
        .as_ref()
        .ok_or_else(|| RelayError::Configuration("authenticator not configured".into()))?;
    let auth = authenticator
        .authenticate(AuthRequest { path_token: token })
        .await?;

    let text = read_text(body, state.config().max_body_bytes).await?;
    let order = services
        .parser
        .parse(&text, auth.expected_token.as_deref())
        .ok_or_else(|| RelayError::Validation("alert did not yield an order".into()))?;

    if !whitelist.allows(ORDER_PATH, "POST") {
        return Err(RelayError::Forbidden(format!("POST {ORDER_PATH}")));
    }

    let started_at = std::time::Instant::now();
    let outcome = services
        .executor
        .submit_order(&auth.credentials, &order, state.shutdown())
        .await;

    if outcome.is_success() {
        if let Some(emitter) = &services.emitter {
            let emitter = Arc::clone(emitter);
            tokio::spawn(
                async move { emitter.emit(&order, started_at).await }.instrument(Span::current()),
            );
        }
    }

    Ok(outcome_response(outcome))
}

async fn handle_proxy(
    state: &AppState,
    token: Option<&str>,
    request: Request,
) -> Result<Response, RelayError> {
    let (parts, body) = request.into_parts();
    let services = state.services();

    let whitelist = admit(state, &parts)?;
    let authenticator = services
        .authenticator
        .as_ref()
        .ok_or_else(|| RelayError::Configuration("authenticator not configured".into()))?;
    let auth = authenticator
        .authenticate(AuthRequest { path_token: token })
        .await?;

    let text = read_text(body, state.config().max_body_bytes).await?;
    let proxy: ProxyRequest = serde_json::from_str(&text)
        .map_err(|e| RelayError::Validation(format!("invalid proxy request: {e}")))?;
    let call = proxy.validate()?;

    // body_token callers cannot prove themselves without alert text
    let credentials = match proxy.credentials() {
        Some(credentials) => credentials,
        None if authenticator.mode() == AuthMode::BodyToken => {
            return Err(RelayError::Validation("missing apiKey or secret".into()));
        }
        None => auth.credentials,
    };

    if !whitelist.allows(&call.path, call.method) {
        return Err(RelayError::Forbidden(format!("{} {}", call.method, call.path)));
    }

    info!(method = call.method, path = %call.path, "Proxying request");
    let outcome = services
        .executor
        .relay(&credentials, call.method, &call.path, &call.body, state.shutdown())
        .await;

    Ok(outcome_response(outcome))
}

/// Checks shared by every relay route: caller IP, whitelist present, POST.
fn admit<'a>(state: &'a AppState, parts: &Parts) -> Result<&'a ApiWhitelist, RelayError> {
    let ip = client_ip(state, parts);
    if !state.config().is_ip_allowed(ip.as_deref()) {
        return Err(RelayError::Authentication(format!(
            "caller IP not allowed: {}",
            ip.as_deref().unwrap_or("unknown")
        )));
    }

    let whitelist = state
        .services()
        .whitelist
        .as_deref()
        .ok_or_else(|| RelayError::Configuration("API whitelist not configured".into()))?;

    if parts.method != Method::POST {
        return Err(RelayError::MethodNotAllowed(parts.method.to_string()));
    }

    Ok(whitelist)
}

/// Caller IP from the configured header (first hop), else the socket peer.
fn client_ip(state: &AppState, parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(state.config().client_ip_header.as_str())
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

async fn read_text(body: Body, limit: usize) -> Result<String, RelayError> {
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| RelayError::Validation(format!("unreadable body: {e}")))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| RelayError::Validation("body is not UTF-8".into()))
}

fn outcome_response(outcome: RelayOutcome) -> Response {
    Metrics::alert(outcome.state.as_str());
    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        outcome.body,
    )
        .into_response()
}

/// Serve on an already bound listener until `state.shutdown()` is cancelled.
pub async fn serve(listener: TcpListener, state: AppState) -> ServerResult<()> {
    let shutdown = state.shutdown().clone();
    let app = create_router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    info!("Relay server stopped");
    Ok(())
}

/// Run the relay HTTP server on the configured address.
pub async fn run_server(state: AppState) -> ServerResult<()> {
    let addr: SocketAddr = state
        .config()
        .listen_addr
        .parse()
        .map_err(|_| ServerError::InvalidAddress(state.config().listen_addr.clone()))?;

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Starting relay server");
    serve(listener, state).await
}
