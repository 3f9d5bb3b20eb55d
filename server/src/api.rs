//! # Sign-In HTTP API
//!
//! Builds the axum router for the challenge-response endpoints. This layer
//! owns request-shape validation and wire formats; all protocol logic lives
//! in `wraplogin-auth`. Malformed input never reaches the core.
//!
//! ## Endpoints
//!
//! | Method | Path      | Description                                     |
//! |--------|-----------|-------------------------------------------------|
//! | GET    | `/health` | Liveness probe                                  |
//! | POST   | `/nonce`  | Issue (or re-read) the challenge nonce          |
//! | POST   | `/verify` | Verify a signed challenge for a Wrap Name       |
//!
//! ## Wire contract
//!
//! `/nonce` answers with the bare decimal nonce as a text body. `/verify`
//! answers `{"error":"Not Exist"}` for unknown names and the bare text
//! `"True"` / `"False"` otherwise — quirky, but it is the contract deployed
//! clients already speak. Infrastructure failures answer 502 with a JSON
//! error and are never folded into `"False"`.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wraplogin_auth::config::ADDRESS_HEX_LEN;
use wraplogin_auth::directory::Directory;
use wraplogin_auth::store::NonceKv;
use wraplogin_auth::{AuthError, LoginService, VerifyOutcome};

use crate::metrics::SharedMetrics;

/// The service with its collaborators behind trait objects, so the router
/// does not care which store or directory the deployment wired up.
pub type DynLoginService = LoginService<Arc<dyn NonceKv>, Arc<dyn Directory>>;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The composed sign-in flow.
    pub service: Arc<DynLoginService>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/nonce", post(nonce_handler))
        .route("/verify", post(verify_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /nonce`.
#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    /// `0x` + 40 hex digits. Case-insensitive.
    pub address: String,
    /// Absolute URL of the relying party.
    pub domain: String,
}

/// Body of `POST /verify`.
///
/// The name field is called `dotAgency` on the wire — the registry these
/// names live in grew out of the .agency namespace and the deployed clients
/// still send it under that key.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The claimed Wrap Name.
    #[serde(rename = "dotAgency")]
    pub name: String,
    /// `0x`-prefixed hex signature over the challenge message.
    pub signature: String,
    /// Absolute URL of the relying party. Must match the domain the nonce
    /// was issued under.
    pub domain: String,
}

/// Generic error body returned on validation and infrastructure failures —
/// and, verbatim per the wire contract, for unknown names.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// `0x` followed by exactly 40 hex digits.
fn is_hex_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(rest) => rest.len() == ADDRESS_HEX_LEN && rest.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Syntactically valid absolute URL.
fn is_absolute_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// 502, never 500: the service is fine, a dependency is not.
fn infra_failure(metrics: &SharedMetrics, err: &AuthError) -> Response {
    metrics.infra_failures_total.inc();
    tracing::error!(error = %err, "request failed on infrastructure");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the service is alive.
///
/// Intentionally does not probe the store or the directory; a liveness
/// check that fans out to dependencies just turns their outage into a
/// restart loop.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /nonce` — issue (or return the still-live) challenge nonce for a
/// (domain, address) pair. Body is the bare decimal nonce.
async fn nonce_handler(
    State(state): State<AppState>,
    Json(req): Json<NonceRequest>,
) -> Response {
    if !is_hex_address(&req.address) {
        return bad_request("address must be 0x followed by 40 hex digits");
    }
    if !is_absolute_url(&req.domain) {
        return bad_request("domain must be an absolute URL");
    }

    state.metrics.nonce_requests_total.inc();

    match state.service.issue_nonce(&req.domain, &req.address).await {
        Ok(nonce) => (StatusCode::OK, nonce).into_response(),
        Err(e) => infra_failure(&state.metrics, &e),
    }
}

/// `POST /verify` — run the full verification pipeline.
///
/// Answers, in the deployed clients' dialect:
/// - `{"error":"Not Exist"}` when the name has no directory record;
/// - `"True"` when the signature recovers to the name's holder;
/// - `"False"` for everything else the client got wrong.
async fn verify_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    if !req.signature.starts_with("0x") {
        return bad_request("signature must be 0x-prefixed hex");
    }
    if !is_absolute_url(&req.domain) {
        return bad_request("domain must be an absolute URL");
    }

    state.metrics.verify_requests_total.inc();
    let started = Instant::now();

    let outcome = state
        .service
        .verify(&req.name, &req.domain, &req.signature)
        .await;
    state
        .metrics
        .verify_latency_seconds
        .observe(started.elapsed().as_secs_f64());

    match outcome {
        Ok(VerifyOutcome::Valid) => {
            state.metrics.verify_valid_total.inc();
            (StatusCode::OK, "True").into_response()
        }
        Ok(VerifyOutcome::Invalid) => {
            state.metrics.verify_invalid_total.inc();
            (StatusCode::OK, "False").into_response()
        }
        Ok(VerifyOutcome::UnknownName) => {
            state.metrics.unknown_name_total.inc();
            (
                StatusCode::OK,
                Json(ErrorResponse {
                    error: "Not Exist".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => infra_failure(&state.metrics, &e),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
