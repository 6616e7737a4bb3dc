//! # REST API
//!
//! Builds the axum router that exposes the loan-log service over HTTP.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                                  | Description                          |
//! |--------|---------------------------------------|--------------------------------------|
//! | GET    | `/health`                             | Liveness probe                       |
//! | GET    | `/status`                             | Service status summary               |
//! | GET    | `/assets`                             | Loan-log assets minted by the master |
//! | POST   | `/assets`                             | Mint a loan-log asset                |
//! | GET    | `/assets/:asset_id`                   | One asset by id                      |
//! | POST   | `/assets/:asset_id/log`               | Append a log entry                   |
//! | GET    | `/assets/:asset_id/log`               | Read the log back, oldest first      |
//! | GET    | `/assets/:asset_id/optin/:address`    | Asset opt-in check                   |
//! | POST   | `/profiles`                           | Write a credit profile               |
//! | GET    | `/profiles/:address`                  | Read a credit profile                |
//! | GET    | `/profiles/:address/status`           | Profile lifecycle status             |
//! | GET    | `/txn/optin/asset/:asset_id/:address` | Unsigned asset opt-in blob           |
//! | GET    | `/txn/optin/profile/:address`         | Unsigned profile opt-in blob         |
//! | GET    | `/txn/transfer/:from/:to/:amount`     | Unsigned stable-token transfer blob  |
//! | POST   | `/admin/fund/:address`                | Fund an account from the master      |
//! | POST   | `/admin/clawback/:asset_id/:from/:to/:amount` | Clawback transfer            |
//!
//! Mutating endpoints sit behind the bearer gate from [`crate::auth`];
//! reads and blob construction are open.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use arbor_ledger::client::CreatedAsset;
use arbor_ledger::service::{LogEntry, MintedLogAsset};
use arbor_ledger::{
    Address, CreditProfile, LoanLogService, OptInStatus, ProfileUpdate, ServiceError,
};

use crate::auth::AuthConfig;
use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc` or handle types.
#[derive(Clone)]
pub struct AppState {
    /// The service's reported version string.
    pub version: String,
    /// The connected loan-log service (registrar check already passed).
    pub service: Arc<LoanLogService>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Bearer gate configuration for mutating endpoints.
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let open = Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/assets", get(list_assets_handler))
        .route("/assets/:asset_id", get(get_asset_handler))
        .route("/assets/:asset_id/log", get(read_log_handler))
        .route("/assets/:asset_id/optin/:address", get(asset_opt_in_handler))
        .route("/profiles/:address", get(read_profile_handler))
        .route("/profiles/:address/status", get(profile_status_handler))
        .route(
            "/txn/optin/asset/:asset_id/:address",
            get(asset_opt_in_blob_handler),
        )
        .route("/txn/optin/profile/:address", get(profile_opt_in_blob_handler))
        .route(
            "/txn/transfer/:from/:to/:amount",
            get(stable_transfer_blob_handler),
        );

    let guarded = Router::new()
        .route("/assets", post(mint_asset_handler))
        .route("/assets/:asset_id/log", post(append_log_handler))
        .route("/profiles", post(write_profile_handler))
        .route("/admin/fund/:address", post(fund_handler))
        .route(
            "/admin/clawback/:asset_id/:from/:to/:amount",
            post(clawback_handler),
        )
        .layer(from_fn_with_state(state.auth.clone(), crate::auth::require_bearer));

    open.merge(guarded)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Service software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// The registrar / master address.
    pub registrar: String,
    /// Id of the profile contract.
    pub profile_app_id: u64,
    /// Latest sealed ledger round.
    pub ledger_round: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// One minted asset, with the metadata hash hex-encoded for transport.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetResponse {
    pub asset_id: u64,
    pub asset_name: String,
    pub unit_name: String,
    pub total: u64,
    pub decimals: u32,
    pub metadata_hash: Option<String>,
}

impl From<CreatedAsset> for AssetResponse {
    fn from(asset: CreatedAsset) -> Self {
        Self {
            asset_id: asset.asset_id,
            asset_name: asset.asset_name,
            unit_name: asset.unit_name,
            total: asset.total,
            decimals: asset.decimals,
            metadata_hash: asset.metadata_hash.map(hex::encode),
        }
    }
}

/// Response payload for transaction-producing endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TxidResponse {
    pub txid: String,
}

/// Response payload for unsigned-blob endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlobResponse {
    /// Hex-encoded unsigned transaction for wallet-side signing.
    pub blob: String,
}

/// Response payload for `GET /profiles/:address`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub address: String,
    /// The credit record; `null` when the account opted in but no record
    /// has been written yet.
    pub profile: Option<CreditProfile>,
}

/// Response payload for `GET /profiles/:address/status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatusResponse {
    pub address: String,
    pub status: OptInStatus,
}

/// Response payload for `GET /assets/:asset_id/optin/:address`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOptInResponse {
    pub asset_id: u64,
    pub address: String,
    pub opted_in: bool,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps service errors onto HTTP statuses.
///
/// Client mistakes (unknown assets, missing opt-ins, malformed notes) get
/// 4xx; misconfiguration is a 500; anything the ledger itself failed on is
/// a 502, because from the client's point of view the upstream broke.
fn error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::UnknownAsset(_) => StatusCode::NOT_FOUND,
        ServiceError::Note(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotOptedIn { .. } => StatusCode::BAD_REQUEST,
        ServiceError::Unauthorized(_) => StatusCode::FORBIDDEN,
        ServiceError::RegistrarMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Ledger(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::error!(%err, "request failed");
    } else {
        tracing::debug!(%err, "request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn parse_address(raw: &str) -> Result<Address, Response> {
    Address::parse(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid address: {e}"),
            }),
        )
            .into_response()
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the service is alive.
///
/// This is the liveness probe for orchestrators. It intentionally does not
/// touch the ledger — that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns the service status summary, including the
/// latest sealed round as a reachability check against the ledger.
async fn status_handler(State(state): State<AppState>) -> Response {
    let round = match state.service.ledger_round().await {
        Ok(round) => round,
        Err(err) => return error_response(err),
    };
    state.metrics.ledger_round.set(round as i64);

    let config = state.service.config();
    Json(StatusResponse {
        version: state.version.clone(),
        network: config.network.to_string(),
        registrar: state.service.master_address().as_str().to_string(),
        profile_app_id: config.profile_app_id,
        ledger_round: round,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}

/// `POST /assets` — mints a loan-log asset from the posted loan terms.
async fn mint_asset_handler(
    State(state): State<AppState>,
    Json(input): Json<arbor_ledger::asset::NewLogAssetInput>,
) -> Response {
    match state.service.create_log_asset(&input).await {
        Ok(minted) => {
            state.metrics.log_assets_created_total.inc();
            (StatusCode::CREATED, Json::<MintedLogAsset>(minted)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `GET /assets` — lists every loan-log asset the master has minted.
async fn list_assets_handler(State(state): State<AppState>) -> Response {
    match state.service.created_assets().await {
        Ok(assets) => {
            let out: Vec<AssetResponse> = assets.into_iter().map(Into::into).collect();
            Json(out).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `GET /assets/:asset_id` — one asset by id, 404 when the master never
/// minted it.
async fn get_asset_handler(
    Path(asset_id): Path<u64>,
    State(state): State<AppState>,
) -> Response {
    match state.service.created_asset(asset_id).await {
        Ok(asset) => Json(AssetResponse::from(asset)).into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /assets/:asset_id/log` — appends the posted JSON document to the
/// loan log. The body is the log entry, verbatim; no schema is imposed.
async fn append_log_handler(
    Path(asset_id): Path<u64>,
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let started = std::time::Instant::now();
    match state.service.append_log(asset_id, &payload).await {
        Ok(txid) => {
            state.metrics.log_appends_total.inc();
            state
                .metrics
                .confirmation_latency_seconds
                .observe(started.elapsed().as_secs_f64());
            (StatusCode::CREATED, Json(TxidResponse { txid })).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// `GET /assets/:asset_id/log` — the decoded log, oldest first.
async fn read_log_handler(
    Path(asset_id): Path<u64>,
    State(state): State<AppState>,
) -> Response {
    match state.service.asset_log(asset_id).await {
        Ok(entries) => Json::<Vec<LogEntry>>(entries).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /assets/:asset_id/optin/:address` — whether `address` holds the
/// asset.
async fn asset_opt_in_handler(
    Path((asset_id, address)): Path<(u64, String)>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.has_opted_in_to_asset(&parsed, asset_id).await {
        Ok(opted_in) => Json(AssetOptInResponse {
            asset_id,
            address,
            opted_in,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /profiles` — writes (creates or overwrites) a credit profile.
async fn write_profile_handler(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let started = std::time::Instant::now();
    match state.service.write_profile(&update).await {
        Ok(txid) => {
            state.metrics.profile_writes_total.inc();
            state
                .metrics
                .confirmation_latency_seconds
                .observe(started.elapsed().as_secs_f64());
            (StatusCode::CREATED, Json(TxidResponse { txid })).into_response()
        }
        Err(err) => {
            if matches!(
                err,
                ServiceError::NotOptedIn { .. } | ServiceError::Unauthorized(_)
            ) {
                state.metrics.profile_write_rejections_total.inc();
            }
            error_response(err)
        }
    }
}

/// `GET /profiles/:address` — reads a credit profile. 400 when the account
/// never opted in to the profile contract.
async fn read_profile_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.read_profile(&parsed).await {
        Ok(profile) => Json(ProfileResponse { address, profile }).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /profiles/:address/status` — where the account stands in the
/// profile lifecycle.
async fn profile_status_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.opt_in_status(&parsed).await {
        Ok(status) => Json(ProfileStatusResponse { address, status }).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /txn/optin/asset/:asset_id/:address` — unsigned asset opt-in for
/// wallet-side signing.
async fn asset_opt_in_blob_handler(
    Path((asset_id, address)): Path<(u64, String)>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.asset_opt_in_blob(&parsed, asset_id).await {
        Ok(blob) => Json(BlobResponse { blob }).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /txn/optin/profile/:address` — unsigned profile-contract opt-in.
async fn profile_opt_in_blob_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.profile_opt_in_blob(&parsed).await {
        Ok(blob) => Json(BlobResponse { blob }).into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /txn/transfer/:from/:to/:amount` — unsigned stable-token transfer
/// of `amount` whole tokens.
async fn stable_transfer_blob_handler(
    Path((from, to, amount)): Path<(String, String, u64)>,
    State(state): State<AppState>,
) -> Response {
    let from = match parse_address(&from) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let to = match parse_address(&to) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.stable_transfer_blob(&from, &to, amount).await {
        Ok(blob) => Json(BlobResponse { blob }).into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /admin/fund/:address` — sends participation funding from the
/// master account.
async fn fund_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let parsed = match parse_address(&address) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state.service.fund_account(&parsed).await {
        Ok(txid) => (StatusCode::CREATED, Json(TxidResponse { txid })).into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /admin/clawback/:asset_id/:from/:to/:amount` — claws base units
/// of an asset out of `from` and delivers them to `to`.
async fn clawback_handler(
    Path((asset_id, from, to, amount)): Path<(u64, String, String, u64)>,
    State(state): State<AppState>,
) -> Response {
    let from = match parse_address(&from) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let to = match parse_address(&to) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match state
        .service
        .clawback_transfer(asset_id, &from, &to, amount)
        .await
    {
        Ok(txid) => (StatusCode::CREATED, Json(TxidResponse { txid })).into_response(),
        Err(err) => error_response(err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
