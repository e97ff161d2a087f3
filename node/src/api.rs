//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the vault node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                             | Description                        |
//! |--------|----------------------------------|------------------------------------|
//! | GET    | `/health`                        | Liveness probe                     |
//! | GET    | `/status`                        | Node and vault status summary      |
//! | GET    | `/vault`                         | Full vault snapshot                |
//! | GET    | `/holders/:identity`             | Holder position snapshot           |
//! | POST   | `/investments`                   | Open an investment request         |
//! | POST   | `/investments/:id/approve`       | Approve (approver role)            |
//! | POST   | `/investments/:id/claim`         | Settle an approved investment      |
//! | POST   | `/investments/:id/approve-claim` | Approve and settle in one call     |
//! | POST   | `/investments/:id/reject`        | Reject and queue the refund        |
//! | POST   | `/withdrawals`                   | Open a withdrawal request          |
//! | POST   | `/withdrawals/:id/approve`       | Approve (approver role)            |
//! | POST   | `/withdrawals/:id/claim`         | Pay out an approved withdrawal     |
//! | POST   | `/withdrawals/:id/approve-claim` | Approve and pay out in one call    |
//! | POST   | `/withdrawals/:id/reject`        | Reject and release frozen shares   |
//! | GET    | `/requests/investments/:id`      | Investment record by id            |
//! | GET    | `/requests/withdrawals/:id`      | Withdrawal record by id            |
//! | POST   | `/refunds/claim`                 | Collect a queued refund            |
//! | POST   | `/emergency-withdraw`            | Paused-only forced exit (config)   |
//! | POST   | `/transfers`                     | Move shares between members        |
//! | POST   | `/operators`                     | Grant or revoke a delegate         |
//! | POST   | `/params`                        | Administer parameters and pause    |
//! | GET    | `/preview/deposit`               | Quote shares for a deposit         |
//! | GET    | `/preview/mint`                  | Quote assets for a mint            |
//! | GET    | `/preview/withdraw`              | Quote shares for a withdrawal      |
//! | GET    | `/preview/redeem`                | Quote assets for a redemption      |
//! | GET    | `/limits/:identity`              | Per-holder operation ceilings      |
//! | GET    | `/events`                        | WebSocket stream of vault events   |
//!
//! ## Refusal mapping
//!
//! Engine refusals translate to HTTP statuses by class: validation is 400,
//! state conflicts are 409, authorization is 403, economic guards are 422,
//! and arithmetic overflow is 500. Every refusal body carries the class
//! label and the engine's message, so clients can branch without parsing
//! prose.
//!
//! Mutating handlers stamp `now` from the node clock exactly once per call;
//! the engine itself never reads time.
//!
//! Request payloads carry amounts as `u64` (query-string and JSON clients
//! rarely speak wider integers) and widen them at the engine boundary.
//! Responses echo the engine's full-width `u128` amounts.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use meridian_vault::account::{HolderView, VaultAccount, VaultView};
use meridian_vault::collaborators::{PauseSwitch, Role, RoleOracle, RoleTable};
use meridian_vault::config::{Amount, Timestamp};
use meridian_vault::error::{ErrorKind, VaultError};
use meridian_vault::events::VaultEvent;
use meridian_vault::ledger::{InvestmentRequest, WithdrawalRequest};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Deployment environment label (e.g., "dev", "staging", "prod").
    pub environment: String,
    /// The vault engine. One write lock per mutation keeps every
    /// operation atomic from admission through commit.
    pub engine: Arc<RwLock<VaultAccount>>,
    /// The pause flag the engine was wired to. Held here as well so
    /// `/params` can flip it without going through the engine.
    pub pause: PauseSwitch,
    /// The role table the engine was wired to. `/params` checks the
    /// config role before touching the pause flag.
    pub roles: RoleTable,
    /// Broadcast channel fanning engine events out to WebSocket clients.
    pub event_tx: broadcast::Sender<VaultEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/vault", get(vault_handler))
        .route("/holders/:identity", get(holder_handler))
        .route("/investments", post(request_investment_handler))
        .route("/investments/:id/approve", post(approve_investment_handler))
        .route("/investments/:id/claim", post(claim_investment_handler))
        .route(
            "/investments/:id/approve-claim",
            post(approve_claim_investment_handler),
        )
        .route("/investments/:id/reject", post(reject_investment_handler))
        .route("/withdrawals", post(request_withdrawal_handler))
        .route("/withdrawals/:id/approve", post(approve_withdrawal_handler))
        .route("/withdrawals/:id/claim", post(claim_withdrawal_handler))
        .route(
            "/withdrawals/:id/approve-claim",
            post(approve_claim_withdrawal_handler),
        )
        .route("/withdrawals/:id/reject", post(reject_withdrawal_handler))
        .route("/requests/investments/:id", get(investment_record_handler))
        .route("/requests/withdrawals/:id", get(withdrawal_record_handler))
        .route("/refunds/claim", post(claim_refund_handler))
        .route("/emergency-withdraw", post(emergency_withdraw_handler))
        .route("/transfers", post(transfer_handler))
        .route("/operators", post(operator_handler))
        .route("/params", post(params_handler))
        .route("/preview/deposit", get(preview_deposit_handler))
        .route("/preview/mint", get(preview_mint_handler))
        .route("/preview/withdraw", get(preview_withdraw_handler))
        .route("/preview/redeem", get(preview_redeem_handler))
        .route("/limits/:identity", get(limits_handler))
        .route("/events", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Engine Access
// ---------------------------------------------------------------------------

/// Translates an engine refusal into an HTTP response.
fn refusal_response(err: &VaultError) -> Response {
    let kind = err.kind();
    let status = match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::EconomicGuard => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Arithmetic => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        kind: kind.as_str().into(),
        error: err.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Runs one mutating engine operation under the write lock.
///
/// Stamps `now` from the node clock, times the call, counts the outcome,
/// and forwards any events the operation recorded to WebSocket
/// subscribers — on refusals too, since a refused fast path may already
/// have committed its approval half. Refusals come back as ready-to-send
/// responses.
fn commit<T>(
    state: &AppState,
    op: impl FnOnce(&mut VaultAccount, Timestamp) -> Result<T, VaultError>,
) -> Result<T, Response> {
    let now = Utc::now().timestamp() as Timestamp;
    let timer = state.metrics.op_duration_seconds.start_timer();
    let mut engine = state.engine.write();
    let mark = engine.event_count();
    let outcome = op(&mut engine, now);
    timer.observe_duration();
    // The engine records an event only after its mutation commits, so
    // anything past the mark is real regardless of the overall outcome.
    for event in engine.events_since(mark) {
        // Send fails only when nobody is subscribed.
        let _ = state.event_tx.send(event.clone());
    }
    match outcome {
        Ok(value) => {
            state.metrics.operations_total.inc();
            Ok(value)
        }
        Err(err) => {
            state.metrics.refusals_total.inc();
            tracing::debug!(kind = err.kind().as_str(), "engine refused: {}", err);
            Err(refusal_response(&err))
        }
    }
}

/// Read-only twin of [`commit`]: shared lock, no counters, no events.
fn inspect<T>(
    state: &AppState,
    op: impl FnOnce(&VaultAccount, Timestamp) -> Result<T, VaultError>,
) -> Result<T, Response> {
    let now = Utc::now().timestamp() as Timestamp;
    let engine = state.engine.read();
    op(&engine, now).map_err(|err| refusal_response(&err))
}

// ---------------------------------------------------------------------------
// Request Payloads
// ---------------------------------------------------------------------------

/// Body for `POST /investments`.
#[derive(Debug, Deserialize)]
pub struct InvestmentBody {
    /// Who is investing (or an operator acting for them).
    pub caller: String,
    /// Caller-chosen request id. Must be unused.
    pub id: String,
    /// Asset units to invest.
    pub amount: u64,
    /// Optional commitment deadline (unix seconds). Zero means none.
    #[serde(default)]
    pub committed_until: u64,
}

/// Body for approve and reject calls on both books.
#[derive(Debug, Deserialize)]
pub struct ApprovalBody {
    pub caller: String,
}

/// Body for `POST /investments/:id/claim` and the fast path.
#[derive(Debug, Deserialize)]
pub struct ClaimBody {
    pub caller: String,
    /// Share recipient. Defaults to the request's investor.
    pub receiver: Option<String>,
}

/// Body for `POST /withdrawals`.
#[derive(Debug, Deserialize)]
pub struct WithdrawalBody {
    pub caller: String,
    pub id: String,
    /// Asset units to withdraw, valued at the current ratio.
    pub amount: u64,
}

/// Body for `POST /refunds/claim`.
#[derive(Debug, Deserialize)]
pub struct RefundBody {
    pub caller: String,
}

/// Body for `POST /emergency-withdraw`.
#[derive(Debug, Deserialize)]
pub struct EmergencyBody {
    /// Config-role caller driving the exit.
    pub caller: String,
    /// The holder being paid out.
    pub holder: String,
    /// Asset units to move.
    pub amount: u64,
}

/// Body for `POST /transfers`.
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub caller: String,
    pub to: String,
    pub shares: u64,
}

/// Body for `POST /operators`.
#[derive(Debug, Deserialize)]
pub struct OperatorBody {
    pub owner: String,
    pub operator: String,
    pub authorized: bool,
}

/// A min/max pair for `POST /params`.
#[derive(Debug, Deserialize)]
pub struct BoundsPatch {
    pub min: u64,
    pub max: u64,
}

/// Body for `POST /params`. Every field is optional; absent fields leave
/// the corresponding parameter untouched.
#[derive(Debug, Deserialize)]
pub struct ParamsBody {
    /// Config-role caller.
    pub caller: String,
    /// Set or clear the pause flag.
    pub paused: Option<bool>,
    /// Replace the investment admission bounds.
    pub investment_bounds: Option<BoundsPatch>,
    /// Replace the withdrawal admission bounds.
    pub withdrawal_bounds: Option<BoundsPatch>,
    /// Replace the growth guard factor. Zero disables the guard.
    pub growth_guard_factor: Option<u64>,
    /// Replace the daily yield rate, in microbips.
    pub daily_yield_rate: Option<u64>,
    /// Open or close the vault to new requests.
    pub open: Option<bool>,
    /// Re-point the custody account.
    pub custodian: Option<String>,
    /// Replace the managed total, subject to the growth guard.
    pub total_value: Option<u64>,
}

/// Query string for asset-denominated previews.
#[derive(Debug, Deserialize)]
pub struct AssetsQuery {
    pub assets: u64,
}

/// Query string for share-denominated previews.
#[derive(Debug, Deserialize)]
pub struct SharesQuery {
    pub shares: u64,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Deployment environment label.
    pub environment: String,
    /// Whether the pause flag is set.
    pub paused: bool,
    /// Whether the vault accepts new requests.
    pub open: bool,
    /// Outstanding share supply.
    pub total_shares: Amount,
    /// Managed total with accrual applied.
    pub total_value: Amount,
    /// Investment requests ever recorded.
    pub investment_requests: usize,
    /// Withdrawal requests ever recorded.
    pub withdrawal_requests: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `POST /refunds/claim`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefundResponse {
    pub investor: String,
    /// Asset units returned.
    pub refunded: Amount,
}

/// Response payload for `POST /emergency-withdraw`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmergencyResponse {
    pub holder: String,
    /// Asset units paid out.
    pub amount: Amount,
    /// Shares burned to cover the payout, rounded against the holder.
    pub shares_burned: Amount,
}

/// Response payload for `POST /transfers`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub from: String,
    pub to: String,
    pub shares: Amount,
}

/// Response payload for `POST /operators`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OperatorResponse {
    pub owner: String,
    pub operator: String,
    pub authorized: bool,
}

/// Response payload for the four `GET /preview/*` endpoints. Always
/// carries both sides of the quoted conversion.
#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub assets: Amount,
    pub shares: Amount,
}

/// Response payload for `GET /limits/:identity`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LimitsResponse {
    pub identity: String,
    /// Largest deposit the vault would admit right now. Zero when closed,
    /// paused, or the identity is not a member.
    pub max_deposit: Amount,
    /// Share equivalent of `max_deposit`.
    pub max_mint: Amount,
    /// Largest withdrawal the holder could request right now.
    pub max_withdraw: Amount,
    /// Share equivalent of `max_withdraw`.
    pub max_redeem: Amount,
}

/// Generic error body returned by REST endpoints on refusal.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Refusal class label: "validation", "state_conflict",
    /// "authorization", "economic_guard", or "arithmetic".
    pub kind: String,
    pub error: String,
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not touch the engine — that belongs in
/// `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns a node and vault status summary.
async fn status_handler(State(state): State<AppState>) -> Result<Json<StatusResponse>, Response> {
    let view = inspect(&state, |engine, now| engine.vault_view(now))?;
    Ok(Json(StatusResponse {
        version: state.version.clone(),
        environment: state.environment.clone(),
        paused: view.paused,
        open: view.params.is_open,
        total_shares: view.total_shares,
        total_value: view.current_total_value,
        investment_requests: view.investment_requests,
        withdrawal_requests: view.withdrawal_requests,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

/// `GET /vault` — returns the full vault snapshot.
async fn vault_handler(State(state): State<AppState>) -> Result<Json<VaultView>, Response> {
    let view = inspect(&state, |engine, now| engine.vault_view(now))?;
    Ok(Json(view))
}

/// `GET /holders/:identity` — returns one holder's position.
///
/// Works for any identity; an account that never invested comes back
/// with zeroes rather than an error.
async fn holder_handler(
    Path(identity): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<HolderView>, Response> {
    let view = inspect(&state, |engine, now| engine.holder_view(&identity, now))?;
    Ok(Json(view))
}

/// `GET /requests/investments/:id` — returns an investment record.
async fn investment_record_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = inspect(&state, |engine, _now| {
        engine.investment_request(&id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `GET /requests/withdrawals/:id` — returns a withdrawal record.
async fn withdrawal_record_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = inspect(&state, |engine, _now| {
        engine.withdrawal_request(&id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `GET /preview/deposit?assets=N` — shares a deposit of `N` would mint.
async fn preview_deposit_handler(
    Query(query): Query<AssetsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, Response> {
    let shares = inspect(&state, |engine, now| {
        engine.preview_deposit(query.assets.into(), now)
    })?;
    Ok(Json(PreviewResponse {
        assets: query.assets.into(),
        shares,
    }))
}

/// `GET /preview/mint?shares=N` — assets needed to mint `N` shares.
async fn preview_mint_handler(
    Query(query): Query<SharesQuery>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, Response> {
    let assets = inspect(&state, |engine, now| {
        engine.preview_mint(query.shares.into(), now)
    })?;
    Ok(Json(PreviewResponse {
        assets,
        shares: query.shares.into(),
    }))
}

/// `GET /preview/withdraw?assets=N` — shares a withdrawal of `N` would charge.
async fn preview_withdraw_handler(
    Query(query): Query<AssetsQuery>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, Response> {
    let shares = inspect(&state, |engine, now| {
        engine.preview_withdraw(query.assets.into(), now)
    })?;
    Ok(Json(PreviewResponse {
        assets: query.assets.into(),
        shares,
    }))
}

/// `GET /preview/redeem?shares=N` — assets redeeming `N` shares pays out.
async fn preview_redeem_handler(
    Query(query): Query<SharesQuery>,
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, Response> {
    let assets = inspect(&state, |engine, now| {
        engine.preview_redeem(query.shares.into(), now)
    })?;
    Ok(Json(PreviewResponse {
        assets,
        shares: query.shares.into(),
    }))
}

/// `GET /limits/:identity` — the four operation ceilings for one holder.
async fn limits_handler(
    Path(identity): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LimitsResponse>, Response> {
    let response = inspect(&state, |engine, now| {
        Ok(LimitsResponse {
            identity: identity.clone(),
            max_deposit: engine.max_deposit(&identity, now)?,
            max_mint: engine.max_mint(&identity, now)?,
            max_withdraw: engine.max_withdraw(&identity, now)?,
            max_redeem: engine.max_redeem(&identity, now)?,
        })
    })?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// Lifecycle Handlers
// ---------------------------------------------------------------------------

/// `POST /investments` — opens an investment request.
///
/// The caller's funds move to custody immediately; shares are minted at
/// claim time, at the ratio prevailing then.
async fn request_investment_handler(
    State(state): State<AppState>,
    Json(body): Json<InvestmentBody>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = commit(&state, |engine, now| {
        engine
            .request_investment(
                &body.caller,
                &body.id,
                body.amount.into(),
                body.committed_until,
                now,
            )
            .map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /investments/:id/approve` — approves a pending investment.
async fn approve_investment_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = commit(&state, |engine, _now| {
        engine.approve_investment(&body.caller, &id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /investments/:id/claim` — settles an approved investment.
///
/// `receiver` defaults to the request's investor. The caller must be the
/// investor, one of their operators, or an approver.
async fn claim_investment_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ClaimBody>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = commit(&state, |engine, now| {
        let receiver = match body.receiver.as_deref() {
            Some(receiver) => receiver.to_string(),
            None => engine.investment_request(&id)?.investor.clone(),
        };
        engine
            .claim_investment(&body.caller, &id, &receiver, now)
            .map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /investments/:id/approve-claim` — approve and settle in one call.
async fn approve_claim_investment_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ClaimBody>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = commit(&state, |engine, now| {
        let receiver = match body.receiver.as_deref() {
            Some(receiver) => receiver.to_string(),
            None => engine.investment_request(&id)?.investor.clone(),
        };
        engine
            .approve_then_claim_investment(&body.caller, &id, &receiver, now)
            .map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /investments/:id/reject` — rejects a pending investment and
/// queues the escrowed funds as a refund.
async fn reject_investment_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<InvestmentRequest>, Response> {
    let record = commit(&state, |engine, _now| {
        engine.reject_investment(&body.caller, &id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /withdrawals` — opens a withdrawal request.
///
/// The share cost is computed at the current ratio, frozen on the record,
/// and reserved against the holder. The returned record carries it in
/// `shares`.
async fn request_withdrawal_handler(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalBody>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = commit(&state, |engine, now| {
        engine
            .request_withdrawal(&body.caller, &body.id, body.amount.into(), now)
            .map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /withdrawals/:id/approve` — approves a pending withdrawal.
async fn approve_withdrawal_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = commit(&state, |engine, _now| {
        engine.approve_withdrawal(&body.caller, &id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /withdrawals/:id/claim` — burns the frozen shares and pays out.
async fn claim_withdrawal_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = commit(&state, |engine, now| {
        engine.claim_withdrawal(&body.caller, &id, now).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /withdrawals/:id/approve-claim` — approve and pay out in one call.
async fn approve_claim_withdrawal_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = commit(&state, |engine, now| {
        engine
            .approve_then_claim_withdrawal(&body.caller, &id, now)
            .map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /withdrawals/:id/reject` — rejects a withdrawal and releases
/// the reserved shares back to the holder.
async fn reject_withdrawal_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ApprovalBody>,
) -> Result<Json<WithdrawalRequest>, Response> {
    let record = commit(&state, |engine, _now| {
        engine.reject_withdrawal(&body.caller, &id).map(|r| r.clone())
    })?;
    Ok(Json(record))
}

/// `POST /refunds/claim` — pays out the caller's queued refund.
async fn claim_refund_handler(
    State(state): State<AppState>,
    Json(body): Json<RefundBody>,
) -> Result<Json<RefundResponse>, Response> {
    let refunded = commit(&state, |engine, _now| engine.claim_refund(&body.caller))?;
    Ok(Json(RefundResponse {
        investor: body.caller,
        refunded,
    }))
}

/// `POST /transfers` — moves spendable shares between allowlisted holders.
async fn transfer_handler(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<TransferResponse>, Response> {
    commit(&state, |engine, now| {
        engine.transfer_shares(&body.caller, &body.to, body.shares.into(), now)
    })?;
    Ok(Json(TransferResponse {
        from: body.caller,
        to: body.to,
        shares: body.shares.into(),
    }))
}

/// `POST /operators` — grants or revokes a claim delegate for the owner.
async fn operator_handler(
    State(state): State<AppState>,
    Json(body): Json<OperatorBody>,
) -> Result<Json<OperatorResponse>, Response> {
    commit(&state, |engine, _now| {
        engine.set_operator(&body.owner, &body.operator, body.authorized)
    })?;
    Ok(Json(OperatorResponse {
        owner: body.owner,
        operator: body.operator,
        authorized: body.authorized,
    }))
}

// ---------------------------------------------------------------------------
// Admin Handlers
// ---------------------------------------------------------------------------

/// `POST /emergency-withdraw` — forced exit while the vault is paused.
///
/// Requires the config role and refuses outright when the vault is not
/// paused; the ordinary two-phase path covers normal operation.
async fn emergency_withdraw_handler(
    State(state): State<AppState>,
    Json(body): Json<EmergencyBody>,
) -> Result<Json<EmergencyResponse>, Response> {
    let shares_burned = commit(&state, |engine, now| {
        engine.emergency_withdraw(&body.caller, &body.holder, body.amount.into(), now)
    })?;
    Ok(Json(EmergencyResponse {
        holder: body.holder,
        amount: body.amount.into(),
        shares_burned,
    }))
}

/// `POST /params` — applies a batch of parameter changes.
///
/// The pause flag is flipped first, outside the engine, after its own
/// config-role check; everything else runs through the engine in the
/// order the fields are declared. A mid-batch refusal leaves the earlier
/// changes applied — callers wanting atomicity send one field at a time.
async fn params_handler(
    State(state): State<AppState>,
    Json(body): Json<ParamsBody>,
) -> Result<Json<VaultView>, Response> {
    if let Some(paused) = body.paused {
        if !state.roles.has_role(&body.caller, Role::Config) {
            let err = VaultError::MissingRole {
                identity: body.caller.clone(),
                role: Role::Config,
            };
            state.metrics.refusals_total.inc();
            return Err(refusal_response(&err));
        }
        state.pause.set(paused);
        tracing::info!(paused, caller = %body.caller, "pause flag updated");
    }

    let view = commit(&state, |engine, now| {
        if let Some(bounds) = &body.investment_bounds {
            engine.set_investment_bounds(&body.caller, bounds.min.into(), bounds.max.into())?;
        }
        if let Some(bounds) = &body.withdrawal_bounds {
            engine.set_withdrawal_bounds(&body.caller, bounds.min.into(), bounds.max.into())?;
        }
        if let Some(factor) = body.growth_guard_factor {
            engine.set_growth_guard(&body.caller, factor)?;
        }
        if let Some(rate) = body.daily_yield_rate {
            engine.set_daily_yield_rate(&body.caller, rate, now)?;
        }
        if let Some(open) = body.open {
            engine.set_open(&body.caller, open)?;
        }
        if let Some(custodian) = &body.custodian {
            engine.set_custodian(&body.caller, custodian)?;
        }
        if let Some(total) = body.total_value {
            engine.update_total_value(&body.caller, total.into(), now)?;
        }
        engine.vault_view(now)
    })?;
    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /events` — WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`VaultEvent`] messages for every engine
/// mutation that commits. The connection is read-only from the server's
/// perspective; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();
    state.metrics.ws_clients.inc();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload.into())).await.is_err() {
                            // Client disconnected.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {
                        // Client messages are ignored — this is a push-only channel.
                    }
                    _ => break, // Disconnected or error.
                }
            }
        }
    }

    state.metrics.ws_clients.dec();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use meridian_vault::account::Collaborators;
    use meridian_vault::collaborators::{Allowlist, AssetBook, OperatorTable};
    use meridian_vault::config::VaultParams;
    use tower::ServiceExt;

    /// Spins up a vault wired for HTTP tests: two funded members, one
    /// custody account, and an "admin" identity holding both roles.
    /// Matching decimals keep shares and units one-to-one.
    fn test_state() -> AppState {
        let allowlist = Allowlist::with_members(["alice", "bob", "custody"]);
        let roles = RoleTable::new();
        roles.grant("admin", Role::Approver);
        roles.grant("admin", Role::Config);
        let assets = AssetBook::new();
        assets.deposit("alice", 1_000_000);
        assets.deposit("bob", 1_000_000);
        let pause = PauseSwitch::new();
        let collaborators = Collaborators {
            allowlist: Box::new(allowlist.clone()),
            roles: Box::new(roles.clone()),
            assets: Box::new(assets.clone()),
            pause: Box::new(pause.clone()),
            operators: Box::new(OperatorTable::new()),
        };
        let params = VaultParams {
            min_investment: 1,
            max_investment: 1_000_000,
            min_withdrawal: 1,
            max_withdrawal: 1_000_000,
            daily_yield_rate: 0,
            growth_guard_factor: 0,
            is_open: true,
        };
        let engine = VaultAccount::new(params, "custody", 6, 6, collaborators).expect("vault");
        let (event_tx, _) = broadcast::channel(64);

        AppState {
            version: "0.1.0-test".into(),
            environment: "test".into(),
            engine: Arc::new(RwLock::new(engine)),
            pause,
            roles,
            event_tx,
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
        }
    }

    /// Sends a GET request and returns the (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a POST request with JSON body and returns (status, body_bytes).
    async fn post_json(
        router: &Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Requests and settles one investment through the fast path.
    async fn seed_investment(router: &Router, who: &str, id: &str, amount: u64) {
        let (status, _) = post_json(
            router,
            "/investments",
            serde_json::json!({ "caller": who, "id": id, "amount": amount }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post_json(
            router,
            &format!("/investments/{}/approve-claim", id),
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // -- 1. Health endpoint still works --------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    // -- 2. Status endpoint reports the vault --------------------------------

    #[tokio::test]
    async fn status_endpoint_reports_the_vault() {
        let router = create_router(test_state());
        let (status, body) = get(&router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.environment, "test");
        assert!(!resp.paused);
        assert!(resp.open);
        assert_eq!(resp.total_shares, 0);
        assert_eq!(resp.investment_requests, 0);
    }

    // -- 3. Investment lifecycle over HTTP -----------------------------------

    #[tokio::test]
    async fn investment_lifecycle_over_http() {
        let router = create_router(test_state());

        let (status, body) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-1", "amount": 50_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let record: InvestmentRequest = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.investor, "alice");
        assert_eq!(record.amount, 50_000);
        assert!(!record.approved);

        let (status, _) = post_json(
            &router,
            "/investments/inv-1/approve",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Explicit receiver: the shares land on bob, not alice.
        let (status, body) = post_json(
            &router,
            "/investments/inv-1/claim",
            serde_json::json!({ "caller": "alice", "receiver": "bob" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let record: InvestmentRequest = serde_json::from_slice(&body).unwrap();
        assert!(record.claimed);

        let (status, body) = get(&router, "/vault").await;
        assert_eq!(status, StatusCode::OK);
        let view: VaultView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.total_shares, 50_000);
        assert_eq!(view.investment_requests, 1);

        let (_, body) = get(&router, "/holders/bob").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 50_000);
    }

    // -- 4. Fast path settles in one call ------------------------------------

    #[tokio::test]
    async fn fast_path_settles_in_one_call() {
        let router = create_router(test_state());
        seed_investment(&router, "alice", "inv-fast", 1_000).await;

        let (_, body) = get(&router, "/holders/alice").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 1_000);
    }

    // -- 5. Withdrawal returns the computed share cost ------------------------

    #[tokio::test]
    async fn withdrawal_returns_computed_shares_and_settles() {
        let router = create_router(test_state());
        seed_investment(&router, "alice", "inv-1", 1_000).await;

        let (status, body) = post_json(
            &router,
            "/withdrawals",
            serde_json::json!({ "caller": "alice", "id": "wd-1", "amount": 400 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let record: WithdrawalRequest = serde_json::from_slice(&body).unwrap();
        assert_eq!(record.shares, 400);

        let (status, _) = post_json(
            &router,
            "/withdrawals/wd-1/approve",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post_json(
            &router,
            "/withdrawals/wd-1/claim",
            serde_json::json!({ "caller": "alice" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&router, "/holders/alice").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 600);

        // The settled record survives on the book.
        let (status, body) = get(&router, "/requests/withdrawals/wd-1").await;
        assert_eq!(status, StatusCode::OK);
        let record: WithdrawalRequest = serde_json::from_slice(&body).unwrap();
        assert!(record.claimed);
    }

    // -- 6. Refusals map onto status codes ------------------------------------

    #[tokio::test]
    async fn refusals_map_onto_status_codes() {
        let router = create_router(test_state());

        // Validation: zero amount.
        let (status, body) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-0", "amount": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "validation");

        // Authorization: bob holds no approver role.
        seed_investment(&router, "alice", "inv-1", 1_000).await;
        let (status, _) = post_json(
            &router,
            "/withdrawals",
            serde_json::json!({ "caller": "alice", "id": "wd-1", "amount": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post_json(
            &router,
            "/withdrawals/wd-1/approve",
            serde_json::json!({ "caller": "bob" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "authorization");

        // State conflict: claim before approval.
        let (status, body) = post_json(
            &router,
            "/withdrawals/wd-1/claim",
            serde_json::json!({ "caller": "alice" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "state_conflict");
    }

    // -- 7. Empty vault refuses withdrawals as an economic guard ---------------

    #[tokio::test]
    async fn empty_vault_withdrawal_is_an_economic_refusal() {
        let router = create_router(test_state());

        let (status, body) = post_json(
            &router,
            "/withdrawals",
            serde_json::json!({ "caller": "alice", "id": "wd-1", "amount": 10 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "economic_guard");
    }

    // -- 8. Rejection queues a refund claimable over HTTP ----------------------

    #[tokio::test]
    async fn rejection_queues_a_refund_claimable_over_http() {
        let router = create_router(test_state());

        let (status, _) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-r", "amount": 2_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post_json(
            &router,
            "/investments/inv-r/reject",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let record: InvestmentRequest = serde_json::from_slice(&body).unwrap();
        assert!(record.rejected);

        let (_, body) = get(&router, "/holders/alice").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.pending_refund, 2_000);

        let (status, body) = post_json(
            &router,
            "/refunds/claim",
            serde_json::json!({ "caller": "alice" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: RefundResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.refunded, 2_000);

        // Nothing left to claim the second time.
        let (status, body) = post_json(
            &router,
            "/refunds/claim",
            serde_json::json!({ "caller": "alice" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "economic_guard");
    }

    // -- 9. Operator can claim for the owner -----------------------------------

    #[tokio::test]
    async fn operator_can_claim_for_the_owner() {
        let router = create_router(test_state());

        let (status, _) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-op", "amount": 1_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = post_json(
            &router,
            "/operators",
            serde_json::json!({ "owner": "alice", "operator": "bob", "authorized": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: OperatorResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.authorized);

        let (status, _) = post_json(
            &router,
            "/investments/inv-op/approve",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Bob claims; the receiver defaults to the investor, alice.
        let (status, _) = post_json(
            &router,
            "/investments/inv-op/claim",
            serde_json::json!({ "caller": "bob" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&router, "/holders/alice").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 1_000);
    }

    // -- 10. Emergency flow requires pause and the config role -----------------

    #[tokio::test]
    async fn emergency_flow_requires_pause_and_config_role() {
        let router = create_router(test_state());
        seed_investment(&router, "alice", "inv-1", 1_000).await;

        // Unpaused: refused as a state conflict.
        let (status, _) = post_json(
            &router,
            "/emergency-withdraw",
            serde_json::json!({ "caller": "admin", "holder": "alice", "amount": 250 }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // Alice cannot pause: no config role.
        let (status, _) = post_json(
            &router,
            "/params",
            serde_json::json!({ "caller": "alice", "paused": true }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_json(
            &router,
            "/params",
            serde_json::json!({ "caller": "admin", "paused": true }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // Paused but alice holds no config role either.
        let (status, _) = post_json(
            &router,
            "/emergency-withdraw",
            serde_json::json!({ "caller": "alice", "holder": "alice", "amount": 250 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = post_json(
            &router,
            "/emergency-withdraw",
            serde_json::json!({ "caller": "admin", "holder": "alice", "amount": 250 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: EmergencyResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.shares_burned, 250);

        let (status, _) = post_json(
            &router,
            "/params",
            serde_json::json!({ "caller": "admin", "paused": false }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = get(&router, "/status").await;
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert!(!resp.paused);
    }

    // -- 11. Params endpoint updates bounds and closes the vault ---------------

    #[tokio::test]
    async fn params_endpoint_updates_bounds_and_closes() {
        let router = create_router(test_state());

        let (status, body) = post_json(
            &router,
            "/params",
            serde_json::json!({
                "caller": "admin",
                "investment_bounds": { "min": 10, "max": 500 },
                "open": false
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let view: VaultView = serde_json::from_slice(&body).unwrap();
        assert_eq!(view.params.min_investment, 10);
        assert_eq!(view.params.max_investment, 500);
        assert!(!view.params.is_open);

        // Closed vault refuses new requests.
        let (status, body) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-late", "amount": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "state_conflict");
    }

    // -- 12. Transfers move shares between members ------------------------------

    #[tokio::test]
    async fn transfers_move_shares_between_members() {
        let router = create_router(test_state());
        seed_investment(&router, "alice", "inv-1", 1_000).await;

        let (status, body) = post_json(
            &router,
            "/transfers",
            serde_json::json!({ "caller": "alice", "to": "bob", "shares": 250 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let resp: TransferResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.shares, 250);

        let (_, body) = get(&router, "/holders/alice").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 750);
        let (_, body) = get(&router, "/holders/bob").await;
        let holder: HolderView = serde_json::from_slice(&body).unwrap();
        assert_eq!(holder.shares, 250);
    }

    // -- 13. Preview and limits quote the current ratio -------------------------

    #[tokio::test]
    async fn preview_and_limits_quote_the_current_ratio() {
        let router = create_router(test_state());
        seed_investment(&router, "alice", "inv-1", 1_000).await;

        let (status, body) = get(&router, "/preview/deposit?assets=100").await;
        assert_eq!(status, StatusCode::OK);
        let quote: PreviewResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(quote.shares, 100);

        let (_, body) = get(&router, "/preview/redeem?shares=60").await;
        let quote: PreviewResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(quote.assets, 60);

        let (status, body) = get(&router, "/limits/alice").await;
        assert_eq!(status, StatusCode::OK);
        let limits: LimitsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(limits.max_deposit, 1_000_000);
        assert_eq!(limits.max_withdraw, 1_000);
        assert_eq!(limits.max_redeem, 1_000);

        // A stranger gets all-zero ceilings.
        let (_, body) = get(&router, "/limits/mallory").await;
        let limits: LimitsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(limits.max_deposit, 0);
        assert_eq!(limits.max_withdraw, 0);
    }

    // -- 14. Committed events reach broadcast subscribers -----------------------

    #[tokio::test]
    async fn committed_events_reach_broadcast_subscribers() {
        let state = test_state();
        let mut rx = state.event_tx.subscribe();
        let router = create_router(state);

        let (status, _) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-1", "amount": 500 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let event = rx.recv().await.expect("event");
        assert_eq!(event.kind.label(), "investment_requested");
    }

    // -- 15. Unknown request ids conflict ---------------------------------------

    #[tokio::test]
    async fn unknown_request_ids_conflict() {
        let router = create_router(test_state());

        let (status, body) = get(&router, "/requests/investments/ghost").await;
        assert_eq!(status, StatusCode::CONFLICT);
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.kind, "state_conflict");

        let (status, _) = post_json(
            &router,
            "/investments/ghost/approve",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    // -- 16. Metrics count commits and refusals ----------------------------------

    #[tokio::test]
    async fn metrics_count_commits_and_refusals() {
        let state = test_state();
        let metrics = Arc::clone(&state.metrics);
        let router = create_router(state);

        let (status, _) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-1", "amount": 100 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post_json(
            &router,
            "/investments",
            serde_json::json!({ "caller": "alice", "id": "inv-2", "amount": 0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let text = metrics.encode().unwrap();
        assert!(text.contains("meridian_vault_operations_total 1"));
        assert!(text.contains("meridian_vault_refusals_total 1"));
    }

    // -- 17. Refused fast path still broadcasts its committed approval --------

    #[tokio::test]
    async fn refused_fast_path_still_broadcasts_the_approval() {
        let state = test_state();
        let mut rx = state.event_tx.subscribe();
        let router = create_router(state);
        seed_investment(&router, "alice", "inv-1", 1_000).await;

        // Revalue the vault above what custody actually holds; a full
        // withdrawal now prices out at more than custody can pay.
        let (status, _) = post_json(
            &router,
            "/params",
            serde_json::json!({ "caller": "admin", "total_value": 2_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = post_json(
            &router,
            "/withdrawals",
            serde_json::json!({ "caller": "alice", "id": "wd-1", "amount": 2_000 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The approval half commits; the custody transfer then refuses the
        // claim half, failing the call as a whole.
        let (status, _) = post_json(
            &router,
            "/withdrawals/wd-1/approve-claim",
            serde_json::json!({ "caller": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = get(&router, "/requests/withdrawals/wd-1").await;
        let record: WithdrawalRequest = serde_json::from_slice(&body).unwrap();
        assert!(record.approved);
        assert!(!record.claimed);

        // Subscribers saw the committed approval despite the refusal.
        let mut labels = Vec::new();
        while let Ok(event) = rx.try_recv() {
            labels.push(event.kind.label());
        }
        assert_eq!(labels.last().copied(), Some("withdrawal_approved"));
    }
}
