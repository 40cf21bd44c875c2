use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::ledger::{LedgerError, LedgerRequest};
use super::risk::{RiskError, RiskRequest};
use crate::models::fraud::{
    ActivityKind, AutomatedAction, DetectionMethod, FraudType, ReviewStatus, Severity,
};
use crate::models::transactions::TransactionType;

#[derive(Clone)]
struct AppState {
    ledger_channel: mpsc::Sender<LedgerRequest>,
    risk_channel: mpsc::Sender<RiskRequest>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn internal(description: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "description": description })),
    )
}

fn ledger_error(e: LedgerError) -> ApiError {
    let status = match &e {
        LedgerError::Validation(_)
        | LedgerError::InsufficientBalance
        | LedgerError::DailyLimitReached { .. }
        | LedgerError::CooldownActive { .. }
        | LedgerError::AlreadySpunToday => StatusCode::BAD_REQUEST,
        LedgerError::AccountNotFound => StatusCode::NOT_FOUND,
        LedgerError::AccountFrozen | LedgerError::AccountSuspended => StatusCode::FORBIDDEN,
        LedgerError::Contention => StatusCode::CONFLICT,
        LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "description": e.to_string() })))
}

fn risk_error(e: RiskError) -> ApiError {
    let status = match &e {
        RiskError::AccountNotFound | RiskError::IncidentNotFound => StatusCode::NOT_FOUND,
        RiskError::Contention => StatusCode::CONFLICT,
        RiskError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "description": e.to_string() })))
}

async fn dispatch<T, R>(
    channel: &mpsc::Sender<T>,
    request: T,
    response: oneshot::Receiver<R>,
) -> Result<R, ApiError> {
    if channel.send(request).await.is_err() {
        return Err(internal("Service unavailable."));
    }

    response.await.map_err(|_| internal("No response from service."))
}

#[derive(Deserialize)]
struct NewAccount {
    username: String,
    referred_by: Option<String>,
}

async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<NewAccount>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::CreateAccount {
        username: req.username,
        referred_by: req.referred_by,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(account)) => (StatusCode::CREATED, Json(json!(account))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::GetBalance {
        account_id,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(balance)) => (StatusCode::OK, Json(json!(balance))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct TransactionsQuery {
    limit: Option<i64>,
}

async fn get_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::GetTransactions {
        account_id,
        limit: query.limit.unwrap_or(20),
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(transactions)) => (StatusCode::OK, Json(json!(transactions))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct AwardRequest {
    amount: i64,
    tx_type: TransactionType,
    description: String,
    related_account: Option<String>,
}

async fn award_coins(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<AwardRequest>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::Award {
        account_id,
        amount: req.amount,
        tx_type: req.tx_type,
        description: req.description,
        related_account: req.related_account,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(record)) => (StatusCode::CREATED, Json(json!(record))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn deduct_coins(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<AwardRequest>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::Deduct {
        account_id,
        amount: req.amount,
        tx_type: req.tx_type,
        description: req.description,
        related_account: req.related_account,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(record)) => (StatusCode::CREATED, Json(json!(record))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn claim_upload_reward(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::ClaimUploadReward {
        account_id,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(json!(outcome))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct ViewRewardRequest {
    views: i64,
}

async fn claim_view_reward(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<ViewRewardRequest>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::ClaimViewReward {
        account_id,
        views: req.views,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(json!(outcome))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn watch_ad(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::WatchAd {
        account_id,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(json!(outcome))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn spin_wheel(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::Spin {
        account_id,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(outcome)) => (StatusCode::OK, Json(json!(outcome))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct GiftRequest {
    recipient_id: String,
    amount: i64,
    message: Option<String>,
}

async fn send_gift(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<GiftRequest>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = LedgerRequest::SendGift {
        sender_id: account_id,
        recipient_id: req.recipient_id,
        amount: req.amount,
        message: req.message,
        response: tx,
    };

    match dispatch(&state.ledger_channel, request, rx).await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "description": "Gift sent." }))),
        Ok(Err(e)) => ledger_error(e),
        Err(e) => e,
    }
}

async fn get_risk_profile(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = RiskRequest::GetRiskProfile {
        account_id,
        response: tx,
    };

    match dispatch(&state.risk_channel, request, rx).await {
        Ok(Ok(profile)) => (StatusCode::OK, Json(json!(profile))),
        Ok(Err(e)) => risk_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct NewSession {
    account_id: String,
    device_id: String,
    ip_address: String,
    user_agent: Option<String>,
}

async fn record_login(
    State(state): State<AppState>,
    Json(req): Json<NewSession>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = RiskRequest::RecordLogin {
        account_id: req.account_id,
        device_id: req.device_id,
        ip_address: req.ip_address,
        user_agent: req.user_agent,
        response: tx,
    };

    match dispatch(&state.risk_channel, request, rx).await {
        Ok(Ok(session)) => (StatusCode::CREATED, Json(json!(session))),
        Ok(Err(e)) => risk_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct FraudReport {
    account_id: String,
    fraud_type: FraudType,
    severity: Severity,
    description: String,
}

async fn report_fraud(
    State(state): State<AppState>,
    Json(req): Json<FraudReport>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = RiskRequest::ReportIncident {
        account_id: req.account_id,
        fraud_type: req.fraud_type,
        severity: req.severity,
        description: req.description,
        evidence: None,
        detection: DetectionMethod::Manual,
        response: tx,
    };

    match dispatch(&state.risk_channel, request, rx).await {
        Ok(Ok(Some(incident))) => (StatusCode::CREATED, Json(json!(incident))),
        Ok(Ok(None)) => (
            StatusCode::OK,
            Json(json!({ "description": "Duplicate incident suppressed." })),
        ),
        Ok(Err(e)) => risk_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct ReviewRequest {
    reviewer_id: String,
    status: ReviewStatus,
    notes: Option<String>,
    action: Option<AutomatedAction>,
}

async fn review_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = RiskRequest::ReviewIncident {
        incident_id,
        reviewer_id: req.reviewer_id,
        status: req.status,
        notes: req.notes,
        action: req.action,
        response: tx,
    };

    match dispatch(&state.risk_channel, request, rx).await {
        Ok(Ok(incident)) => (StatusCode::OK, Json(json!(incident))),
        Ok(Err(e)) => risk_error(e),
        Err(e) => e,
    }
}

#[derive(Deserialize)]
struct ActivityReport {
    kind: ActivityKind,
    count: Option<i64>,
}

async fn note_activity(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(req): Json<ActivityReport>,
) -> impl IntoResponse {
    let (tx, rx) = oneshot::channel();
    let request = RiskRequest::NoteActivity {
        account_id,
        kind: req.kind,
        count: req.count,
        response: tx,
    };

    match dispatch(&state.risk_channel, request, rx).await {
        Ok(Ok(verdict)) => (StatusCode::OK, Json(json!(verdict))),
        Ok(Err(e)) => risk_error(e),
        Err(e) => e,
    }
}

pub async fn start_http_server(
    bind: &str,
    ledger_channel: mpsc::Sender<LedgerRequest>,
    risk_channel: mpsc::Sender<RiskRequest>,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        ledger_channel,
        risk_channel,
    };

    let app = Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/{id}/balance", get(get_balance))
        .route("/accounts/{id}/transactions", get(get_transactions))
        .route("/accounts/{id}/award", post(award_coins))
        .route("/accounts/{id}/deduct", post(deduct_coins))
        .route("/accounts/{id}/rewards/upload", post(claim_upload_reward))
        .route("/accounts/{id}/rewards/views", post(claim_view_reward))
        .route("/accounts/{id}/ads/watch", post(watch_ad))
        .route("/accounts/{id}/spin", post(spin_wheel))
        .route("/accounts/{id}/gift", post(send_gift))
        .route("/accounts/{id}/risk", get(get_risk_profile))
        .route("/accounts/{id}/activity", post(note_activity))
        .route("/sessions", post(record_login))
        .route("/fraud/reports", post(report_fraud))
        .route("/fraud/{id}/review", put(review_incident))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
