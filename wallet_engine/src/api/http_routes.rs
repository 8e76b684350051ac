use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{
    CashOutRequestRequest, CashOutRequestResponse, CashOutVerifyRequest, CashOutVerifyResponse,
    CreateWalletRequest, ListTransactionsQuery, ProcessActionRequest, ProcessActionResponse,
    TransferRequest, TransferResponse,
};
use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::{Transaction, Wallet};
use crate::domain::error::EngineError;
use crate::domain::repository::TransactionPage;
use crate::domain::types::{Currency, TransactionId};
use crate::facade::WalletEngine;

/// Shared axum state. A single `Arc<WalletEngine>` is the only thing every handler needs —
/// the facade already owns every repository, the idempotency store, the cache and the
/// notification sink.
pub struct AppState {
    pub engine: Arc<WalletEngine>,
}

const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

fn require_idempotency_key(headers: &HeaderMap) -> Result<String, ApiError> {
    let key = headers
        .get("idempotency-key")
        .ok_or(ApiError(EngineError::InvalidData(
            "Idempotency-Key header is required".into(),
        )))?
        .to_str()
        .map_err(|_| ApiError(EngineError::InvalidData("Idempotency-Key header is not valid UTF-8".into())))?;

    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ApiError(EngineError::InvalidData(format!(
            "Idempotency-Key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} characters"
        ))));
    }

    Ok(key.to_string())
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wallets", post(create_wallet))
        .route("/transfers", post(transfer))
        .route("/transfers/action", post(process_action))
        .route("/cash-out/request", post(cash_out_request))
        .route("/cash-out/verify", post(cash_out_verify))
        .route("/webhooks/paysend", post(ingest_deposit_webhook))
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .with_state(state)
}

async fn create_wallet(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<CreateWalletRequest>,
) -> Result<Json<ApiResponse<Wallet>>, ApiError> {
    let currency = Currency::from_str(&payload.currency)
        .map_err(|e| ApiError(EngineError::InvalidData(e)))?;

    let wallet = state
        .engine
        .create_wallet(user_id, &payload.phone_number, currency)
        .await?;

    Ok(Json(ApiResponse::success(wallet)))
}

async fn transfer(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<ApiResponse<TransferResponse>>, ApiError> {
    let outcome = state
        .engine
        .transfer(user_id, &payload.recipient_username, payload.amount)
        .await?;

    Ok(Json(ApiResponse::success(TransferResponse {
        message: "transfer pending recipient acceptance".to_string(),
        reference: outcome.reference,
    })))
}

async fn process_action(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<ProcessActionRequest>,
) -> Result<Json<ApiResponse<ProcessActionResponse>>, ApiError> {
    let caller_wallet_id = state.engine.resolve_owned_wallet(user_id).await?;

    state
        .engine
        .process_action(user_id, caller_wallet_id, &payload.reference, payload.action)
        .await?;

    let message = match payload.action {
        crate::domain::types::TransferAction::Accept => "transfer accepted",
        crate::domain::types::TransferAction::Reject => "transfer rejected",
    };

    Ok(Json(ApiResponse::success(ProcessActionResponse {
        message: message.to_string(),
    })))
}

async fn cash_out_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(payload): Json<CashOutRequestRequest>,
) -> Result<Json<ApiResponse<CashOutRequestResponse>>, ApiError> {
    let outcome = state.engine.cash_out_request(user_id, payload.amount).await?;

    Ok(Json(ApiResponse::success(CashOutRequestResponse {
        withdrawal_code: outcome.withdrawal_code,
        amount: outcome.amount,
        phone_number: outcome.phone_number,
    })))
}

async fn cash_out_verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CashOutVerifyRequest>,
) -> Result<Json<ApiResponse<CashOutVerifyResponse>>, ApiError> {
    let idempotency_key = require_idempotency_key(&headers)?;

    let outcome = state
        .engine
        .cash_out_verify(&payload.phone_number, &payload.withdrawal_code, &idempotency_key)
        .await?;

    Ok(Json(ApiResponse::success(CashOutVerifyResponse {
        status: "approved",
        amount: outcome.amount,
        transaction_id: outcome.transaction_id,
    })))
}

async fn ingest_deposit_webhook(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    raw_body: axum::body::Bytes,
) -> Result<Json<ApiResponse<crate::use_cases::ingest_deposit_webhook::WebhookOutcome>>, ApiError> {
    let idempotency_key = require_idempotency_key(&headers)?;
    let signature = headers
        .get("x-paysend-signature")
        .ok_or(ApiError(EngineError::Unauthorized))?
        .to_str()
        .map_err(|_| ApiError(EngineError::Unauthorized))?;

    let outcome = state
        .engine
        .ingest_deposit_webhook(remote.ip(), signature, &idempotency_key, &raw_body)
        .await?;

    Ok(Json(ApiResponse::success(outcome)))
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ApiResponse<TransactionPage>>, ApiError> {
    let page = state
        .engine
        .list_transactions(user_id, query.page, query.page_size)
        .await?;

    Ok(Json(ApiResponse::success(page)))
}

async fn get_transaction(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let transaction = state.engine.get_transaction(user_id, transaction_id).await?;

    Ok(Json(ApiResponse::success(transaction)))
}
