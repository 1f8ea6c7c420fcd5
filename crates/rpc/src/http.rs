//! HTTP surface

use crate::context::AppContext;
use crate::error::ApiError;
use crate::service::{CreateAccountRequest, ListAccountsQuery, UpdateAccountRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use dbank_ledger::EntryType;
use dbank_transfer::TransferRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

type ApiResult<T> = Result<T, ApiError>;

/// Build the router for all `/dbank/v1` routes
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/dbank/v1/transactions", post(create_transaction))
        .route("/dbank/v1/transactions/:id", get(get_transaction))
        .route("/dbank/v1/transactions/:id/ledger", get(transaction_ledger))
        .route("/dbank/v1/accounts", post(create_account).get(list_accounts))
        .route(
            "/dbank/v1/accounts/:id",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/dbank/v1/accounts/:id/close", post(close_account))
        .route("/dbank/v1/accounts/:id/transactions", get(account_transactions))
        .route("/dbank/v1/accounts/:id/ledger", get(account_ledger))
        .route("/dbank/v1/accounts/:id/ledger/balance", get(ledger_balance))
        .route("/dbank/v1/accounts/:id/reconciliation", get(reconcile))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn create_transaction(
    State(ctx): State<AppContext>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    let record = ctx.transactions.create_transaction(&request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_transaction(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.transactions.get_transaction(&id).await?))
}

async fn transaction_ledger(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let entries = ctx.ledger.entries_by_transaction(&id).await?;
    Ok(Json(entries))
}

async fn create_account(
    State(ctx): State<AppContext>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    let account = ctx.accounts.create_account(&request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn get_account(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.accounts.get_account(&id).await?))
}

async fn list_accounts(
    State(ctx): State<AppContext>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.accounts.list_accounts(query).await?))
}

async fn update_account(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::invalid_argument(e.body_text()))?;
    Ok(Json(ctx.accounts.update_account(&id, &request).await?))
}

async fn delete_account(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    ctx.accounts.delete_account(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn close_account(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.accounts.close_account(&id).await?))
}

async fn account_transactions(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.accounts.account_transactions(&id).await?))
}

#[derive(Deserialize)]
struct LedgerFilter {
    #[serde(rename = "type")]
    entry_type: Option<String>,
}

/// Entries of an account, optionally only debits or credits (`?type=debit`)
async fn account_ledger(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Query(filter): Query<LedgerFilter>,
) -> ApiResult<impl IntoResponse> {
    let entries = match filter.entry_type.as_deref() {
        None => ctx.ledger.entries_by_account(&id).await?,
        Some(raw) => {
            let entry_type = EntryType::parse(raw)
                .ok_or_else(|| ApiError::invalid_argument(format!("invalid entry type: {raw}")))?;
            ctx.ledger.entries_by_type(entry_type, &id).await?
        }
    };
    Ok(Json(entries))
}

#[derive(Serialize)]
struct LedgerBalance {
    account_id: String,
    balance: Decimal,
}

async fn ledger_balance(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let balance = ctx.ledger.account_balance(&id).await?;
    Ok(Json(LedgerBalance {
        account_id: id,
        balance,
    }))
}

async fn reconcile(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(ctx.reconciler.reconcile(&id).await?))
}
