//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{
    LedgerEntry, LedgerEntryType, LedgerFilter, LedgerSummary, Reconciliation, StockAdjustment,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::{AdjustmentOutcome, LedgerService};
use crate::AppState;

/// Query parameters for listing ledger entries
#[derive(Debug, Deserialize)]
pub struct ListLedgerQuery {
    pub product_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub entry_type: Option<LedgerEntryType>,
    pub booking_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// Request body for a manual ledger entry
#[derive(Debug, Deserialize, Validate)]
pub struct RecordAdjustmentRequest {
    pub product_id: Uuid,
    pub entry_type: LedgerEntryType,
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    pub quantity_change: i32,
    pub booking_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000))]
    pub notes: Option<String>,
}

fn ledger_service(state: AppState) -> LedgerService {
    LedgerService::new(state.db, state.config.inventory.ledger_page_limit)
}

/// List ledger entries, newest first
pub async fn list_ledger(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<ListLedgerQuery>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let filter = LedgerFilter {
        product_id: query.product_id,
        entry_type: query.entry_type,
        booking_id: query.booking_id,
        request_id: query.request_id,
        date_from: query.date_from,
        date_to: query.date_to,
        limit: query.limit,
    };
    let entries = ledger_service(state).list_entries(&filter).await?;
    Ok(Json(entries))
}

/// Entry counts and quantities per entry type
pub async fn ledger_summary(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
) -> AppResult<Json<Vec<LedgerSummary>>> {
    let summary = ledger_service(state).summary().await?;
    Ok(Json(summary))
}

/// Reconcile one product against its ledger
pub async fn reconcile_product(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Reconciliation>> {
    let report = ledger_service(state).reconcile(product_id).await?;
    Ok(Json(report))
}

/// Reconcile the whole catalog
pub async fn reconcile_all(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
) -> AppResult<Json<Vec<Reconciliation>>> {
    let report = ledger_service(state).reconcile_all().await?;
    Ok(Json(report))
}

/// Record a manual adjustment or return
pub async fn record_adjustment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<RecordAdjustmentRequest>,
) -> AppResult<(StatusCode, Json<AdjustmentOutcome>)> {
    input.validate()?;
    let adjustment = StockAdjustment {
        product_id: input.product_id,
        entry_type: input.entry_type,
        quantity_change: input.quantity_change,
        booking_id: input.booking_id,
        notes: input.notes,
    };
    let outcome = ledger_service(state)
        .record_adjustment(&actor, adjustment)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
