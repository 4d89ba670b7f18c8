//! HTTP handlers for product permission requests

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    NewPermissionRequest, PermissionRequest, PermissionRequestFilter, RequestStatus,
    ReviewDecision,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::pagination;
use crate::middleware::CurrentActor;
use crate::services::{PermissionRequestService, ReviewOutcome, SubmittedRequest};
use crate::AppState;

/// Request body for submitting a permission request
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPermissionRequest {
    #[validate(length(min = 1, max = 200))]
    pub supplier_name: String,
    pub product_code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub mrp: Decimal,
    pub selling_price: Decimal,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Reference returned by the file storage service
    #[validate(length(min = 1, max = 500))]
    pub invoice_image: Option<String>,
}

/// Request body for reviewing a permission request
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewPermissionRequest {
    pub decision: ReviewDecision,
    #[validate(length(max = 2000))]
    pub review_notes: Option<String>,
}

/// Query parameters for listing permission requests
#[derive(Debug, Deserialize)]
pub struct ListPermissionRequestsQuery {
    pub status: Option<RequestStatus>,
    pub delivery_man_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Submit a permission request
pub async fn submit_permission_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<SubmitPermissionRequest>,
) -> AppResult<(StatusCode, Json<SubmittedRequest>)> {
    input.validate()?;
    let request = NewPermissionRequest {
        supplier_name: input.supplier_name,
        product_code: input.product_code,
        product_name: input.product_name,
        category: input.category,
        mrp: input.mrp,
        selling_price: input.selling_price,
        quantity: input.quantity,
        invoice_image: input.invoice_image,
    };
    let service =
        PermissionRequestService::new(state.db, state.config.inventory.max_code_attempts);
    let submitted = service.submit_request(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// Approve or reject a permission request
pub async fn review_permission_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ReviewPermissionRequest>,
) -> AppResult<Json<ReviewOutcome>> {
    input.validate()?;
    let service =
        PermissionRequestService::new(state.db, state.config.inventory.max_code_attempts);
    let outcome = service
        .review_request(&actor, request_id, input.decision, input.review_notes)
        .await?;
    Ok(Json(outcome))
}

/// Get a permission request
pub async fn get_permission_request(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<PermissionRequest>> {
    let service =
        PermissionRequestService::new(state.db, state.config.inventory.max_code_attempts);
    let request = service.get_request(request_id).await?;
    Ok(Json(request))
}

/// List permission requests
pub async fn list_permission_requests(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<ListPermissionRequestsQuery>,
) -> AppResult<Json<Vec<PermissionRequest>>> {
    let filter = PermissionRequestFilter {
        status: query.status,
        delivery_man_id: query.delivery_man_id,
    };
    let service =
        PermissionRequestService::new(state.db, state.config.inventory.max_code_attempts);
    let requests = service
        .list_requests(&filter, pagination(query.page, query.per_page))
        .await?;
    Ok(Json(requests))
}
