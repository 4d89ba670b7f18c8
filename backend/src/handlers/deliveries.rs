//! HTTP handlers for delivery updates

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DeliveryStatus, DeliveryUpdate};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::{DeliveryOutcome, DeliveryService};
use crate::AppState;

/// Request body for a delivery update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeliveryRequest {
    pub status: DeliveryStatus,
    #[validate(length(max = 100))]
    pub delivery_company: Option<String>,
    #[validate(length(max = 100))]
    pub tracking_number: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<UpdateDeliveryRequest> for DeliveryUpdate {
    fn from(body: UpdateDeliveryRequest) -> Self {
        DeliveryUpdate {
            status: body.status,
            delivery_company: body.delivery_company,
            tracking_number: body.tracking_number,
            delivery_date: body.delivery_date,
            notes: body.notes,
        }
    }
}

/// Mark a booking delivered or not delivered
pub async fn update_delivery(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<UpdateDeliveryRequest>,
) -> AppResult<Json<DeliveryOutcome>> {
    input.validate()?;
    let service = DeliveryService::new(state.db);
    let outcome = service
        .update_delivery(&actor, booking_id, input.into())
        .await?;
    Ok(Json(outcome))
}
