//! HTTP handlers for booking payments

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{Payment, PaymentStatus, PaymentUpdate};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::CurrentActor;
use crate::services::PaymentService;
use crate::AppState;

/// Request body for a payment update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
    #[validate(length(min = 1, max = 50))]
    pub method: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub transaction_id: Option<String>,
    pub payment_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Get the payment of a booking
pub async fn get_payment(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let service = PaymentService::new(state.db);
    let payment = service.get_payment(booking_id).await?;
    Ok(Json(payment))
}

/// Update the payment of a booking
pub async fn update_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<UpdatePaymentRequest>,
) -> AppResult<Json<Payment>> {
    input.validate()?;
    let update = PaymentUpdate {
        status: input.status,
        method: input.method,
        transaction_id: input.transaction_id,
        payment_date: input.payment_date,
        notes: input.notes,
    };
    let service = PaymentService::new(state.db);
    let payment = service.update_payment(&actor, booking_id, update).await?;
    Ok(Json(payment))
}
