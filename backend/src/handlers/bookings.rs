//! HTTP handlers for bookings and customer lookup

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{
    Booking, BookingAction, BookingFilter, BookingStatus, Customer, NewBooking, NewBookingLine,
    PaymentType,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::pagination;
use crate::middleware::CurrentActor;
use crate::services::{BookingDetail, BookingService, CustomerHistory, CustomerService};
use crate::AppState;

/// Request body for creating a booking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(length(min = 6, max = 30))]
    pub customer_phone: String,
    #[validate(length(min = 1, max = 1000))]
    pub customer_address: String,
    pub payment_type: PaymentType,
    #[validate(length(min = 1, max = 100))]
    pub items: Vec<NewBookingLine>,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(body: CreateBookingRequest) -> Self {
        NewBooking {
            customer: Customer {
                name: body.customer_name,
                phone: body.customer_phone,
                address: body.customer_address,
            },
            payment_type: body.payment_type,
            lines: body.items,
        }
    }
}

/// Query parameters for listing bookings
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<BookingStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Query parameters for customer lookup
#[derive(Debug, Deserialize)]
pub struct CustomerLookupQuery {
    pub phone: String,
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingDetail>)> {
    input.validate()?;
    let service = BookingService::new(state.db);
    let detail = service.create_booking(&actor, input.into()).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List bookings
pub async fn list_bookings(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<ListBookingsQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let filter = BookingFilter {
        status: query.status,
        search: query.search,
    };
    let service = BookingService::new(state.db);
    let bookings = service
        .list_bookings(&filter, pagination(query.page, query.per_page))
        .await?;
    Ok(Json(bookings))
}

/// Get a booking with items, payment and delivery details
pub async fn get_booking(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingDetail>> {
    let service = BookingService::new(state.db);
    let detail = service.get_booking(booking_id).await?;
    Ok(Json(detail))
}

/// Approve a pending booking
pub async fn approve_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let service = BookingService::new(state.db);
    let booking = service
        .review_booking(&actor, booking_id, BookingAction::Approve)
        .await?;
    Ok(Json(booking))
}

/// Reject a pending booking
pub async fn reject_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<Booking>> {
    let service = BookingService::new(state.db);
    let booking = service
        .review_booking(&actor, booking_id, BookingAction::Reject)
        .await?;
    Ok(Json(booking))
}

/// Look up a returning customer by phone
pub async fn lookup_customer(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<CustomerLookupQuery>,
) -> AppResult<Json<Option<CustomerHistory>>> {
    let service = CustomerService::new(state.db);
    let history = service.lookup(&query.phone).await?;
    Ok(Json(history))
}
