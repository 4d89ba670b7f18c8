//! Returning-customer lookup for the booking form

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{validate_phone, Booking, BookingLineItem, BookingStatus, Customer};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::booking::booking_items;

/// Delivered bookings kept in a customer history
const HISTORY_LIMIT: i64 = 10;

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// What we know about a returning customer
#[derive(Debug, Clone, Serialize)]
pub struct CustomerHistory {
    /// Contact details from the most recent delivered booking
    pub customer: Customer,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub recent_bookings: Vec<Booking>,
    pub last_order_items: Vec<BookingLineItem>,
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Look up a customer's delivered bookings by phone number
    pub async fn lookup(&self, phone: &str) -> AppResult<Option<CustomerHistory>> {
        let phone = phone.trim();
        validate_phone(phone)?;

        let mut conn = self.db.acquire().await?;

        let recent_bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, customer_name, customer_phone, customer_address, payment_type, amount,
                   status, moderator_id, accountant_id, storeman_id, reviewed_at,
                   created_at, updated_at
            FROM bookings
            WHERE customer_phone = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(phone)
        .bind(BookingStatus::Delivered)
        .bind(HISTORY_LIMIT)
        .fetch_all(&mut *conn)
        .await?;

        let Some(latest) = recent_bookings.first() else {
            return Ok(None);
        };

        let (total_orders, total_spent) = sqlx::query_as::<_, (i64, Decimal)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount), 0)
            FROM bookings
            WHERE customer_phone = $1 AND status = $2
            "#,
        )
        .bind(phone)
        .bind(BookingStatus::Delivered)
        .fetch_one(&mut *conn)
        .await?;

        let customer = latest.customer();
        let last_order_items = booking_items(&mut conn, latest.id).await?;

        Ok(Some(CustomerHistory {
            customer,
            total_orders,
            total_spent,
            recent_bookings,
            last_order_items,
        }))
    }
}
