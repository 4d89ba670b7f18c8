//! Payment service
//!
//! Payments follow their own small state machine and never touch stock.

use shared::{Actor, DomainError, Payment, PaymentUpdate, Role};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Payment service
#[derive(Clone)]
pub struct PaymentService {
    db: PgPool,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the payment of a booking
    pub async fn get_payment(&self, booking_id: Uuid) -> AppResult<Payment> {
        let mut conn = self.db.acquire().await?;
        fetch_payment(&mut conn, booking_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Payment".to_string()).into())
    }

    /// Move a payment to a new status and record its details
    pub async fn update_payment(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        input: PaymentUpdate,
    ) -> AppResult<Payment> {
        actor.require(&[Role::Accountant])?;

        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, status, method, transaction_id, payment_date, notes,
                   updated_by, created_at, updated_at
            FROM payments
            WHERE booking_id = $1
            FOR UPDATE
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::NotFound("Payment".to_string()))?;

        let status = current.status.transition_to(input.status)?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = $2,
                method = COALESCE($3, method),
                transaction_id = COALESCE($4, transaction_id),
                payment_date = COALESCE($5, payment_date),
                notes = COALESCE($6, notes),
                updated_by = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, booking_id, status, method, transaction_id, payment_date, notes,
                      updated_by, created_at, updated_at
            "#,
        )
        .bind(current.id)
        .bind(status)
        .bind(&input.method)
        .bind(&input.transaction_id)
        .bind(input.payment_date)
        .bind(&input.notes)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking_id,
            from = current.status.as_str(),
            to = payment.status.as_str(),
            actor = %actor.id,
            "payment updated"
        );
        Ok(payment)
    }
}

/// Payment row for a booking
pub(crate) async fn fetch_payment(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> AppResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, booking_id, status, method, transaction_id, payment_date, notes,
               updated_by, created_at, updated_at
        FROM payments
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(payment)
}
