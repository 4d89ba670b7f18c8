//! Booking service: reservation and the accountant review step
//!
//! Creating a booking only *checks* stock; nothing is decremented until the
//! booking is delivered. Approve/reject is a transaction around one conditional
//! UPDATE so concurrent reviews of one booking produce exactly one winner.

use serde::Serialize;
use shared::{
    prepare_lines, quote_booking, validate_customer, Actor, Booking,
    BookingAction, BookingFilter, BookingLineItem, BookingStatus, DeliveryDetails, DomainError,
    NewBooking, Pagination, Payment, Role,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::product::fetch_products;

/// Booking service for reservation, review and booking reads
#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
}

/// A booking with everything hanging off it
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub items: Vec<BookingLineItem>,
    pub payment: Option<Payment>,
    pub delivery: Option<DeliveryDetails>,
}

impl BookingService {
    /// Create a new BookingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Validate, price and persist a booking with its lines and payment
    pub async fn create_booking(&self, actor: &Actor, input: NewBooking) -> AppResult<BookingDetail> {
        actor.require(&[Role::Moderator])?;

        let customer = input.customer.trimmed();
        validate_customer(&customer)?;
        let lines = prepare_lines(&input.lines)?;

        let mut tx = self.db.begin().await?;

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let catalog = fetch_products(&mut tx, &product_ids).await?;
        let quote = quote_booking(&lines, &catalog)?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (customer_name, customer_phone, customer_address,
                                  payment_type, amount, status, moderator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, customer_name, customer_phone, customer_address, payment_type, amount,
                      status, moderator_id, accountant_id, storeman_id, reviewed_at,
                      created_at, updated_at
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(input.payment_type)
        .bind(quote.amount)
        .bind(BookingStatus::Pending)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(quote.lines.len());
        for (position, line) in quote.lines.iter().enumerate() {
            let item = sqlx::query_as::<_, BookingLineItem>(
                r#"
                INSERT INTO booking_items (booking_id, product_id, quantity, unit_price, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, booking_id, product_id, quantity, unit_price
                "#,
            )
            .bind(booking.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (booking_id, status, updated_by)
            VALUES ($1, $2, $3)
            RETURNING id, booking_id, status, method, transaction_id, payment_date, notes,
                      updated_by, created_at, updated_at
            "#,
        )
        .bind(booking.id)
        .bind(input.payment_type.initial_payment_status())
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            amount = %booking.amount,
            lines = items.len(),
            actor = %actor.id,
            "booking created"
        );

        Ok(BookingDetail {
            booking,
            items,
            payment: Some(payment),
            delivery: None,
        })
    }

    /// Approve or reject a pending booking
    pub async fn review_booking(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        action: BookingAction,
    ) -> AppResult<Booking> {
        if !matches!(action, BookingAction::Approve | BookingAction::Reject) {
            return Err(DomainError::validation(
                "action",
                "Bookings are reviewed by approving or rejecting them",
            )
            .into());
        }
        actor.require(&[action.role()])?;

        let mut tx = self.db.begin().await?;

        let reviewed = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $3, accountant_id = $4, reviewed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, customer_name, customer_phone, customer_address, payment_type, amount,
                      status, moderator_id, accountant_id, storeman_id, reviewed_at,
                      created_at, updated_at
            "#,
        )
        .bind(booking_id)
        .bind(action.source())
        .bind(action.target())
        .bind(actor.id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(booking) = reviewed {
            tx.commit().await?;
            tracing::info!(
                booking_id = %booking.id,
                status = %booking.status,
                actor = %actor.id,
                "booking reviewed"
            );
            return Ok(booking);
        }

        // Zero rows: either the booking is missing or someone else moved it first
        let current = sqlx::query_scalar::<_, BookingStatus>(
            "SELECT status FROM bookings WHERE id = $1",
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::NotFound("Booking".to_string()))?;

        Err(DomainError::InvalidTransition {
            entity: "booking",
            from: current.as_str().to_string(),
            requested: action.target().as_str().to_string(),
        }
        .into())
    }

    /// Get a booking with its items, payment and delivery details
    pub async fn get_booking(&self, booking_id: Uuid) -> AppResult<BookingDetail> {
        let mut conn = self.db.acquire().await?;
        let booking = fetch_booking(&mut conn, booking_id).await?;
        load_detail(&mut conn, booking).await
    }

    /// List bookings, pending first and newest next
    pub async fn list_bookings(
        &self,
        filter: &BookingFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Booking>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, customer_name, customer_phone, customer_address, payment_type, amount,
                   status, moderator_id, accountant_id, storeman_id, reviewed_at,
                   created_at, updated_at
            FROM bookings
            WHERE ($1::booking_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR customer_name ILIKE $2 OR customer_phone ILIKE $2)
            ORDER BY (status = 'pending') DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status)
        .bind(search)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(bookings)
    }
}

/// Read a booking without locking it
pub(crate) async fn fetch_booking(conn: &mut PgConnection, booking_id: Uuid) -> AppResult<Booking> {
    sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, customer_name, customer_phone, customer_address, payment_type, amount,
               status, moderator_id, accountant_id, storeman_id, reviewed_at,
               created_at, updated_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::NotFound("Booking".to_string()).into())
}

/// Lock a booking row for the rest of the transaction
pub(crate) async fn lock_booking(conn: &mut PgConnection, booking_id: Uuid) -> AppResult<Booking> {
    sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, customer_name, customer_phone, customer_address, payment_type, amount,
               status, moderator_id, accountant_id, storeman_id, reviewed_at,
               created_at, updated_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::NotFound("Booking".to_string()).into())
}

/// Line items of a booking in the order they were booked
pub(crate) async fn booking_items(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> AppResult<Vec<BookingLineItem>> {
    let items = sqlx::query_as::<_, BookingLineItem>(
        r#"
        SELECT id, booking_id, product_id, quantity, unit_price
        FROM booking_items
        WHERE booking_id = $1
        ORDER BY position
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Delivery details row for a booking, if one was written
pub(crate) async fn delivery_details(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> AppResult<Option<DeliveryDetails>> {
    let details = sqlx::query_as::<_, DeliveryDetails>(
        r#"
        SELECT id, booking_id, delivery_company, tracking_number, delivery_date, notes,
               updated_by, created_at, updated_at
        FROM delivery_details
        WHERE booking_id = $1
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(details)
}

async fn load_detail(conn: &mut PgConnection, booking: Booking) -> AppResult<BookingDetail> {
    let items = booking_items(conn, booking.id).await?;
    let payment = crate::services::payment::fetch_payment(conn, booking.id).await?;
    let delivery = delivery_details(conn, booking.id).await?;

    Ok(BookingDetail {
        booking,
        items,
        payment,
        delivery,
    })
}
