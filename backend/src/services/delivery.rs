//! Delivery-commit service
//!
//! Marks an approved booking delivered or not delivered. Delivering moves
//! stock out exactly once per booking: the booking row is locked, the
//! "delivery already recorded" guard runs inside the same transaction, and
//! product rows are locked in id order before their levels are rewritten.

use serde::Serialize;
use shared::{
    delivery_mode, plan_delivery, Actor, Booking, BookingStatus, DeliveryDetails, DeliveryMode,
    DeliveryStatus, DeliveryUpdate, InventoryWarning, LedgerEntry, LedgerEntryType,
    NewLedgerEntry, Provenance,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::booking::{booking_items, lock_booking};
use crate::services::ledger::{append_entry, delivery_entries, delivery_recorded};
use crate::services::product::{lock_products, write_stock_level};

/// Delivery service
#[derive(Clone)]
pub struct DeliveryService {
    db: PgPool,
}

/// Result of a delivery update
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub booking: Booking,
    pub details: DeliveryDetails,
    /// Stock left the shelves during this call
    pub stock_committed: bool,
    /// The booking already carried the requested outcome; only details changed
    pub replayed: bool,
    /// Lines delivered beyond the stock on hand
    pub warnings: Vec<InventoryWarning>,
    /// Delivery entries for the booking
    pub ledger_entries: Vec<LedgerEntry>,
}

impl DeliveryService {
    /// Create a new DeliveryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record the delivery outcome of a booking
    pub async fn update_delivery(
        &self,
        actor: &Actor,
        booking_id: Uuid,
        input: DeliveryUpdate,
    ) -> AppResult<DeliveryOutcome> {
        actor.require(&[input.status.action().role()])?;

        let mut tx = self.db.begin().await?;

        let booking = lock_booking(&mut tx, booking_id).await?;
        let mode = delivery_mode(booking.status, input.status)?;

        if mode == DeliveryMode::Replay {
            let details = upsert_details(&mut tx, booking_id, actor, &input).await?;
            let ledger_entries = delivery_entries(&mut tx, booking_id).await?;
            tx.commit().await?;

            tracing::info!(
                booking_id = %booking_id,
                status = %booking.status,
                actor = %actor.id,
                "delivery details updated"
            );
            return Ok(DeliveryOutcome {
                booking,
                details,
                stock_committed: false,
                replayed: true,
                warnings: Vec::new(),
                ledger_entries,
            });
        }

        let mut warnings = Vec::new();
        let mut stock_committed = false;

        if input.status == DeliveryStatus::Delivered {
            if delivery_recorded(&mut tx, booking_id).await? {
                tracing::warn!(
                    booking_id = %booking_id,
                    "stock already recorded for booking, skipping decrement"
                );
            } else {
                warnings = commit_stock(&mut tx, &booking, actor).await?;
                stock_committed = true;
            }
        }

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, storeman_id = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING id, customer_name, customer_phone, customer_address, payment_type, amount,
                      status, moderator_id, accountant_id, storeman_id, reviewed_at,
                      created_at, updated_at
            "#,
        )
        .bind(booking_id)
        .bind(input.status.booking_status())
        .bind(actor.id)
        .bind(BookingStatus::Approved)
        .fetch_one(&mut *tx)
        .await?;

        let details = upsert_details(&mut tx, booking_id, actor, &input).await?;
        let ledger_entries = delivery_entries(&mut tx, booking_id).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            status = %booking.status,
            stock_committed,
            warnings = warnings.len(),
            actor = %actor.id,
            "delivery recorded"
        );

        Ok(DeliveryOutcome {
            booking,
            details,
            stock_committed,
            replayed: false,
            warnings,
            ledger_entries,
        })
    }
}

/// Take every line of `booking` out of stock, one ledger entry per line
async fn commit_stock(
    conn: &mut PgConnection,
    booking: &Booking,
    actor: &Actor,
) -> AppResult<Vec<InventoryWarning>> {
    let items = booking_items(conn, booking.id).await?;
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products = lock_products(conn, &product_ids).await?;

    let plan = plan_delivery(&items, &products)?;

    let mut levels: Vec<_> = plan.final_levels().into_iter().collect();
    levels.sort_by_key(|(product_id, _)| *product_id);
    for (product_id, level) in levels {
        write_stock_level(conn, product_id, level).await?;
    }

    for movement in &plan.movements {
        append_entry(
            conn,
            &NewLedgerEntry {
                product_id: movement.product_id,
                entry_type: LedgerEntryType::Delivery,
                quantity_change: movement.quantity_change(),
                provenance: Provenance::Booking(booking.id),
                booking_item_id: Some(movement.booking_item_id),
                notes: None,
                created_by: actor.id,
            },
        )
        .await?;
    }

    for warning in &plan.warnings {
        tracing::warn!(
            booking_id = %booking.id,
            product_id = %warning.product_id,
            requested = warning.requested,
            available = warning.available,
            "delivered beyond stock on hand"
        );
    }

    Ok(plan.warnings)
}

/// Insert or overwrite the single delivery details row of a booking
async fn upsert_details(
    conn: &mut PgConnection,
    booking_id: Uuid,
    actor: &Actor,
    input: &DeliveryUpdate,
) -> AppResult<DeliveryDetails> {
    let details = sqlx::query_as::<_, DeliveryDetails>(
        r#"
        INSERT INTO delivery_details (booking_id, delivery_company, tracking_number,
                                      delivery_date, notes, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (booking_id) DO UPDATE
        SET delivery_company = EXCLUDED.delivery_company,
            tracking_number = EXCLUDED.tracking_number,
            delivery_date = EXCLUDED.delivery_date,
            notes = EXCLUDED.notes,
            updated_by = EXCLUDED.updated_by,
            updated_at = NOW()
        RETURNING id, booking_id, delivery_company, tracking_number, delivery_date, notes,
                  updated_by, created_at, updated_at
        "#,
    )
    .bind(booking_id)
    .bind(&input.delivery_company)
    .bind(&input.tracking_number)
    .bind(input.delivery_date)
    .bind(&input.notes)
    .bind(actor.id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(details)
}
