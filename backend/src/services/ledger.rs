//! Inventory ledger service
//!
//! `inventory_transactions` is append-only; a trigger rejects UPDATE and
//! DELETE. Every stock write in the backend goes through `append_entry` in
//! the same transaction as the product row change.

use chrono::{DateTime, Utc};
use shared::{
    Actor, BookingStatus, DomainError, LedgerEntry, LedgerEntryType, LedgerFilter, LedgerSummary,
    NewLedgerEntry, Product, Provenance, Reconciliation, Role, StockAdjustment,
};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::product::{lock_products, write_stock_level};

/// Ledger service for stock history, summaries and reconciliation
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
    page_limit: i64,
}

/// Row shape of `inventory_transactions`
#[derive(Debug, FromRow)]
struct LedgerRow {
    id: Uuid,
    product_id: Uuid,
    transaction_type: LedgerEntryType,
    quantity_change: i32,
    booking_id: Option<Uuid>,
    request_id: Option<Uuid>,
    booking_item_id: Option<Uuid>,
    notes: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        LedgerEntry {
            id: row.id,
            product_id: row.product_id,
            entry_type: row.transaction_type,
            quantity_change: row.quantity_change,
            provenance: Provenance::from_columns(row.booking_id, row.request_id),
            booking_item_id: row.booking_item_id,
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Product joined with the sum of its ledger
#[derive(Debug, FromRow)]
struct ProductLedgerRow {
    #[sqlx(flatten)]
    product: Product,
    ledger_total: i64,
}

/// Result of a manual adjustment
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub product: Product,
    pub entry: LedgerEntry,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool, page_limit: i64) -> Self {
        Self { db, page_limit }
    }

    /// List ledger entries, newest first
    pub async fn list_entries(&self, filter: &LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let limit = filter
            .limit
            .unwrap_or(self.page_limit)
            .clamp(1, self.page_limit);

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, product_id, transaction_type, quantity_change, booking_id, request_id,
                   booking_item_id, notes, created_by, created_at
            FROM inventory_transactions
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::inventory_transaction_type IS NULL OR transaction_type = $2)
              AND ($3::uuid IS NULL OR booking_id = $3)
              AND ($4::uuid IS NULL OR request_id = $4)
              AND ($5::date IS NULL OR created_at >= $5::date)
              AND ($6::date IS NULL OR created_at < $6::date + 1)
            ORDER BY created_at DESC, id DESC
            LIMIT $7
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.entry_type)
        .bind(filter.booking_id)
        .bind(filter.request_id)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    /// Entry counts and absolute quantity moved per entry type
    pub async fn summary(&self) -> AppResult<Vec<LedgerSummary>> {
        let rows = sqlx::query_as::<_, (LedgerEntryType, i64, i64)>(
            r#"
            SELECT transaction_type,
                   COUNT(*) AS count,
                   COALESCE(SUM(ABS(quantity_change)), 0)::BIGINT AS total_quantity
            FROM inventory_transactions
            GROUP BY transaction_type
            ORDER BY transaction_type
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(entry_type, count, total_quantity)| LedgerSummary {
                entry_type,
                count,
                total_quantity,
            })
            .collect())
    }

    /// Compare one product's stock with its opening stock plus ledger
    pub async fn reconcile(&self, product_id: Uuid) -> AppResult<Reconciliation> {
        let row = sqlx::query_as::<_, ProductLedgerRow>(
            r#"
            SELECT p.id, p.code, p.sku, p.name, p.category, p.description, p.price,
                   p.stock_quantity, p.backorder_quantity, p.opening_stock,
                   p.created_at, p.updated_at,
                   COALESCE(SUM(t.quantity_change), 0)::BIGINT AS ledger_total
            FROM products p
            LEFT JOIN inventory_transactions t ON t.product_id = p.id
            WHERE p.id = $1
            GROUP BY p.id
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DomainError::ProductNotFound(product_id))?;

        Ok(Reconciliation::compute(&row.product, row.ledger_total))
    }

    /// Reconcile every product in the catalog
    pub async fn reconcile_all(&self) -> AppResult<Vec<Reconciliation>> {
        let rows = sqlx::query_as::<_, ProductLedgerRow>(
            r#"
            SELECT p.id, p.code, p.sku, p.name, p.category, p.description, p.price,
                   p.stock_quantity, p.backorder_quantity, p.opening_stock,
                   p.created_at, p.updated_at,
                   COALESCE(SUM(t.quantity_change), 0)::BIGINT AS ledger_total
            FROM products p
            LEFT JOIN inventory_transactions t ON t.product_id = p.id
            GROUP BY p.id
            ORDER BY p.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let report: Vec<Reconciliation> = rows
            .iter()
            .map(|row| Reconciliation::compute(&row.product, row.ledger_total))
            .collect();

        let unbalanced = report.iter().filter(|r| !r.balanced).count();
        if unbalanced > 0 {
            tracing::warn!(unbalanced, "ledger reconciliation found drift");
        }
        Ok(report)
    }

    /// Record a manual adjustment or customer return
    pub async fn record_adjustment(
        &self,
        actor: &Actor,
        input: StockAdjustment,
    ) -> AppResult<AdjustmentOutcome> {
        actor.require(&[Role::Accountant, Role::Storeman])?;

        if !matches!(
            input.entry_type,
            LedgerEntryType::Adjustment | LedgerEntryType::Return
        ) {
            return Err(DomainError::validation(
                "entry_type",
                "Only adjustment and return entries can be recorded manually",
            )
            .into());
        }

        let entry = NewLedgerEntry {
            product_id: input.product_id,
            entry_type: input.entry_type,
            quantity_change: input.quantity_change,
            provenance: input.provenance(),
            booking_item_id: None,
            notes: input.notes.clone(),
            created_by: actor.id,
        };
        entry.validate()?;

        let mut tx = self.db.begin().await?;

        if let Some(booking_id) = input.booking_id {
            let status = sqlx::query_scalar::<_, BookingStatus>(
                "SELECT status FROM bookings WHERE id = $1",
            )
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DomainError::NotFound("Booking".to_string()))?;

            if status != BookingStatus::Delivered {
                return Err(DomainError::validation(
                    "booking_id",
                    format!("Returns must reference a delivered booking, booking is {}", status),
                )
                .into());
            }
        }

        let products = lock_products(&mut tx, &[input.product_id]).await?;
        let product = products
            .get(&input.product_id)
            .ok_or(DomainError::ProductNotFound(input.product_id))?;

        let level = product.stock_level();
        if input.quantity_change < 0 {
            let requested = input.quantity_change.checked_neg().ok_or_else(|| {
                DomainError::validation("quantity_change", "Quantity change is out of range")
            })?;
            if level.shortfall(requested) > 0 {
                return Err(DomainError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    available: level.on_hand,
                    requested,
                }
                .into());
            }
        }

        let product =
            write_stock_level(&mut tx, product.id, level.apply(input.quantity_change)?).await?;
        let entry = append_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product.id,
            entry_type = entry.entry_type.as_str(),
            quantity_change = entry.quantity_change,
            actor = %actor.id,
            "manual stock entry recorded"
        );
        Ok(AdjustmentOutcome { product, entry })
    }
}

/// Append one entry; callers hold the product row lock
pub(crate) async fn append_entry(
    conn: &mut PgConnection,
    entry: &NewLedgerEntry,
) -> AppResult<LedgerEntry> {
    entry.validate()?;

    let row = sqlx::query_as::<_, LedgerRow>(
        r#"
        INSERT INTO inventory_transactions (
            product_id, transaction_type, quantity_change, booking_id, request_id,
            booking_item_id, notes, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, product_id, transaction_type, quantity_change, booking_id, request_id,
                  booking_item_id, notes, created_by, created_at
        "#,
    )
    .bind(entry.product_id)
    .bind(entry.entry_type)
    .bind(entry.quantity_change)
    .bind(entry.provenance.booking_id())
    .bind(entry.provenance.request_id())
    .bind(entry.booking_item_id)
    .bind(&entry.notes)
    .bind(entry.created_by)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Whether stock already left for `booking_id`
pub(crate) async fn delivery_recorded(conn: &mut PgConnection, booking_id: Uuid) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM inventory_transactions
            WHERE booking_id = $1 AND transaction_type = 'delivery'
        )
        "#,
    )
    .bind(booking_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Delivery entries recorded for `booking_id`, oldest first
pub(crate) async fn delivery_entries(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> AppResult<Vec<LedgerEntry>> {
    let rows = sqlx::query_as::<_, LedgerRow>(
        r#"
        SELECT id, product_id, transaction_type, quantity_change, booking_id, request_id,
               booking_item_id, notes, created_by, created_at
        FROM inventory_transactions
        WHERE booking_id = $1 AND transaction_type = 'delivery'
        ORDER BY created_at, id
        "#,
    )
    .bind(booking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(LedgerEntry::from).collect())
}
