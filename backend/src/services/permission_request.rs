//! Product permission requests
//!
//! A storeman asks to bring stock in; an accountant approves or rejects the
//! request once. Approval restocks the product answering to the request's
//! code, or creates it when no such product exists yet.

use serde::Serialize;
use shared::{
    normalize_code, validate_permission_request, Actor, DomainError, LedgerEntry,
    LedgerEntryType, NewLedgerEntry, NewPermissionRequest, Pagination, PermissionRequest,
    PermissionRequestFilter, Product, ProductCategory, Provenance, RequestStatus,
    ReviewDecision, Role,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::ledger::append_entry;
use crate::services::product::{
    code_exists, generate_product_code, insert_product, lock_product_by_code, write_stock_level,
    ProductRecord,
};

/// Permission request service
#[derive(Clone)]
pub struct PermissionRequestService {
    db: PgPool,
    max_code_attempts: u32,
}

/// A freshly submitted request
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedRequest {
    pub request: PermissionRequest,
    /// The code was drawn by the server rather than supplied
    pub code_generated: bool,
    /// Approval will restock an existing product instead of creating one
    pub restocks_existing: bool,
}

/// Result of reviewing a request
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub request: PermissionRequest,
    pub product: Option<Product>,
    pub product_created: bool,
    pub ledger_entry: Option<LedgerEntry>,
}

impl PermissionRequestService {
    /// Create a new PermissionRequestService instance
    pub fn new(db: PgPool, max_code_attempts: u32) -> Self {
        Self {
            db,
            max_code_attempts,
        }
    }

    /// Submit a stock request; no stock moves until it is approved
    pub async fn submit_request(
        &self,
        actor: &Actor,
        input: NewPermissionRequest,
    ) -> AppResult<SubmittedRequest> {
        actor.require(&[Role::Storeman])?;
        validate_permission_request(&input)?;

        let mut tx = self.db.begin().await?;

        let supplied = input
            .product_code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());

        let (code, code_generated) = match supplied {
            Some(code) => (code, false),
            None => {
                let category = ProductCategory::from_name(&input.category);
                let code = generate_product_code(&mut tx, category, self.max_code_attempts).await?;
                (code, true)
            }
        };
        let restocks_existing = !code_generated && code_exists(&mut tx, &code).await?;

        let request = sqlx::query_as::<_, PermissionRequest>(
            r#"
            INSERT INTO product_permission_requests (
                delivery_man_id, supplier_name, product_code, product_name, category,
                mrp, selling_price, quantity, invoice_image, code_generated, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, delivery_man_id, supplier_name, product_code, product_name, category,
                      mrp, selling_price, quantity, invoice_image, code_generated, status, accountant_id,
                      review_notes, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(actor.id)
        .bind(input.supplier_name.trim())
        .bind(&code)
        .bind(input.product_name.trim())
        .bind(input.category.trim())
        .bind(input.mrp)
        .bind(input.selling_price)
        .bind(input.quantity)
        .bind(&input.invoice_image)
        .bind(code_generated)
        .bind(RequestStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            code = %request.product_code,
            restocks_existing,
            actor = %actor.id,
            "permission request submitted"
        );

        Ok(SubmittedRequest {
            request,
            code_generated,
            restocks_existing,
        })
    }

    /// Approve or reject a pending request
    pub async fn review_request(
        &self,
        actor: &Actor,
        request_id: Uuid,
        decision: ReviewDecision,
        review_notes: Option<String>,
    ) -> AppResult<ReviewOutcome> {
        actor.require(&[Role::Accountant])?;

        let mut tx = self.db.begin().await?;

        let request = sqlx::query_as::<_, PermissionRequest>(
            r#"
            SELECT id, delivery_man_id, supplier_name, product_code, product_name, category,
                   mrp, selling_price, quantity, invoice_image, code_generated, status, accountant_id,
                   review_notes, reviewed_at, created_at, updated_at
            FROM product_permission_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::NotFound("Permission request".to_string()))?;

        let status = request.status.review(decision)?;

        let mut product = None;
        let mut product_created = false;
        let mut ledger_entry = None;

        if status == RequestStatus::Approved {
            let restocked = match lock_product_by_code(&mut tx, &request.product_code).await? {
                // A generated code was meant for a new product; never restock a stranger
                Some(_) if request.code_generated => {
                    return Err(DomainError::DuplicateCode(request.product_code.clone()).into());
                }
                Some(existing) => {
                    let level = existing.stock_level().apply(request.quantity)?;
                    write_stock_level(&mut tx, existing.id, level).await?
                }
                None => {
                    product_created = true;
                    insert_product(
                        &mut tx,
                        ProductRecord {
                            code: &request.product_code,
                            sku: None,
                            name: &request.product_name,
                            category: &request.category,
                            description: None,
                            price: request.selling_price,
                            stock_quantity: request.quantity,
                            opening_stock: 0,
                        },
                    )
                    .await?
                }
            };

            let entry = append_entry(
                &mut tx,
                &NewLedgerEntry {
                    product_id: restocked.id,
                    entry_type: LedgerEntryType::Restock,
                    quantity_change: request.quantity,
                    provenance: Provenance::Request(request.id),
                    booking_item_id: None,
                    notes: Some(format!("Supplied by {}", request.supplier_name)),
                    created_by: actor.id,
                },
            )
            .await?;

            product = Some(restocked);
            ledger_entry = Some(entry);
        }

        let request = sqlx::query_as::<_, PermissionRequest>(
            r#"
            UPDATE product_permission_requests
            SET status = $2, accountant_id = $3, review_notes = $4,
                reviewed_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING id, delivery_man_id, supplier_name, product_code, product_name, category,
                      mrp, selling_price, quantity, invoice_image, code_generated, status, accountant_id,
                      review_notes, reviewed_at, created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(status)
        .bind(actor.id)
        .bind(review_notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = %request.id,
            status = %request.status,
            product_id = ?product.as_ref().map(|p| p.id),
            product_created,
            actor = %actor.id,
            "permission request reviewed"
        );

        Ok(ReviewOutcome {
            request,
            product,
            product_created,
            ledger_entry,
        })
    }

    /// Get a request by id
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<PermissionRequest> {
        sqlx::query_as::<_, PermissionRequest>(
            r#"
            SELECT id, delivery_man_id, supplier_name, product_code, product_name, category,
                   mrp, selling_price, quantity, invoice_image, code_generated, status, accountant_id,
                   review_notes, reviewed_at, created_at, updated_at
            FROM product_permission_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Permission request".to_string()).into())
    }

    /// List requests, pending first and newest next
    pub async fn list_requests(
        &self,
        filter: &PermissionRequestFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<PermissionRequest>> {
        let requests = sqlx::query_as::<_, PermissionRequest>(
            r#"
            SELECT id, delivery_man_id, supplier_name, product_code, product_name, category,
                   mrp, selling_price, quantity, invoice_image, code_generated, status, accountant_id,
                   review_notes, reviewed_at, created_at, updated_at
            FROM product_permission_requests
            WHERE ($1::request_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR delivery_man_id = $2)
            ORDER BY (status = 'pending') DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.status)
        .bind(filter.delivery_man_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(requests)
    }
}
