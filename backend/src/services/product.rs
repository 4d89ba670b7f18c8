//! Product catalog service
//!
//! Besides the catalog operations this module owns the row-level helpers the
//! booking, delivery and permission-request services use inside their own
//! transactions: locking product rows, writing stock levels and drawing
//! fresh product codes.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use shared::{
    generate_unique_code, normalize_code, validate_new_product, validate_price,
    Actor, DomainError, NewProduct, Pagination, Product, ProductCategory, ProductFilter,
    RequestStatus, Role, StockLevel,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{map_code_conflict, AppResult};

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    max_code_attempts: u32,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, max_code_attempts: u32) -> Self {
        Self {
            db,
            max_code_attempts,
        }
    }

    /// Add a product to the catalog with its opening stock
    pub async fn create_product(&self, actor: &Actor, input: NewProduct) -> AppResult<Product> {
        actor.require(&[Role::Accountant])?;
        validate_new_product(&input)?;

        let category = ProductCategory::from_name(&input.category);
        let mut tx = self.db.begin().await?;

        let code = match input.code.as_deref().map(normalize_code).filter(|c| !c.is_empty()) {
            Some(code) => {
                if code_exists(&mut tx, &code).await? {
                    return Err(DomainError::DuplicateCode(code).into());
                }
                code
            }
            None => generate_product_code(&mut tx, category, self.max_code_attempts).await?,
        };

        let product = insert_product(
            &mut tx,
            ProductRecord {
                code: &code,
                sku: input.sku.as_deref(),
                name: input.name.trim(),
                category: input.category.trim(),
                description: input.description.as_deref(),
                price: input.price,
                stock_quantity: input.opening_stock,
                opening_stock: input.opening_stock,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = %product.id,
            code = %product.code,
            actor = %actor.id,
            "product created"
        );
        Ok(product)
    }

    /// Change the catalog price; existing bookings keep their snapshot
    pub async fn update_price(
        &self,
        actor: &Actor,
        product_id: Uuid,
        price: Decimal,
    ) -> AppResult<Product> {
        actor.require(&[Role::Accountant])?;
        validate_price(price)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET price = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, code, sku, name, category, description, price,
                      stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(price)
        .fetch_optional(&self.db)
        .await?
        .ok_or(DomainError::ProductNotFound(product_id))?;

        tracing::info!(product_id = %product.id, price = %price, actor = %actor.id, "product price updated");
        Ok(product)
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, sku, name, category, description, price,
                   stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DomainError::ProductNotFound(product_id).into())
    }

    /// List catalog products
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<Product>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, sku, name, category, description, price,
                   stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1 OR sku ILIKE $1)
              AND ($2::text IS NULL OR LOWER(category) = LOWER($2))
              AND (NOT $3 OR stock_quantity > 0)
            ORDER BY name, code
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(search)
        .bind(filter.category.as_deref())
        .bind(filter.in_stock_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Look up a product by code or legacy SKU, optionally matching its name
    pub async fn check_inventory(
        &self,
        actor: &Actor,
        code: Option<&str>,
        name: Option<&str>,
    ) -> AppResult<Option<Product>> {
        actor.require(&[Role::Storeman])?;

        let code = code.map(normalize_code).filter(|c| !c.is_empty());
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if code.is_none() && name.is_none() {
            return Err(DomainError::validation("code", "Provide a product code or name").into());
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, sku, name, category, description, price,
                   stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL OR code = $1 OR UPPER(sku) = $1)
              AND ($2::text IS NULL OR LOWER(name) = LOWER($2))
            ORDER BY (code = $1) DESC NULLS LAST, created_at
            LIMIT 1
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        Ok(product)
    }

    /// Draw a free product code for `category`
    pub async fn generate_code(&self, actor: &Actor, category: &str) -> AppResult<String> {
        actor.require(&[Role::Storeman])?;

        let category = ProductCategory::from_name(category);
        let mut conn = self.db.acquire().await?;
        generate_product_code(&mut conn, category, self.max_code_attempts).await
    }
}

/// Column values for a new product row
pub(crate) struct ProductRecord<'a> {
    pub code: &'a str,
    pub sku: Option<&'a str>,
    pub name: &'a str,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub opening_stock: i32,
}

/// Insert a product; a lost race on the code surfaces as `DuplicateCode`
pub(crate) async fn insert_product(
    conn: &mut PgConnection,
    record: ProductRecord<'_>,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (code, sku, name, category, description, price,
                              stock_quantity, backorder_quantity, opening_stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
        RETURNING id, code, sku, name, category, description, price,
                  stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
        "#,
    )
    .bind(record.code)
    .bind(record.sku)
    .bind(record.name)
    .bind(record.category)
    .bind(record.description)
    .bind(record.price)
    .bind(record.stock_quantity)
    .bind(record.opening_stock)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_code_conflict(e, record.code))
}

/// Read products without locking them
pub(crate) async fn fetch_products(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Product>> {
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, code, sku, name, category, description, price,
               stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
        FROM products
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Lock product rows for update, always in id order
pub(crate) async fn lock_products(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Product>> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids.dedup();

    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, code, sku, name, category, description, price,
               stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    if let Some(missing) = ids.iter().find(|id| !products.iter().any(|p| p.id == **id)) {
        return Err(DomainError::ProductNotFound(*missing).into());
    }

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Lock the product answering to `code`, by code first and legacy SKU second
pub(crate) async fn lock_product_by_code(
    conn: &mut PgConnection,
    code: &str,
) -> AppResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, code, sku, name, category, description, price,
               stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
        FROM products
        WHERE code = $1 OR UPPER(sku) = $1
        ORDER BY (code = $1) DESC
        LIMIT 1
        FOR UPDATE
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Persist a locked product's new stock level
pub(crate) async fn write_stock_level(
    conn: &mut PgConnection,
    product_id: Uuid,
    level: StockLevel,
) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET stock_quantity = $2, backorder_quantity = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING id, code, sku, name, category, description, price,
                  stock_quantity, backorder_quantity, opening_stock, created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(level.on_hand)
    .bind(level.backordered)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::ProductNotFound(product_id).into())
}

/// Whether any product already uses `code` as its code or legacy SKU
pub(crate) async fn code_exists(conn: &mut PgConnection, code: &str) -> AppResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE code = $1 OR UPPER(sku) = $1)",
    )
    .bind(code)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Draw a code for `category` that nothing else holds yet.
///
/// Product codes, legacy SKUs and codes held by pending requests for the
/// prefix are read once; candidates are then checked in memory. The unique
/// constraint on `products.code` still decides races.
pub(crate) async fn generate_product_code(
    conn: &mut PgConnection,
    category: ProductCategory,
    max_attempts: u32,
) -> AppResult<String> {
    let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
        r#"
        SELECT code FROM products WHERE code LIKE $1 || '%'
        UNION
        SELECT UPPER(sku) FROM products WHERE UPPER(sku) LIKE $1 || '%'
        UNION
        SELECT product_code FROM product_permission_requests
        WHERE status = $2 AND product_code LIKE $1 || '%'
        "#,
    )
    .bind(category.prefix())
    .bind(RequestStatus::Pending)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .collect();

    let code = {
        let mut rng = rand::thread_rng();
        generate_unique_code(category, &mut rng, max_attempts, |candidate| {
            taken.contains(candidate)
        })?
    };

    tracing::debug!(category = category.display_name(), code = %code, "product code generated");
    Ok(code)
}
