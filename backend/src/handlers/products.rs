//! HTTP handlers for the product catalog and product codes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{NewProduct, Product, ProductCategory, ProductFilter};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::pagination;
use crate::middleware::CurrentActor;
use crate::services::ProductService;
use crate::AppState;

/// Request body for adding a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 8, max = 8))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub opening_stock: i32,
}

/// Request body for a price change
#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price: Decimal,
}

/// Query parameters for listing products
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock_only: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Query parameters for an inventory check
#[derive(Debug, Deserialize)]
pub struct CheckInventoryQuery {
    pub code: Option<String>,
    pub name: Option<String>,
}

/// Request body for drawing a product code
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateCodeRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedCode {
    pub code: String,
    pub category: &'static str,
    pub prefix: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub prefix: &'static str,
}

/// Add a product to the catalog
pub async fn create_product(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    input.validate()?;
    let new_product = NewProduct {
        code: input.code,
        sku: input.sku,
        name: input.name,
        category: input.category,
        description: input.description,
        price: input.price,
        opening_stock: input.opening_stock,
    };
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let product = service.create_product(&actor, new_product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List catalog products
pub async fn list_products(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Query(query): Query<ListProductsQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        search: query.search,
        category: query.category,
        in_stock_only: query.in_stock_only,
    };
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let products = service
        .list_products(&filter, pagination(query.page, query.per_page))
        .await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// Change a product's catalog price
pub async fn update_product_price(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdatePriceRequest>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let product = service
        .update_price(&actor, product_id, input.price)
        .await?;
    Ok(Json(product))
}

/// Find a product by code, legacy SKU or name before requesting stock
pub async fn check_inventory(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<CheckInventoryQuery>,
) -> AppResult<Json<Option<Product>>> {
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let product = service
        .check_inventory(&actor, query.code.as_deref(), query.name.as_deref())
        .await?;
    Ok(Json(product))
}

/// Draw a free product code for a category
pub async fn generate_product_code(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<GenerateCodeRequest>,
) -> AppResult<Json<GeneratedCode>> {
    input.validate()?;
    let service = ProductService::new(state.db, state.config.inventory.max_code_attempts);
    let code = service.generate_code(&actor, &input.category).await?;
    let category = ProductCategory::from_name(&input.category);
    Ok(Json(GeneratedCode {
        code,
        category: category.display_name(),
        prefix: category.prefix(),
    }))
}

/// Categories and their code prefixes
pub async fn list_categories(CurrentActor(_actor): CurrentActor) -> Json<Vec<CategoryInfo>> {
    Json(
        ProductCategory::all()
            .map(|category| CategoryInfo {
                name: category.display_name(),
                prefix: category.prefix(),
            })
            .collect(),
    )
}
