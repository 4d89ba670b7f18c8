//! Route definitions for the TrackIt inventory API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/customers", customer_routes(state.clone()))
        .nest("/products", product_routes(state.clone()))
        .nest("/permission-requests", permission_request_routes(state.clone()))
        .nest("/ledger", ledger_routes(state))
}

/// Booking, delivery and payment routes (protected)
fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_bookings).post(handlers::create_booking))
        .route("/:booking_id", get(handlers::get_booking))
        .route("/:booking_id/approve", post(handlers::approve_booking))
        .route("/:booking_id/reject", post(handlers::reject_booking))
        .route("/:booking_id/delivery", put(handlers::update_delivery))
        .route(
            "/:booking_id/payment",
            get(handlers::get_payment).put(handlers::update_payment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Customer lookup routes (protected)
fn customer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/lookup", get(handlers::lookup_customer))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/categories", get(handlers::list_categories))
        .route("/check", get(handlers::check_inventory))
        .route("/generate-code", post(handlers::generate_product_code))
        .route("/:product_id", get(handlers::get_product))
        .route("/:product_id/price", put(handlers::update_product_price))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Permission request routes (protected)
fn permission_request_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_permission_requests).post(handlers::submit_permission_request),
        )
        .route("/:request_id", get(handlers::get_permission_request))
        .route("/:request_id/review", post(handlers::review_permission_request))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Ledger routes (protected)
fn ledger_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_ledger))
        .route("/summary", get(handlers::ledger_summary))
        .route("/adjustments", post(handlers::record_adjustment))
        .route("/reconcile", get(handlers::reconcile_all))
        .route("/reconcile/:product_id", get(handlers::reconcile_product))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
