use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::auth::{create_account, login};
use super::handlers::bookings::{book_item, cancel_booking, list_all_bookings};
use super::handlers::inventory::{list_all_inventories, upload_inventories};
use super::handlers::members::{list_all_members, upload_members};
use super::handlers::AppState;

/// Creates the API router with all endpoints
///
/// Authenticated endpoints (bearer token):
/// - POST /book, POST /cancel, GET /all - booking operations
/// - GET /all-members, POST /upload-members - member operations
///
/// Unauthenticated endpoints:
/// - POST /login, POST /create - token issuance and registration
/// - GET /view-all, POST /upload-inventories - inventory operations
///   (mirrors the original wiring; see DESIGN.md)
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Authentication
        .route("/login", post(login))
        .route("/create", post(create_account))
        // Bookings
        .route("/book", post(book_item))
        .route("/cancel", post(cancel_booking))
        .route("/all", get(list_all_bookings))
        // Members
        .route("/all-members", get(list_all_members))
        .route("/upload-members", post(upload_members))
        // Inventory
        .route("/view-all", get(list_all_inventories))
        .route("/upload-inventories", post(upload_inventories))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
