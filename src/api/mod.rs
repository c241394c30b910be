//! API handlers for the lending REST endpoints

pub mod auth;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod users;
pub mod works;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        // Catalog
        .route("/works", get(works::list_works))
        .route("/works/search", get(works::search_works))
        .route("/works/:id", get(works::get_work))
        // Loans
        .route("/loans", post(loans::create_loan))
        .route("/loans/return", post(loans::return_loan))
        .route("/loans/active", get(loans::list_active_loans))
        .route("/loans/overdue", get(loans::list_overdue))
        .route("/loans/sweep", post(loans::run_overdue_sweep))
        // Users
        .route("/users", post(users::create_user))
        .route("/users/:email", get(users::get_user))
        .route("/users/:email/loans", get(users::get_user_loans))
        .route("/users/:email/blocked", put(users::set_blocked))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
