//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, loans, users, works};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending API",
        version = "0.1.0",
        description = "Loan policy engine for a finite-copy library catalog",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        // Works
        works::list_works,
        works::search_works,
        works::get_work,
        // Loans
        loans::create_loan,
        loans::return_loan,
        loans::list_active_loans,
        loans::list_overdue,
        loans::run_overdue_sweep,
        // Users
        users::create_user,
        users::get_user,
        users::get_user_loans,
        users::set_blocked,
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadinessResponse,
            auth::LoginRequest,
            loans::CreateLoanRequest,
            loans::ReturnLoanRequest,
            loans::LoanResponse,
            loans::ReturnResponse,
            loans::SweepResponse,
            users::UserInfo,
            users::SetBlockedRequest,
            crate::models::Work,
            crate::models::Loan,
            crate::models::OverdueEntry,
            crate::models::Role,
            crate::models::RoleProfile,
            crate::models::CreateUser,
            crate::error::ErrorResponse,
            crate::error::DenialReason,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication"),
        (name = "works", description = "Catalog lookup"),
        (name = "loans", description = "Loans, returns and overdue handling"),
        (name = "users", description = "User directory")
    )
)]
pub struct ApiDoc;

/// Create the router serving Swagger UI and the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
