//! Loan management endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Loan, OverdueEntry},
};

/// Create loan request
#[derive(Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Borrower email
    pub email: String,
    /// Work ID
    pub work_id: i32,
}

/// Return request
#[derive(Deserialize, ToSchema)]
pub struct ReturnLoanRequest {
    /// Borrower email
    pub email: String,
    /// Work ID
    pub work_id: i32,
    /// Email of the librarian handling the return
    pub processed_by: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub loan: Loan,
    /// Status message
    pub message: String,
}

/// Return response with loan details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub loan: Loan,
}

#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    /// Users blocked by this sweep
    pub blocked: Vec<String>,
}

/// Borrow a work
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 404, description = "User or work not found"),
        (status = 422, description = "Loan denied by policy", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let loan = state
        .services
        .lending
        .request_loan(&request.email, request.work_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            message: format!("Work {} due on {}", loan.work_id, loan.due_date),
            loan,
        }),
    ))
}

/// Return a borrowed work
#[utoipa::path(
    post,
    path = "/loans/return",
    tag = "loans",
    request_body = ReturnLoanRequest,
    responses(
        (status = 200, description = "Work returned", body = ReturnResponse),
        (status = 400, description = "processed_by is not a librarian"),
        (status = 404, description = "No active loan for this user and work")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<ReturnLoanRequest>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state
        .services
        .lending
        .register_return(&request.email, request.work_id, request.processed_by.as_deref())
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}

/// List all active loans
#[utoipa::path(
    get,
    path = "/loans/active",
    tag = "loans",
    responses(
        (status = 200, description = "Unreturned loans", body = Vec<Loan>)
    )
)]
pub async fn list_active_loans(State(state): State<crate::AppState>) -> Json<Vec<Loan>> {
    Json(state.services.lending.list_active_loans().await)
}

/// List overdue loans and their borrowers
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Overdue loans", body = Vec<OverdueEntry>)
    )
)]
pub async fn list_overdue(State(state): State<crate::AppState>) -> Json<Vec<OverdueEntry>> {
    Json(state.services.lending.list_overdue().await)
}

/// Block every user with an overdue loan
#[utoipa::path(
    post,
    path = "/loans/sweep",
    tag = "loans",
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse)
    )
)]
pub async fn run_overdue_sweep(State(state): State<crate::AppState>) -> Json<SweepResponse> {
    Json(SweepResponse {
        blocked: state.services.lending.overdue_sweep().await,
    })
}
