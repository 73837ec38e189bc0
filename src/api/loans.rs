//! Loan endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, LoanDetails, LoanQuery},
};

use super::{ApiJson, ApiQuery, MessageResponse};

/// Loan list response
#[derive(Serialize, ToSchema)]
pub struct LoansResponse {
    pub success: bool,
    pub loans: Vec<LoanDetails>,
}

/// Single loan response
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub success: bool,
    pub loan: LoanDetails,
}

/// List loans with their book and borrower
#[utoipa::path(
    get,
    path = "/prestamos",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "List of loans", body = LoansResponse)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<Json<LoansResponse>> {
    let loans = state.services.loans.list_loans(&query).await?;

    Ok(Json(LoansResponse {
        success: true,
        loans,
    }))
}

/// Get loan details by ID
#[utoipa::path(
    get,
    path = "/prestamos/{id}",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state.services.loans.get_loan(&id).await?;

    Ok(Json(LoanResponse {
        success: true,
        loan,
    }))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/prestamos",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 200, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Book or user not found, or book not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    ApiJson(request): ApiJson<CreateLoan>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state.services.loans.create_loan(request).await?;

    Ok(Json(LoanResponse {
        success: true,
        loan,
    }))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/prestamos/{id}/return",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 400, description = "Loan already returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state.services.loans.return_loan(&id).await?;

    Ok(Json(LoanResponse {
        success: true,
        loan,
    }))
}

/// Delete a loan record
#[utoipa::path(
    delete,
    path = "/prestamos/{id}",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan deleted", body = MessageResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.loans.delete_loan(&id).await?;

    Ok(Json(MessageResponse::ok("Préstamo eliminado")))
}
