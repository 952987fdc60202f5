//! # REST API for Loans
//!
//! Applications, board review, release and repayments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use log::info;
use serde::Deserialize;
use shared::{
    ApplyLoanRequest, LoanApplication, LoanDetailResponse, LoanPayment, LoanStatus, LoanableAmountResponse,
    PageResponse, RecordPaymentRequest, ReleaseLoanRequest, ReviewLoanRequest,
};
use uuid::Uuid;

use super::{ApiError, CurrentMember};
use crate::backend::domain::commands::loans::LoanListQuery;
use crate::backend::domain::commands::pagination::PageRequest;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListLoansParams {
    pub member_id: Option<Uuid>,
    pub status: Option<LoanStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoanableParams {
    pub member_id: Option<Uuid>,
}

/// Create a router for loan related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_loans).post(apply_for_loan))
        .route("/loanable", get(loanable_amount))
        .route("/:id", get(get_loan))
        .route("/:id/approve", post(approve_loan))
        .route("/:id/reject", post(reject_loan))
        .route("/:id/release", post(release_loan))
        .route("/:id/payments", get(list_payments).post(record_payment))
}

pub async fn loanable_amount(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<LoanableParams>,
) -> Result<Json<LoanableAmountResponse>, ApiError> {
    info!("GET /api/loans/loanable - member {:?}", params.member_id);
    Ok(Json(state.loan_service.loanable_amount(&ctx, params.member_id).await?))
}

pub async fn list_loans(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Query(params): Query<ListLoansParams>,
) -> Result<Json<PageResponse<LoanApplication>>, ApiError> {
    info!("GET /api/loans - {:?}", params);
    let query = LoanListQuery {
        member_id: params.member_id,
        status: params.status,
        page: PageRequest::new(params.page, params.page_size),
    };
    Ok(Json(state.loan_service.list_loans(&ctx, query).await?))
}

pub async fn apply_for_loan(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Json(request): Json<ApplyLoanRequest>,
) -> Result<(StatusCode, Json<LoanApplication>), ApiError> {
    info!("POST /api/loans - {:?}", request);
    let loan = state.loan_service.apply_for_loan(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

pub async fn get_loan(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanDetailResponse>, ApiError> {
    info!("GET /api/loans/{}", id);
    Ok(Json(state.loan_service.get_loan(&ctx, id).await?))
}

// Review and release bodies are optional; an empty POST is accepted.

pub async fn approve_loan(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    request: Option<Json<ReviewLoanRequest>>,
) -> Result<Json<LoanApplication>, ApiError> {
    info!("POST /api/loans/{}/approve", id);
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(state.loan_service.approve_loan(&ctx, id, request).await?))
}

pub async fn reject_loan(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    request: Option<Json<ReviewLoanRequest>>,
) -> Result<Json<LoanApplication>, ApiError> {
    info!("POST /api/loans/{}/reject", id);
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(state.loan_service.reject_loan(&ctx, id, request).await?))
}

pub async fn release_loan(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    request: Option<Json<ReleaseLoanRequest>>,
) -> Result<Json<LoanDetailResponse>, ApiError> {
    info!("POST /api/loans/{}/release", id);
    let request = request.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(state.loan_service.release_loan(&ctx, id, request).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<LoanPayment>>, ApiError> {
    info!("GET /api/loans/{}/payments", id);
    Ok(Json(state.loan_service.list_payments(&ctx, id).await?))
}

pub async fn record_payment(
    State(state): State<AppState>,
    CurrentMember(ctx): CurrentMember,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<LoanPayment>), ApiError> {
    info!("POST /api/loans/{}/payments - {}", id, request.amount);
    let payment = state.loan_service.record_payment(&ctx, id, request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
