use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        expense_transaction::{self, ExpenseStatus},
        fund_request,
    },
    queries::{
        fund_request_queries::{
            FundRequestListSummary, FundRequestSummary, FundRequestSummaryQuery, ListExpensesQuery,
            ListFundRequestsQuery,
        },
        Query as _,
    },
    services::{
        expenses::{CreateExpenseInput, UpdateExpenseInput},
        fund_requests::CreateFundRequestInput,
    },
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse, PaginatedSummary,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFundRequestRequest {
    #[validate(length(min = 1, message = "Request code cannot be empty"))]
    pub request_code: String,
    #[validate(length(min = 1, message = "Purpose cannot be empty"))]
    pub purpose: String,
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Requestor cannot be empty"))]
    pub requestor: String,
    pub date_needed: Option<DateTime<Utc>>,
}

pub async fn create_fund_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateFundRequestRequest>,
) -> ApiResult<fund_request::Model> {
    payload.validate()?;
    let created = state
        .services
        .fund_requests
        .create_fund_request(CreateFundRequestInput {
            request_code: payload.request_code,
            purpose: payload.purpose,
            amount: payload.amount,
            requestor: payload.requestor,
            date_needed: payload.date_needed,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct FundRequestListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub requestor: Option<String>,
}

pub async fn list_fund_requests(
    State(state): State<AppState>,
    Query(query): Query<FundRequestListQuery>,
) -> ApiResult<PaginatedSummary<fund_request::Model, FundRequestListSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total, summary) = ListFundRequestsQuery {
        status: query.status,
        requestor: query.requestor,
        limit,
        offset: (page - 1) * limit,
    }
    .execute(&state.db)
    .await?;
    Ok(Json(ApiResponse::success(PaginatedSummary {
        items,
        summary,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })))
}

pub async fn fund_request_summary(
    State(state): State<AppState>,
) -> ApiResult<FundRequestSummary> {
    let summary = FundRequestSummaryQuery {}.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn get_fund_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<fund_request::Model> {
    let model = state.services.fund_requests.get_fund_request(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub to_step: i16,
}

pub async fn advance_fund_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> ApiResult<fund_request::Model> {
    let updated = state
        .services
        .fund_requests
        .advance(id, payload.to_step)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(min = 1, message = "Reason cannot be empty"))]
    pub reason: String,
}

pub async fn reject_fund_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> ApiResult<fund_request::Model> {
    payload.validate()?;
    let updated = state.services.fund_requests.reject(id, payload.reason).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_fund_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.fund_requests.delete_fund_request(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<expense_transaction::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = ListExpensesQuery {
        request_id: id,
        limit,
        offset: (page - 1) * limit,
    }
    .execute(&state.db)
    .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    pub request_id: Uuid,
    #[validate(length(min = 1, message = "Expense name cannot be empty"))]
    pub expense_name: String,
    pub amount: Decimal,
    pub receipt_reference: Option<String>,
    pub date_incurred: Option<DateTime<Utc>>,
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(payload): Json<CreateExpenseRequest>,
) -> ApiResult<expense_transaction::Model> {
    payload.validate()?;
    let created = state
        .services
        .expenses
        .create_expense(CreateExpenseInput {
            request_id: payload.request_id,
            expense_name: payload.expense_name,
            amount: payload.amount,
            receipt_reference: payload.receipt_reference,
            date_incurred: payload.date_incurred,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<expense_transaction::Model> {
    let model = state.services.expenses.get_expense(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateExpenseRequest {
    pub amount: Option<Decimal>,
    pub receipt_reference: Option<String>,
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> ApiResult<expense_transaction::Model> {
    let updated = state
        .services
        .expenses
        .update_expense(
            id,
            UpdateExpenseInput {
                amount: payload.amount,
                receipt_reference: payload.receipt_reference,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

#[derive(Debug, Deserialize)]
pub struct ExpenseStatusRequest {
    pub status: ExpenseStatus,
}

pub async fn set_expense_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseStatusRequest>,
) -> ApiResult<expense_transaction::Model> {
    let updated = state
        .services
        .expenses
        .set_expense_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_expense(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.expenses.delete_expense(id).await?;
    Ok(Json(ApiResponse::success(())))
}
