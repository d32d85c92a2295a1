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
    entities::igp_transaction::ReceiptStatus,
    queries::{
        igp_queries::{
            IgpSalesSummary, IgpSalesSummaryQuery, ListIgpSuppliesQuery, ListIgpTransactionsQuery,
            TransactionListSummary,
        },
        Query as _,
    },
    services::{
        igp_supplies::{CreateSupplyInput, SupplyCorrectionInput},
        igp_transactions::{CreateTransactionInput, UpdateTransactionInput},
        igps::CreateIgpInput,
    },
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse, PaginatedSummary,
};

use crate::entities::{igp, igp_supply, igp_transaction};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIgpRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "IGP type cannot be empty"))]
    pub igp_type: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub semester: Option<String>,
}

pub async fn create_igp(
    State(state): State<AppState>,
    Json(payload): Json<CreateIgpRequest>,
) -> ApiResult<igp::Model> {
    payload.validate()?;
    let created = state
        .services
        .igps
        .create_igp(CreateIgpInput {
            name: payload.name,
            igp_type: payload.igp_type,
            description: payload.description,
            unit_price: payload.unit_price,
            semester: payload.semester,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn list_igps(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<igp::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = state.services.igps.list_igps(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })))
}

pub async fn get_igp(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<igp::Model> {
    let model = state.services.igps.get_igp(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn delete_igp(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.igps.delete_igp(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn igp_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<IgpSalesSummary> {
    let summary = IgpSalesSummaryQuery { igp_id: id }.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn list_igp_supplies(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<igp_supply::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = ListIgpSuppliesQuery {
        igp_id: id,
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
pub struct CreateSupplyRequest {
    pub igp_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub expenses: Decimal,
    pub supply_date: Option<DateTime<Utc>>,
}

pub async fn create_supply(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplyRequest>,
) -> ApiResult<igp_supply::Model> {
    payload.validate()?;
    let created = state
        .services
        .igp_supplies
        .create_supply(CreateSupplyInput {
            igp_id: payload.igp_id,
            quantity: payload.quantity,
            unit_cost: payload.unit_cost,
            expenses: payload.expenses,
            supply_date: payload.supply_date,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn get_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<igp_supply::Model> {
    let model = state.services.igp_supplies.get_supply(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize, Default)]
pub struct CorrectSupplyRequest {
    pub quantity: Option<i32>,
    pub quantity_sold: Option<i32>,
    pub total_revenue: Option<Decimal>,
    pub expenses: Option<Decimal>,
}

pub async fn correct_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CorrectSupplyRequest>,
) -> ApiResult<igp_supply::Model> {
    let updated = state
        .services
        .igp_supplies
        .correct_supply(
            id,
            SupplyCorrectionInput {
                quantity: payload.quantity,
                quantity_sold: payload.quantity_sold,
                total_revenue: payload.total_revenue,
                expenses: payload.expenses,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_supply(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.igp_supplies.delete_supply(id).await?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    pub igp_id: Uuid,
    pub supply_id: Uuid,
    #[validate(length(min = 1, message = "Purchaser cannot be empty"))]
    pub purchaser: String,
    pub batch: Option<String>,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub receipt_status: ReceiptStatus,
    pub date_purchased: Option<DateTime<Utc>>,
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<igp_transaction::Model> {
    payload.validate()?;
    let created = state
        .services
        .igp_transactions
        .create_transaction(CreateTransactionInput {
            igp_id: payload.igp_id,
            supply_id: payload.supply_id,
            purchaser: payload.purchaser,
            batch: payload.batch,
            quantity: payload.quantity,
            receipt_status: payload.receipt_status,
            date_purchased: payload.date_purchased,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub igp_id: Option<Uuid>,
    pub receipt_status: Option<ReceiptStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<PaginatedSummary<igp_transaction::Model, TransactionListSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total, summary) = ListIgpTransactionsQuery {
        igp_id: query.igp_id,
        receipt_status: query.receipt_status,
        start_date: query.start_date,
        end_date: query.end_date,
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

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<igp_transaction::Model> {
    let model = state.services.igp_transactions.get_transaction(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateTransactionRequest {
    pub purchaser: Option<String>,
    pub batch: Option<String>,
    pub quantity: Option<i32>,
    pub receipt_status: Option<ReceiptStatus>,
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> ApiResult<igp_transaction::Model> {
    let updated = state
        .services
        .igp_transactions
        .update_transaction(
            id,
            UpdateTransactionInput {
                purchaser: payload.purchaser,
                batch: payload.batch,
                quantity: payload.quantity,
                receipt_status: payload.receipt_status,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.igp_transactions.delete_transaction(id).await?;
    Ok(Json(ApiResponse::success(())))
}
