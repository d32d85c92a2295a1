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
    entities::{water_supply, water_vendo},
    queries::{
        water_queries::{
            ListWaterSuppliesQuery, WaterSupplyListSummary, WaterVendoSummary,
            WaterVendoSummaryQuery,
        },
        Query as _,
    },
    services::{
        water_supplies::{CreateWaterSupplyInput, UpdateWaterSupplyInput},
        water_vendos::CreateVendoInput,
    },
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse, PaginatedSummary,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVendoRequest {
    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: String,
    pub vendo_status: Option<String>,
}

pub async fn create_vendo(
    State(state): State<AppState>,
    Json(payload): Json<CreateVendoRequest>,
) -> ApiResult<water_vendo::Model> {
    payload.validate()?;
    let created = state
        .services
        .water_vendos
        .create_vendo(CreateVendoInput {
            location: payload.location,
            vendo_status: payload.vendo_status,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn list_vendos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<water_vendo::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = state.services.water_vendos.list_vendos(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })))
}

pub async fn get_vendo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<water_vendo::Model> {
    let model = state.services.water_vendos.get_vendo(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

pub async fn vendo_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WaterVendoSummary> {
    let summary = WaterVendoSummaryQuery { vendo_id: id }.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn delete_vendo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.water_vendos.delete_vendo(id).await?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWaterSupplyRequest {
    pub vendo_id: Uuid,
    #[validate(range(min = 1, message = "Supplied gallons must be positive"))]
    pub supplied_gallons: i32,
    #[serde(default)]
    pub expenses: Decimal,
    pub supply_date: Option<DateTime<Utc>>,
}

pub async fn create_water_supply(
    State(state): State<AppState>,
    Json(payload): Json<CreateWaterSupplyRequest>,
) -> ApiResult<water_supply::Model> {
    payload.validate()?;
    let created = state
        .services
        .water_supplies
        .create_supply(CreateWaterSupplyInput {
            vendo_id: payload.vendo_id,
            supplied_gallons: payload.supplied_gallons,
            expenses: payload.expenses,
            supply_date: payload.supply_date,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct WaterSupplyListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub vendo_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn list_water_supplies(
    State(state): State<AppState>,
    Query(query): Query<WaterSupplyListQuery>,
) -> ApiResult<PaginatedSummary<water_supply::Model, WaterSupplyListSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total, summary) = ListWaterSuppliesQuery {
        vendo_id: query.vendo_id,
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

pub async fn get_water_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<water_supply::Model> {
    let model = state.services.water_supplies.get_supply(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateWaterSupplyRequest {
    pub used_gallons: Option<i32>,
    pub expenses: Option<Decimal>,
    pub revenue: Option<Decimal>,
}

pub async fn update_water_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWaterSupplyRequest>,
) -> ApiResult<water_supply::Model> {
    let updated = state
        .services
        .water_supplies
        .update_supply(
            id,
            UpdateWaterSupplyInput {
                used_gallons: payload.used_gallons,
                expenses: payload.expenses,
                revenue: payload.revenue,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_water_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.water_supplies.delete_supply(id).await?;
    Ok(Json(ApiResponse::success(())))
}
