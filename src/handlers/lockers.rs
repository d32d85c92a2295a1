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
        locker::{self, LockerStatus},
        locker_rental::{self, RentalStatus},
    },
    queries::{
        rental_queries::{
            ListRentalsQuery, LockerOccupancy, LockerOccupancyQuery, OverdueRentalsQuery,
        },
        Query as _,
    },
    services::{
        lockers::CreateLockerInput,
        rentals::{CreateRentalInput, UpdateRentalInput},
    },
    ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLockerRequest {
    #[validate(length(min = 1, message = "Locker number cannot be empty"))]
    pub locker_number: String,
    #[validate(length(min = 1, message = "Section cannot be empty"))]
    pub section: String,
}

pub async fn create_locker(
    State(state): State<AppState>,
    Json(payload): Json<CreateLockerRequest>,
) -> ApiResult<locker::Model> {
    payload.validate()?;
    let created = state
        .services
        .lockers
        .create_locker(CreateLockerInput {
            locker_number: payload.locker_number,
            section: payload.section,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn list_lockers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<locker::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let (items, total) = state.services.lockers.list_lockers(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    })))
}

pub async fn locker_occupancy(State(state): State<AppState>) -> ApiResult<LockerOccupancy> {
    let occupancy = LockerOccupancyQuery {}.execute(&state.db).await?;
    Ok(Json(ApiResponse::success(occupancy)))
}

pub async fn get_locker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<locker::Model> {
    let model = state.services.lockers.get_locker(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize)]
pub struct LockerStatusRequest {
    pub status: LockerStatus,
}

pub async fn set_locker_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LockerStatusRequest>,
) -> ApiResult<locker::Model> {
    let updated = state
        .services
        .lockers
        .set_locker_status(id, payload.status)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_locker(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.lockers.delete_locker(id).await?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRentalRequest {
    pub locker_id: Uuid,
    #[validate(length(min = 1, message = "Renter name cannot be empty"))]
    pub renter_name: String,
    #[validate(email(message = "Renter email must be valid"))]
    pub renter_email: String,
    pub rental_status: RentalStatus,
    pub date_rented: DateTime<Utc>,
    pub date_due: DateTime<Utc>,
    pub payment_amount: Decimal,
}

pub async fn create_rental(
    State(state): State<AppState>,
    Json(payload): Json<CreateRentalRequest>,
) -> ApiResult<locker_rental::Model> {
    payload.validate()?;
    let created = state
        .services
        .rentals
        .create_rental(CreateRentalInput {
            locker_id: payload.locker_id,
            renter_name: payload.renter_name,
            renter_email: payload.renter_email,
            rental_status: payload.rental_status,
            date_rented: payload.date_rented,
            date_due: payload.date_due,
            payment_amount: payload.payment_amount,
        })
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct RentalListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub locker_id: Option<Uuid>,
    pub rental_status: Option<RentalStatus>,
}

pub async fn list_rentals(
    State(state): State<AppState>,
    Query(query): Query<RentalListQuery>,
) -> ApiResult<PaginatedResponse<locker_rental::Model>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total) = ListRentalsQuery {
        locker_id: query.locker_id,
        rental_status: query.rental_status,
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

pub async fn overdue_rentals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<locker_rental::Model>> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let items = OverdueRentalsQuery {
        as_of: Utc::now(),
        limit,
        offset: (page - 1) * limit,
    }
    .execute(&state.db)
    .await?;
    Ok(Json(ApiResponse::success(items)))
}

pub async fn get_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<locker_rental::Model> {
    let model = state.services.rentals.get_rental(id).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateRentalRequest {
    pub locker_id: Option<Uuid>,
    pub renter_name: Option<String>,
    pub renter_email: Option<String>,
    pub rental_status: Option<RentalStatus>,
    pub date_rented: Option<DateTime<Utc>>,
    pub date_due: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
}

pub async fn update_rental(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRentalRequest>,
) -> ApiResult<locker_rental::Model> {
    let updated = state
        .services
        .rentals
        .update_rental(
            id,
            UpdateRentalInput {
                locker_id: payload.locker_id,
                renter_name: payload.renter_name,
                renter_email: payload.renter_email,
                rental_status: payload.rental_status,
                date_rented: payload.date_rented,
                date_due: payload.date_due,
                payment_amount: payload.payment_amount,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_rental(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.rentals.delete_rental(id).await?;
    Ok(Json(ApiResponse::success(())))
}
