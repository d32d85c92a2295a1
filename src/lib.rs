//! Organization Ledger API Library
//!
//! This crate provides the core functionality for the organization ledger API:
//! IGP sales accounting, water vendo supply tracking, fund request approvals
//! and locker rentals for a student-organization admin dashboard.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod queries;
pub mod services;
pub mod workflow;

use std::sync::Arc;

use axum::{
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// A page plus summary statistics computed over the whole filtered set,
/// not just the rows on this page.
#[derive(Debug, Serialize)]
pub struct PaginatedSummary<T, S> {
    pub items: Vec<T>,
    pub summary: S,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let igp_routes = Router::new()
        .route("/igps", post(handlers::igp::create_igp))
        .route("/igps", get(handlers::igp::list_igps))
        .route("/igps/:id", get(handlers::igp::get_igp))
        .route("/igps/:id", delete(handlers::igp::delete_igp))
        .route("/igps/:id/summary", get(handlers::igp::igp_summary))
        .route("/igps/:id/supplies", get(handlers::igp::list_igp_supplies))
        .route("/igp-supplies", post(handlers::igp::create_supply))
        .route("/igp-supplies/:id", get(handlers::igp::get_supply))
        .route("/igp-supplies/:id", put(handlers::igp::correct_supply))
        .route("/igp-supplies/:id", delete(handlers::igp::delete_supply))
        .route("/igp-transactions", post(handlers::igp::create_transaction))
        .route("/igp-transactions", get(handlers::igp::list_transactions))
        .route("/igp-transactions/:id", get(handlers::igp::get_transaction))
        .route(
            "/igp-transactions/:id",
            put(handlers::igp::update_transaction),
        )
        .route(
            "/igp-transactions/:id",
            delete(handlers::igp::delete_transaction),
        );

    let water_routes = Router::new()
        .route("/water-vendos", post(handlers::water::create_vendo))
        .route("/water-vendos", get(handlers::water::list_vendos))
        .route("/water-vendos/:id", get(handlers::water::get_vendo))
        .route("/water-vendos/:id", delete(handlers::water::delete_vendo))
        .route(
            "/water-vendos/:id/summary",
            get(handlers::water::vendo_summary),
        )
        .route(
            "/water-supplies",
            post(handlers::water::create_water_supply),
        )
        .route("/water-supplies", get(handlers::water::list_water_supplies))
        .route(
            "/water-supplies/:id",
            get(handlers::water::get_water_supply),
        )
        .route(
            "/water-supplies/:id",
            put(handlers::water::update_water_supply),
        )
        .route(
            "/water-supplies/:id",
            delete(handlers::water::delete_water_supply),
        );

    let fund_request_routes = Router::new()
        .route(
            "/fund-requests",
            post(handlers::fund_requests::create_fund_request),
        )
        .route(
            "/fund-requests",
            get(handlers::fund_requests::list_fund_requests),
        )
        .route(
            "/fund-requests/summary",
            get(handlers::fund_requests::fund_request_summary),
        )
        .route(
            "/fund-requests/:id",
            get(handlers::fund_requests::get_fund_request),
        )
        .route(
            "/fund-requests/:id",
            delete(handlers::fund_requests::delete_fund_request),
        )
        .route(
            "/fund-requests/:id/advance",
            post(handlers::fund_requests::advance_fund_request),
        )
        .route(
            "/fund-requests/:id/reject",
            post(handlers::fund_requests::reject_fund_request),
        )
        .route(
            "/fund-requests/:id/expenses",
            get(handlers::fund_requests::list_expenses),
        )
        .route("/expenses", post(handlers::fund_requests::create_expense))
        .route("/expenses/:id", get(handlers::fund_requests::get_expense))
        .route(
            "/expenses/:id",
            put(handlers::fund_requests::update_expense),
        )
        .route(
            "/expenses/:id/status",
            put(handlers::fund_requests::set_expense_status),
        )
        .route(
            "/expenses/:id",
            delete(handlers::fund_requests::delete_expense),
        );

    let locker_routes = Router::new()
        .route("/lockers", post(handlers::lockers::create_locker))
        .route("/lockers", get(handlers::lockers::list_lockers))
        .route(
            "/lockers/occupancy",
            get(handlers::lockers::locker_occupancy),
        )
        .route("/lockers/:id", get(handlers::lockers::get_locker))
        .route("/lockers/:id", delete(handlers::lockers::delete_locker))
        .route(
            "/lockers/:id/status",
            put(handlers::lockers::set_locker_status),
        )
        .route("/rentals", post(handlers::lockers::create_rental))
        .route("/rentals", get(handlers::lockers::list_rentals))
        .route("/rentals/overdue", get(handlers::lockers::overdue_rentals))
        .route("/rentals/:id", get(handlers::lockers::get_rental))
        .route("/rentals/:id", put(handlers::lockers::update_rental))
        .route("/rentals/:id", delete(handlers::lockers::delete_rental));

    Router::new()
        .merge(igp_routes)
        .merge(water_routes)
        .merge(fund_request_routes)
        .merge(locker_routes)
        .route("/status", get(api_status))
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Ok(Json(ApiResponse::success(status_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_response_carries_data() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, Some("ok"));
        assert!(response.message.is_none());
    }

    #[test]
    fn error_response_carries_message() {
        let response = ApiResponse::<()>::error("oops".into());
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
    }

    #[test]
    fn validation_errors_are_listed() {
        let response = ApiResponse::<()>::validation_errors(vec!["missing".into()]);
        assert_eq!(response.errors.as_ref().map(|e| e.len()), Some(1));
    }
}
