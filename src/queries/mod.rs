//! Read-side queries for the dashboard. Mutations live in the service
//! layer; everything here is a plain read against the store.

pub mod fund_request_queries;
pub mod igp_queries;
pub mod rental_queries;
pub mod water_queries;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}
