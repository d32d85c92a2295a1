use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{entities::water_vendo, errors::ServiceError};

#[derive(Debug, Clone)]
pub struct CreateVendoInput {
    pub location: String,
    pub vendo_status: Option<String>,
}

#[derive(Clone)]
pub struct WaterVendoService {
    db: Arc<DatabaseConnection>,
}

impl WaterVendoService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_vendo(
        &self,
        input: CreateVendoInput,
    ) -> Result<water_vendo::Model, ServiceError> {
        let db = self.db.as_ref();
        let existing = water_vendo::Entity::find()
            .filter(water_vendo::Column::Location.eq(input.location.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "water vendo at '{}' already exists",
                input.location
            )));
        }

        let now = Utc::now();
        let model = water_vendo::ActiveModel {
            id: Set(Uuid::new_v4()),
            location: Set(input.location),
            gallons_used: Set(0),
            revenue: Set(Decimal::ZERO),
            total_expenses: Set(Decimal::ZERO),
            vendo_status: Set(input
                .vendo_status
                .unwrap_or_else(|| "operational".to_string())),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(vendo_id = %model.id, location = %model.location, "water vendo registered");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_vendo(&self, id: Uuid) -> Result<water_vendo::Model, ServiceError> {
        water_vendo::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Water vendo {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_vendos(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<water_vendo::Model>, u64), ServiceError> {
        let paginator = water_vendo::Entity::find().paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Deletes a vendo and, by cascade, its supply records.
    #[instrument(skip(self))]
    pub async fn delete_vendo(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        let model = water_vendo::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Water vendo {} not found", id)))?;
        water_vendo::Entity::delete_by_id(model.id).exec(db).await?;
        info!(vendo_id = %id, "water vendo deleted");
        Ok(())
    }
}
