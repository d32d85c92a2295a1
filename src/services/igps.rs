use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::igp,
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateIgpInput {
    pub name: String,
    pub igp_type: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub semester: Option<String>,
}

/// CRUD for income-generating projects. Derived totals (`total_sold`,
/// `revenue`) are owned by the transaction service and never written here.
#[derive(Clone)]
pub struct IgpService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl IgpService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_igp(&self, input: CreateIgpInput) -> Result<igp::Model, ServiceError> {
        if input.unit_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "unit price cannot be negative".into(),
            ));
        }

        let db = self.db.as_ref();
        let existing = igp::Entity::find()
            .filter(igp::Column::Name.eq(input.name.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "IGP '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let model = igp::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            igp_type: Set(input.igp_type),
            description: Set(input.description),
            unit_price: Set(input.unit_price),
            semester: Set(input.semester),
            total_sold: Set(0),
            revenue: Set(Decimal::ZERO),
            status: Set("active".to_string()),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(igp_id = %model.id, name = %model.name, "IGP created");
        self.event_sender
            .send(Event::IgpCreated(model.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_igp(&self, id: Uuid) -> Result<igp::Model, ServiceError> {
        igp::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("IGP {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_igps(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<igp::Model>, u64), ServiceError> {
        let paginator = igp::Entity::find().paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Deletes an IGP and, by cascade, its supplies and transactions.
    #[instrument(skip(self))]
    pub async fn delete_igp(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        let model = igp::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("IGP {} not found", id)))?;

        igp::Entity::delete_by_id(model.id).exec(db).await?;
        info!(igp_id = %id, "IGP deleted");
        self.event_sender
            .send(Event::IgpDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(())
    }
}
