use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        locker::{self, LockerStatus},
        locker_rental::{self, RentalStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateLockerInput {
    pub locker_number: String,
    pub section: String,
}

#[derive(Clone)]
pub struct LockerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl LockerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_locker(
        &self,
        input: CreateLockerInput,
    ) -> Result<locker::Model, ServiceError> {
        let db = self.db.as_ref();
        let existing = locker::Entity::find()
            .filter(locker::Column::LockerNumber.eq(input.locker_number.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "locker '{}' already exists",
                input.locker_number
            )));
        }

        let now = Utc::now();
        let model = locker::ActiveModel {
            id: Set(Uuid::new_v4()),
            locker_number: Set(input.locker_number),
            section: Set(input.section),
            status: Set(LockerStatus::Available.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(locker_id = %model.id, number = %model.locker_number, "locker registered");
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_locker(&self, id: Uuid) -> Result<locker::Model, ServiceError> {
        locker::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Locker {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_lockers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<locker::Model>, u64), ServiceError> {
        let paginator = locker::Entity::find().paginate(self.db.as_ref(), limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Administrative status change (maintenance, out-of-service). `occupied`
    /// is owned by the rental synchronizer and cannot be set here.
    #[instrument(skip(self))]
    pub async fn set_locker_status(
        &self,
        id: Uuid,
        status: LockerStatus,
    ) -> Result<locker::Model, ServiceError> {
        if status == LockerStatus::Occupied {
            return Err(ServiceError::InvalidOperation(
                "occupied is derived from rentals and cannot be set directly".into(),
            ));
        }

        let db = self.db.as_ref();
        let model = self.get_locker(id).await?;
        if model.status == LockerStatus::Occupied.as_str() {
            return Err(ServiceError::LockerUnavailable(format!(
                "locker '{}' has an active rental",
                model.locker_number
            )));
        }

        let old_status = model.status.clone();
        let mut active: locker::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        info!(locker_id = %id, status = %status, "locker status changed");
        self.event_sender
            .send(Event::LockerStatusChanged {
                locker_id: id,
                old_status,
                new_status: updated.status.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a locker. Refused while any active rental references it; the
    /// foreign key restricts the delete otherwise, and historical rentals
    /// must be removed first.
    #[instrument(skip(self))]
    pub async fn delete_locker(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        let model = self.get_locker(id).await?;

        let active_rentals = locker_rental::Entity::find()
            .filter(locker_rental::Column::LockerId.eq(model.id))
            .filter(locker_rental::Column::RentalStatus.eq(RentalStatus::Active.as_str()))
            .count(db)
            .await?;
        if active_rentals > 0 {
            return Err(ServiceError::LockerUnavailable(format!(
                "locker '{}' has an active rental",
                model.locker_number
            )));
        }

        locker::Entity::delete_by_id(model.id).exec(db).await?;
        info!(locker_id = %id, "locker deleted");
        Ok(())
    }
}
