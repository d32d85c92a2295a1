use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{
        locker::{self, LockerStatus},
        locker_rental::{self, RentalStatus},
    },
    errors::ServiceError,
};

use super::Query;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRentalsQuery {
    pub locker_id: Option<Uuid>,
    pub rental_status: Option<RentalStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for ListRentalsQuery {
    type Result = (Vec<locker_rental::Model>, u64);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = locker_rental::Entity::find();
        if let Some(locker_id) = self.locker_id {
            query = query.filter(locker_rental::Column::LockerId.eq(locker_id));
        }
        if let Some(status) = self.rental_status {
            query = query.filter(locker_rental::Column::RentalStatus.eq(status.as_str()));
        }

        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(locker_rental::Column::DateRented)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;

        Ok((items, total))
    }
}

/// Active rentals whose due date has passed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueRentalsQuery {
    pub as_of: DateTime<Utc>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for OverdueRentalsQuery {
    type Result = Vec<locker_rental::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let items = locker_rental::Entity::find()
            .filter(locker_rental::Column::RentalStatus.eq(RentalStatus::Active.as_str()))
            .filter(locker_rental::Column::DateDue.lt(self.as_of))
            .order_by_asc(locker_rental::Column::DateDue)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;
        Ok(items)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerOccupancyQuery {}

#[derive(Debug, Clone, Serialize)]
pub struct LockerOccupancy {
    pub total: u64,
    pub available: u64,
    pub occupied: u64,
    pub reserved: u64,
    pub maintenance: u64,
    pub out_of_service: u64,
}

#[async_trait]
impl Query for LockerOccupancyQuery {
    type Result = LockerOccupancy;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let count_by = |status: LockerStatus| {
            locker::Entity::find()
                .filter(locker::Column::Status.eq(status.as_str()))
                .count(db)
        };

        Ok(LockerOccupancy {
            total: locker::Entity::find().count(db).await?,
            available: count_by(LockerStatus::Available).await?,
            occupied: count_by(LockerStatus::Occupied).await?,
            reserved: count_by(LockerStatus::Reserved).await?,
            maintenance: count_by(LockerStatus::Maintenance).await?,
            out_of_service: count_by(LockerStatus::OutOfService).await?,
        })
    }
}
