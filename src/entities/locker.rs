use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Occupancy status. `occupied` is owned by the rental synchronizer: a
/// locker is occupied exactly when an active rental references it.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum LockerStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
    OutOfService,
}

impl LockerStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lockers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub locker_number: String,
    pub section: String,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn status(&self) -> Result<LockerStatus, strum::ParseError> {
        self.status.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::locker_rental::Entity")]
    LockerRental,
}

impl Related<super::locker_rental::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LockerRental.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
