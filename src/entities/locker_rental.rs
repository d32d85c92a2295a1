use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Active,
    Pending,
    Expired,
    Cancelled,
}

impl RentalStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locker_rentals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub locker_id: Uuid,
    pub renter_name: String,
    pub renter_email: String,
    pub rental_status: String,
    pub date_rented: DateTimeUtc,
    pub date_due: DateTimeUtc,
    pub payment_amount: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn rental_status(&self) -> Result<RentalStatus, strum::ParseError> {
        self.rental_status.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locker::Entity",
        from = "Column::LockerId",
        to = "super::locker::Column::Id"
    )]
    Locker,
}

impl Related<super::locker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Locker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
