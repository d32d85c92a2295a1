use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Water vending machine. `gallons_used`, `revenue` and `total_expenses` are
/// derived totals over this vendo's supply records.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "water_vendos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location: String,
    pub gallons_used: i32,
    pub revenue: Decimal,
    pub total_expenses: Decimal,
    pub vendo_status: String,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::water_supply::Entity")]
    WaterSupply,
}

impl Related<super::water_supply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WaterSupply.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
