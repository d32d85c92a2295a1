use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "water_supplies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendo_id: Uuid,
    pub supplied_gallons: i32,
    pub used_gallons: i32,
    pub expenses: Decimal,
    pub revenue: Decimal,
    pub supply_date: DateTimeUtc,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn remaining_gallons(&self) -> i32 {
        self.supplied_gallons - self.used_gallons
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::water_vendo::Entity",
        from = "Column::VendoId",
        to = "super::water_vendo::Column::Id"
    )]
    WaterVendo,
}

impl Related<super::water_vendo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WaterVendo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
