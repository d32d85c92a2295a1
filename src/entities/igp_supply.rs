use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A batch of stock supplied to an IGP. `quantity` is capacity,
/// `quantity_sold` is capacity consumed by non-cancelled transactions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "igp_supplies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub igp_id: Uuid,
    pub quantity: i32,
    pub quantity_sold: i32,
    pub unit_cost: Decimal,
    pub expenses: Decimal,
    pub total_revenue: Decimal,
    pub supply_date: DateTimeUtc,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn remaining(&self) -> i32 {
        self.quantity - self.quantity_sold
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::igp::Entity",
        from = "Column::IgpId",
        to = "super::igp::Column::Id"
    )]
    Igp,
    #[sea_orm(has_many = "super::igp_transaction::Entity")]
    IgpTransaction,
}

impl Related<super::igp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Igp.def()
    }
}

impl Related<super::igp_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IgpTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
