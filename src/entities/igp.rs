use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income-generating project. `total_sold` and `revenue` are derived totals
/// maintained by the ledger engine; they must never be written directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "igps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub igp_type: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub semester: Option<String>,
    pub total_sold: i32,
    pub revenue: Decimal,
    pub status: String,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::igp_supply::Entity")]
    IgpSupply,
    #[sea_orm(has_many = "super::igp_transaction::Entity")]
    IgpTransaction,
}

impl Related<super::igp_supply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IgpSupply.def()
    }
}

impl Related<super::igp_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IgpTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
