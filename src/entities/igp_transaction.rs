use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Receipt lifecycle of a sale. Only `received` transactions contribute to
/// the parent IGP's sold/revenue totals; `cancelled` ones release supply
/// capacity as well.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Pending,
    Received,
    Cancelled,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "igp_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub igp_id: Uuid,
    pub supply_id: Uuid,
    pub purchaser: String,
    pub batch: Option<String>,
    pub quantity: i32,
    pub unit_price_at_purchase: Decimal,
    pub receipt_status: String,
    pub date_purchased: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn receipt_status(&self) -> Result<ReceiptStatus, strum::ParseError> {
        self.receipt_status.parse()
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
    #[sea_orm(
        belongs_to = "super::igp_supply::Entity",
        from = "Column::SupplyId",
        to = "super::igp_supply::Column::Id"
    )]
    IgpSupply,
}

impl Related<super::igp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Igp.def()
    }
}

impl Related<super::igp_supply::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IgpSupply.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
