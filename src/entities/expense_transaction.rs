use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    Validated,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub expense_name: String,
    pub amount: Decimal,
    pub status: String,
    pub receipt_reference: Option<String>,
    pub date_incurred: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

impl Model {
    pub fn status(&self) -> Result<ExpenseStatus, strum::ParseError> {
        self.status.parse()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fund_request::Entity",
        from = "Column::RequestId",
        to = "super::fund_request::Column::Id"
    )]
    FundRequest,
}

impl Related<super::fund_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FundRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
