use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A fund request moving through the approval pipeline. `status` and
/// `current_step` are owned by the workflow state machine; `utilized_funds`
/// is a derived total over this request's expense transactions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fund_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_code: String,
    pub purpose: String,
    pub amount: Decimal,
    pub utilized_funds: Decimal,
    pub status: String,
    pub current_step: i16,
    pub is_rejected: bool,
    pub rejection_step: Option<i16>,
    pub rejection_reason: Option<String>,
    pub requestor: String,
    pub date_needed: Option<DateTimeUtc>,
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_transaction::Entity")]
    ExpenseTransaction,
}

impl Related<super::expense_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
