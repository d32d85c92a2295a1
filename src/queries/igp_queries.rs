use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{
        igp,
        igp_supply,
        igp_transaction::{self, ReceiptStatus},
    },
    errors::ServiceError,
};

use super::Query;

/// Transaction listing, filterable by IGP, receipt status and purchase date
/// window. Count, summary and page all consume the same condition so they
/// cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListIgpTransactionsQuery {
    pub igp_id: Option<Uuid>,
    pub receipt_status: Option<ReceiptStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

/// Totals over every transaction the listing filter matches.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionListSummary {
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

impl ListIgpTransactionsQuery {
    fn condition(&self) -> Result<Condition, ServiceError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ServiceError::InvalidDateRange(
                    "end date falls before start date".into(),
                ));
            }
        }

        let mut cond = Condition::all();
        if let Some(igp_id) = self.igp_id {
            cond = cond.add(igp_transaction::Column::IgpId.eq(igp_id));
        }
        if let Some(status) = self.receipt_status {
            cond = cond.add(igp_transaction::Column::ReceiptStatus.eq(status.as_str()));
        }
        if let Some(start) = self.start_date {
            cond = cond.add(igp_transaction::Column::DatePurchased.gte(start));
        }
        if let Some(end) = self.end_date {
            cond = cond.add(igp_transaction::Column::DatePurchased.lte(end));
        }
        Ok(cond)
    }
}

#[async_trait]
impl Query for ListIgpTransactionsQuery {
    type Result = (Vec<igp_transaction::Model>, u64, TransactionListSummary);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let cond = self.condition()?;

        let total = igp_transaction::Entity::find()
            .filter(cond.clone())
            .count(db)
            .await?;

        let (quantity, revenue): (Option<i64>, Option<Decimal>) = igp_transaction::Entity::find()
            .select_only()
            .column_as(igp_transaction::Column::Quantity.sum(), "total_quantity")
            .column_as(
                SimpleExpr::from(Func::sum(
                    Expr::col(igp_transaction::Column::Quantity)
                        .mul(Expr::col(igp_transaction::Column::UnitPriceAtPurchase)),
                )),
                "total_revenue",
            )
            .filter(cond.clone())
            .into_tuple()
            .one(db)
            .await?
            .unwrap_or((None, None));

        let items = igp_transaction::Entity::find()
            .filter(cond)
            .order_by_desc(igp_transaction::Column::DatePurchased)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;

        let summary = TransactionListSummary {
            total_quantity: quantity.unwrap_or(0),
            total_revenue: revenue.unwrap_or(Decimal::ZERO),
        };
        Ok((items, total, summary))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListIgpSuppliesQuery {
    pub igp_id: Uuid,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for ListIgpSuppliesQuery {
    type Result = (Vec<igp_supply::Model>, u64);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let query =
            igp_supply::Entity::find().filter(igp_supply::Column::IgpId.eq(self.igp_id));
        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(igp_supply::Column::SupplyDate)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;
        Ok((items, total))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgpSalesSummaryQuery {
    pub igp_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct IgpSalesSummary {
    pub igp_id: Uuid,
    pub name: String,
    pub total_sold: i32,
    pub revenue: Decimal,
    pub remaining_capacity: i64,
    pub pending_transactions: u64,
    pub received_transactions: u64,
    pub cancelled_transactions: u64,
}

#[async_trait]
impl Query for IgpSalesSummaryQuery {
    type Result = IgpSalesSummary;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let parent = igp::Entity::find_by_id(self.igp_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("IGP {} not found", self.igp_id)))?;

        // Unsold capacity across all supplies of this IGP.
        let (quantity, consumed): (Option<i64>, Option<i64>) = igp_supply::Entity::find()
            .select_only()
            .column_as(igp_supply::Column::Quantity.sum(), "quantity")
            .column_as(igp_supply::Column::QuantitySold.sum(), "consumed")
            .filter(igp_supply::Column::IgpId.eq(parent.id))
            .into_tuple()
            .one(db)
            .await?
            .unwrap_or((None, None));

        let count_by = |status: ReceiptStatus| {
            igp_transaction::Entity::find()
                .filter(igp_transaction::Column::IgpId.eq(parent.id))
                .filter(igp_transaction::Column::ReceiptStatus.eq(status.as_str()))
                .count(db)
        };
        let pending = count_by(ReceiptStatus::Pending).await?;
        let received = count_by(ReceiptStatus::Received).await?;
        let cancelled = count_by(ReceiptStatus::Cancelled).await?;

        Ok(IgpSalesSummary {
            igp_id: parent.id,
            name: parent.name,
            total_sold: parent.total_sold,
            revenue: parent.revenue,
            remaining_capacity: quantity.unwrap_or(0) - consumed.unwrap_or(0),
            pending_transactions: pending,
            received_transactions: received,
            cancelled_transactions: cancelled,
        })
    }
}
