use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{expense_transaction, fund_request},
    errors::ServiceError,
};

use super::Query;

/// Fund-request listing by status and requestor; the count, the summary
/// and the page share one condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFundRequestsQuery {
    pub status: Option<String>,
    pub requestor: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Totals over every request the listing filter matches.
#[derive(Debug, Clone, Serialize)]
pub struct FundRequestListSummary {
    pub total_amount: Decimal,
    pub total_utilized: Decimal,
}

impl ListFundRequestsQuery {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(status) = &self.status {
            cond = cond.add(fund_request::Column::Status.eq(status.clone()));
        }
        if let Some(requestor) = &self.requestor {
            cond = cond.add(fund_request::Column::Requestor.eq(requestor.clone()));
        }
        cond
    }
}

#[async_trait]
impl Query for ListFundRequestsQuery {
    type Result = (Vec<fund_request::Model>, u64, FundRequestListSummary);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let cond = self.condition();

        let total = fund_request::Entity::find()
            .filter(cond.clone())
            .count(db)
            .await?;

        let sums: Option<(Option<Decimal>, Option<Decimal>)> = fund_request::Entity::find()
            .select_only()
            .column_as(fund_request::Column::Amount.sum(), "total_amount")
            .column_as(fund_request::Column::UtilizedFunds.sum(), "total_utilized")
            .filter(cond.clone())
            .into_tuple()
            .one(db)
            .await?;
        let (amount, utilized) = sums.unwrap_or((None, None));

        let items = fund_request::Entity::find()
            .filter(cond)
            .order_by_desc(fund_request::Column::CreatedAt)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;

        let summary = FundRequestListSummary {
            total_amount: amount.unwrap_or(Decimal::ZERO),
            total_utilized: utilized.unwrap_or(Decimal::ZERO),
        };
        Ok((items, total, summary))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListExpensesQuery {
    pub request_id: Uuid,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for ListExpensesQuery {
    type Result = (Vec<expense_transaction::Model>, u64);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let query = expense_transaction::Entity::find()
            .filter(expense_transaction::Column::RequestId.eq(self.request_id));
        let total = query.clone().count(db).await?;
        let items = query
            .order_by_desc(expense_transaction::Column::DateIncurred)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;
        Ok((items, total))
    }
}

/// Portfolio snapshot across all fund requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRequestSummaryQuery {}

#[derive(Debug, Clone, Serialize)]
pub struct FundRequestSummary {
    pub total_requests: u64,
    pub in_progress: u64,
    pub validated: u64,
    pub rejected: u64,
    pub total_requested: Decimal,
    pub total_utilized: Decimal,
}

#[async_trait]
impl Query for FundRequestSummaryQuery {
    type Result = FundRequestSummary;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let total_requests = fund_request::Entity::find().count(db).await?;
        let validated = fund_request::Entity::find()
            .filter(fund_request::Column::Status.eq("validated"))
            .count(db)
            .await?;
        let rejected = fund_request::Entity::find()
            .filter(fund_request::Column::IsRejected.eq(true))
            .count(db)
            .await?;

        let sums: Option<(Option<Decimal>, Option<Decimal>)> = fund_request::Entity::find()
            .select_only()
            .column_as(fund_request::Column::Amount.sum(), "total_requested")
            .column_as(fund_request::Column::UtilizedFunds.sum(), "total_utilized")
            .into_tuple()
            .one(db)
            .await?;
        let (total_requested, total_utilized) = sums.unwrap_or((None, None));

        Ok(FundRequestSummary {
            total_requests,
            in_progress: total_requests - validated - rejected,
            validated,
            rejected,
            total_requested: total_requested.unwrap_or(Decimal::ZERO),
            total_utilized: total_utilized.unwrap_or(Decimal::ZERO),
        })
    }
}
