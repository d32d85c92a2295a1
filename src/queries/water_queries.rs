use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::{water_supply, water_vendo},
    errors::ServiceError,
};

use super::Query;

/// Supply listing per vendo and date window; the count, the summary and
/// the page share one condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListWaterSuppliesQuery {
    pub vendo_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u64,
    pub offset: u64,
}

/// Totals over every supply record the listing filter matches.
#[derive(Debug, Clone, Serialize)]
pub struct WaterSupplyListSummary {
    pub gallons_supplied: i64,
    pub gallons_used: i64,
    pub expenses: Decimal,
    pub revenue: Decimal,
}

impl ListWaterSuppliesQuery {
    fn condition(&self) -> Result<Condition, ServiceError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ServiceError::InvalidDateRange(
                    "end date falls before start date".into(),
                ));
            }
        }

        let mut cond = Condition::all();
        if let Some(vendo_id) = self.vendo_id {
            cond = cond.add(water_supply::Column::VendoId.eq(vendo_id));
        }
        if let Some(start) = self.start_date {
            cond = cond.add(water_supply::Column::SupplyDate.gte(start));
        }
        if let Some(end) = self.end_date {
            cond = cond.add(water_supply::Column::SupplyDate.lte(end));
        }
        Ok(cond)
    }
}

#[async_trait]
impl Query for ListWaterSuppliesQuery {
    type Result = (Vec<water_supply::Model>, u64, WaterSupplyListSummary);

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let cond = self.condition()?;

        let total = water_supply::Entity::find()
            .filter(cond.clone())
            .count(db)
            .await?;

        let sums: Option<(Option<i64>, Option<i64>, Option<Decimal>, Option<Decimal>)> =
            water_supply::Entity::find()
                .select_only()
                .column_as(water_supply::Column::SuppliedGallons.sum(), "supplied")
                .column_as(water_supply::Column::UsedGallons.sum(), "used")
                .column_as(water_supply::Column::Expenses.sum(), "expenses")
                .column_as(water_supply::Column::Revenue.sum(), "revenue")
                .filter(cond.clone())
                .into_tuple()
                .one(db)
                .await?;
        let (supplied, used, expenses, revenue) = sums.unwrap_or((None, None, None, None));

        let items = water_supply::Entity::find()
            .filter(cond)
            .order_by_desc(water_supply::Column::SupplyDate)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await?;

        let summary = WaterSupplyListSummary {
            gallons_supplied: supplied.unwrap_or(0),
            gallons_used: used.unwrap_or(0),
            expenses: expenses.unwrap_or(Decimal::ZERO),
            revenue: revenue.unwrap_or(Decimal::ZERO),
        };
        Ok((items, total, summary))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterVendoSummaryQuery {
    pub vendo_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterVendoSummary {
    pub vendo_id: Uuid,
    pub location: String,
    pub gallons_supplied: i64,
    pub gallons_used: i32,
    pub revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}

#[async_trait]
impl Query for WaterVendoSummaryQuery {
    type Result = WaterVendoSummary;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let vendo = water_vendo::Entity::find_by_id(self.vendo_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Water vendo {} not found", self.vendo_id))
            })?;

        let supplied: Option<Option<i64>> = water_supply::Entity::find()
            .select_only()
            .column_as(water_supply::Column::SuppliedGallons.sum(), "supplied")
            .filter(water_supply::Column::VendoId.eq(vendo.id))
            .into_tuple()
            .one(db)
            .await?;

        Ok(WaterVendoSummary {
            vendo_id: vendo.id,
            location: vendo.location,
            gallons_supplied: supplied.flatten().unwrap_or(0),
            gallons_used: vendo.gallons_used,
            revenue: vendo.revenue,
            total_expenses: vendo.total_expenses,
            net_income: vendo.revenue - vendo.total_expenses,
        })
    }
}
