use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{water_supply, water_vendo},
    errors::ServiceError,
    events::{Event, EventSender},
    ledger,
};

#[derive(Debug, Clone)]
pub struct CreateWaterSupplyInput {
    pub vendo_id: Uuid,
    pub supplied_gallons: i32,
    pub expenses: Decimal,
    pub supply_date: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateWaterSupplyInput {
    pub used_gallons: Option<i32>,
    pub expenses: Option<Decimal>,
    pub revenue: Option<Decimal>,
}

/// Water supply accounting. Usage, expense and revenue changes on a supply
/// record patch the owning vendo's totals by the signed delta inside the
/// same transaction.
#[derive(Clone)]
pub struct WaterSupplyService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl WaterSupplyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(vendo_id = %input.vendo_id))]
    pub async fn create_supply(
        &self,
        input: CreateWaterSupplyInput,
    ) -> Result<water_supply::Model, ServiceError> {
        if input.supplied_gallons <= 0 {
            return Err(ServiceError::ValidationError(
                "supplied gallons must be positive".into(),
            ));
        }
        if input.expenses < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "expenses cannot be negative".into(),
            ));
        }

        let created = self
            .db
            .transaction::<_, water_supply::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let vendo = water_vendo::Entity::find_by_id(input.vendo_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Water vendo {} not found",
                                input.vendo_id
                            ))
                        })?;

                    if !input.expenses.is_zero() {
                        let expenses = ledger::apply_money_total(
                            vendo.total_expenses,
                            input.expenses,
                            "vendo expenses",
                        )?;
                        patch_vendo_totals(
                            txn,
                            &vendo,
                            vendo.gallons_used,
                            vendo.revenue,
                            expenses,
                        )
                        .await?;
                    }

                    let now = Utc::now();
                    let model = water_supply::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        vendo_id: Set(vendo.id),
                        supplied_gallons: Set(input.supplied_gallons),
                        used_gallons: Set(0),
                        expenses: Set(input.expenses),
                        revenue: Set(Decimal::ZERO),
                        supply_date: Set(input.supply_date.unwrap_or(now)),
                        version: Set(1),
                        created_at: Set(now),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await?;

                    Ok(model)
                })
            })
            .await?;

        info!(
            supply_id = %created.id,
            gallons = created.supplied_gallons,
            "water supply logged"
        );
        self.event_sender
            .send(Event::WaterSupplyLogged {
                supply_id: created.id,
                vendo_id: created.vendo_id,
                gallons: created.supplied_gallons,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    /// Records usage/expense/revenue changes. The overdraw check
    /// (`used_gallons <= supplied_gallons`) rejects before any row is
    /// written; all vendo patches are deltas.
    #[instrument(skip(self, patch))]
    pub async fn update_supply(
        &self,
        id: Uuid,
        patch: UpdateWaterSupplyInput,
    ) -> Result<water_supply::Model, ServiceError> {
        let updated = self
            .db
            .transaction::<_, water_supply::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let supply = water_supply::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Water supply {} not found", id))
                        })?;
                    let vendo = water_vendo::Entity::find_by_id(supply.vendo_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Water vendo {} not found",
                                supply.vendo_id
                            ))
                        })?;

                    let new_used = patch.used_gallons.unwrap_or(supply.used_gallons);
                    let new_expenses = patch.expenses.unwrap_or(supply.expenses);
                    let new_revenue = patch.revenue.unwrap_or(supply.revenue);
                    if new_revenue < Decimal::ZERO || new_expenses < Decimal::ZERO {
                        return Err(ServiceError::ValidationError(
                            "expenses and revenue cannot be negative".into(),
                        ));
                    }

                    let used_delta = new_used - supply.used_gallons;
                    // Validates the per-supply invariant before the vendo is touched.
                    ledger::apply_water_usage(
                        supply.supplied_gallons,
                        supply.used_gallons,
                        used_delta,
                    )?;

                    let expenses_delta = new_expenses - supply.expenses;
                    let revenue_delta = new_revenue - supply.revenue;

                    if used_delta != 0 || !expenses_delta.is_zero() || !revenue_delta.is_zero() {
                        let gallons_used = vendo.gallons_used + used_delta;
                        if gallons_used < 0 {
                            return Err(ServiceError::LedgerDrift(format!(
                                "vendo gallons_used would become {gallons_used}"
                            )));
                        }
                        let revenue = ledger::apply_money_total(
                            vendo.revenue,
                            revenue_delta,
                            "vendo revenue",
                        )?;
                        let expenses = ledger::apply_money_total(
                            vendo.total_expenses,
                            expenses_delta,
                            "vendo expenses",
                        )?;
                        patch_vendo_totals(txn, &vendo, gallons_used, revenue, expenses).await?;
                    }

                    let version = supply.version;
                    let mut active: water_supply::ActiveModel = supply.into();
                    active.used_gallons = Set(new_used);
                    active.expenses = Set(new_expenses);
                    active.revenue = Set(new_revenue);
                    active.version = Set(version + 1);
                    active.updated_at = Set(Some(Utc::now()));

                    Ok(active.update(txn).await?)
                })
            })
            .await?;

        info!(supply_id = %id, "water supply updated");
        self.event_sender
            .send(Event::WaterSupplyAdjusted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a supply record, compensating the vendo totals by the
    /// record's full contribution.
    #[instrument(skip(self))]
    pub async fn delete_supply(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let supply = water_supply::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Water supply {} not found", id))
                        })?;
                    let vendo = water_vendo::Entity::find_by_id(supply.vendo_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Water vendo {} not found",
                                supply.vendo_id
                            ))
                        })?;

                    let gallons_used = vendo.gallons_used - supply.used_gallons;
                    if gallons_used < 0 {
                        return Err(ServiceError::LedgerDrift(format!(
                            "vendo gallons_used would become {gallons_used}"
                        )));
                    }
                    let revenue =
                        ledger::apply_money_total(vendo.revenue, -supply.revenue, "vendo revenue")?;
                    let expenses = ledger::apply_money_total(
                        vendo.total_expenses,
                        -supply.expenses,
                        "vendo expenses",
                    )?;
                    patch_vendo_totals(txn, &vendo, gallons_used, revenue, expenses).await?;

                    water_supply::Entity::delete_by_id(supply.id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(supply_id = %id, "water supply deleted");
        self.event_sender
            .send(Event::WaterSupplyDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_supply(&self, id: Uuid) -> Result<water_supply::Model, ServiceError> {
        water_supply::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Water supply {} not found", id)))
    }
}

async fn patch_vendo_totals<C: ConnectionTrait>(
    conn: &C,
    vendo: &water_vendo::Model,
    gallons_used: i32,
    revenue: Decimal,
    total_expenses: Decimal,
) -> Result<(), ServiceError> {
    let result = water_vendo::Entity::update_many()
        .col_expr(water_vendo::Column::GallonsUsed, Expr::value(gallons_used))
        .col_expr(water_vendo::Column::Revenue, Expr::value(revenue))
        .col_expr(
            water_vendo::Column::TotalExpenses,
            Expr::value(total_expenses),
        )
        .col_expr(water_vendo::Column::Version, Expr::value(vendo.version + 1))
        .col_expr(water_vendo::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(water_vendo::Column::Id.eq(vendo.id))
        .filter(water_vendo::Column::Version.eq(vendo.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(vendo.id));
    }
    Ok(())
}
