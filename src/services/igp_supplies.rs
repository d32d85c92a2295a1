use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        igp,
        igp_supply,
        igp_transaction::{self, ReceiptStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    ledger::{self, ParentTotals},
};

use super::igp_transactions::patch_igp_totals;

#[derive(Debug, Clone)]
pub struct CreateSupplyInput {
    pub igp_id: Uuid,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub expenses: Decimal,
    pub supply_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Administrative correction to a supply's counted/derived fields. Sold and
/// revenue corrections propagate their signed deltas to the parent IGP.
#[derive(Debug, Clone, Default)]
pub struct SupplyCorrectionInput {
    pub quantity: Option<i32>,
    pub quantity_sold: Option<i32>,
    pub total_revenue: Option<Decimal>,
    pub expenses: Option<Decimal>,
}

#[derive(Clone)]
pub struct IgpSupplyService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl IgpSupplyService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(igp_id = %input.igp_id))]
    pub async fn create_supply(
        &self,
        input: CreateSupplyInput,
    ) -> Result<igp_supply::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "supply quantity must be positive".into(),
            ));
        }

        let db = self.db.as_ref();
        let parent = igp::Entity::find_by_id(input.igp_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("IGP {} not found", input.igp_id)))?;

        let now = Utc::now();
        let model = igp_supply::ActiveModel {
            id: Set(Uuid::new_v4()),
            igp_id: Set(parent.id),
            quantity: Set(input.quantity),
            quantity_sold: Set(0),
            unit_cost: Set(input.unit_cost),
            expenses: Set(input.expenses),
            total_revenue: Set(Decimal::ZERO),
            supply_date: Set(input.supply_date.unwrap_or(now)),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(supply_id = %model.id, quantity = model.quantity, "IGP supply restocked");
        self.event_sender
            .send(Event::IgpSupplyRestocked {
                supply_id: model.id,
                igp_id: model.igp_id,
                quantity: model.quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(model)
    }

    /// Applies an administrative correction. Edits to `quantity_sold` and
    /// `total_revenue` are treated as deltas against the parent totals in
    /// the same transaction, so the aggregate cannot drift.
    #[instrument(skip(self, patch))]
    pub async fn correct_supply(
        &self,
        id: Uuid,
        patch: SupplyCorrectionInput,
    ) -> Result<igp_supply::Model, ServiceError> {
        let updated = self
            .db
            .transaction::<_, igp_supply::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let supply = igp_supply::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Supply {} not found", id))
                        })?;
                    let parent = igp::Entity::find_by_id(supply.igp_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("IGP {} not found", supply.igp_id))
                        })?;

                    let new_quantity = patch.quantity.unwrap_or(supply.quantity);
                    let new_sold = patch.quantity_sold.unwrap_or(supply.quantity_sold);
                    let new_revenue = patch.total_revenue.unwrap_or(supply.total_revenue);

                    if new_quantity <= 0 {
                        return Err(ServiceError::ValidationError(
                            "supply quantity must be positive".into(),
                        ));
                    }
                    if new_sold < 0 || new_sold > new_quantity {
                        return Err(ServiceError::InsufficientSupply(format!(
                            "quantity sold {} exceeds capacity {}",
                            new_sold, new_quantity
                        )));
                    }
                    if new_revenue < Decimal::ZERO {
                        return Err(ServiceError::ValidationError(
                            "revenue cannot be negative".into(),
                        ));
                    }

                    let delta = ledger::supply_edit_delta(
                        supply.quantity_sold,
                        new_sold,
                        supply.total_revenue,
                        new_revenue,
                    );
                    if !delta.is_zero() {
                        let parent_totals = ledger::apply_to_parent(
                            &ParentTotals {
                                total_sold: parent.total_sold,
                                revenue: parent.revenue,
                            },
                            &delta,
                        )?;
                        patch_igp_totals(txn, &parent, &parent_totals).await?;
                    }

                    let version = supply.version;
                    let mut active: igp_supply::ActiveModel = supply.into();
                    active.quantity = Set(new_quantity);
                    active.quantity_sold = Set(new_sold);
                    active.total_revenue = Set(new_revenue);
                    if let Some(expenses) = patch.expenses {
                        active.expenses = Set(expenses);
                    }
                    active.version = Set(version + 1);
                    active.updated_at = Set(Some(Utc::now()));

                    Ok(active.update(txn).await?)
                })
            })
            .await?;

        info!(supply_id = %id, "IGP supply corrected");
        self.event_sender
            .send(Event::IgpSupplyAdjusted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a supply along with its transactions (cascade), compensating
    /// the parent totals by the supply's received contribution.
    #[instrument(skip(self))]
    pub async fn delete_supply(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let supply = igp_supply::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Supply {} not found", id))
                        })?;
                    let parent = igp::Entity::find_by_id(supply.igp_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("IGP {} not found", supply.igp_id))
                        })?;

                    // The parent's totals only contain received transactions,
                    // so the compensation is recomputed over them rather than
                    // taken from the supply's capacity counters.
                    let received_sold = received_quantity_of(txn, supply.id).await?;
                    let delta = ledger::LedgerDelta {
                        capacity: 0,
                        sold: -received_sold,
                        revenue: -supply.total_revenue,
                    };
                    if !delta.is_zero() {
                        let parent_totals = ledger::apply_to_parent(
                            &ParentTotals {
                                total_sold: parent.total_sold,
                                revenue: parent.revenue,
                            },
                            &delta,
                        )?;
                        patch_igp_totals(txn, &parent, &parent_totals).await?;
                    }

                    igp_transaction::Entity::delete_many()
                        .filter(igp_transaction::Column::SupplyId.eq(supply.id))
                        .exec(txn)
                        .await?;
                    igp_supply::Entity::delete_by_id(supply.id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(supply_id = %id, "IGP supply deleted");
        self.event_sender
            .send(Event::IgpSupplyDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_supply(&self, id: Uuid) -> Result<igp_supply::Model, ServiceError> {
        igp_supply::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supply {} not found", id)))
    }
}

async fn received_quantity_of<C: ConnectionTrait>(
    conn: &C,
    supply_id: Uuid,
) -> Result<i32, ServiceError> {
    let sum: Option<Option<i64>> = igp_transaction::Entity::find()
        .select_only()
        .column_as(igp_transaction::Column::Quantity.sum(), "received_quantity")
        .filter(igp_transaction::Column::SupplyId.eq(supply_id))
        .filter(igp_transaction::Column::ReceiptStatus.eq(ReceiptStatus::Received.as_str()))
        .into_tuple()
        .one(conn)
        .await?;

    Ok(sum.flatten().unwrap_or(0) as i32)
}
