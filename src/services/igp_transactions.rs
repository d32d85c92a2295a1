use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set, TransactionTrait,
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
    ledger::{self, ParentTotals, SupplyTotals, TxnSnapshot},
};

#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub igp_id: Uuid,
    pub supply_id: Uuid,
    pub purchaser: String,
    pub batch: Option<String>,
    pub quantity: i32,
    pub receipt_status: ReceiptStatus,
    pub date_purchased: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub purchaser: Option<String>,
    pub batch: Option<String>,
    pub quantity: Option<i32>,
    pub receipt_status: Option<ReceiptStatus>,
}

/// Ledger engine for IGP sales. Each operation writes the transaction row
/// and patches the owning supply and IGP totals by the signed delta, all in
/// one store transaction.
#[derive(Clone)]
pub struct IgpTransactionService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl IgpTransactionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(igp_id = %input.igp_id, supply_id = %input.supply_id))]
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> Result<igp_transaction::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".into(),
            ));
        }

        let created = self
            .db
            .transaction::<_, igp_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let parent = igp::Entity::find_by_id(input.igp_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("IGP {} not found", input.igp_id))
                        })?;
                    let supply = find_supply_of(txn, input.supply_id, parent.id).await?;

                    let snapshot = TxnSnapshot {
                        quantity: input.quantity,
                        unit_price: parent.unit_price,
                        receipt_status: input.receipt_status,
                    };
                    let delta = ledger::transaction_delta(None, Some(&snapshot));
                    apply_delta(txn, &parent, &supply, &delta).await?;

                    let now = Utc::now();
                    let model = igp_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        igp_id: Set(parent.id),
                        supply_id: Set(supply.id),
                        purchaser: Set(input.purchaser),
                        batch: Set(input.batch),
                        quantity: Set(input.quantity),
                        unit_price_at_purchase: Set(parent.unit_price),
                        receipt_status: Set(input.receipt_status.as_str().to_string()),
                        date_purchased: Set(input.date_purchased.unwrap_or(now)),
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
            transaction_id = %created.id,
            quantity = created.quantity,
            status = %created.receipt_status,
            "IGP transaction recorded"
        );
        self.event_sender
            .send(Event::IgpTransactionRecorded {
                transaction_id: created.id,
                igp_id: created.igp_id,
                quantity: created.quantity,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_transaction(
        &self,
        id: Uuid,
        patch: UpdateTransactionInput,
    ) -> Result<igp_transaction::Model, ServiceError> {
        if matches!(patch.quantity, Some(q) if q <= 0) {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".into(),
            ));
        }

        let updated = self
            .db
            .transaction::<_, igp_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = igp_transaction::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Transaction {} not found", id))
                        })?;
                    let parent = igp::Entity::find_by_id(existing.igp_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("IGP {} not found", existing.igp_id))
                        })?;
                    let supply = find_supply_of(txn, existing.supply_id, parent.id).await?;

                    let old_status = parse_status(&existing)?;
                    let old = TxnSnapshot {
                        quantity: existing.quantity,
                        unit_price: existing.unit_price_at_purchase,
                        receipt_status: old_status,
                    };
                    let new = TxnSnapshot {
                        quantity: patch.quantity.unwrap_or(existing.quantity),
                        unit_price: existing.unit_price_at_purchase,
                        receipt_status: patch.receipt_status.unwrap_or(old_status),
                    };
                    let delta = ledger::transaction_delta(Some(&old), Some(&new));
                    if !delta.is_zero() {
                        apply_delta(txn, &parent, &supply, &delta).await?;
                    }

                    let mut active: igp_transaction::ActiveModel = existing.into();
                    if let Some(purchaser) = patch.purchaser {
                        active.purchaser = Set(purchaser);
                    }
                    if let Some(batch) = patch.batch {
                        active.batch = Set(Some(batch));
                    }
                    active.quantity = Set(new.quantity);
                    active.receipt_status = Set(new.receipt_status.as_str().to_string());
                    active.updated_at = Set(Some(Utc::now()));

                    Ok(active.update(txn).await?)
                })
            })
            .await?;

        info!(transaction_id = %id, "IGP transaction updated");
        self.event_sender
            .send(Event::IgpTransactionUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a transaction and compensates the supply and IGP totals by
    /// its full contribution.
    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = igp_transaction::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Transaction {} not found", id))
                        })?;
                    let parent = igp::Entity::find_by_id(existing.igp_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("IGP {} not found", existing.igp_id))
                        })?;
                    let supply = find_supply_of(txn, existing.supply_id, parent.id).await?;

                    let old = TxnSnapshot {
                        quantity: existing.quantity,
                        unit_price: existing.unit_price_at_purchase,
                        receipt_status: parse_status(&existing)?,
                    };
                    let delta = ledger::transaction_delta(Some(&old), None);
                    apply_delta(txn, &parent, &supply, &delta).await?;

                    igp_transaction::Entity::delete_by_id(existing.id)
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await?;

        info!(transaction_id = %id, "IGP transaction deleted");
        self.event_sender
            .send(Event::IgpTransactionDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: Uuid) -> Result<igp_transaction::Model, ServiceError> {
        igp_transaction::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", id)))
    }
}

fn parse_status(model: &igp_transaction::Model) -> Result<ReceiptStatus, ServiceError> {
    model.receipt_status().map_err(|_| {
        ServiceError::InternalError(format!(
            "transaction {} carries unknown receipt status '{}'",
            model.id, model.receipt_status
        ))
    })
}

async fn find_supply_of<C: ConnectionTrait>(
    conn: &C,
    supply_id: Uuid,
    igp_id: Uuid,
) -> Result<igp_supply::Model, ServiceError> {
    igp_supply::Entity::find_by_id(supply_id)
        .filter(igp_supply::Column::IgpId.eq(igp_id))
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Supply {} not found for IGP {}", supply_id, igp_id))
        })
}

/// Applies a ledger delta to the supply and parent rows. Both updates are
/// conditional on the version observed in this transaction; zero affected
/// rows means an overlapping writer got there first and the whole unit
/// aborts with `ConcurrentModification`.
async fn apply_delta<C: ConnectionTrait>(
    conn: &C,
    parent: &igp::Model,
    supply: &igp_supply::Model,
    delta: &ledger::LedgerDelta,
) -> Result<(), ServiceError> {
    let supply_totals = ledger::apply_to_supply(
        &SupplyTotals {
            quantity: supply.quantity,
            quantity_sold: supply.quantity_sold,
            total_revenue: supply.total_revenue,
        },
        delta,
    )?;
    let parent_totals = ledger::apply_to_parent(
        &ParentTotals {
            total_sold: parent.total_sold,
            revenue: parent.revenue,
        },
        delta,
    )?;

    patch_supply_totals(conn, supply, &supply_totals).await?;
    patch_igp_totals(conn, parent, &parent_totals).await
}

pub(crate) async fn patch_supply_totals<C: ConnectionTrait>(
    conn: &C,
    supply: &igp_supply::Model,
    totals: &SupplyTotals,
) -> Result<(), ServiceError> {
    let result = igp_supply::Entity::update_many()
        .col_expr(
            igp_supply::Column::QuantitySold,
            Expr::value(totals.quantity_sold),
        )
        .col_expr(
            igp_supply::Column::TotalRevenue,
            Expr::value(totals.total_revenue),
        )
        .col_expr(igp_supply::Column::Version, Expr::value(supply.version + 1))
        .col_expr(igp_supply::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(igp_supply::Column::Id.eq(supply.id))
        .filter(igp_supply::Column::Version.eq(supply.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(supply.id));
    }
    Ok(())
}

pub(crate) async fn patch_igp_totals<C: ConnectionTrait>(
    conn: &C,
    parent: &igp::Model,
    totals: &ParentTotals,
) -> Result<(), ServiceError> {
    let result = igp::Entity::update_many()
        .col_expr(igp::Column::TotalSold, Expr::value(totals.total_sold))
        .col_expr(igp::Column::Revenue, Expr::value(totals.revenue))
        .col_expr(igp::Column::Version, Expr::value(parent.version + 1))
        .col_expr(igp::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(igp::Column::Id.eq(parent.id))
        .filter(igp::Column::Version.eq(parent.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(parent.id));
    }
    Ok(())
}
