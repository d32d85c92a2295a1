use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        expense_transaction::{self, ExpenseStatus},
        fund_request,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    ledger, workflow,
};

use super::fund_requests::{find_request, persist_state, state_of};

#[derive(Debug, Clone)]
pub struct CreateExpenseInput {
    pub request_id: Uuid,
    pub expense_name: String,
    pub amount: Decimal,
    pub receipt_reference: Option<String>,
    pub date_incurred: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateExpenseInput {
    pub amount: Option<Decimal>,
    pub receipt_reference: Option<String>,
}

/// Expense records under fund requests. Amount changes patch the owning
/// request's `utilized_funds` by the signed delta inside the same store
/// transaction, and validating the last pending expense force-validates
/// the request.
#[derive(Clone)]
pub struct ExpenseService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ExpenseService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(request_id = %input.request_id))]
    pub async fn create_expense(
        &self,
        input: CreateExpenseInput,
    ) -> Result<expense_transaction::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "expense amount must be positive".into(),
            ));
        }

        let created = self
            .db
            .transaction::<_, expense_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = find_request(txn, input.request_id).await?;

                    let duplicate = expense_transaction::Entity::find()
                        .filter(expense_transaction::Column::RequestId.eq(request.id))
                        .filter(
                            expense_transaction::Column::ExpenseName
                                .eq(input.expense_name.clone()),
                        )
                        .one(txn)
                        .await?;
                    if duplicate.is_some() {
                        return Err(ServiceError::DuplicateName(format!(
                            "expense '{}' already recorded for this request",
                            input.expense_name
                        )));
                    }

                    let utilized =
                        ledger::apply_utilized_funds(request.utilized_funds, input.amount)?;
                    patch_utilized_funds(txn, &request, utilized).await?;

                    let now = Utc::now();
                    let model = expense_transaction::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        request_id: Set(request.id),
                        expense_name: Set(input.expense_name),
                        amount: Set(input.amount),
                        status: Set(ExpenseStatus::Pending.as_str().to_string()),
                        receipt_reference: Set(input.receipt_reference),
                        date_incurred: Set(input.date_incurred.unwrap_or(now)),
                        created_at: Set(now),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await?;

                    Ok(model)
                })
            })
            .await?;

        info!(expense_id = %created.id, amount = %created.amount, "expense recorded");
        self.event_sender
            .send(Event::ExpenseRecorded {
                expense_id: created.id,
                request_id: created.request_id,
                amount: created.amount,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(created)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_expense(
        &self,
        id: Uuid,
        patch: UpdateExpenseInput,
    ) -> Result<expense_transaction::Model, ServiceError> {
        if matches!(patch.amount, Some(a) if a <= Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "expense amount must be positive".into(),
            ));
        }

        let updated = self
            .db
            .transaction::<_, expense_transaction::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let expense = find_expense(txn, id).await?;
                    let request = find_request(txn, expense.request_id).await?;

                    let new_amount = patch.amount.unwrap_or(expense.amount);
                    let delta = ledger::expense_delta(expense.amount, new_amount);
                    if !delta.is_zero() {
                        let utilized =
                            ledger::apply_utilized_funds(request.utilized_funds, delta)?;
                        patch_utilized_funds(txn, &request, utilized).await?;
                    }

                    let mut active: expense_transaction::ActiveModel = expense.into();
                    active.amount = Set(new_amount);
                    if let Some(reference) = patch.receipt_reference {
                        active.receipt_reference = Set(Some(reference));
                    }
                    active.updated_at = Set(Some(Utc::now()));

                    Ok(active.update(txn).await?)
                })
            })
            .await?;

        info!(expense_id = %id, "expense updated");
        self.event_sender
            .send(Event::ExpenseUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Moves an expense between `pending`, `validated` and `rejected`.
    /// Rejected amounts stay in `utilized_funds` as an audit trail; when the
    /// last non-rejected expense reaches `validated`, the owning request is
    /// force-validated.
    #[instrument(skip(self))]
    pub async fn set_expense_status(
        &self,
        id: Uuid,
        status: ExpenseStatus,
    ) -> Result<expense_transaction::Model, ServiceError> {
        let (updated, auto_validated) = self
            .db
            .transaction::<_, (expense_transaction::Model, bool), ServiceError>(move |txn| {
                Box::pin(async move {
                    let expense = find_expense(txn, id).await?;
                    let request = find_request(txn, expense.request_id).await?;

                    let mut active: expense_transaction::ActiveModel = expense.into();
                    active.status = Set(status.as_str().to_string());
                    active.updated_at = Set(Some(Utc::now()));
                    let updated = active.update(txn).await?;

                    // A reject can also clear the last pending expense, so
                    // both outbound transitions get a chance to cascade.
                    let mut auto_validated = false;
                    if status != ExpenseStatus::Pending {
                        auto_validated = try_auto_validate(txn, &request).await?;
                    }

                    Ok((updated, auto_validated))
                })
            })
            .await?;

        info!(expense_id = %id, status = %status, "expense status changed");
        self.event_sender
            .send(Event::ExpenseUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        if auto_validated {
            self.event_sender
                .send(Event::FundRequestValidated(updated.request_id))
                .await
                .map_err(ServiceError::EventError)?;
        }

        Ok(updated)
    }

    /// Deletes an expense, compensating the request's utilized funds.
    #[instrument(skip(self))]
    pub async fn delete_expense(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let expense = find_expense(txn, id).await?;
                    let request = find_request(txn, expense.request_id).await?;

                    let utilized =
                        ledger::apply_utilized_funds(request.utilized_funds, -expense.amount)?;
                    patch_utilized_funds(txn, &request, utilized).await?;

                    expense_transaction::Entity::delete_by_id(expense.id)
                        .exec(txn)
                        .await?;
                    Ok(())
                })
            })
            .await?;

        info!(expense_id = %id, "expense deleted");
        self.event_sender
            .send(Event::ExpenseDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_expense(&self, id: Uuid) -> Result<expense_transaction::Model, ServiceError> {
        find_expense(self.db.as_ref(), id).await
    }
}

async fn find_expense<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<expense_transaction::Model, ServiceError> {
    expense_transaction::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Expense {} not found", id)))
}

/// Version-checked write of the running utilized-funds total.
async fn patch_utilized_funds<C: ConnectionTrait>(
    conn: &C,
    request: &fund_request::Model,
    utilized: Decimal,
) -> Result<(), ServiceError> {
    use sea_orm::sea_query::Expr;

    let result = fund_request::Entity::update_many()
        .col_expr(fund_request::Column::UtilizedFunds, Expr::value(utilized))
        .col_expr(
            fund_request::Column::Version,
            Expr::value(request.version + 1),
        )
        .col_expr(fund_request::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(fund_request::Column::Id.eq(request.id))
        .filter(fund_request::Column::Version.eq(request.version))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::ConcurrentModification(request.id));
    }
    Ok(())
}

/// Force-validates the request if every non-rejected expense under it is
/// now `validated`. Terminal (validated or rejected) requests are left
/// untouched.
async fn try_auto_validate<C: ConnectionTrait>(
    conn: &C,
    request: &fund_request::Model,
) -> Result<bool, ServiceError> {
    let state = state_of(request)?;
    if state.is_terminal() {
        return Ok(false);
    }

    let outstanding = expense_transaction::Entity::find()
        .filter(expense_transaction::Column::RequestId.eq(request.id))
        .filter(expense_transaction::Column::Status.eq(ExpenseStatus::Pending.as_str()))
        .count(conn)
        .await?;
    if outstanding > 0 {
        return Ok(false);
    }
    let validated = expense_transaction::Entity::find()
        .filter(expense_transaction::Column::RequestId.eq(request.id))
        .filter(expense_transaction::Column::Status.eq(ExpenseStatus::Validated.as_str()))
        .count(conn)
        .await?;
    if validated == 0 {
        return Ok(false);
    }

    // Re-read so the version check below uses the row as of this
    // transaction, not the snapshot taken before the expense update.
    let current = find_request(conn, request.id).await?;
    let next = workflow::auto_validate(&state_of(&current)?);
    persist_state(conn, current, &next).await?;

    info!(request_id = %request.id, "fund request auto-validated");
    Ok(true)
}
