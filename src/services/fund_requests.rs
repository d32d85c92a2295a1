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
    entities::fund_request,
    errors::ServiceError,
    events::{Event, EventSender},
    workflow::{self, WorkflowState},
};

#[derive(Debug, Clone)]
pub struct CreateFundRequestInput {
    pub request_code: String,
    pub purpose: String,
    pub amount: Decimal,
    pub requestor: String,
    pub date_needed: Option<chrono::DateTime<chrono::Utc>>,
}

/// Fund request lifecycle. All step/status writes flow through the workflow
/// state machine; nothing else mutates those fields.
#[derive(Clone)]
pub struct FundRequestService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl FundRequestService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(request_code = %input.request_code))]
    pub async fn create_fund_request(
        &self,
        input: CreateFundRequestInput,
    ) -> Result<fund_request::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "requested amount must be positive".into(),
            ));
        }

        let db = self.db.as_ref();
        let existing = fund_request::Entity::find()
            .filter(fund_request::Column::RequestCode.eq(input.request_code.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "fund request '{}' already exists",
                input.request_code
            )));
        }

        let state = WorkflowState::initial();
        let now = Utc::now();
        let model = fund_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            request_code: Set(input.request_code),
            purpose: Set(input.purpose),
            amount: Set(input.amount),
            utilized_funds: Set(Decimal::ZERO),
            status: Set(state.status()),
            current_step: Set(state.step.ordinal()),
            is_rejected: Set(false),
            rejection_step: Set(None),
            rejection_reason: Set(None),
            requestor: Set(input.requestor),
            date_needed: Set(input.date_needed),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await?;

        info!(request_id = %model.id, "fund request created");
        self.event_sender
            .send(Event::FundRequestCreated(model.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(model)
    }

    /// Advances the request by exactly one workflow step.
    #[instrument(skip(self))]
    pub async fn advance(
        &self,
        id: Uuid,
        to_step: i16,
    ) -> Result<fund_request::Model, ServiceError> {
        let (updated, from_step) = self
            .db
            .transaction::<_, (fund_request::Model, i16), ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = find_request(txn, id).await?;
                    let state = state_of(&request)?;
                    let next = workflow::advance(&state, to_step)?;
                    let updated = persist_state(txn, request, &next).await?;
                    Ok((updated, state.step.ordinal()))
                })
            })
            .await?;

        info!(request_id = %id, from_step, to_step, "fund request advanced");
        self.event_sender
            .send(Event::FundRequestAdvanced {
                request_id: id,
                from_step,
                to_step,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Rejects the request at its current step. One-way; the frozen
    /// rejection step never changes afterwards.
    #[instrument(skip(self, reason))]
    pub async fn reject(
        &self,
        id: Uuid,
        reason: String,
    ) -> Result<fund_request::Model, ServiceError> {
        let updated = self
            .db
            .transaction::<_, fund_request::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = find_request(txn, id).await?;
                    let state = state_of(&request)?;
                    let next = workflow::reject(&state, &reason)?;
                    persist_state(txn, request, &next).await
                })
            })
            .await?;

        info!(request_id = %id, step = updated.rejection_step, "fund request rejected");
        self.event_sender
            .send(Event::FundRequestRejected {
                request_id: id,
                step: updated.rejection_step.unwrap_or(updated.current_step),
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_fund_request(&self, id: Uuid) -> Result<fund_request::Model, ServiceError> {
        find_request(self.db.as_ref(), id).await
    }

    /// Deletes a fund request along with its expense records (cascade).
    #[instrument(skip(self))]
    pub async fn delete_fund_request(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = self.db.as_ref();
        let request = find_request(db, id).await?;
        fund_request::Entity::delete_by_id(request.id).exec(db).await?;
        info!(request_id = %id, "fund request deleted");
        Ok(())
    }
}

pub(crate) async fn find_request<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<fund_request::Model, ServiceError> {
    fund_request::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Fund request {} not found", id)))
}

pub(crate) fn state_of(request: &fund_request::Model) -> Result<WorkflowState, ServiceError> {
    WorkflowState::from_row(
        request.current_step,
        request.is_rejected,
        request.rejection_step,
        request.rejection_reason.clone(),
    )
    .map_err(|e| ServiceError::InternalError(format!("fund request {}: {}", request.id, e)))
}

/// Writes the workflow fields back, conditional on the version read in this
/// transaction.
pub(crate) async fn persist_state<C: ConnectionTrait>(
    conn: &C,
    request: fund_request::Model,
    state: &WorkflowState,
) -> Result<fund_request::Model, ServiceError> {
    let result = fund_request::Entity::update_many()
        .col_expr(fund_request::Column::Status, Expr::value(state.status()))
        .col_expr(
            fund_request::Column::CurrentStep,
            Expr::value(state.step.ordinal()),
        )
        .col_expr(
            fund_request::Column::IsRejected,
            Expr::value(state.is_rejected),
        )
        .col_expr(
            fund_request::Column::RejectionStep,
            Expr::value(state.rejection_step),
        )
        .col_expr(
            fund_request::Column::RejectionReason,
            Expr::value(state.rejection_reason.clone()),
        )
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

    find_request(conn, request.id).await
}
