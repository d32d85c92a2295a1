use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        locker::{self, LockerStatus},
        locker_rental::{self, RentalStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

#[derive(Debug, Clone)]
pub struct CreateRentalInput {
    pub locker_id: Uuid,
    pub renter_name: String,
    pub renter_email: String,
    pub rental_status: RentalStatus,
    pub date_rented: DateTime<Utc>,
    pub date_due: DateTime<Utc>,
    pub payment_amount: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRentalInput {
    pub locker_id: Option<Uuid>,
    pub renter_name: Option<String>,
    pub renter_email: Option<String>,
    pub rental_status: Option<RentalStatus>,
    pub date_rented: Option<DateTime<Utc>>,
    pub date_due: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
}

/// Rental lifecycle plus the occupancy synchronizer: the locker's
/// `occupied` status tracks active rentals, flipped in the same store
/// transaction as the rental write.
#[derive(Clone)]
pub struct RentalService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

struct StatusFlip {
    locker_id: Uuid,
    old_status: String,
    new_status: String,
}

impl RentalService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(locker_id = %input.locker_id))]
    pub async fn create_rental(
        &self,
        input: CreateRentalInput,
    ) -> Result<locker_rental::Model, ServiceError> {
        if input.date_due <= input.date_rented {
            return Err(ServiceError::InvalidDateRange(
                "due date must fall after the rental date".into(),
            ));
        }
        if input.payment_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount cannot be negative".into(),
            ));
        }

        let (created, flip) = self
            .db
            .transaction::<_, (locker_rental::Model, Option<StatusFlip>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let target = find_locker(txn, input.locker_id).await?;
                        let mut flip = None;

                        if input.rental_status == RentalStatus::Active {
                            match locker_status(&target)? {
                                LockerStatus::Available => {
                                    flip = Some(
                                        mark_locker(txn, target, LockerStatus::Occupied).await?,
                                    );
                                }
                                other => {
                                    return Err(ServiceError::LockerUnavailable(format!(
                                        "locker '{}' is {}",
                                        target.locker_number,
                                        other.as_str()
                                    )));
                                }
                            }
                        }

                        let now = Utc::now();
                        let model = locker_rental::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            locker_id: Set(input.locker_id),
                            renter_name: Set(input.renter_name),
                            renter_email: Set(input.renter_email),
                            rental_status: Set(input.rental_status.as_str().to_string()),
                            date_rented: Set(input.date_rented),
                            date_due: Set(input.date_due),
                            payment_amount: Set(input.payment_amount),
                            created_at: Set(now),
                            updated_at: Set(None),
                        }
                        .insert(txn)
                        .await?;

                        Ok((model, flip))
                    })
                },
            )
            .await?;

        info!(rental_id = %created.id, status = %created.rental_status, "rental created");
        self.event_sender
            .send(Event::RentalCreated(created.id))
            .await
            .map_err(ServiceError::EventError)?;
        self.emit_flips(flip.into_iter().collect()).await?;

        Ok(created)
    }

    /// Updates a rental. Status changes crossing the `active` boundary flip
    /// the locker's occupancy, and moving an active rental to another locker
    /// releases the old one and occupies the new one, all in the same
    /// transaction.
    #[instrument(skip(self, patch))]
    pub async fn update_rental(
        &self,
        id: Uuid,
        patch: UpdateRentalInput,
    ) -> Result<locker_rental::Model, ServiceError> {
        let (updated, flips) = self
            .db
            .transaction::<_, (locker_rental::Model, Vec<StatusFlip>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let rental = find_rental(txn, id).await?;

                        let date_rented = patch.date_rented.unwrap_or(rental.date_rented);
                        let date_due = patch.date_due.unwrap_or(rental.date_due);
                        if date_due <= date_rented {
                            return Err(ServiceError::InvalidDateRange(
                                "due date must fall after the rental date".into(),
                            ));
                        }

                        let old_status = rental_status(&rental)?;
                        let new_status = patch.rental_status.unwrap_or(old_status);
                        let new_locker_id = patch.locker_id.unwrap_or(rental.locker_id);

                        let mut flips = Vec::new();
                        if new_locker_id != rental.locker_id {
                            // Any move validates the target, whatever the
                            // rental's status.
                            let target = find_locker(txn, new_locker_id).await?;
                            if locker_status(&target)? != LockerStatus::Available {
                                return Err(ServiceError::LockerUnavailable(format!(
                                    "locker '{}' is {}",
                                    target.locker_number, target.status
                                )));
                            }
                            let conflicting = locker_rental::Entity::find()
                                .filter(locker_rental::Column::LockerId.eq(new_locker_id))
                                .filter(
                                    locker_rental::Column::RentalStatus
                                        .eq(RentalStatus::Active.as_str()),
                                )
                                .count(txn)
                                .await?;
                            if conflicting > 0 {
                                return Err(ServiceError::LockerUnavailable(format!(
                                    "locker '{}' already has an active rental",
                                    target.locker_number
                                )));
                            }
                            if new_status == RentalStatus::Active {
                                flips.push(
                                    mark_locker(txn, target, LockerStatus::Occupied).await?,
                                );
                            }
                            if old_status == RentalStatus::Active {
                                let old = find_locker(txn, rental.locker_id).await?;
                                if locker_status(&old)? == LockerStatus::Occupied {
                                    flips.push(
                                        mark_locker(txn, old, LockerStatus::Available).await?,
                                    );
                                }
                            }
                        } else if let Some(flip) =
                            sync_occupancy(txn, rental.locker_id, old_status, new_status).await?
                        {
                            flips.push(flip);
                        }

                        let mut active: locker_rental::ActiveModel = rental.into();
                        if let Some(name) = patch.renter_name {
                            active.renter_name = Set(name);
                        }
                        if let Some(email) = patch.renter_email {
                            active.renter_email = Set(email);
                        }
                        if let Some(amount) = patch.payment_amount {
                            if amount < Decimal::ZERO {
                                return Err(ServiceError::ValidationError(
                                    "payment amount cannot be negative".into(),
                                ));
                            }
                            active.payment_amount = Set(amount);
                        }
                        active.locker_id = Set(new_locker_id);
                        active.rental_status = Set(new_status.as_str().to_string());
                        active.date_rented = Set(date_rented);
                        active.date_due = Set(date_due);
                        active.updated_at = Set(Some(Utc::now()));

                        Ok((active.update(txn).await?, flips))
                    })
                },
            )
            .await?;

        info!(rental_id = %id, "rental updated");
        self.event_sender
            .send(Event::RentalUpdated(id))
            .await
            .map_err(ServiceError::EventError)?;
        self.emit_flips(flips).await?;

        Ok(updated)
    }

    /// Deletes a rental. An active rental releases its locker on the way
    /// out.
    #[instrument(skip(self))]
    pub async fn delete_rental(&self, id: Uuid) -> Result<(), ServiceError> {
        let flip = self
            .db
            .transaction::<_, Option<StatusFlip>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let rental = find_rental(txn, id).await?;
                    let status = rental_status(&rental)?;
                    let flip = sync_occupancy(
                        txn,
                        rental.locker_id,
                        status,
                        RentalStatus::Cancelled,
                    )
                    .await?;

                    locker_rental::Entity::delete_by_id(rental.id).exec(txn).await?;
                    Ok(flip)
                })
            })
            .await?;

        info!(rental_id = %id, "rental deleted");
        self.event_sender
            .send(Event::RentalDeleted(id))
            .await
            .map_err(ServiceError::EventError)?;
        self.emit_flips(flip.into_iter().collect()).await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_rental(&self, id: Uuid) -> Result<locker_rental::Model, ServiceError> {
        find_rental(self.db.as_ref(), id).await
    }

    async fn emit_flips(&self, flips: Vec<StatusFlip>) -> Result<(), ServiceError> {
        for flip in flips {
            self.event_sender
                .send(Event::LockerStatusChanged {
                    locker_id: flip.locker_id,
                    old_status: flip.old_status,
                    new_status: flip.new_status,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }
        Ok(())
    }
}

async fn find_rental<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<locker_rental::Model, ServiceError> {
    locker_rental::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", id)))
}

async fn find_locker<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<locker::Model, ServiceError> {
    locker::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Locker {} not found", id)))
}

fn locker_status(model: &locker::Model) -> Result<LockerStatus, ServiceError> {
    model.status().map_err(|_| {
        ServiceError::InternalError(format!(
            "locker {} carries unknown status '{}'",
            model.id, model.status
        ))
    })
}

fn rental_status(model: &locker_rental::Model) -> Result<RentalStatus, ServiceError> {
    model.rental_status().map_err(|_| {
        ServiceError::InternalError(format!(
            "rental {} carries unknown status '{}'",
            model.id, model.rental_status
        ))
    })
}

/// Flips the locker between occupied and available when a rental crosses
/// the `active` boundary. Returns the flip for event emission after commit.
async fn sync_occupancy<C: ConnectionTrait>(
    conn: &C,
    locker_id: Uuid,
    old_status: RentalStatus,
    new_status: RentalStatus,
) -> Result<Option<StatusFlip>, ServiceError> {
    let was_active = old_status == RentalStatus::Active;
    let is_active = new_status == RentalStatus::Active;
    if was_active == is_active {
        return Ok(None);
    }

    let target = find_locker(conn, locker_id).await?;
    if is_active {
        match locker_status(&target)? {
            LockerStatus::Available => {
                Ok(Some(mark_locker(conn, target, LockerStatus::Occupied).await?))
            }
            other => Err(ServiceError::LockerUnavailable(format!(
                "locker '{}' is {}",
                target.locker_number,
                other.as_str()
            ))),
        }
    } else {
        // Only release the locker if this rental actually held it.
        if locker_status(&target)? == LockerStatus::Occupied {
            Ok(Some(mark_locker(conn, target, LockerStatus::Available).await?))
        } else {
            Ok(None)
        }
    }
}

async fn mark_locker<C: ConnectionTrait>(
    conn: &C,
    target: locker::Model,
    status: LockerStatus,
) -> Result<StatusFlip, ServiceError> {
    let locker_id = target.id;
    let old_status = target.status.clone();
    let mut active: locker::ActiveModel = target.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Some(Utc::now()));
    active.update(conn).await?;

    Ok(StatusFlip {
        locker_id,
        old_status,
        new_status: status.as_str().to_string(),
    })
}
