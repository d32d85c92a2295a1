//! HTTP handlers. Each module holds the request/response DTOs and thin
//! axum handlers for one dashboard area; all business rules live in the
//! service layer.

pub mod fund_requests;
pub mod igp;
pub mod lockers;
pub mod water;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{events::EventSender, services};

/// Aggregated services shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub igps: Arc<services::igps::IgpService>,
    pub igp_supplies: Arc<services::igp_supplies::IgpSupplyService>,
    pub igp_transactions: Arc<services::igp_transactions::IgpTransactionService>,
    pub water_vendos: Arc<services::water_vendos::WaterVendoService>,
    pub water_supplies: Arc<services::water_supplies::WaterSupplyService>,
    pub fund_requests: Arc<services::fund_requests::FundRequestService>,
    pub expenses: Arc<services::expenses::ExpenseService>,
    pub lockers: Arc<services::lockers::LockerService>,
    pub rentals: Arc<services::rentals::RentalService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            igps: Arc::new(services::igps::IgpService::new(
                db.clone(),
                event_sender.clone(),
            )),
            igp_supplies: Arc::new(services::igp_supplies::IgpSupplyService::new(
                db.clone(),
                event_sender.clone(),
            )),
            igp_transactions: Arc::new(services::igp_transactions::IgpTransactionService::new(
                db.clone(),
                event_sender.clone(),
            )),
            water_vendos: Arc::new(services::water_vendos::WaterVendoService::new(db.clone())),
            water_supplies: Arc::new(services::water_supplies::WaterSupplyService::new(
                db.clone(),
                event_sender.clone(),
            )),
            fund_requests: Arc::new(services::fund_requests::FundRequestService::new(
                db.clone(),
                event_sender.clone(),
            )),
            expenses: Arc::new(services::expenses::ExpenseService::new(
                db.clone(),
                event_sender.clone(),
            )),
            lockers: Arc::new(services::lockers::LockerService::new(
                db.clone(),
                event_sender.clone(),
            )),
            rentals: Arc::new(services::rentals::RentalService::new(db, event_sender)),
        }
    }
}
