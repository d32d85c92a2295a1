//! Database entity definitions (sea-orm models).

pub mod expense_transaction;
pub mod fund_request;
pub mod igp;
pub mod igp_supply;
pub mod igp_transaction;
pub mod locker;
pub mod locker_rental;
pub mod water_supply;
pub mod water_vendo;
