//! Transactional services. Every multi-row mutation runs inside a single
//! store transaction; parent totals are patched with version-checked updates
//! so overlapping writers to the same row cannot lose updates.

pub mod expenses;
pub mod fund_requests;
pub mod igp_supplies;
pub mod igp_transactions;
pub mod igps;
pub mod lockers;
pub mod rentals;
pub mod water_supplies;
pub mod water_vendos;
