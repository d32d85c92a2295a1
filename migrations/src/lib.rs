pub use sea_orm_migration::prelude::*;

mod m20240201_000001_create_igp_tables;
mod m20240201_000002_create_water_tables;
mod m20240201_000003_create_fund_request_tables;
mod m20240201_000004_create_locker_tables;
mod m20240315_000005_add_listing_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240201_000001_create_igp_tables::Migration),
            Box::new(m20240201_000002_create_water_tables::Migration),
            Box::new(m20240201_000003_create_fund_request_tables::Migration),
            Box::new(m20240201_000004_create_locker_tables::Migration),
            Box::new(m20240315_000005_add_listing_indexes::Migration),
        ]
    }
}
