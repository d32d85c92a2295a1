use sea_orm_migration::prelude::*;

use crate::m20240201_000001_create_igp_tables::IgpTransactions;
use crate::m20240201_000002_create_water_tables::WaterSupplies;
use crate::m20240201_000003_create_fund_request_tables::{ExpenseTransactions, FundRequests};
use crate::m20240201_000004_create_locker_tables::LockerRentals;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_igp_transactions_igp_id")
                    .table(IgpTransactions::Table)
                    .col(IgpTransactions::IgpId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_igp_transactions_supply_id")
                    .table(IgpTransactions::Table)
                    .col(IgpTransactions::SupplyId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_water_supplies_vendo_id")
                    .table(WaterSupplies::Table)
                    .col(WaterSupplies::VendoId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_expense_transactions_request_id")
                    .table(ExpenseTransactions::Table)
                    .col(ExpenseTransactions::RequestId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_fund_requests_status")
                    .table(FundRequests::Table)
                    .col(FundRequests::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_locker_rentals_locker_id")
                    .table(LockerRentals::Table)
                    .col(LockerRentals::LockerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_locker_rentals_status")
                    .table(LockerRentals::Table)
                    .col(LockerRentals::RentalStatus)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_igp_transactions_igp_id",
            "idx_igp_transactions_supply_id",
            "idx_water_supplies_vendo_id",
            "idx_expense_transactions_request_id",
            "idx_fund_requests_status",
            "idx_locker_rentals_locker_id",
            "idx_locker_rentals_status",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
