use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lockers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lockers::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Lockers::LockerNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Lockers::Section).string().not_null())
                    .col(
                        ColumnDef::new(Lockers::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Lockers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Lockers::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LockerRentals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LockerRentals::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LockerRentals::LockerId).uuid().not_null())
                    .col(ColumnDef::new(LockerRentals::RenterName).string().not_null())
                    .col(
                        ColumnDef::new(LockerRentals::RenterEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LockerRentals::RentalStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(LockerRentals::DateRented)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LockerRentals::DateDue).timestamp().not_null())
                    .col(
                        ColumnDef::new(LockerRentals::PaymentAmount)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(LockerRentals::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LockerRentals::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_locker_rentals_locker")
                            .from(LockerRentals::Table, LockerRentals::LockerId)
                            .to(Lockers::Table, Lockers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LockerRentals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lockers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Lockers {
    Table,
    Id,
    LockerNumber,
    Section,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum LockerRentals {
    Table,
    Id,
    LockerId,
    RenterName,
    RenterEmail,
    RentalStatus,
    DateRented,
    DateDue,
    PaymentAmount,
    CreatedAt,
    UpdatedAt,
}
