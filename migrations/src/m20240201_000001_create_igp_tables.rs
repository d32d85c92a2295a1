use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Igps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Igps::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Igps::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Igps::IgpType).string().not_null())
                    .col(ColumnDef::new(Igps::Description).text().null())
                    .col(ColumnDef::new(Igps::UnitPrice).decimal().not_null())
                    .col(ColumnDef::new(Igps::Semester).string().null())
                    .col(
                        ColumnDef::new(Igps::TotalSold)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Igps::Revenue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Igps::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Igps::Version).integer().not_null().default(1))
                    .col(ColumnDef::new(Igps::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Igps::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IgpSupplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IgpSupplies::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IgpSupplies::IgpId).uuid().not_null())
                    .col(ColumnDef::new(IgpSupplies::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(IgpSupplies::QuantitySold)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(IgpSupplies::UnitCost)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(IgpSupplies::Expenses)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(IgpSupplies::TotalRevenue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(IgpSupplies::SupplyDate).timestamp().not_null())
                    .col(
                        ColumnDef::new(IgpSupplies::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(IgpSupplies::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(IgpSupplies::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_igp_supplies_igp")
                            .from(IgpSupplies::Table, IgpSupplies::IgpId)
                            .to(Igps::Table, Igps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IgpTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IgpTransactions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IgpTransactions::IgpId).uuid().not_null())
                    .col(ColumnDef::new(IgpTransactions::SupplyId).uuid().not_null())
                    .col(ColumnDef::new(IgpTransactions::Purchaser).string().not_null())
                    .col(ColumnDef::new(IgpTransactions::Batch).string().null())
                    .col(ColumnDef::new(IgpTransactions::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(IgpTransactions::UnitPriceAtPurchase)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IgpTransactions::ReceiptStatus)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(IgpTransactions::DatePurchased)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IgpTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(IgpTransactions::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_igp_transactions_igp")
                            .from(IgpTransactions::Table, IgpTransactions::IgpId)
                            .to(Igps::Table, Igps::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_igp_transactions_supply")
                            .from(IgpTransactions::Table, IgpTransactions::SupplyId)
                            .to(IgpSupplies::Table, IgpSupplies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IgpTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(IgpSupplies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Igps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Igps {
    Table,
    Id,
    Name,
    IgpType,
    Description,
    UnitPrice,
    Semester,
    TotalSold,
    Revenue,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum IgpSupplies {
    Table,
    Id,
    IgpId,
    Quantity,
    QuantitySold,
    UnitCost,
    Expenses,
    TotalRevenue,
    SupplyDate,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum IgpTransactions {
    Table,
    Id,
    IgpId,
    SupplyId,
    Purchaser,
    Batch,
    Quantity,
    UnitPriceAtPurchase,
    ReceiptStatus,
    DatePurchased,
    CreatedAt,
    UpdatedAt,
}
