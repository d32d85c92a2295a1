use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WaterVendos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaterVendos::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::Location)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::GallonsUsed)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::Revenue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::TotalExpenses)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::VendoStatus)
                            .string()
                            .not_null()
                            .default("operational"),
                    )
                    .col(
                        ColumnDef::new(WaterVendos::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(WaterVendos::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(WaterVendos::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WaterSupplies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WaterSupplies::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WaterSupplies::VendoId).uuid().not_null())
                    .col(
                        ColumnDef::new(WaterSupplies::SuppliedGallons)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::UsedGallons)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::Expenses)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::Revenue)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::SupplyDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(WaterSupplies::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WaterSupplies::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_water_supplies_vendo")
                            .from(WaterSupplies::Table, WaterSupplies::VendoId)
                            .to(WaterVendos::Table, WaterVendos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WaterSupplies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WaterVendos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum WaterVendos {
    Table,
    Id,
    Location,
    GallonsUsed,
    Revenue,
    TotalExpenses,
    VendoStatus,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum WaterSupplies {
    Table,
    Id,
    VendoId,
    SuppliedGallons,
    UsedGallons,
    Expenses,
    Revenue,
    SupplyDate,
    Version,
    CreatedAt,
    UpdatedAt,
}
