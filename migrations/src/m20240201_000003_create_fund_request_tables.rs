use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FundRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundRequests::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FundRequests::RequestCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(FundRequests::Purpose).text().not_null())
                    .col(ColumnDef::new(FundRequests::Amount).decimal().not_null())
                    .col(
                        ColumnDef::new(FundRequests::UtilizedFunds)
                            .decimal()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(FundRequests::Status)
                            .string()
                            .not_null()
                            .default("submitted"),
                    )
                    .col(
                        ColumnDef::new(FundRequests::CurrentStep)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(FundRequests::IsRejected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FundRequests::RejectionStep)
                            .small_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(FundRequests::RejectionReason).text().null())
                    .col(ColumnDef::new(FundRequests::Requestor).string().not_null())
                    .col(ColumnDef::new(FundRequests::DateNeeded).timestamp().null())
                    .col(
                        ColumnDef::new(FundRequests::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(FundRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundRequests::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseTransactions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::RequestId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::ExpenseName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::Amount)
                            .decimal()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::ReceiptReference)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::DateIncurred)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseTransactions::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_transactions_request")
                            .from(ExpenseTransactions::Table, ExpenseTransactions::RequestId)
                            .to(FundRequests::Table, FundRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expense_transactions_request_name")
                    .table(ExpenseTransactions::Table)
                    .col(ExpenseTransactions::RequestId)
                    .col(ExpenseTransactions::ExpenseName)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpenseTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum FundRequests {
    Table,
    Id,
    RequestCode,
    Purpose,
    Amount,
    UtilizedFunds,
    Status,
    CurrentStep,
    IsRejected,
    RejectionStep,
    RejectionReason,
    Requestor,
    DateNeeded,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ExpenseTransactions {
    Table,
    Id,
    RequestId,
    ExpenseName,
    Amount,
    Status,
    ReceiptReference,
    DateIncurred,
    CreatedAt,
    UpdatedAt,
}
