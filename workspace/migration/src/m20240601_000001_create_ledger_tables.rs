use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::Id))
                    .col(string(Students::Name))
                    .col(string(Students::Program))
                    .col(boolean(Students::IsActive).default(true))
                    .to_owned(),
            )
            .await?;

        // Create accounts table (hierarchical chart of accounts)
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string_uniq(Accounts::Code))
                    .col(string(Accounts::Name))
                    .col(string_null(Accounts::Description))
                    .col(string_len(Accounts::AccountType, 20))
                    .col(integer_null(Accounts::ParentId))
                    .col(integer(Accounts::Level))
                    .col(integer(Accounts::SortOrder))
                    .col(boolean(Accounts::IsPostable))
                    .col(boolean(Accounts::IsActive).default(true))
                    .col(string_len(Accounts::NormalBalance, 10))
                    .col(decimal_len(Accounts::CurrentBalance, 16, 2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_parent")
                            .from(Accounts::Table, Accounts::ParentId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create invoices table
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(pk_auto(Invoices::Id))
                    .col(string_uniq(Invoices::InvoiceNumber))
                    .col(integer(Invoices::StudentId))
                    .col(date(Invoices::IssueDate))
                    .col(date(Invoices::DueDate))
                    .col(decimal_len(Invoices::Subtotal, 16, 2))
                    .col(decimal_len(Invoices::Discount, 16, 2))
                    .col(decimal_len(Invoices::TotalAmount, 16, 2))
                    .col(decimal_len(Invoices::PaidAmount, 16, 2))
                    .col(decimal_len(Invoices::Balance, 16, 2))
                    .col(string_len(Invoices::Status, 10))
                    .col(integer(Invoices::CreatedBy))
                    .col(timestamp_with_time_zone(Invoices::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_student")
                            .from(Invoices::Table, Invoices::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create transactions table (journal entries)
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(string_uniq(Transactions::TransactionNumber))
                    .col(date(Transactions::TransactionDate))
                    .col(string(Transactions::TransactionType))
                    .col(string_len_null(Transactions::ReferenceKind, 20))
                    .col(integer_null(Transactions::ReferenceId))
                    .col(string(Transactions::Description))
                    .col(decimal_len(Transactions::Amount, 16, 2))
                    .col(string_len(Transactions::Status, 10))
                    .col(integer(Transactions::CreatedBy))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt))
                    .col(integer_null(Transactions::PostedBy))
                    .col(timestamp_with_time_zone_null(Transactions::PostedAt))
                    .col(integer_null(Transactions::VoidedBy))
                    .col(timestamp_with_time_zone_null(Transactions::VoidedAt))
                    .col(string_null(Transactions::VoidReason))
                    .to_owned(),
            )
            .await?;

        // Create transaction_details table (journal lines)
        manager
            .create_table(
                Table::create()
                    .table(TransactionDetails::Table)
                    .if_not_exists()
                    .col(pk_auto(TransactionDetails::Id))
                    .col(integer(TransactionDetails::TransactionId))
                    .col(integer(TransactionDetails::AccountId))
                    .col(decimal_len(TransactionDetails::Debit, 16, 2))
                    .col(decimal_len(TransactionDetails::Credit, 16, 2))
                    .col(string_null(TransactionDetails::Description))
                    .col(integer(TransactionDetails::LineOrder))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detail_transaction")
                            .from(TransactionDetails::Table, TransactionDetails::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_detail_account")
                            .from(TransactionDetails::Table, TransactionDetails::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index for the "max transaction number with prefix" query
        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_number")
                    .table(Transactions::Table)
                    .col(Transactions::TransactionNumber)
                    .to_owned(),
            )
            .await?;

        // Create payments table
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(string_uniq(Payments::PaymentNumber))
                    .col(integer(Payments::InvoiceId))
                    .col(integer(Payments::AccountId))
                    .col(integer_null(Payments::TransactionId))
                    .col(decimal_len(Payments::Amount, 16, 2))
                    .col(date(Payments::PaymentDate))
                    .col(string_null(Payments::Method))
                    .col(string_null(Payments::Notes))
                    .col(string_len(Payments::Status, 10))
                    .col(integer(Payments::ConfirmedBy))
                    .col(timestamp_with_time_zone(Payments::ConfirmedAt))
                    .col(integer_null(Payments::CancelledBy))
                    .col(timestamp_with_time_zone_null(Payments::CancelledAt))
                    .col(string_null(Payments::CancelReason))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_invoice")
                            .from(Payments::Table, Payments::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_account")
                            .from(Payments::Table, Payments::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_transaction")
                            .from(Payments::Table, Payments::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    Name,
    Program,
    IsActive,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Code,
    Name,
    Description,
    AccountType,
    ParentId,
    Level,
    SortOrder,
    IsPostable,
    IsActive,
    NormalBalance,
    CurrentBalance,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    InvoiceNumber,
    StudentId,
    IssueDate,
    DueDate,
    Subtotal,
    Discount,
    TotalAmount,
    PaidAmount,
    Balance,
    Status,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TransactionNumber,
    TransactionDate,
    TransactionType,
    ReferenceKind,
    ReferenceId,
    Description,
    Amount,
    Status,
    CreatedBy,
    CreatedAt,
    PostedBy,
    PostedAt,
    VoidedBy,
    VoidedAt,
    VoidReason,
}

#[derive(DeriveIden)]
enum TransactionDetails {
    Table,
    Id,
    TransactionId,
    AccountId,
    Debit,
    Credit,
    Description,
    LineOrder,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    PaymentNumber,
    InvoiceId,
    AccountId,
    TransactionId,
    Amount,
    PaymentDate,
    Method,
    Notes,
    Status,
    ConfirmedBy,
    ConfirmedAt,
    CancelledBy,
    CancelledAt,
    CancelReason,
}
