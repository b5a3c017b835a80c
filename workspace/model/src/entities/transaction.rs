use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Lifecycle of a journal entry: draft entries have no effect on account
/// balances, posting applies them, voiding reverses them while keeping the
/// lines as a historical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Posted")]
    Posted,
    #[sea_orm(string_value = "Void")]
    Void,
}

/// The kind of source document a journal entry traces back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReferenceKind {
    #[sea_orm(string_value = "Invoice")]
    Invoice,
    #[sea_orm(string_value = "Payment")]
    Payment,
}

/// A journal entry (ledger transaction) owning a set of balanced
/// debit/credit detail lines.
///
/// `transaction_number` follows `TRX-YYYYMM-NNNNN`, sequenced per calendar
/// month of creation. `amount` is the display total (sum of debit lines).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub transaction_number: String,
    pub transaction_date: NaiveDate,
    /// Free-form categorical tag: "receipt", "payment", "journal", ...
    pub transaction_type: String,
    pub reference_kind: Option<ReferenceKind>,
    pub reference_id: Option<i32>,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub created_by: i32,
    pub created_at: DateTimeUtc,
    pub posted_by: Option<i32>,
    pub posted_at: Option<DateTimeUtc>,
    pub voided_by: Option<i32>,
    pub voided_at: Option<DateTimeUtc>,
    pub void_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction_detail::Entity")]
    TransactionDetail,
}

impl Related<super::transaction_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
