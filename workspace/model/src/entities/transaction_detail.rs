use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{account, transaction};

/// A single journal line: exactly one of `debit`/`credit` is nonzero.
/// Lines are immutable once the owning transaction is posted, and are
/// deleted only together with a draft transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub transaction_id: i32,
    pub account_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub credit: Decimal,
    pub description: Option<String>,
    pub line_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "transaction::Entity",
        from = "Column::TransactionId",
        to = "transaction::Column::Id",
        on_delete = "Cascade"
    )]
    Transaction,
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AccountId",
        to = "account::Column::Id"
    )]
    Account,
}

impl Related<transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
