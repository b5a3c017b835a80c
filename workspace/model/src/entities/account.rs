use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// The five fundamental account types of the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AccountType {
    #[sea_orm(string_value = "Asset")]
    Asset,
    #[sea_orm(string_value = "Liability")]
    Liability,
    #[sea_orm(string_value = "Equity")]
    Equity,
    #[sea_orm(string_value = "Income")]
    Income,
    #[sea_orm(string_value = "Expense")]
    Expense,
}

/// The side on which an account naturally increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum NormalBalance {
    #[sea_orm(string_value = "Debit")]
    Debit,
    #[sea_orm(string_value = "Credit")]
    Credit,
}

impl AccountType {
    /// Asset and expense accounts increase on debit; liability, equity and
    /// income accounts increase on credit.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => {
                NormalBalance::Credit
            }
        }
    }
}

/// A node in the hierarchical chart of accounts.
///
/// `code` is a dotted hierarchical string (e.g. `1.01`); `level` is the
/// depth from the root (roots are level 1). Header accounts
/// (`is_postable = false`) only group children and never receive journal
/// lines. `current_balance` is maintained exclusively by the posting
/// engine.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub account_type: AccountType,
    pub parent_id: Option<i32>,
    pub level: i32,
    pub sort_order: i32,
    pub is_postable: bool,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub normal_balance: NormalBalance,
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub current_balance: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Self-referential tree: an account optionally belongs to a parent.
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::transaction_detail::Entity")]
    TransactionDetail,
}

impl Related<super::transaction_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
