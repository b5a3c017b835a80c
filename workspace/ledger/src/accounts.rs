//! Account registry: the hierarchical chart of accounts and its running
//! balances.
//!
//! `current_balance` is mutated exclusively through
//! [`apply_balance_update`], which issues a single arithmetic `UPDATE`
//! statement so concurrent postings against the same account serialize in
//! the database instead of losing updates.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use model::entities::account::{self, AccountType, NormalBalance};
use model::entities::prelude::{Account, TransactionDetail};
use model::entities::transaction_detail;

use crate::audit::record_audit;
use crate::error::{LedgerError, Result};

/// Attempts at inserting an auto-generated code before giving up.
/// Concurrent sibling creation can race the read-then-write of
/// [`generate_next_code`]; the unique constraint on `code` catches it.
const CODE_GENERATION_ATTEMPTS: usize = 3;

/// Input for creating a chart-of-accounts node.
///
/// When `code` is `None` the next sibling code is generated. When
/// `parent_id` is given, the account type and level are derived from the
/// parent, not from the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: Option<String>,
    pub name: String,
    pub account_type: AccountType,
    pub parent_id: Option<i32>,
    pub is_postable: bool,
    pub description: Option<String>,
}

/// Creates an account as a single atomic insert.
#[instrument(skip(db))]
pub async fn create_account(
    db: &DatabaseConnection,
    new: NewAccount,
    actor_id: i32,
) -> Result<account::Model> {
    debug!("Creating account '{}' for actor {}", new.name, actor_id);

    if new.name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "account name must not be empty".to_string(),
        ));
    }

    let txn = db.begin().await?;

    // Derive type and level from the parent when one is given.
    let parent = match new.parent_id {
        Some(parent_id) => Some(
            Account::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    LedgerError::Validation(format!("parent account {parent_id} does not exist"))
                })?,
        ),
        None => None,
    };

    let account_type = parent.as_ref().map(|p| p.account_type).unwrap_or(new.account_type);
    let level = parent.as_ref().map(|p| p.level + 1).unwrap_or(1);
    let normal_balance = account_type.normal_balance();

    let sort_order = next_sort_order(&txn, new.parent_id).await?;

    let model = match &new.code {
        Some(code) => {
            let existing = Account::find()
                .filter(account::Column::Code.eq(code.clone()))
                .one(&txn)
                .await?;
            if existing.is_some() {
                return Err(LedgerError::Validation(format!(
                    "account code {code} already exists"
                )));
            }
            insert_account(&txn, code, &new, account_type, level, normal_balance, sort_order)
                .await?
        }
        None => {
            // Generated codes race concurrent sibling creation; retry on a
            // unique-constraint violation.
            let mut attempt = 0;
            loop {
                attempt += 1;
                let code = generate_next_code(&txn, new.parent_id).await?;
                match insert_account(
                    &txn,
                    &code,
                    &new,
                    account_type,
                    level,
                    normal_balance,
                    sort_order,
                )
                .await
                {
                    Ok(model) => break model,
                    Err(LedgerError::Database(err))
                        if LedgerError::is_unique_violation(&err)
                            && attempt < CODE_GENERATION_ATTEMPTS =>
                    {
                        warn!(
                            "Account code {} was taken concurrently, retrying (attempt {})",
                            code, attempt
                        );
                        continue;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    };

    record_audit(
        &txn,
        "account",
        model.id,
        "create",
        None,
        Some(json!({
            "code": model.code,
            "name": model.name,
            "parent_id": model.parent_id,
            "level": model.level,
            "is_postable": model.is_postable,
        })),
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!("Account {} ({}) created", model.code, model.name);
    Ok(model)
}

async fn insert_account<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    new: &NewAccount,
    account_type: AccountType,
    level: i32,
    normal_balance: NormalBalance,
    sort_order: i32,
) -> Result<account::Model> {
    let model = account::ActiveModel {
        code: Set(code.to_string()),
        name: Set(new.name.clone()),
        description: Set(new.description.clone()),
        account_type: Set(account_type),
        parent_id: Set(new.parent_id),
        level: Set(level),
        sort_order: Set(sort_order),
        is_postable: Set(new.is_postable),
        is_active: Set(true),
        normal_balance: Set(normal_balance),
        current_balance: Set(Decimal::ZERO),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(model)
}

async fn next_sort_order<C: ConnectionTrait>(conn: &C, parent_id: Option<i32>) -> Result<i32> {
    let siblings = siblings_of(conn, parent_id).await?;
    Ok(siblings.iter().map(|a| a.sort_order).max().unwrap_or(0) + 1)
}

async fn siblings_of<C: ConnectionTrait>(
    conn: &C,
    parent_id: Option<i32>,
) -> Result<Vec<account::Model>> {
    let query = match parent_id {
        Some(id) => Account::find().filter(account::Column::ParentId.eq(id)),
        None => Account::find().filter(account::Column::ParentId.is_null()),
    };
    Ok(query.all(conn).await?)
}

/// Returns the next sibling code under `parent_id`.
///
/// Under a parent the highest numeric suffix segment among the children is
/// incremented and zero-padded to two digits (parent `1.1` with child
/// `1.1.04` yields `1.1.05`; with no children, `1.1.01`). At the root only
/// integer codes participate; the highest is incremented (no integer-coded
/// roots yields `"1"`).
///
/// Read-only: calling this twice without creating an account in between
/// returns the same code both times.
#[instrument(skip(conn))]
pub async fn generate_next_code<C: ConnectionTrait>(
    conn: &C,
    parent_id: Option<i32>,
) -> Result<String> {
    match parent_id {
        Some(id) => {
            let parent = Account::find_by_id(id).one(conn).await?.ok_or_else(|| {
                LedgerError::Validation(format!("parent account {id} does not exist"))
            })?;

            let children = siblings_of(conn, Some(id)).await?;
            let highest = children
                .iter()
                .filter_map(|child| child.code.rsplit('.').next())
                .filter_map(|suffix| suffix.parse::<u32>().ok())
                .max();

            let next = highest.map(|n| n + 1).unwrap_or(1);
            Ok(format!("{}.{:02}", parent.code, next))
        }
        None => {
            let roots = siblings_of(conn, None).await?;
            let highest = roots
                .iter()
                .filter_map(|root| root.code.parse::<u32>().ok())
                .max();

            let next = highest.map(|n| n + 1).unwrap_or(1);
            Ok(next.to_string())
        }
    }
}

/// The only sanctioned mutator of `current_balance`.
///
/// Adds `debit - credit` for accounts that increase on debit
/// (asset/expense) and `credit - debit` otherwise. Must be invoked exactly
/// once per (account, line) pair per posting or voiding event.
pub(crate) async fn apply_balance_update<C: ConnectionTrait>(
    conn: &C,
    account_id: i32,
    debit: Decimal,
    credit: Decimal,
) -> Result<()> {
    let account = Account::find_by_id(account_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("account {account_id} does not exist"))
        })?;

    let delta = match account.normal_balance {
        NormalBalance::Debit => debit - credit,
        NormalBalance::Credit => credit - debit,
    };

    debug!(
        "Applying balance delta {} to account {} ({})",
        delta, account.code, account.name
    );

    // Single-statement arithmetic update: the database serializes
    // concurrent postings against the same account row.
    Account::update_many()
        .col_expr(
            account::Column::CurrentBalance,
            Expr::col(account::Column::CurrentBalance).add(Expr::val(delta)),
        )
        .filter(account::Column::Id.eq(account_id))
        .exec(conn)
        .await?;

    Ok(())
}

/// Soft-deletes an account.
///
/// Fails with a conflict when the account still has children or any
/// transaction history. Rows are never physically removed.
#[instrument(skip(db))]
pub async fn delete_account(db: &DatabaseConnection, account_id: i32, actor_id: i32) -> Result<()> {
    let txn = db.begin().await?;

    let account = Account::find_by_id(account_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("account {account_id} does not exist"))
        })?;

    let child_count = Account::find()
        .filter(account::Column::ParentId.eq(account_id))
        .count(&txn)
        .await?;
    if child_count > 0 {
        return Err(LedgerError::Conflict(format!(
            "account {} has {} child accounts",
            account.code, child_count
        )));
    }

    let detail_count = TransactionDetail::find()
        .filter(transaction_detail::Column::AccountId.eq(account_id))
        .count(&txn)
        .await?;
    if detail_count > 0 {
        return Err(LedgerError::Conflict(format!(
            "account {} has transaction history ({} lines)",
            account.code, detail_count
        )));
    }

    let code = account.code.clone();
    let mut active: account::ActiveModel = account.into();
    active.is_active = Set(false);
    active.update(&txn).await?;

    record_audit(
        &txn,
        "account",
        account_id,
        "delete",
        Some(json!({"is_active": true})),
        Some(json!({"is_active": false})),
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!("Account {} soft-deleted", code);
    Ok(())
}

/// Full ancestor path of an account as a human-readable breadcrumb,
/// e.g. `Assets > Current Assets > Cash`.
pub async fn account_path<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<String> {
    let mut names = Vec::new();
    let mut cursor = Some(account_id);
    let mut visited = std::collections::HashSet::new();

    while let Some(id) = cursor {
        if !visited.insert(id) {
            // Stop if the tree is corrupted into a cycle.
            break;
        }
        let account = Account::find_by_id(id).one(conn).await?.ok_or_else(|| {
            LedgerError::Validation(format!("account {id} does not exist"))
        })?;
        names.push(account.name);
        cursor = account.parent_id;
    }

    names.reverse();
    Ok(names.join(" > "))
}

/// All descendant ids of an account, depth-first over the children.
pub async fn descendant_ids<C: ConnectionTrait>(conn: &C, account_id: i32) -> Result<Vec<i32>> {
    let mut result = Vec::new();
    let mut stack = vec![account_id];

    while let Some(id) = stack.pop() {
        let children = Account::find()
            .filter(account::Column::ParentId.eq(id))
            .order_by_desc(account::Column::SortOrder)
            .all(conn)
            .await?;
        for child in children {
            result.push(child.id);
            stack.push(child.id);
        }
    }

    Ok(result)
}
