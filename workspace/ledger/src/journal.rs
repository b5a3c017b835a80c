//! Journal entries: creation, posting, voiding and draft deletion.
//!
//! An entry is created as a draft with balanced debit/credit lines and has
//! no effect on account balances until it is posted. Voiding a posted
//! entry applies the exact mirror of the posting (debit and credit swapped
//! into the balance mutator) and keeps the lines as a historical record.
//!
//! The payment workflow posts at creation time and the manual journal
//! path defers; both share this module through [`PostingMode`], so the
//! balance invariant logic exists exactly once.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use common::money::is_balanced;
use model::entities::prelude::{Account, Transaction, TransactionDetail};
use model::entities::transaction::{self, ReferenceKind, TransactionStatus};
use model::entities::transaction_detail;

use crate::accounts::apply_balance_update;
use crate::audit::record_audit;
use crate::error::{LedgerError, Result};
use crate::numbering;

/// Whether a new entry is posted in the same unit of work (payment
/// shortcut) or left as a draft for an explicit post step (manual
/// journal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingMode {
    Immediate,
    Deferred,
}

/// One side of a journal entry as supplied by the caller.
#[derive(Debug, Clone)]
pub struct JournalLine {
    pub account_id: i32,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_id: i32, amount: Decimal, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description,
        }
    }

    pub fn credit(account_id: i32, amount: Decimal, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description,
        }
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub transaction_date: NaiveDate,
    /// Free-form categorical tag: "receipt", "payment", "journal", ...
    pub transaction_type: String,
    pub description: String,
    pub reference: Option<(ReferenceKind, i32)>,
    pub lines: Vec<JournalLine>,
}

fn status_name(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Draft => "draft",
        TransactionStatus::Posted => "posted",
        TransactionStatus::Void => "void",
    }
}

/// Validates the line set and returns the (debit, credit) totals.
///
/// Order matters: line count first, then the balance of the totals, then
/// the per-line shape, so the caller always sees the most structural
/// problem first.
fn validate_lines(lines: &[JournalLine]) -> Result<(Decimal, Decimal)> {
    if lines.len() < 2 {
        return Err(LedgerError::Validation(
            "a journal entry requires at least two lines".to_string(),
        ));
    }

    let debit_total: Decimal = lines.iter().map(|l| l.debit).sum();
    let credit_total: Decimal = lines.iter().map(|l| l.credit).sum();
    if !is_balanced(debit_total, credit_total) {
        return Err(LedgerError::UnbalancedEntry {
            debit: debit_total,
            credit: credit_total,
        });
    }

    for (idx, line) in lines.iter().enumerate() {
        let index = idx + 1;
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::InvalidLine {
                index,
                reason: "debit and credit must not be negative".to_string(),
            });
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            return Err(LedgerError::InvalidLine {
                index,
                reason: "a line cannot have both a debit and a credit".to_string(),
            });
        }
        if line.debit == Decimal::ZERO && line.credit == Decimal::ZERO {
            return Err(LedgerError::InvalidLine {
                index,
                reason: "a line must have either a debit or a credit".to_string(),
            });
        }
    }

    Ok((debit_total, credit_total))
}

/// Creates a journal entry inside its own database transaction.
#[instrument(skip(db, entry), fields(lines = entry.lines.len(), mode = ?mode))]
pub async fn create_entry(
    db: &DatabaseConnection,
    entry: NewJournalEntry,
    mode: PostingMode,
    actor_id: i32,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;
    let model = create_entry_in(&txn, entry, mode, actor_id).await?;
    txn.commit().await?;
    Ok(model)
}

/// Creates a journal entry on an existing connection/transaction. Used by
/// workflows that bundle the entry with other writes in one unit of work.
pub(crate) async fn create_entry_in<C: ConnectionTrait>(
    conn: &C,
    entry: NewJournalEntry,
    mode: PostingMode,
    actor_id: i32,
) -> Result<transaction::Model> {
    let (debit_total, credit_total) = validate_lines(&entry.lines)?;
    debug!(
        "Creating journal entry '{}' with {} lines, totals {}/{}",
        entry.description,
        entry.lines.len(),
        debit_total,
        credit_total
    );

    // Every line must target a postable, active account. Header accounts
    // never receive lines directly.
    for line in &entry.lines {
        let account = Account::find_by_id(line.account_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(format!("account {} does not exist", line.account_id))
            })?;
        if !account.is_postable {
            return Err(LedgerError::InvalidAccount(format!(
                "account {} is a header account and cannot receive journal lines",
                account.code
            )));
        }
        if !account.is_active {
            return Err(LedgerError::InvalidAccount(format!(
                "account {} is inactive",
                account.code
            )));
        }
    }

    let number = numbering::next_transaction_number(conn).await?;
    let (reference_kind, reference_id) = match entry.reference {
        Some((kind, id)) => (Some(kind), Some(id)),
        None => (None, None),
    };

    let model = transaction::ActiveModel {
        transaction_number: Set(number),
        transaction_date: Set(entry.transaction_date),
        transaction_type: Set(entry.transaction_type.clone()),
        reference_kind: Set(reference_kind),
        reference_id: Set(reference_id),
        description: Set(entry.description.clone()),
        amount: Set(debit_total),
        status: Set(TransactionStatus::Draft),
        created_by: Set(actor_id),
        created_at: Set(Utc::now()),
        posted_by: Set(None),
        posted_at: Set(None),
        voided_by: Set(None),
        voided_at: Set(None),
        void_reason: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    for (idx, line) in entry.lines.iter().enumerate() {
        transaction_detail::ActiveModel {
            transaction_id: Set(model.id),
            account_id: Set(line.account_id),
            debit: Set(line.debit),
            credit: Set(line.credit),
            description: Set(line.description.clone()),
            line_order: Set((idx + 1) as i32),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    record_audit(
        conn,
        "transaction",
        model.id,
        "create",
        None,
        Some(json!({
            "transaction_number": model.transaction_number,
            "amount": model.amount.to_string(),
            "lines": entry.lines.len(),
        })),
        actor_id,
    )
    .await;

    info!(
        "Journal entry {} created as draft ({} lines)",
        model.transaction_number,
        entry.lines.len()
    );

    match mode {
        PostingMode::Deferred => Ok(model),
        PostingMode::Immediate => post_entry_in(conn, model.id, actor_id).await,
    }
}

/// Posts a draft entry: applies every line to its account balance and
/// stamps the transition.
#[instrument(skip(db))]
pub async fn post_entry(
    db: &DatabaseConnection,
    transaction_id: i32,
    actor_id: i32,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;
    let model = post_entry_in(&txn, transaction_id, actor_id).await?;
    txn.commit().await?;
    Ok(model)
}

pub(crate) async fn post_entry_in<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i32,
    actor_id: i32,
) -> Result<transaction::Model> {
    let entry = Transaction::find_by_id(transaction_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("transaction {transaction_id} does not exist"))
        })?;

    if entry.status != TransactionStatus::Draft {
        return Err(LedgerError::InvalidState(format!(
            "cannot post a {} transaction",
            status_name(entry.status)
        )));
    }

    let details = TransactionDetail::find()
        .filter(transaction_detail::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_detail::Column::LineOrder)
        .all(conn)
        .await?;

    for detail in &details {
        apply_balance_update(conn, detail.account_id, detail.debit, detail.credit).await?;
    }

    let number = entry.transaction_number.clone();
    let mut active: transaction::ActiveModel = entry.into();
    active.status = Set(TransactionStatus::Posted);
    active.posted_by = Set(Some(actor_id));
    active.posted_at = Set(Some(Utc::now()));
    let updated = active.update(conn).await?;

    record_audit(
        conn,
        "transaction",
        transaction_id,
        "post",
        Some(json!({"status": "draft"})),
        Some(json!({"status": "posted"})),
        actor_id,
    )
    .await;

    info!("Journal entry {} posted ({} lines)", number, details.len());
    Ok(updated)
}

/// Voids a posted entry: reverses its effect on every account balance by
/// swapping the debit/credit arguments, and keeps the lines untouched.
#[instrument(skip(db))]
pub async fn void_entry(
    db: &DatabaseConnection,
    transaction_id: i32,
    reason: &str,
    actor_id: i32,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;
    let model = void_entry_in(&txn, transaction_id, reason, actor_id).await?;
    txn.commit().await?;
    Ok(model)
}

pub(crate) async fn void_entry_in<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i32,
    reason: &str,
    actor_id: i32,
) -> Result<transaction::Model> {
    if reason.trim().is_empty() {
        return Err(LedgerError::Validation(
            "voiding requires a non-empty reason".to_string(),
        ));
    }

    let entry = Transaction::find_by_id(transaction_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("transaction {transaction_id} does not exist"))
        })?;

    if entry.status != TransactionStatus::Posted {
        return Err(LedgerError::InvalidState(format!(
            "cannot void a {} transaction",
            status_name(entry.status)
        )));
    }

    let details = TransactionDetail::find()
        .filter(transaction_detail::Column::TransactionId.eq(transaction_id))
        .all(conn)
        .await?;

    // Mirror of the posting: debit and credit swapped.
    for detail in &details {
        apply_balance_update(conn, detail.account_id, detail.credit, detail.debit).await?;
    }

    let number = entry.transaction_number.clone();
    let mut active: transaction::ActiveModel = entry.into();
    active.status = Set(TransactionStatus::Void);
    active.voided_by = Set(Some(actor_id));
    active.voided_at = Set(Some(Utc::now()));
    active.void_reason = Set(Some(reason.to_string()));
    let updated = active.update(conn).await?;

    record_audit(
        conn,
        "transaction",
        transaction_id,
        "void",
        Some(json!({"status": "posted"})),
        Some(json!({"status": "void", "reason": reason})),
        actor_id,
    )
    .await;

    info!("Journal entry {} voided: {}", number, reason);
    Ok(updated)
}

/// Deletes a draft entry and its lines. Posted and void entries are part
/// of the audit trail and cannot be deleted.
#[instrument(skip(db))]
pub async fn delete_entry(
    db: &DatabaseConnection,
    transaction_id: i32,
    actor_id: i32,
) -> Result<()> {
    let txn = db.begin().await?;

    let entry = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("transaction {transaction_id} does not exist"))
        })?;

    if entry.status != TransactionStatus::Draft {
        return Err(LedgerError::InvalidState(format!(
            "cannot delete a {} transaction",
            status_name(entry.status)
        )));
    }

    TransactionDetail::delete_many()
        .filter(transaction_detail::Column::TransactionId.eq(transaction_id))
        .exec(&txn)
        .await?;
    let number = entry.transaction_number.clone();
    Transaction::delete_by_id(transaction_id).exec(&txn).await?;

    record_audit(
        &txn,
        "transaction",
        transaction_id,
        "delete",
        Some(json!({"transaction_number": number, "status": "draft"})),
        None,
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!("Draft journal entry {} deleted", number);
    Ok(())
}
