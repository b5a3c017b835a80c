//! Payment receipt and cancellation workflows.
//!
//! Receiving a payment bundles four writes into one database transaction:
//! a two-line journal entry (debit the cash/bank account, credit the
//! contra account) posted immediately, the payment row linked to that
//! entry, the invoice's `paid_amount` adjustment, and the audit record.
//! Cancelling reverses each step by voiding the linked entry and applying
//! the negative delta.
//!
//! The contra side is resolved from [`ContraAccountPolicy`] so the choice
//! of receivable/income accounts is deployment configuration, not code.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use model::entities::account::{self, AccountType};
use model::entities::payment::{self, PaymentStatus};
use model::entities::prelude::{Account, Invoice, Payment, Student};
use model::entities::transaction::ReferenceKind;

use crate::audit::record_audit;
use crate::error::{LedgerError, Result};
use crate::invoices::apply_payment_delta;
use crate::journal::{create_entry_in, void_entry_in, JournalLine, NewJournalEntry, PostingMode};
use crate::numbering;

/// Which account receives the credit side of a payment receipt.
///
/// Resolution order:
/// 1. `receivable_code`, when set and the account exists (invoices are
///    carried as receivables),
/// 2. the income account mapped to the student's program,
/// 3. `default_income_code`.
#[derive(Debug, Clone)]
pub struct ContraAccountPolicy {
    pub receivable_code: Option<String>,
    pub program_income_codes: HashMap<String, String>,
    pub default_income_code: String,
}

impl Default for ContraAccountPolicy {
    fn default() -> Self {
        Self {
            receivable_code: Some("1.03".to_string()),
            program_income_codes: HashMap::new(),
            default_income_code: "4.01".to_string(),
        }
    }
}

/// Input for receiving a payment against an invoice.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub invoice_id: i32,
    /// The cash/bank asset account the money landed in.
    pub account_id: i32,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: Option<String>,
    pub notes: Option<String>,
}

async fn find_postable_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<account::Model>> {
    let found = Account::find()
        .filter(account::Column::Code.eq(code))
        .one(conn)
        .await?;
    Ok(found.filter(|a| a.is_postable && a.is_active))
}

/// Picks the credit-side account for a receipt per the policy order.
async fn resolve_contra_account<C: ConnectionTrait>(
    conn: &C,
    policy: &ContraAccountPolicy,
    program: &str,
) -> Result<account::Model> {
    if let Some(code) = &policy.receivable_code {
        if let Some(found) = find_postable_by_code(conn, code).await? {
            return Ok(found);
        }
        debug!(
            "Receivable account {} not usable, falling back to income",
            code
        );
    }

    let income_code = policy
        .program_income_codes
        .get(program)
        .map(String::as_str)
        .unwrap_or(&policy.default_income_code);

    find_postable_by_code(conn, income_code)
        .await?
        .ok_or_else(|| {
            LedgerError::InvalidAccount(format!(
                "no usable contra account: {income_code} is missing, a header, or inactive"
            ))
        })
}

/// Receives a payment: posts the journal entry, records the payment and
/// updates the invoice, all in one database transaction.
#[instrument(skip(db, new, policy), fields(invoice_id = new.invoice_id, amount = %new.amount))]
pub async fn receive_payment(
    db: &DatabaseConnection,
    new: NewPayment,
    policy: &ContraAccountPolicy,
    actor_id: i32,
) -> Result<payment::Model> {
    if new.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "payment amount must be positive".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let invoice = Invoice::find_by_id(new.invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("invoice {} does not exist", new.invoice_id))
        })?;
    if new.amount > invoice.balance {
        return Err(LedgerError::ExceedsBalance {
            amount: new.amount,
            balance: invoice.balance,
        });
    }

    let cash_account = Account::find_by_id(new.account_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("account {} does not exist", new.account_id))
        })?;
    if cash_account.account_type != AccountType::Asset {
        return Err(LedgerError::InvalidAccount(format!(
            "account {} is not an asset account",
            cash_account.code
        )));
    }
    if !cash_account.is_postable || !cash_account.is_active {
        return Err(LedgerError::InvalidAccount(format!(
            "account {} cannot receive postings",
            cash_account.code
        )));
    }

    let student = Student::find_by_id(invoice.student_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("student {} does not exist", invoice.student_id))
        })?;
    let contra = resolve_contra_account(&txn, policy, &student.program).await?;

    let payment_number = numbering::next_payment_number(&txn).await?;
    let description = format!(
        "Payment {} for invoice {}",
        payment_number, invoice.invoice_number
    );

    let entry = create_entry_in(
        &txn,
        NewJournalEntry {
            transaction_date: new.payment_date,
            transaction_type: "receipt".to_string(),
            description: description.clone(),
            reference: Some((ReferenceKind::Invoice, invoice.id)),
            lines: vec![
                JournalLine::debit(
                    cash_account.id,
                    new.amount,
                    Some("received payment".to_string()),
                ),
                JournalLine::credit(contra.id, new.amount, Some(description)),
            ],
        },
        PostingMode::Immediate,
        actor_id,
    )
    .await?;

    let model = payment::ActiveModel {
        payment_number: Set(payment_number),
        invoice_id: Set(invoice.id),
        account_id: Set(cash_account.id),
        transaction_id: Set(Some(entry.id)),
        amount: Set(new.amount),
        payment_date: Set(new.payment_date),
        method: Set(new.method),
        notes: Set(new.notes),
        status: Set(PaymentStatus::Confirmed),
        confirmed_by: Set(actor_id),
        confirmed_at: Set(Utc::now()),
        cancelled_by: Set(None),
        cancelled_at: Set(None),
        cancel_reason: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    apply_payment_delta(&txn, invoice.id, new.amount).await?;

    record_audit(
        &txn,
        "payment",
        model.id,
        "receive",
        None,
        Some(json!({
            "payment_number": model.payment_number,
            "invoice_id": invoice.id,
            "amount": model.amount.to_string(),
            "transaction_id": entry.id,
        })),
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!(
        "Payment {} of {} received against invoice {} (entry {})",
        model.payment_number, model.amount, invoice.invoice_number, entry.transaction_number
    );
    Ok(model)
}

/// Cancels a confirmed payment: voids the linked journal entry, rolls the
/// invoice's paid amount back and stamps the cancellation.
#[instrument(skip(db))]
pub async fn cancel_payment(
    db: &DatabaseConnection,
    payment_id: i32,
    reason: &str,
    actor_id: i32,
) -> Result<payment::Model> {
    if reason.trim().is_empty() {
        return Err(LedgerError::Validation(
            "cancelling requires a non-empty reason".to_string(),
        ));
    }

    let txn = db.begin().await?;

    let existing = Payment::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| LedgerError::Validation(format!("payment {payment_id} does not exist")))?;

    if existing.status == PaymentStatus::Cancelled {
        return Err(LedgerError::AlreadyCancelled(payment_id));
    }

    if let Some(transaction_id) = existing.transaction_id {
        void_entry_in(&txn, transaction_id, reason, actor_id).await?;
    }

    apply_payment_delta(&txn, existing.invoice_id, -existing.amount).await?;

    let number = existing.payment_number.clone();
    let amount = existing.amount;
    let mut active: payment::ActiveModel = existing.into();
    active.status = Set(PaymentStatus::Cancelled);
    active.cancelled_by = Set(Some(actor_id));
    active.cancelled_at = Set(Some(Utc::now()));
    active.cancel_reason = Set(Some(reason.to_string()));
    let updated = active.update(&txn).await?;

    record_audit(
        &txn,
        "payment",
        payment_id,
        "cancel",
        Some(json!({"status": "confirmed"})),
        Some(json!({"status": "cancelled", "reason": reason})),
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!("Payment {} of {} cancelled: {}", number, amount, reason);
    Ok(updated)
}
