//! Invoice creation and the recalculation contract.
//!
//! The invoice's derived fields (`total_amount`, `balance`, `status`)
//! are always recomputed together through [`recalculate`]. The payment
//! workflow is the only caller that changes `paid_amount`, and it does so
//! via [`apply_payment_delta`] so the derived fields can never drift from
//! the stored ones.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{info, instrument};

use model::entities::invoice::{self, InvoiceStatus};
use model::entities::prelude::{Invoice, Student};

use crate::audit::record_audit;
use crate::error::{LedgerError, Result};
use crate::numbering;

/// Input for issuing an invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub student_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub discount: Decimal,
}

/// Recomputes the derived fields from the independent ones.
///
/// Returns `(total_amount, balance, status)` for the given inputs and
/// reference date. Overdue only applies while money is still owed: a
/// fully paid invoice stays Paid regardless of its due date.
pub fn recalculate(
    subtotal: Decimal,
    discount: Decimal,
    paid_amount: Decimal,
    due_date: NaiveDate,
    today: NaiveDate,
) -> (Decimal, Decimal, InvoiceStatus) {
    let total = subtotal - discount;
    let balance = total - paid_amount;
    let status = if balance <= Decimal::ZERO {
        InvoiceStatus::Paid
    } else if due_date < today {
        InvoiceStatus::Overdue
    } else if paid_amount > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Unpaid
    };
    (total, balance, status)
}

/// Issues a new invoice to a student.
#[instrument(skip(db, new), fields(student_id = new.student_id))]
pub async fn create_invoice(
    db: &DatabaseConnection,
    new: NewInvoice,
    actor_id: i32,
) -> Result<invoice::Model> {
    if new.subtotal <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "invoice subtotal must be positive".to_string(),
        ));
    }
    if new.discount < Decimal::ZERO || new.discount > new.subtotal {
        return Err(LedgerError::Validation(
            "discount must be between zero and the subtotal".to_string(),
        ));
    }
    if new.due_date < new.issue_date {
        return Err(LedgerError::Validation(
            "due date cannot precede the issue date".to_string(),
        ));
    }

    let txn = db.begin().await?;

    Student::find_by_id(new.student_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            LedgerError::Validation(format!("student {} does not exist", new.student_id))
        })?;

    let number = numbering::next_invoice_number(&txn).await?;
    let today = Utc::now().date_naive();
    let (total, balance, status) =
        recalculate(new.subtotal, new.discount, Decimal::ZERO, new.due_date, today);

    let model = invoice::ActiveModel {
        invoice_number: Set(number),
        student_id: Set(new.student_id),
        issue_date: Set(new.issue_date),
        due_date: Set(new.due_date),
        subtotal: Set(new.subtotal),
        discount: Set(new.discount),
        total_amount: Set(total),
        paid_amount: Set(Decimal::ZERO),
        balance: Set(balance),
        status: Set(status),
        created_by: Set(actor_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    record_audit(
        &txn,
        "invoice",
        model.id,
        "create",
        None,
        Some(json!({
            "invoice_number": model.invoice_number,
            "total_amount": model.total_amount.to_string(),
        })),
        actor_id,
    )
    .await;

    txn.commit().await?;
    info!(
        "Invoice {} issued to student {} for {}",
        model.invoice_number, model.student_id, model.total_amount
    );
    Ok(model)
}

/// Adjusts `paid_amount` by `delta` (positive on receipt, negative on
/// cancellation) and recomputes the derived fields in the same write.
pub(crate) async fn apply_payment_delta<C: ConnectionTrait>(
    conn: &C,
    invoice_id: i32,
    delta: Decimal,
) -> Result<invoice::Model> {
    let current = Invoice::find_by_id(invoice_id)
        .one(conn)
        .await?
        .ok_or_else(|| LedgerError::Validation(format!("invoice {invoice_id} does not exist")))?;

    let paid = current.paid_amount + delta;
    let today = Utc::now().date_naive();
    let (total, balance, status) =
        recalculate(current.subtotal, current.discount, paid, current.due_date, today);

    let mut active: invoice::ActiveModel = current.into();
    active.paid_amount = Set(paid);
    active.total_amount = Set(total);
    active.balance = Set(balance);
    active.status = Set(status);
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    use model::entities::student;

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn totals_are_net_of_discount() {
        let (total, balance, status) =
            recalculate(d(100_000), d(10_000), Decimal::ZERO, date(2024, 7, 1), date(2024, 6, 1));
        assert_eq!(total, d(90_000));
        assert_eq!(balance, d(90_000));
        assert_eq!(status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn partial_payment_moves_to_partial() {
        let (_, balance, status) =
            recalculate(d(100_000), Decimal::ZERO, d(40_000), date(2024, 7, 1), date(2024, 6, 1));
        assert_eq!(balance, d(60_000));
        assert_eq!(status, InvoiceStatus::Partial);
    }

    #[test]
    fn zero_balance_is_paid_even_past_due() {
        let (_, balance, status) =
            recalculate(d(100_000), Decimal::ZERO, d(100_000), date(2024, 5, 1), date(2024, 6, 1));
        assert_eq!(balance, Decimal::ZERO);
        assert_eq!(status, InvoiceStatus::Paid);
    }

    #[test]
    fn outstanding_balance_past_due_is_overdue() {
        let (_, _, status) =
            recalculate(d(100_000), Decimal::ZERO, d(40_000), date(2024, 5, 1), date(2024, 6, 1));
        assert_eq!(status, InvoiceStatus::Overdue);
    }

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");
        db
    }

    async fn seed_student(db: &DatabaseConnection) -> i32 {
        student::ActiveModel {
            name: Set("Alex Tan".to_string()),
            program: Set("regular".to_string()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn creates_an_invoice_with_derived_fields() {
        let db = setup_db().await;
        let student_id = seed_student(&db).await;

        let future = Utc::now().date_naive() + chrono::Days::new(30);
        let inv = create_invoice(
            &db,
            NewInvoice {
                student_id,
                issue_date: Utc::now().date_naive(),
                due_date: future,
                subtotal: d(150_000),
                discount: d(15_000),
            },
            1,
        )
        .await
        .unwrap();

        assert!(inv.invoice_number.starts_with("INV-"));
        assert!(inv.invoice_number.ends_with("-00001"));
        assert_eq!(inv.total_amount, d(135_000));
        assert_eq!(inv.balance, d(135_000));
        assert_eq!(inv.paid_amount, Decimal::ZERO);
        assert_eq!(inv.status, InvoiceStatus::Unpaid);
    }

    #[tokio::test]
    async fn rejects_bad_amounts_and_dates() {
        let db = setup_db().await;
        let student_id = seed_student(&db).await;
        let today = Utc::now().date_naive();

        let bad_discount = create_invoice(
            &db,
            NewInvoice {
                student_id,
                issue_date: today,
                due_date: today,
                subtotal: d(10_000),
                discount: d(20_000),
            },
            1,
        )
        .await;
        assert!(matches!(bad_discount, Err(LedgerError::Validation(_))));

        let bad_dates = create_invoice(
            &db,
            NewInvoice {
                student_id,
                issue_date: today,
                due_date: today - chrono::Days::new(1),
                subtotal: d(10_000),
                discount: Decimal::ZERO,
            },
            1,
        )
        .await;
        assert!(matches!(bad_dates, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_student_is_a_validation_error() {
        let db = setup_db().await;
        let today = Utc::now().date_naive();

        let err = create_invoice(
            &db,
            NewInvoice {
                student_id: 999,
                issue_date: today,
                due_date: today,
                subtotal: d(10_000),
                discount: Decimal::ZERO,
            },
            1,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn payment_delta_recomputes_the_derived_fields() {
        let db = setup_db().await;
        let student_id = seed_student(&db).await;
        let future = Utc::now().date_naive() + chrono::Days::new(30);

        let inv = create_invoice(
            &db,
            NewInvoice {
                student_id,
                issue_date: Utc::now().date_naive(),
                due_date: future,
                subtotal: d(100_000),
                discount: Decimal::ZERO,
            },
            1,
        )
        .await
        .unwrap();

        let after = apply_payment_delta(&db, inv.id, d(40_000)).await.unwrap();
        assert_eq!(after.paid_amount, d(40_000));
        assert_eq!(after.balance, d(60_000));
        assert_eq!(after.status, InvoiceStatus::Partial);

        let settled = apply_payment_delta(&db, inv.id, d(60_000)).await.unwrap();
        assert_eq!(settled.balance, Decimal::ZERO);
        assert_eq!(settled.status, InvoiceStatus::Paid);

        // Cancellation path: the delta is negative and the status falls back.
        let reverted = apply_payment_delta(&db, inv.id, d(-100_000)).await.unwrap();
        assert_eq!(reverted.paid_amount, Decimal::ZERO);
        assert_eq!(reverted.status, InvoiceStatus::Unpaid);
    }
}
