//! Document number sequences.
//!
//! Numbers are derived at call time by querying the highest existing
//! number with the period prefix and incrementing its trailing 5-digit
//! counter; there is no separate sequence table. Sequences are scoped to
//! the calendar period of generation, not the document's effective date,
//! and each document kind is sequenced independently:
//!
//! - transactions: `TRX-YYYYMM-NNNNN`
//! - payments: `PAY-YYYYMMDD-NNNNN`
//! - invoices: `INV-YYYYMM-NNNNN`

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use model::entities::prelude::{Invoice, Payment, Transaction};
use model::entities::{invoice, payment, transaction};

use crate::error::Result;

/// Next journal entry number, sequenced per calendar month.
pub async fn next_transaction_number<C: ConnectionTrait>(conn: &C) -> Result<String> {
    let prefix = format!("TRX-{}-", Utc::now().format("%Y%m"));
    let last = Transaction::find()
        .filter(transaction::Column::TransactionNumber.starts_with(&prefix))
        .order_by_desc(transaction::Column::TransactionNumber)
        .one(conn)
        .await?;
    let number = increment_sequence(last.as_ref().map(|m| m.transaction_number.as_str()), &prefix);
    debug!("Generated transaction number {}", number);
    Ok(number)
}

/// Next payment number, sequenced per calendar day.
pub async fn next_payment_number<C: ConnectionTrait>(conn: &C) -> Result<String> {
    let prefix = format!("PAY-{}-", Utc::now().format("%Y%m%d"));
    let last = Payment::find()
        .filter(payment::Column::PaymentNumber.starts_with(&prefix))
        .order_by_desc(payment::Column::PaymentNumber)
        .one(conn)
        .await?;
    let number = increment_sequence(last.as_ref().map(|m| m.payment_number.as_str()), &prefix);
    debug!("Generated payment number {}", number);
    Ok(number)
}

/// Next invoice number, sequenced per calendar month.
pub async fn next_invoice_number<C: ConnectionTrait>(conn: &C) -> Result<String> {
    let prefix = format!("INV-{}-", Utc::now().format("%Y%m"));
    let last = Invoice::find()
        .filter(invoice::Column::InvoiceNumber.starts_with(&prefix))
        .order_by_desc(invoice::Column::InvoiceNumber)
        .one(conn)
        .await?;
    let number = increment_sequence(last.as_ref().map(|m| m.invoice_number.as_str()), &prefix);
    debug!("Generated invoice number {}", number);
    Ok(number)
}

/// Increments the trailing counter of the highest existing number, or
/// starts the period at 1. A malformed trailing counter restarts the
/// sequence rather than failing document creation.
fn increment_sequence(last: Option<&str>, prefix: &str) -> String {
    let next = last
        .and_then(|number| number.strip_prefix(prefix))
        .and_then(|counter| counter.parse::<u32>().ok())
        .map(|n| n + 1)
        .unwrap_or(1);
    format!("{prefix}{next:05}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

    #[test]
    fn first_of_the_period_starts_at_one() {
        assert_eq!(increment_sequence(None, "TRX-202406-"), "TRX-202406-00001");
    }

    #[test]
    fn increments_the_trailing_counter() {
        assert_eq!(
            increment_sequence(Some("TRX-202406-00041"), "TRX-202406-"),
            "TRX-202406-00042"
        );
    }

    #[test]
    fn malformed_counter_restarts_the_sequence() {
        assert_eq!(
            increment_sequence(Some("TRX-202406-garbage"), "TRX-202406-"),
            "TRX-202406-00001"
        );
    }

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None).await.expect("Failed to run migrations");
        db
    }

    async fn insert_transaction(db: &DatabaseConnection, number: &str) {
        transaction::ActiveModel {
            transaction_number: Set(number.to_string()),
            transaction_date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            transaction_type: Set("journal".to_string()),
            reference_kind: Set(None),
            reference_id: Set(None),
            description: Set("test".to_string()),
            amount: Set(Decimal::ZERO),
            status: Set(transaction::TransactionStatus::Draft),
            created_by: Set(1),
            created_at: Set(Utc::now()),
            posted_by: Set(None),
            posted_at: Set(None),
            voided_by: Set(None),
            voided_at: Set(None),
            void_reason: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("insert failed");
    }

    #[tokio::test]
    async fn transaction_numbers_are_monotonic_within_the_month() {
        let db = setup_db().await;

        let first = next_transaction_number(&db).await.unwrap();
        assert!(first.ends_with("-00001"));
        insert_transaction(&db, &first).await;

        let second = next_transaction_number(&db).await.unwrap();
        assert!(second.ends_with("-00002"));
        assert_eq!(&first[..first.len() - 5], &second[..second.len() - 5]);
    }

    #[tokio::test]
    async fn other_months_do_not_affect_the_sequence() {
        let db = setup_db().await;

        // A stale number from an old month is ignored by the prefix match.
        insert_transaction(&db, "TRX-200001-00099").await;

        let number = next_transaction_number(&db).await.unwrap();
        assert!(number.ends_with("-00001"));
    }
}
