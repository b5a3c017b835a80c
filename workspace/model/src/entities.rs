//! This file serves as the root for all SeaORM entity modules.
//! The data models for the school bookkeeping application are defined
//! here: the hierarchical chart of accounts, journal entries with their
//! detail lines, invoices, payments, students and the audit trail.

pub mod account;
pub mod audit_log;
pub mod invoice;
pub mod payment;
pub mod student;
pub mod transaction;
pub mod transaction_detail;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::audit_log::Entity as AuditLog;
    pub use super::invoice::Entity as Invoice;
    pub use super::payment::Entity as Payment;
    pub use super::student::Entity as Student;
    pub use super::transaction::Entity as Transaction;
    pub use super::transaction_detail::Entity as TransactionDetail;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        // Create a small account tree: a header asset account with one
        // postable child.
        let assets = account::ActiveModel {
            code: Set("1".to_string()),
            name: Set("Assets".to_string()),
            description: Set(None),
            account_type: Set(account::AccountType::Asset),
            parent_id: Set(None),
            level: Set(1),
            sort_order: Set(1),
            is_postable: Set(false),
            is_active: Set(true),
            normal_balance: Set(account::NormalBalance::Debit),
            current_balance: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let cash = account::ActiveModel {
            code: Set("1.01".to_string()),
            name: Set("Cash".to_string()),
            description: Set(Some("Petty cash".to_string())),
            account_type: Set(account::AccountType::Asset),
            parent_id: Set(Some(assets.id)),
            level: Set(2),
            sort_order: Set(1),
            is_postable: Set(true),
            is_active: Set(true),
            normal_balance: Set(account::NormalBalance::Debit),
            current_balance: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let tuition = account::ActiveModel {
            code: Set("4.01".to_string()),
            name: Set("Tuition Income".to_string()),
            description: Set(None),
            account_type: Set(account::AccountType::Income),
            parent_id: Set(None),
            level: Set(1),
            sort_order: Set(4),
            is_postable: Set(true),
            is_active: Set(true),
            normal_balance: Set(account::NormalBalance::Credit),
            current_balance: Set(Decimal::ZERO),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // A journal entry with two balanced lines.
        let entry = transaction::ActiveModel {
            transaction_number: Set("TRX-202401-00001".to_string()),
            transaction_date: Set(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            transaction_type: Set("journal".to_string()),
            reference_kind: Set(None),
            reference_id: Set(None),
            description: Set("Opening tuition receipt".to_string()),
            amount: Set(Decimal::new(10000000, 2)),
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
        .insert(&db)
        .await?;

        let debit_line = transaction_detail::ActiveModel {
            transaction_id: Set(entry.id),
            account_id: Set(cash.id),
            debit: Set(Decimal::new(10000000, 2)),
            credit: Set(Decimal::ZERO),
            description: Set(Some("received payment".to_string())),
            line_order: Set(1),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let credit_line = transaction_detail::ActiveModel {
            transaction_id: Set(entry.id),
            account_id: Set(tuition.id),
            debit: Set(Decimal::ZERO),
            credit: Set(Decimal::new(10000000, 2)),
            description: Set(None),
            line_order: Set(2),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // A student with an invoice and a payment against it.
        let student = student::ActiveModel {
            name: Set("Siti Rahma".to_string()),
            program: Set("regular".to_string()),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let invoice = invoice::ActiveModel {
            invoice_number: Set("INV-202401-00001".to_string()),
            student_id: Set(student.id),
            issue_date: Set(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            due_date: Set(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            subtotal: Set(Decimal::new(5000000, 2)),
            discount: Set(Decimal::ZERO),
            total_amount: Set(Decimal::new(5000000, 2)),
            paid_amount: Set(Decimal::ZERO),
            balance: Set(Decimal::new(5000000, 2)),
            status: Set(invoice::InvoiceStatus::Unpaid),
            created_by: Set(1),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let payment = payment::ActiveModel {
            payment_number: Set("PAY-20240115-00001".to_string()),
            invoice_id: Set(invoice.id),
            account_id: Set(cash.id),
            transaction_id: Set(Some(entry.id)),
            amount: Set(Decimal::new(5000000, 2)),
            payment_date: Set(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            method: Set(Some("cash".to_string())),
            notes: Set(None),
            status: Set(payment::PaymentStatus::Confirmed),
            confirmed_by: Set(1),
            confirmed_at: Set(Utc::now()),
            cancelled_by: Set(None),
            cancelled_at: Set(None),
            cancel_reason: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify relationships.
        let accounts = Account::find().all(&db).await?;
        assert_eq!(accounts.len(), 3);

        let children = Account::find()
            .filter(account::Column::ParentId.eq(assets.id))
            .all(&db)
            .await?;
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, cash.id);

        let lines = TransactionDetail::find()
            .filter(transaction_detail::Column::TransactionId.eq(entry.id))
            .all(&db)
            .await?;
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.id == debit_line.id));
        assert!(lines.iter().any(|l| l.id == credit_line.id));

        let cash_lines = TransactionDetail::find()
            .filter(transaction_detail::Column::AccountId.eq(cash.id))
            .all(&db)
            .await?;
        assert_eq!(cash_lines.len(), 1);
        assert_eq!(cash_lines[0].debit, Decimal::new(10000000, 2));

        let invoices = Invoice::find()
            .filter(invoice::Column::StudentId.eq(student.id))
            .all(&db)
            .await?;
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_number, "INV-202401-00001");

        let payments = Payment::find()
            .filter(payment::Column::InvoiceId.eq(invoice.id))
            .all(&db)
            .await?;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, payment.id);
        assert_eq!(payments[0].transaction_id, Some(entry.id));

        // Deleting a draft transaction cascades its lines.
        Transaction::delete_by_id(entry.id).exec(&db).await?;
        let remaining = TransactionDetail::find()
            .filter(transaction_detail::Column::TransactionId.eq(entry.id))
            .all(&db)
            .await?;
        assert!(remaining.is_empty());

        Ok(())
    }
}
