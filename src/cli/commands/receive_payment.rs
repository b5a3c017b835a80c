use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use ledger::payments::{self, NewPayment};
use model::entities::account;
use model::entities::prelude::Account;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Database, EntityTrait, QueryFilter};
use tracing::info;

use crate::config;

/// Records a payment against an invoice from the command line. The
/// contra-account policy comes from the environment.
pub async fn receive_payment(
    database_url: &str,
    invoice_id: i32,
    account_code: &str,
    amount: Decimal,
    payment_date: Option<NaiveDate>,
    method: Option<String>,
    actor_id: i32,
) -> Result<()> {
    let db = Database::connect(database_url).await?;

    let account = Account::find()
        .filter(account::Column::Code.eq(account_code))
        .one(&db)
        .await?;
    let Some(account) = account else {
        bail!("no account with code {account_code}");
    };

    let policy = config::contra_policy_from_env();
    let payment = payments::receive_payment(
        &db,
        NewPayment {
            invoice_id,
            account_id: account.id,
            amount,
            payment_date: payment_date.unwrap_or_else(|| Utc::now().date_naive()),
            method,
            notes: None,
        },
        &policy,
        actor_id,
    )
    .await?;

    info!(
        "Recorded payment {} of {} against invoice {}",
        payment.payment_number, payment.amount, invoice_id
    );
    Ok(())
}
