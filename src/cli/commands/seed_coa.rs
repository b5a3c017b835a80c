use anyhow::Result;
use ledger::accounts::{create_account, NewAccount};
use model::entities::account::{self, AccountType};
use model::entities::prelude::Account;
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{debug, info};

struct SeedAccount {
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    parent_code: Option<&'static str>,
    is_postable: bool,
}

/// The default chart of accounts for a school: five root headers plus the
/// postable leaves the payment workflow relies on (cash, bank, accounts
/// receivable and the income accounts).
const DEFAULT_CHART: &[SeedAccount] = &[
    SeedAccount { code: "1", name: "Assets", account_type: AccountType::Asset, parent_code: None, is_postable: false },
    SeedAccount { code: "1.01", name: "Cash", account_type: AccountType::Asset, parent_code: Some("1"), is_postable: true },
    SeedAccount { code: "1.02", name: "Bank", account_type: AccountType::Asset, parent_code: Some("1"), is_postable: true },
    SeedAccount { code: "1.03", name: "Accounts Receivable", account_type: AccountType::Asset, parent_code: Some("1"), is_postable: true },
    SeedAccount { code: "2", name: "Liabilities", account_type: AccountType::Liability, parent_code: None, is_postable: false },
    SeedAccount { code: "3", name: "Equity", account_type: AccountType::Equity, parent_code: None, is_postable: false },
    SeedAccount { code: "4", name: "Income", account_type: AccountType::Income, parent_code: None, is_postable: false },
    SeedAccount { code: "4.01", name: "Tuition Income", account_type: AccountType::Income, parent_code: Some("4"), is_postable: true },
    SeedAccount { code: "4.02", name: "Registration Income", account_type: AccountType::Income, parent_code: Some("4"), is_postable: true },
    SeedAccount { code: "5", name: "Expenses", account_type: AccountType::Expense, parent_code: None, is_postable: false },
];

async fn find_by_code(db: &DatabaseConnection, code: &str) -> Result<Option<account::Model>> {
    Ok(Account::find()
        .filter(account::Column::Code.eq(code))
        .one(db)
        .await?)
}

/// Seeds the default chart of accounts. Accounts whose code already
/// exists are left untouched, so re-running is safe.
pub async fn seed_chart_of_accounts(database_url: &str, actor_id: i32) -> Result<()> {
    info!("Seeding the default chart of accounts");
    let db = Database::connect(database_url).await?;

    let mut created = 0;
    for seed in DEFAULT_CHART {
        if find_by_code(&db, seed.code).await?.is_some() {
            debug!("Account {} already exists, skipping", seed.code);
            continue;
        }

        let parent_id = match seed.parent_code {
            Some(parent_code) => Some(
                find_by_code(&db, parent_code)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("parent account {parent_code} is missing from the seed")
                    })?
                    .id,
            ),
            None => None,
        };

        create_account(
            &db,
            NewAccount {
                code: Some(seed.code.to_string()),
                name: seed.name.to_string(),
                account_type: seed.account_type,
                parent_id,
                is_postable: seed.is_postable,
                description: None,
            },
            actor_id,
        )
        .await?;
        info!("Created account {} {}", seed.code, seed.name);
        created += 1;
    }

    info!(
        "Chart of accounts seeding finished ({} created, {} already present)",
        created,
        DEFAULT_CHART.len() - created
    );
    Ok(())
}
