use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for the ledger services.
///
/// All of these are local, synchronous failures raised at the point of
/// violation; none are retried automatically. The enclosing database
/// transaction is rolled back whenever one of them propagates.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed input: missing required field, unknown foreign key,
    /// duplicate account code.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Debit and credit totals differ beyond the rounding tolerance.
    #[error("Unbalanced entry: debit total is {debit}, credit total is {credit}")]
    UnbalancedEntry { debit: Decimal, credit: Decimal },

    /// A journal line has both sides zero or both sides positive.
    /// `index` is 1-based.
    #[error("Invalid journal line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    /// A lifecycle transition was attempted from a state that does not
    /// allow it (post a non-draft, void a non-posted, delete a non-draft).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Deletion blocked by existing children or transaction history.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A payment would exceed the invoice's remaining balance.
    #[error("Payment of {amount} exceeds the remaining invoice balance of {balance}")]
    ExceedsBalance { amount: Decimal, balance: Decimal },

    /// The targeted account is unusable for the operation (header account,
    /// inactive, or wrong type for a cash/bank role).
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// The payment was already cancelled.
    #[error("Payment {0} is already cancelled")]
    AlreadyCancelled(i32),
}

/// Type alias for Result with LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// True when a database error reports a unique-constraint violation.
    /// Used to retry auto-generated account codes that lost a creation
    /// race.
    pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
        let message = err.to_string().to_lowercase();
        message.contains("unique") || message.contains("duplicate key")
    }
}
