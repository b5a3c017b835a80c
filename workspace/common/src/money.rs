//! Currency comparison helpers for the double-entry core.
//!
//! Amounts are plain decimals (DECIMAL(16,2) in the schema). Debit/credit
//! totals are compared with a small rounding tolerance rather than exact
//! equality so that caller-side rounding of split amounts does not reject
//! an entry that is balanced to the cent.

use rust_decimal::Decimal;

/// Tolerance applied when comparing debit and credit totals.
///
/// One minor unit (0.01). Anything further apart than this is a genuinely
/// unbalanced entry, not a rounding artifact.
pub fn balance_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Returns true when the debit and credit totals agree within
/// [`balance_epsilon`].
pub fn is_balanced(debit_total: Decimal, credit_total: Decimal) -> bool {
    (debit_total - credit_total).abs() <= balance_epsilon()
}
