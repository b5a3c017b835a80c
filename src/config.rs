//! Environment-backed configuration.
//!
//! The contra-account policy is deployment configuration:
//! - `RECEIVABLE_ACCOUNT_CODE` credits payments to a receivable account
//!   (empty/unset disables the receivable step),
//! - `PROGRAM_INCOME_ACCOUNTS` maps programs to income account codes as
//!   `program=code,program=code`,
//! - `DEFAULT_INCOME_ACCOUNT_CODE` is the final fallback.

use std::collections::HashMap;

use ledger::ContraAccountPolicy;

/// Builds the contra-account policy from the environment, falling back to
/// the defaults for anything unset.
pub fn contra_policy_from_env() -> ContraAccountPolicy {
    let defaults = ContraAccountPolicy::default();

    let receivable_code = match std::env::var("RECEIVABLE_ACCOUNT_CODE") {
        Ok(code) if code.trim().is_empty() => None,
        Ok(code) => Some(code.trim().to_string()),
        Err(_) => defaults.receivable_code,
    };

    let default_income_code = std::env::var("DEFAULT_INCOME_ACCOUNT_CODE")
        .ok()
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .unwrap_or(defaults.default_income_code);

    let program_income_codes = std::env::var("PROGRAM_INCOME_ACCOUNTS")
        .map(|raw| parse_program_map(&raw))
        .unwrap_or_default();

    ContraAccountPolicy {
        receivable_code,
        program_income_codes,
        default_income_code,
    }
}

/// Parses `program=code,program=code`. Malformed pairs are skipped.
fn parse_program_map(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (program, code) = pair.split_once('=')?;
            let program = program.trim();
            let code = code.trim();
            if program.is_empty() || code.is_empty() {
                return None;
            }
            Some((program.to_string(), code.to_string()))
        })
        .collect()
}
