//! Shared helpers used by both the ledger services and the CLI.
//! Kept free of database dependencies so anything in the workspace
//! can depend on it.

pub mod money;

pub use money::{balance_epsilon, is_balanced};
