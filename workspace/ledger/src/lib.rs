//! Double-entry ledger services for the school bookkeeping application.
//!
//! This crate owns all mutations of the chart of accounts and the journal:
//! - [`accounts`]: the hierarchical account registry and the single
//!   sanctioned balance mutator,
//! - [`journal`]: balanced journal entries with the
//!   draft -> posted -> void lifecycle,
//! - [`payments`]: the payment-receipt and cancellation workflows that
//!   build and post entries on behalf of invoices,
//! - [`invoices`]: invoice creation and the recalculation contract,
//! - [`numbering`]: prefix-scoped document number sequences,
//! - [`audit`]: fire-and-forget audit trail writes.
//!
//! Every multi-step mutation runs inside a single database transaction so
//! a failure partway through leaves no partial state behind.

pub mod accounts;
pub mod audit;
pub mod error;
pub mod invoices;
pub mod journal;
pub mod numbering;
pub mod payments;

pub use error::{LedgerError, Result};
pub use journal::{JournalLine, NewJournalEntry, PostingMode};
pub use payments::ContraAccountPolicy;
