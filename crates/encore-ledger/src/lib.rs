//! # encore-ledger
//!
//! The earnings ledger: every credit and debit a principal ever received,
//! the split of affiliated earnings between artist and label admin, wallet
//! balances derived from the rows, and the payout approval workflow.
//!
//! Every operation takes the caller's own [`rusqlite::Connection`]. Writes
//! that depend on a prior read run inside `BEGIN IMMEDIATE`, so two workers
//! holding separate connections to the same database never interleave a
//! check with someone else's write.
//!
//! ## Modules
//!
//! - [`store`]: Append-and-transition ledger entries
//! - [`registry`]: Affiliations, split overrides, platform default split
//! - [`distribution`]: Turning source events into ledger entries
//! - [`wallet`]: Balance derivation
//! - [`payout`]: Payout request / approve / reject

pub mod distribution;
mod error;
pub mod payout;
pub mod registry;
pub mod store;
pub mod wallet;

pub use error::{LedgerError, Result};

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Start a transaction that takes the database write lock immediately.
pub(crate) fn immediate(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}
