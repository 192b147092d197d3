//! Wallet balances, derived from ledger rows on every call.
//!
//! There is no stored balance anywhere. Each aggregate is a fold over the
//! principal's entries in one currency; see [`WalletBalance::absorb`] for
//! which statuses land where.

use encore_db::queries::ledger;
use encore_types::ledger::WalletBalance;
use rusqlite::Connection;

use crate::Result;

/// Balance of `principal_id` in `currency`.
pub fn balance(conn: &Connection, principal_id: &str, currency: &str) -> Result<WalletBalance> {
    let mut balance = WalletBalance::empty(principal_id, currency);
    for (amount, status) in ledger::amounts(conn, principal_id, currency)? {
        balance.absorb(amount, status);
    }
    Ok(balance)
}

/// One balance per currency the principal has ever held, sorted by currency.
pub fn balances(conn: &Connection, principal_id: &str) -> Result<Vec<WalletBalance>> {
    ledger::currencies(conn, principal_id)?
        .iter()
        .map(|currency| balance(conn, principal_id, currency))
        .collect()
}
