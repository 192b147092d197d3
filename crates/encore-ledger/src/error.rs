//! Ledger error taxonomy.

use encore_db::DbError;
use encore_revenue::RevenueError;
use encore_types::ledger::EntryStatus;
use rust_decimal::Decimal;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed input: empty principal, zero amount, bad currency, ...
    #[error("validation error: {0}")]
    Validation(String),

    /// A status change that is not an edge of the state machine, or whose
    /// precondition no longer holds.
    #[error("invalid transition of {what}: {from} -> {to}")]
    InvalidTransition {
        what: String,
        from: String,
        to: String,
    },

    /// The available balance does not cover the payout.
    #[error("insufficient balance: requested {requested}, available {available}, shortfall {shortfall}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
        shortfall: Decimal,
    },

    /// The split configuration in force is unusable.
    #[error("inconsistent split config: {0}")]
    InconsistentSplitConfig(String),

    /// Payout amount under the configured minimum.
    #[error("amount {amount} is below the minimum payout of {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Db(DbError),
}

impl LedgerError {
    pub(crate) fn insufficient(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            requested,
            available,
            shortfall: requested - available,
        }
    }

    pub(crate) fn entry_transition(id: &uuid::Uuid, from: EntryStatus, to: EntryStatus) -> Self {
        Self::InvalidTransition {
            what: format!("ledger entry {id}"),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<DbError> for LedgerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => Self::NotFound(what),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(e))
    }
}

impl From<RevenueError> for LedgerError {
    fn from(e: RevenueError) -> Self {
        match e {
            RevenueError::InconsistentSplitConfig { .. } => {
                Self::InconsistentSplitConfig(e.to_string())
            }
            RevenueError::InvalidPercentage(_) | RevenueError::NonPositiveAmount(_) => {
                Self::Validation(e.to_string())
            }
            RevenueError::Overflow => Self::Validation(e.to_string()),
        }
    }
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
