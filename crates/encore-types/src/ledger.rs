//! Ledger entries and the balances derived from them.
//!
//! The ledger is append-and-transition: once written, an entry's amount,
//! principal and currency never change. Only [`EntryStatus`] moves, and only
//! along the edges accepted by [`EntryStatus::can_transition_to`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::principal::PrincipalKind;
use crate::{EntryId, PrincipalId};

/// What produced a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EarningType {
    StreamRoyalty,
    DownloadSale,
    SyncLicense,
    PerformanceRoyalty,
    ManualAdjustment,
    SplitShare,
    PayoutDebit,
}

text_enum!(EarningType, "earning type", {
    StreamRoyalty => "stream_royalty",
    DownloadSale => "download_sale",
    SyncLicense => "sync_license",
    PerformanceRoyalty => "performance_royalty",
    ManualAdjustment => "manual_adjustment",
    SplitShare => "split_share",
    PayoutDebit => "payout_debit",
});

/// Settlement status of a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Held,
    Paid,
    Cancelled,
    Rejected,
}

text_enum!(EntryStatus, "entry status", {
    Pending => "pending",
    Held => "held",
    Paid => "paid",
    Cancelled => "cancelled",
    Rejected => "rejected",
});

impl EntryStatus {
    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled | Self::Rejected)
    }

    /// Whether `self -> to` is an edge of the entry status machine.
    ///
    /// ```text
    /// pending -> held | paid | cancelled | rejected
    /// held    -> pending | paid | cancelled | rejected
    /// ```
    pub fn can_transition_to(&self, to: EntryStatus) -> bool {
        match self {
            Self::Pending => matches!(
                to,
                Self::Held | Self::Paid | Self::Cancelled | Self::Rejected
            ),
            Self::Held => matches!(
                to,
                Self::Pending | Self::Paid | Self::Cancelled | Self::Rejected
            ),
            Self::Paid | Self::Cancelled | Self::Rejected => false,
        }
    }

    /// Whether entries in this status count toward any balance aggregate.
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Rejected)
    }
}

/// One signed-amount record in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct LedgerEntry {
    #[ts(type = "string")]
    pub id: EntryId,
    pub principal_id: PrincipalId,
    pub principal_kind: PrincipalKind,
    /// Positive = credit, negative = debit.
    #[ts(type = "string")]
    pub amount: Decimal,
    pub currency: String,
    pub earning_type: EarningType,
    pub status: EntryStatus,
    pub platform: Option<String>,
    pub territory: Option<String>,
    /// Sibling split entry, or the payout request a debit settles.
    #[ts(type = "string | null")]
    pub linked_entry_id: Option<uuid::Uuid>,
    pub created_at: u64,
    pub notes: Option<String>,
}

/// An entry about to be appended. The store assigns the id and timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub principal_id: PrincipalId,
    pub principal_kind: PrincipalKind,
    pub amount: Decimal,
    pub currency: String,
    pub earning_type: EarningType,
    pub status: EntryStatus,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub linked_entry_id: Option<uuid::Uuid>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A raw earning handed to the distribution engine by an ingestion path
/// (manual admin entry, partner revenue report, analytics import).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct SourceEvent {
    /// The artist the earning was reported for.
    pub principal_id: PrincipalId,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub currency: String,
    pub platform: Option<String>,
    pub earning_type: EarningType,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Balance of one principal in one currency, derived from ledger rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct WalletBalance {
    pub principal_id: PrincipalId,
    pub currency: String,
    /// Sum of all `paid` entries, payout debits included.
    #[ts(type = "string")]
    pub available: Decimal,
    /// Sum of positive `pending` entries.
    #[ts(type = "string")]
    pub pending: Decimal,
    /// Sum of positive `held` entries.
    #[ts(type = "string")]
    pub held: Decimal,
    /// Sum of every positive counted entry.
    #[ts(type = "string")]
    pub total_earned: Decimal,
}

impl WalletBalance {
    /// A balance with every aggregate at zero.
    pub fn empty(principal_id: impl Into<PrincipalId>, currency: impl Into<String>) -> Self {
        Self {
            principal_id: principal_id.into(),
            currency: currency.into(),
            available: Decimal::ZERO,
            pending: Decimal::ZERO,
            held: Decimal::ZERO,
            total_earned: Decimal::ZERO,
        }
    }

    /// Fold one entry into the aggregates.
    pub fn absorb(&mut self, amount: Decimal, status: EntryStatus) {
        if !status.is_counted() {
            return;
        }
        let positive = amount.is_sign_positive() && !amount.is_zero();
        match status {
            EntryStatus::Paid => self.available += amount,
            EntryStatus::Pending if positive => self.pending += amount,
            EntryStatus::Held if positive => self.held += amount,
            _ => {}
        }
        if positive {
            self.total_earned += amount;
        }
    }
}
