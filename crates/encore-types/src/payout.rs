//! Payout requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::principal::PrincipalKind;
use crate::{EntryId, PayoutRequestId, PrincipalId};

/// Payout request lifecycle: `pending -> approved | rejected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(PayoutStatus, "payout status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl PayoutStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A principal's request to move available balance off-platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct PayoutRequest {
    #[ts(type = "string")]
    pub id: PayoutRequestId,
    pub principal_id: PrincipalId,
    pub principal_kind: PrincipalKind,
    #[ts(type = "string")]
    pub amount: Decimal,
    pub currency: String,
    /// Opaque to the ledger; handed to the downstream transfer process.
    #[ts(type = "unknown")]
    pub bank_details: serde_json::Value,
    pub status: PayoutStatus,
    pub requested_at: u64,
    pub processed_at: Option<u64>,
    /// The `paid` debit written on approval.
    #[ts(type = "string | null")]
    pub debit_entry_id: Option<EntryId>,
    /// Rejection reason, when rejected.
    pub notes: Option<String>,
}
