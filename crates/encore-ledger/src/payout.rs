//! Payout request workflow.
//!
//! ```text
//! pending ──► approved   (paid payout_debit of -amount written)
//!    └──────► rejected   (reason recorded, no ledger entry)
//! ```
//!
//! The balance check at request time is advisory. The check that matters
//! runs inside the approval transaction, which holds the database write
//! lock from its first read to its commit: two approvals that would jointly
//! overdraw a principal cannot both see the pre-debit balance.

use encore_db::queries::payouts;
use encore_types::ledger::{EarningType, EntryStatus, NewEntry};
use encore_types::payout::{PayoutRequest, PayoutStatus};
use encore_types::principal::Principal;
use encore_types::{is_currency_code, PayoutRequestId, AMOUNT_SCALE, DEFAULT_MINIMUM_PAYOUT};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{immediate, store, wallet, LedgerError, Result};

/// Rules a payout request must satisfy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoutPolicy {
    /// Smallest amount that may be requested.
    pub minimum: Decimal,
}

impl Default for PayoutPolicy {
    fn default() -> Self {
        Self {
            minimum: DEFAULT_MINIMUM_PAYOUT,
        }
    }
}

fn payout_transition(id: &PayoutRequestId, from: PayoutStatus, to: PayoutStatus) -> LedgerError {
    LedgerError::InvalidTransition {
        what: format!("payout request {id}"),
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// File a payout request.
///
/// # Errors
///
/// - [`LedgerError::Validation`] for an empty principal, non-positive or
///   sub-cent amount, bad currency, or bank details that are not an object
/// - [`LedgerError::BelowMinimum`] if `amount < policy.minimum`
/// - [`LedgerError::InsufficientBalance`] if the available balance is short
pub fn request_payout(
    conn: &Connection,
    principal: &Principal,
    amount: Decimal,
    currency: &str,
    bank_details: serde_json::Value,
    policy: &PayoutPolicy,
    now: u64,
) -> Result<PayoutRequest> {
    if principal.id.trim().is_empty() {
        return Err(LedgerError::Validation("principal id is empty".into()));
    }
    if amount <= Decimal::ZERO || amount.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::Validation(format!(
            "invalid payout amount {amount}"
        )));
    }
    if !is_currency_code(currency) {
        return Err(LedgerError::Validation(format!(
            "invalid currency code {currency:?}"
        )));
    }
    if !bank_details.as_object().is_some_and(|o| !o.is_empty()) {
        return Err(LedgerError::Validation("bank details are required".into()));
    }
    if amount < policy.minimum {
        tracing::warn!(principal = %principal.id, %amount, minimum = %policy.minimum, "payout below minimum");
        return Err(LedgerError::BelowMinimum {
            amount,
            minimum: policy.minimum,
        });
    }

    let available = wallet::balance(conn, &principal.id, currency)?.available;
    if available < amount {
        tracing::warn!(principal = %principal.id, %amount, %available, "payout request exceeds balance");
        return Err(LedgerError::insufficient(amount, available));
    }

    let request = PayoutRequest {
        id: uuid::Uuid::new_v4(),
        principal_id: principal.id.clone(),
        principal_kind: principal.kind,
        amount,
        currency: currency.to_string(),
        bank_details,
        status: PayoutStatus::Pending,
        requested_at: now,
        processed_at: None,
        debit_entry_id: None,
        notes: None,
    };
    payouts::insert(conn, &request)?;

    tracing::info!(
        request = %request.id,
        principal = %request.principal_id,
        %amount,
        currency,
        "payout requested"
    );

    Ok(request)
}

/// Approve a pending request, debiting the principal's available balance.
///
/// # Errors
///
/// - [`LedgerError::NotFound`] if the request does not exist
/// - [`LedgerError::InvalidTransition`] if it is no longer pending
/// - [`LedgerError::InsufficientBalance`] if the available balance, as of
///   this transaction, does not cover the amount; nothing is written
pub fn approve(conn: &mut Connection, id: &PayoutRequestId, now: u64) -> Result<PayoutRequest> {
    let tx = immediate(conn)?;

    let mut request =
        payouts::get(&tx, id)?.ok_or_else(|| LedgerError::NotFound(format!("payout request {id}")))?;
    if request.status != PayoutStatus::Pending {
        return Err(payout_transition(id, request.status, PayoutStatus::Approved));
    }

    let available = wallet::balance(&tx, &request.principal_id, &request.currency)?.available;
    if available < request.amount {
        tracing::warn!(
            request = %id,
            principal = %request.principal_id,
            amount = %request.amount,
            %available,
            "payout approval refused: insufficient balance"
        );
        return Err(LedgerError::insufficient(request.amount, available));
    }

    let debit = store::write(
        &tx,
        uuid::Uuid::new_v4(),
        NewEntry {
            principal_id: request.principal_id.clone(),
            principal_kind: request.principal_kind,
            amount: -request.amount,
            currency: request.currency.clone(),
            earning_type: EarningType::PayoutDebit,
            status: EntryStatus::Paid,
            platform: None,
            territory: None,
            linked_entry_id: Some(request.id),
            notes: None,
        },
        now,
    )?;

    if !payouts::mark_approved(&tx, id, &debit.id, now)? {
        return Err(payout_transition(id, request.status, PayoutStatus::Approved));
    }
    tx.commit()?;

    request.status = PayoutStatus::Approved;
    request.processed_at = Some(now);
    request.debit_entry_id = Some(debit.id);

    tracing::info!(
        request = %id,
        principal = %request.principal_id,
        amount = %request.amount,
        debit = %debit.id,
        "payout approved"
    );

    Ok(request)
}

/// Reject a pending request. No ledger entry is written.
///
/// # Errors
///
/// - [`LedgerError::Validation`] if `reason` is blank
/// - [`LedgerError::NotFound`] if the request does not exist
/// - [`LedgerError::InvalidTransition`] if it is no longer pending
pub fn reject(conn: &Connection, id: &PayoutRequestId, reason: &str, now: u64) -> Result<PayoutRequest> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(LedgerError::Validation("a rejection reason is required".into()));
    }

    if !payouts::mark_rejected(conn, id, reason, now)? {
        return match payouts::get(conn, id)? {
            None => Err(LedgerError::NotFound(format!("payout request {id}"))),
            Some(r) => Err(payout_transition(id, r.status, PayoutStatus::Rejected)),
        };
    }

    tracing::info!(request = %id, reason, "payout rejected");
    get(conn, id)
}

/// Fetch one request.
pub fn get(conn: &Connection, id: &PayoutRequestId) -> Result<PayoutRequest> {
    payouts::get(conn, id)?.ok_or_else(|| LedgerError::NotFound(format!("payout request {id}")))
}

/// A principal's requests, newest first.
pub fn list_for_principal(conn: &Connection, principal_id: &str) -> Result<Vec<PayoutRequest>> {
    Ok(payouts::for_principal(conn, principal_id)?)
}

/// Requests in `status`, oldest first.
pub fn list_by_status(conn: &Connection, status: PayoutStatus) -> Result<Vec<PayoutRequest>> {
    Ok(payouts::by_status(conn, status)?)
}
