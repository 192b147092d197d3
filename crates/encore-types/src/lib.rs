//! # encore-types
//!
//! Shared domain types for the Encore earnings ledger.
//!
//! Every structure here is plain data: it is produced by `encore-db` row
//! mappers, consumed by `encore-ledger`, and serialised verbatim by the
//! daemon's JSON-RPC surface. TypeScript bindings for the web frontend are
//! generated from the same definitions via `ts-rs`.
//!
//! ## Modules
//!
//! - [`principal`]: artists and label admins
//! - [`ledger`]: ledger entries, source events, wallet balances
//! - [`split`]: affiliations, overrides, shared earnings
//! - [`payout`]: payout requests

use rust_decimal::Decimal;

/// Identifier of a principal as issued by the auth layer.
pub type PrincipalId = String;
/// Ledger entry identifier.
pub type EntryId = uuid::Uuid;
/// Affiliation identifier.
pub type AffiliationId = uuid::Uuid;
/// Split override identifier.
pub type OverrideId = uuid::Uuid;
/// Shared earnings record identifier.
pub type SharedEarningsId = uuid::Uuid;
/// Payout request identifier.
pub type PayoutRequestId = uuid::Uuid;

/// Decimal places money amounts are kept at (minor units).
pub const AMOUNT_SCALE: u32 = 2;

/// Platform default artist share when an affiliation carries no percentage.
pub const DEFAULT_ARTIST_PCT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Platform default label share when an affiliation carries no percentage.
pub const DEFAULT_LABEL_PCT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Default minimum payout, in the platform currency.
pub const DEFAULT_MINIMUM_PAYOUT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Default platform currency.
pub const DEFAULT_CURRENCY: &str = "GBP";

/// Error returned when a stored or submitted tag does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    /// The enum being parsed.
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// wire form is the given snake_case tag.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $tag:literal),+ $(,)? }) => {
        impl $name {
            /// Canonical storage and wire tag.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(Self::$variant),)+
                    other => Err($crate::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// Declared after `text_enum!` so the macro is in textual scope.
pub mod ledger;
pub mod payout;
pub mod principal;
pub mod split;

/// Returns true if `code` looks like an ISO-4217 currency code.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}
