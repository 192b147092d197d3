//! Database query functions organized by domain.

pub mod affiliations;
pub mod distributions;
pub mod ledger;
pub mod overrides;
pub mod payouts;
pub mod settings;
pub mod shared_earnings;
