//! # encore-revenue
//!
//! Revenue split resolution and arithmetic.
//!
//! Earnings reported for an affiliated artist are divided between the artist
//! and their label admin. Which percentages apply is decided by a fixed
//! precedence chain over the split configuration in force at the time of
//! the earning; this crate is pure and never touches storage.
//!
//! ## Modules
//!
//! - [`splits`]: Resolution chain and split arithmetic

use rust_decimal::Decimal;

pub mod splits;

/// Error types for revenue operations.
#[derive(Debug, thiserror::Error)]
pub enum RevenueError {
    /// The percentages chosen for a split are unusable. Never normalised.
    #[error("inconsistent split config from {origin}: artist {artist_pct} + label {label_pct}")]
    InconsistentSplitConfig {
        /// The link of the resolution chain that produced the percentages.
        origin: &'static str,
        /// Artist share as stored.
        artist_pct: Decimal,
        /// Label share as stored.
        label_pct: Decimal,
    },

    /// A percentage outside `[0, 100]`.
    #[error("percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(Decimal),

    /// Amount is zero or negative.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Arithmetic overflow.
    #[error("arithmetic overflow in split calculation")]
    Overflow,
}

/// Convenience result type for revenue operations.
pub type Result<T> = std::result::Result<T, RevenueError>;
