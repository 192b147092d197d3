//! Affiliations, split overrides and the records a split leaves behind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::principal::PrincipalKind;
use crate::{AffiliationId, EntryId, OverrideId, PrincipalId, SharedEarningsId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationStatus {
    Active,
    Inactive,
}

text_enum!(AffiliationStatus, "affiliation status", {
    Active => "active",
    Inactive => "inactive",
});

/// A label admin's partnership with one artist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Affiliation {
    #[ts(type = "string")]
    pub id: AffiliationId,
    pub label_admin_id: PrincipalId,
    pub artist_id: PrincipalId,
    /// Agreed label share. `None` defers to the platform default.
    #[ts(type = "string | null")]
    pub label_percentage: Option<Decimal>,
    pub status: AffiliationStatus,
    pub effective_from: u64,
    pub effective_until: Option<u64>,
}

impl Affiliation {
    /// Active status and `effective_from <= now < effective_until`.
    pub fn is_effective_at(&self, now: u64) -> bool {
        self.status == AffiliationStatus::Active
            && self.effective_from <= now
            && self.effective_until.map_or(true, |until| now < until)
    }
}

/// A percentage pinned to one artist or label admin.
///
/// Both sides of the split are stored. They must add up to 100; a row where
/// they do not is treated as corrupt by the resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct SplitOverride {
    #[ts(type = "string")]
    pub id: OverrideId,
    pub subject_id: PrincipalId,
    pub subject_kind: PrincipalKind,
    #[ts(type = "string")]
    pub artist_percentage: Decimal,
    #[ts(type = "string")]
    pub label_percentage: Decimal,
    pub is_active: bool,
    pub effective_from: u64,
    pub effective_until: Option<u64>,
}

impl SplitOverride {
    /// The subject's own share: the artist side for artist overrides, the
    /// label side for label-admin overrides.
    pub fn percentage(&self) -> Decimal {
        match self.subject_kind {
            PrincipalKind::Artist => self.artist_percentage,
            PrincipalKind::LabelAdmin => self.label_percentage,
        }
    }

    pub fn is_effective_at(&self, now: u64) -> bool {
        self.is_active
            && self.effective_from <= now
            && self.effective_until.map_or(true, |until| now < until)
    }
}

/// Artist/label percentages applied to one earning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct SplitPercentages {
    #[ts(type = "string")]
    pub artist_pct: Decimal,
    #[ts(type = "string")]
    pub label_pct: Decimal,
}

impl SplitPercentages {
    /// Split where the label receives `label_pct`.
    pub fn from_label(label_pct: Decimal) -> Self {
        Self {
            artist_pct: Decimal::ONE_HUNDRED - label_pct,
            label_pct,
        }
    }

    /// Split where the artist receives `artist_pct`.
    pub fn from_artist(artist_pct: Decimal) -> Self {
        Self {
            artist_pct,
            label_pct: Decimal::ONE_HUNDRED - artist_pct,
        }
    }

    /// The artist keeps everything.
    pub fn unsplit() -> Self {
        Self {
            artist_pct: Decimal::ONE_HUNDRED,
            label_pct: Decimal::ZERO,
        }
    }
}

/// The durable result of one split. Written once, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct SharedEarningsRecord {
    #[ts(type = "string")]
    pub id: SharedEarningsId,
    #[ts(type = "string")]
    pub affiliation_id: AffiliationId,
    /// Identity of the triggering earning (its idempotency key).
    pub source_entry_id: String,
    /// `None` when the artist's share rounded to zero.
    #[ts(type = "string | null")]
    pub artist_entry_id: Option<EntryId>,
    /// `None` when the label's share is zero.
    #[ts(type = "string | null")]
    pub label_entry_id: Option<EntryId>,
    #[ts(type = "string")]
    pub artist_amount: Decimal,
    #[ts(type = "string")]
    pub label_amount: Decimal,
    #[ts(type = "string")]
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: u64,
}

/// A label admin's shared earnings from one artist, per currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct LabelArtistEarnings {
    pub artist_id: PrincipalId,
    pub currency: String,
    #[ts(type = "string")]
    pub total_amount: Decimal,
    #[ts(type = "string")]
    pub artist_share: Decimal,
    #[ts(type = "string")]
    pub label_share: Decimal,
    pub record_count: u64,
}
