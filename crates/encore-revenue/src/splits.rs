//! Split resolution and arithmetic.
//!
//! For an affiliated artist the percentages come from the first link of the
//! chain that is present:
//!
//! 1. **Artist override**: pinned to the artist
//! 2. **Label override**: pinned to the affiliation's label admin
//! 3. **Affiliation**: the percentage agreed in the affiliation itself
//! 4. **Platform default**: artist 80 / label 20 unless reconfigured
//!
//! An artist with no affiliation in force keeps the whole amount and no
//! split happens at all ([`SplitSource::Unaffiliated`]).
//!
//! ## Rounding
//!
//! The artist share is rounded half away from zero at [`AMOUNT_SCALE`]
//! decimal places; the label receives `total - artist`, so the two always
//! add up to the total exactly.

use encore_types::split::{Affiliation, SplitOverride, SplitPercentages};
use encore_types::{AffiliationId, OverrideId, AMOUNT_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Result, RevenueError};

/// Split configuration in force for one earning, as gathered by the
/// registry.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitContext {
    /// The artist's active affiliation, if any.
    pub affiliation: Option<Affiliation>,
    /// Active override pinned to the artist.
    pub artist_override: Option<SplitOverride>,
    /// Active override pinned to the affiliation's label admin.
    pub label_override: Option<SplitOverride>,
    /// Platform-wide default.
    pub platform_default: SplitPercentages,
}

/// Which link of the chain decided a split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SplitSource {
    ArtistOverride(OverrideId),
    LabelOverride(OverrideId),
    Affiliation(AffiliationId),
    PlatformDefault,
    Unaffiliated,
}

impl SplitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArtistOverride(_) => "artist_override",
            Self::LabelOverride(_) => "label_override",
            Self::Affiliation(_) => "affiliation",
            Self::PlatformDefault => "platform_default",
            Self::Unaffiliated => "unaffiliated",
        }
    }
}

/// Outcome of [`resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub source: SplitSource,
    pub percentages: SplitPercentages,
}

impl Resolution {
    /// Whether a label share is paid at all.
    pub fn is_split(&self) -> bool {
        !matches!(self.source, SplitSource::Unaffiliated)
    }
}

/// Validate a single percentage.
///
/// # Errors
///
/// - [`RevenueError::InvalidPercentage`] if outside `[0, 100]`
pub fn validate_percentage(pct: Decimal) -> Result<()> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(RevenueError::InvalidPercentage(pct));
    }
    Ok(())
}

/// Check that a pair of percentages is usable: each in `[0, 100]` and
/// summing to exactly 100.
///
/// # Errors
///
/// - [`RevenueError::InconsistentSplitConfig`] otherwise, tagged with `origin`
pub fn validate_split(origin: &'static str, pct: &SplitPercentages) -> Result<()> {
    let in_range = |p: Decimal| p >= Decimal::ZERO && p <= Decimal::ONE_HUNDRED;
    if !in_range(pct.artist_pct)
        || !in_range(pct.label_pct)
        || pct.artist_pct + pct.label_pct != Decimal::ONE_HUNDRED
    {
        return Err(RevenueError::InconsistentSplitConfig {
            origin,
            artist_pct: pct.artist_pct,
            label_pct: pct.label_pct,
        });
    }
    Ok(())
}

fn from_override(o: &SplitOverride) -> SplitPercentages {
    SplitPercentages {
        artist_pct: o.artist_percentage,
        label_pct: o.label_percentage,
    }
}

/// Pick the percentages for one earning.
///
/// # Errors
///
/// - [`RevenueError::InconsistentSplitConfig`] if the chosen link holds
///   percentages that do not add up to 100 or fall outside `[0, 100]`
pub fn resolve(ctx: &SplitContext) -> Result<Resolution> {
    let Some(affiliation) = &ctx.affiliation else {
        return Ok(Resolution {
            source: SplitSource::Unaffiliated,
            percentages: SplitPercentages::unsplit(),
        });
    };

    let (source, percentages) = if let Some(o) = &ctx.artist_override {
        (SplitSource::ArtistOverride(o.id), from_override(o))
    } else if let Some(o) = &ctx.label_override {
        (SplitSource::LabelOverride(o.id), from_override(o))
    } else if let Some(label_pct) = affiliation.label_percentage {
        (
            SplitSource::Affiliation(affiliation.id),
            SplitPercentages::from_label(label_pct),
        )
    } else {
        (SplitSource::PlatformDefault, ctx.platform_default)
    };

    validate_split(source.as_str(), &percentages)?;

    Ok(Resolution {
        source,
        percentages,
    })
}

/// Divide `total` between artist and label.
///
/// Returns `(artist_amount, label_amount)`. The artist share is rounded to
/// the nearest minor unit (half away from zero); the label takes the
/// remainder.
///
/// # Errors
///
/// - [`RevenueError::NonPositiveAmount`] if `total <= 0`
/// - [`RevenueError::InconsistentSplitConfig`] if the split is invalid
/// - [`RevenueError::Overflow`] on arithmetic overflow
pub fn split_amount(total: Decimal, pct: &SplitPercentages) -> Result<(Decimal, Decimal)> {
    if total <= Decimal::ZERO {
        return Err(RevenueError::NonPositiveAmount(total));
    }
    validate_split("split", pct)?;

    let mut artist = total
        .checked_mul(pct.artist_pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(RevenueError::Overflow)?
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    artist.rescale(AMOUNT_SCALE);
    let label = total - artist;

    debug_assert_eq!(artist + label, total);

    Ok((artist, label))
}
