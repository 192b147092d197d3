//! Money-holding identities.

use serde::{Deserialize, Serialize};

use crate::PrincipalId;

/// Kind of principal a ledger entry or request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Artist,
    LabelAdmin,
}

text_enum!(PrincipalKind, "principal kind", {
    Artist => "artist",
    LabelAdmin => "label_admin",
});

/// An artist or label admin, as verified by the auth layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct Principal {
    pub id: PrincipalId,
    pub kind: PrincipalKind,
}

impl Principal {
    pub fn artist(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            kind: PrincipalKind::Artist,
        }
    }

    pub fn label_admin(id: impl Into<PrincipalId>) -> Self {
        Self {
            id: id.into(),
            kind: PrincipalKind::LabelAdmin,
        }
    }
}
