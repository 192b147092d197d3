//! SQL schema definitions.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS ledger_entries (
    id TEXT PRIMARY KEY,
    principal_id TEXT NOT NULL,
    principal_kind TEXT NOT NULL CHECK (principal_kind IN ('artist', 'label_admin')),
    amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    earning_type TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('pending', 'held', 'paid', 'cancelled', 'rejected')),
    platform TEXT,
    territory TEXT,
    linked_entry_id TEXT,
    created_at INTEGER NOT NULL,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_ledger_principal ON ledger_entries(principal_id, currency);
CREATE INDEX IF NOT EXISTS idx_ledger_linked ON ledger_entries(linked_entry_id);

-- Entries are append-and-transition: only status and notes may change.
CREATE TRIGGER IF NOT EXISTS ledger_entries_immutable
BEFORE UPDATE OF id, principal_id, principal_kind, amount, currency, earning_type, linked_entry_id, created_at
ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entry values are immutable');
END;

CREATE TRIGGER IF NOT EXISTS ledger_entries_no_delete
BEFORE DELETE ON ledger_entries
BEGIN
    SELECT RAISE(ABORT, 'ledger entries cannot be deleted');
END;

-- ============================================================
-- Split configuration
-- ============================================================

CREATE TABLE IF NOT EXISTS affiliations (
    id TEXT PRIMARY KEY,
    label_admin_id TEXT NOT NULL,
    artist_id TEXT NOT NULL,
    label_percentage TEXT,
    status TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
    effective_from INTEGER NOT NULL,
    effective_until INTEGER,
    created_at INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_affiliations_active_pair
    ON affiliations(label_admin_id, artist_id) WHERE status = 'active';
CREATE INDEX IF NOT EXISTS idx_affiliations_artist ON affiliations(artist_id);

CREATE TABLE IF NOT EXISTS split_overrides (
    id TEXT PRIMARY KEY,
    subject_id TEXT NOT NULL,
    subject_kind TEXT NOT NULL CHECK (subject_kind IN ('artist', 'label_admin')),
    artist_percentage TEXT NOT NULL,
    label_percentage TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    effective_from INTEGER NOT NULL,
    effective_until INTEGER,
    created_at INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_split_overrides_active_subject
    ON split_overrides(subject_id, subject_kind) WHERE is_active = 1;

-- ============================================================
-- Split results
-- ============================================================

CREATE TABLE IF NOT EXISTS shared_earnings (
    id TEXT PRIMARY KEY,
    affiliation_id TEXT NOT NULL REFERENCES affiliations(id),
    source_entry_id TEXT NOT NULL UNIQUE,
    artist_entry_id TEXT REFERENCES ledger_entries(id),
    label_entry_id TEXT REFERENCES ledger_entries(id),
    artist_amount TEXT NOT NULL,
    label_amount TEXT NOT NULL,
    total_amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_shared_earnings_affiliation ON shared_earnings(affiliation_id);

-- One row per processed idempotency key; exactly one outcome column is set.
CREATE TABLE IF NOT EXISTS distributions (
    idempotency_key TEXT PRIMARY KEY,
    shared_earnings_id TEXT REFERENCES shared_earnings(id),
    entry_id TEXT REFERENCES ledger_entries(id),
    created_at INTEGER NOT NULL,
    CHECK ((shared_earnings_id IS NULL) <> (entry_id IS NULL))
);

-- ============================================================
-- Payouts
-- ============================================================

CREATE TABLE IF NOT EXISTS payout_requests (
    id TEXT PRIMARY KEY,
    principal_id TEXT NOT NULL,
    principal_kind TEXT NOT NULL CHECK (principal_kind IN ('artist', 'label_admin')),
    amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    bank_details TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('pending', 'approved', 'rejected')),
    requested_at INTEGER NOT NULL,
    processed_at INTEGER,
    debit_entry_id TEXT REFERENCES ledger_entries(id),
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_payout_requests_principal ON payout_requests(principal_id);
CREATE INDEX IF NOT EXISTS idx_payout_requests_status ON payout_requests(status);

-- ============================================================
-- Settings
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
