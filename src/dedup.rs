//! Duplicate detection. A transaction's identity across repeated imports is
//! a SHA-256 fingerprint over (account, posted date, amount, normalized
//! description); the normalization tolerates punctuation/case drift between
//! exports of the same statement.

use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::store;

/// Lifecycle of a fingerprint in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintState {
    Absent,
    Live(i64),
    Deleted(i64),
}

/// Lowercase, strip punctuation to spaces, collapse runs.
pub fn normalize_description(s: &str) -> String {
    let mapped: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn fingerprint(account_id: i64, posted_date: NaiveDate, amount: i64, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(
        format!(
            "{account_id}|{}|{amount}|{}",
            posted_date.format("%Y-%m-%d"),
            normalize_description(description),
        )
        .as_bytes(),
    );
    hex::encode(hasher.finalize())
}

pub fn probe(conn: &Connection, fingerprint: &str) -> Result<FingerprintState> {
    Ok(match store::find_by_fingerprint(conn, fingerprint)? {
        None => FingerprintState::Absent,
        Some((id, false)) => FingerprintState::Live(id),
        Some((id, true)) => FingerprintState::Deleted(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::AccountKind;
    use crate::store::NewTransaction;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_normalize_description_strips_punctuation_and_case() {
        assert_eq!(normalize_description("STARBUCKS #4021"), "starbucks 4021");
        assert_eq!(normalize_description("  Star-bucks,   #4021!"), "star bucks 4021");
        assert_eq!(normalize_description("\u{c2a4}\u{d0c0}\u{bc85}\u{c2a4} 4021"), "\u{c2a4}\u{d0c0}\u{bc85}\u{c2a4} 4021");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(1, date("2025-10-01"), -450_000, "STARBUCKS #4021");
        let b = fingerprint(1, date("2025-10-01"), -450_000, "starbucks 4021");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_varies_with_inputs() {
        let base = fingerprint(1, date("2025-10-01"), -450_000, "STARBUCKS");
        assert_ne!(base, fingerprint(2, date("2025-10-01"), -450_000, "STARBUCKS"));
        assert_ne!(base, fingerprint(1, date("2025-10-02"), -450_000, "STARBUCKS"));
        assert_ne!(base, fingerprint(1, date("2025-10-01"), -450_001, "STARBUCKS"));
        assert_ne!(base, fingerprint(1, date("2025-10-01"), -450_000, "DUNKIN"));
    }

    #[test]
    fn test_probe_states() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        let aid = store::insert_account(&conn, "Chase", AccountKind::Bank, "Chase").unwrap();

        let fp = fingerprint(aid, date("2025-10-01"), -100, "COFFEE");
        assert_eq!(probe(&conn, &fp).unwrap(), FingerprintState::Absent);

        let id = store::insert_transaction(&conn, &NewTransaction {
            account_id: aid,
            posted_date: date("2025-10-01"),
            amount: -100,
            description: "COFFEE",
            category_id: None,
            import_fingerprint: &fp,
        }).unwrap();
        assert_eq!(probe(&conn, &fp).unwrap(), FingerprintState::Live(id));

        store::mark_deleted(&conn, id).unwrap();
        assert_eq!(probe(&conn, &fp).unwrap(), FingerprintState::Deleted(id));
    }
}
