//! Account resolution. An imported row names its account by institution
//! label; resolution is case-insensitive and whitespace-normalized, memoized
//! per import batch so one batch never creates two accounts for one label.

use std::collections::HashMap;

use rusqlite::Connection;

use crate::canonical::normalize_whitespace;
use crate::error::{LedgerError, Result};
use crate::models::AccountKind;
use crate::store;

pub struct AccountResolver {
    auto_create: bool,
    cache: HashMap<(String, AccountKind), i64>,
}

impl AccountResolver {
    pub fn new(auto_create: bool) -> Self {
        Self {
            auto_create,
            cache: HashMap::new(),
        }
    }

    /// Resolve a label+kind to an account id, creating the account when
    /// auto-create is on. Blank labels never resolve.
    pub fn resolve(&mut self, conn: &Connection, label: &str, kind: AccountKind) -> Result<i64> {
        let display = normalize_whitespace(label);
        if display.is_empty() {
            return Err(LedgerError::UnknownAccount("(blank institution label)".to_string()));
        }
        let key = (display.to_lowercase(), kind);
        if let Some(&id) = self.cache.get(&key) {
            return Ok(id);
        }

        let id = match store::find_account(conn, &display, kind)? {
            Some(id) => id,
            None if self.auto_create => store::insert_account(conn, &display, kind, &display)?,
            None => return Err(LedgerError::UnknownAccount(format!("{display} ({})", kind.as_str()))),
        };
        self.cache.insert(key, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn account_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn test_resolves_existing_account_case_insensitively() {
        let (_dir, conn) = test_db();
        let id = store::insert_account(&conn, "KB Card", AccountKind::Card, "KB Card").unwrap();
        let mut resolver = AccountResolver::new(false);
        assert_eq!(resolver.resolve(&conn, "  kb   CARD ", AccountKind::Card).unwrap(), id);
        assert_eq!(account_count(&conn), 1);
    }

    #[test]
    fn test_unknown_account_without_auto_create() {
        let (_dir, conn) = test_db();
        let mut resolver = AccountResolver::new(false);
        let err = resolver.resolve(&conn, "Toss Bank", AccountKind::Bank).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownAccount(_)));
        assert_eq!(account_count(&conn), 0);
    }

    #[test]
    fn test_auto_create_inserts_once_per_batch() {
        let (_dir, conn) = test_db();
        let mut resolver = AccountResolver::new(true);
        let first = resolver.resolve(&conn, "Toss Bank", AccountKind::Bank).unwrap();
        let second = resolver.resolve(&conn, "TOSS  BANK", AccountKind::Bank).unwrap();
        assert_eq!(first, second);
        assert_eq!(account_count(&conn), 1);
    }

    #[test]
    fn test_same_label_different_kind_is_a_different_account() {
        let (_dir, conn) = test_db();
        let mut resolver = AccountResolver::new(true);
        let bank = resolver.resolve(&conn, "Shinhan", AccountKind::Bank).unwrap();
        let card = resolver.resolve(&conn, "Shinhan", AccountKind::Card).unwrap();
        assert_ne!(bank, card);
        assert_eq!(account_count(&conn), 2);
    }

    #[test]
    fn test_blank_label_is_unknown_account() {
        let (_dir, conn) = test_db();
        let mut resolver = AccountResolver::new(true);
        assert!(matches!(
            resolver.resolve(&conn, "   ", AccountKind::Bank).unwrap_err(),
            LedgerError::UnknownAccount(_),
        ));
    }
}
