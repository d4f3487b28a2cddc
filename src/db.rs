use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    institution_label TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'bank',
    display_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (institution_label, kind)
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    label_en TEXT NOT NULL,
    label_ko TEXT NOT NULL,
    emoji TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    posted_date TEXT NOT NULL,
    amount INTEGER NOT NULL,
    description TEXT NOT NULL,
    description_override TEXT,
    notes TEXT,
    category_id INTEGER,
    import_fingerprint TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    deleted_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_txn_live_fingerprint
    ON transactions(import_fingerprint) WHERE is_deleted = 0;
CREATE INDEX IF NOT EXISTS idx_txn_date ON transactions(posted_date);
CREATE INDEX IF NOT EXISTS idx_txn_account ON transactions(account_id);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    pattern TEXT NOT NULL,
    match_mode TEXT NOT NULL DEFAULT 'contains',
    institution_filter TEXT,
    category_id INTEGER NOT NULL,
    priority INTEGER NOT NULL DEFAULT 100,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS budgets (
    id INTEGER PRIMARY KEY,
    category_id INTEGER NOT NULL,
    month TEXT NOT NULL,
    amount INTEGER NOT NULL,
    UNIQUE (category_id, month),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);
";

// (name, label_en, label_ko, emoji)
const DEFAULT_CATEGORIES: &[(&str, &str, &str, &str)] = &[
    ("Food", "Food & Dining", "\u{c2dd}\u{be44}", "\u{1f35c}"),
    ("Groceries", "Groceries", "\u{c7a5}\u{bcf4}\u{ae30}", "\u{1f6d2}"),
    ("Coffee", "Coffee", "\u{cee4}\u{d53c}", "\u{2615}"),
    ("Transport", "Transport", "\u{ad50}\u{d1b5}", "\u{1f687}"),
    ("Housing", "Housing", "\u{c8fc}\u{ac70}", "\u{1f3e0}"),
    ("Utilities", "Utilities", "\u{acf5}\u{acfc}\u{ae08}", "\u{1f4a1}"),
    ("Shopping", "Shopping", "\u{c1fc}\u{d551}", "\u{1f6cd}\u{fe0f}"),
    ("Entertainment", "Entertainment", "\u{c5ec}\u{ac00}", "\u{1f3ac}"),
    ("Health", "Health", "\u{c758}\u{b8cc}", "\u{1f48a}"),
    ("Travel", "Travel", "\u{c5ec}\u{d589}", "\u{2708}\u{fe0f}"),
    ("Income", "Income", "\u{c218}\u{c785}", "\u{1f4b0}"),
    ("Transfer", "Transfer", "\u{c774}\u{ccb4}", "\u{1f501}"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for cat in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, label_en, label_ko, emoji) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![cat.0, cat.1, cat.2, cat.3],
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["accounts", "categories", "transactions", "rules", "budgets"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_init_db_seeds_categories() {
        let (_dir, conn) = test_db();
        let label_ko: String = conn.query_row(
            "SELECT label_ko FROM categories WHERE name = 'Coffee'", [], |r| r.get(0),
        ).unwrap();
        assert_eq!(label_ko, "커피");
    }

    #[test]
    fn test_live_fingerprint_unique_index_ignores_deleted() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO accounts (institution_label, kind, display_name) VALUES ('kb card', 'card', 'kb card')",
            [],
        ).unwrap();
        conn.execute(
            "INSERT INTO transactions (account_id, posted_date, amount, description, import_fingerprint, is_deleted) \
             VALUES (1, '2025-10-01', -4500, 'COFFEE', 'fp1', 1)",
            [],
        ).unwrap();
        // deleted row does not block a live one with the same fingerprint
        conn.execute(
            "INSERT INTO transactions (account_id, posted_date, amount, description, import_fingerprint) \
             VALUES (1, '2025-10-01', -4500, 'COFFEE', 'fp1')",
            [],
        ).unwrap();
        // a second live row does collide
        let dup = conn.execute(
            "INSERT INTO transactions (account_id, posted_date, amount, description, import_fingerprint) \
             VALUES (1, '2025-10-01', -4500, 'COFFEE', 'fp1')",
            [],
        );
        assert!(dup.is_err());
    }
}
