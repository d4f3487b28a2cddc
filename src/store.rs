//! Record store adapter. Every SQL statement in the crate lives here (or in
//! the schema in `db`); engine modules go through these typed helpers and
//! never issue raw queries themselves.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{LedgerError, Result};
use crate::models::{Account, AccountKind, Category, MatchMode, Rule, Transaction};

/// True when the store rejected an insert on a unique constraint. The ledger
/// converts this into a duplicate/conflict signal instead of surfacing it raw.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

fn date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    let kind_raw: String = row.get(2)?;
    Ok(Account {
        id: row.get(0)?,
        institution_label: row.get(1)?,
        kind: AccountKind::parse(&kind_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        display_name: row.get(3)?,
    })
}

pub fn insert_account(
    conn: &Connection,
    institution_label: &str,
    kind: AccountKind,
    display_name: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (institution_label, kind, display_name) VALUES (?1, ?2, ?3)",
        rusqlite::params![institution_label, kind.as_str(), display_name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Case-insensitive lookup; the caller passes a whitespace-normalized label.
pub fn find_account(conn: &Connection, label: &str, kind: AccountKind) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM accounts WHERE lower(institution_label) = lower(?1) AND kind = ?2",
            rusqlite::params![label, kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, institution_label, kind, display_name FROM accounts WHERE id = ?1",
            [id],
            account_from_row,
        )
        .optional()?;
    Ok(account)
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, institution_label, kind, display_name FROM accounts ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], account_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        label_en: row.get(2)?,
        label_ko: row.get(3)?,
        emoji: row.get(4)?,
    })
}

pub fn find_category_by_name(conn: &Connection, name: &str) -> Result<Option<Category>> {
    let cat = conn
        .query_row(
            "SELECT id, name, label_en, label_ko, emoji FROM categories WHERE lower(name) = lower(?1)",
            [name],
            category_from_row,
        )
        .optional()?;
    Ok(cat)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name, label_en, label_ko, emoji FROM categories ORDER BY id")?;
    let rows = stmt
        .query_map([], category_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

const TXN_COLUMNS: &str = "id, account_id, posted_date, amount, description, \
     description_override, notes, category_id, import_fingerprint, is_deleted, deleted_at";

fn txn_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        posted_date: date_column(row, 2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        description_override: row.get(5)?,
        notes: row.get(6)?,
        category_id: row.get(7)?,
        import_fingerprint: row.get(8)?,
        is_deleted: row.get::<_, i64>(9)? != 0,
        deleted_at: row.get(10)?,
    })
}

pub struct NewTransaction<'a> {
    pub account_id: i64,
    pub posted_date: NaiveDate,
    pub amount: i64,
    pub description: &'a str,
    pub category_id: Option<i64>,
    pub import_fingerprint: &'a str,
}

/// Insert or report the raw store error; unique-constraint classification is
/// the caller's job via [`is_unique_violation`].
pub fn insert_transaction(
    conn: &Connection,
    txn: &NewTransaction,
) -> std::result::Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO transactions \
         (account_id, posted_date, amount, description, category_id, import_fingerprint) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            txn.account_id,
            txn.posted_date.format("%Y-%m-%d").to_string(),
            txn.amount,
            txn.description,
            txn.category_id,
            txn.import_fingerprint,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// (id, is_deleted) of the row holding a fingerprint. A live row shadows any
/// soft-deleted ones sharing the fingerprint.
pub fn find_by_fingerprint(conn: &Connection, fingerprint: &str) -> Result<Option<(i64, bool)>> {
    let hit = conn
        .query_row(
            "SELECT id, is_deleted FROM transactions WHERE import_fingerprint = ?1 \
             ORDER BY is_deleted ASC, id ASC LIMIT 1",
            [fingerprint],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)? != 0)),
        )
        .optional()?;
    Ok(hit)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let txn = conn
        .query_row(
            &format!("SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1"),
            [id],
            txn_from_row,
        )
        .optional()?;
    Ok(txn)
}

pub fn set_category(conn: &Connection, id: i64, category_id: Option<i64>) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET category_id = ?1 WHERE id = ?2",
        rusqlite::params![category_id, id],
    )?;
    Ok(())
}

pub fn set_description_override(conn: &Connection, id: i64, text: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET description_override = ?1 WHERE id = ?2",
        rusqlite::params![text, id],
    )?;
    Ok(())
}

pub fn set_notes(conn: &Connection, id: i64, notes: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET notes = ?1 WHERE id = ?2",
        rusqlite::params![notes, id],
    )?;
    Ok(())
}

pub fn mark_deleted(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET is_deleted = 1, deleted_at = datetime('now') WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

pub fn mark_restored(conn: &Connection, id: i64) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET is_deleted = 0, deleted_at = NULL WHERE id = ?1",
        [id],
    )?;
    Ok(())
}

/// Ids of all non-deleted transactions, oldest first. Rows are re-loaded one
/// at a time by the caller, so arbitrarily large ledgers stay out of memory.
pub fn live_transaction_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT id FROM transactions WHERE is_deleted = 0 ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn list_transactions(
    conn: &Connection,
    include_deleted: bool,
    limit: usize,
) -> Result<Vec<Transaction>> {
    let sql = if include_deleted {
        format!("SELECT {TXN_COLUMNS} FROM transactions ORDER BY posted_date DESC, id DESC LIMIT ?1")
    } else {
        format!(
            "SELECT {TXN_COLUMNS} FROM transactions WHERE is_deleted = 0 \
             ORDER BY posted_date DESC, id DESC LIMIT ?1"
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([limit as i64], txn_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// A transaction joined with its owning account, as the rule engine needs it.
pub fn txn_with_account(conn: &Connection, id: i64) -> Result<Option<(Transaction, Account)>> {
    let txn = match get_transaction(conn, id)? {
        Some(t) => t,
        None => return Ok(None),
    };
    let account = get_account(conn, txn.account_id)?.ok_or_else(|| {
        LedgerError::NotFound(format!("account {} for transaction {id}", txn.account_id))
    })?;
    Ok(Some((txn, account)))
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn rule_from_row(row: &Row) -> rusqlite::Result<Rule> {
    let mode_raw: String = row.get(2)?;
    Ok(Rule {
        id: row.get(0)?,
        pattern: row.get(1)?,
        match_mode: MatchMode::parse(&mode_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        institution_filter: row.get(3)?,
        category_id: row.get(4)?,
        priority: row.get(5)?,
        is_active: row.get::<_, i64>(6)? != 0,
    })
}

pub struct NewRule<'a> {
    pub pattern: &'a str,
    pub match_mode: MatchMode,
    pub institution_filter: Option<&'a str>,
    pub category_id: i64,
    pub priority: i64,
}

pub fn insert_rule(conn: &Connection, rule: &NewRule) -> Result<i64> {
    conn.execute(
        "INSERT INTO rules (pattern, match_mode, institution_filter, category_id, priority) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            rule.pattern,
            rule.match_mode.as_str(),
            rule.institution_filter,
            rule.category_id,
            rule.priority,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Default)]
pub struct RulePatch<'a> {
    pub pattern: Option<&'a str>,
    pub match_mode: Option<MatchMode>,
    pub institution_filter: Option<Option<&'a str>>,
    pub category_id: Option<i64>,
    pub priority: Option<i64>,
    pub is_active: Option<bool>,
}

pub fn update_rule(conn: &Connection, id: i64, patch: &RulePatch) -> Result<()> {
    let existing = conn
        .query_row(
            "SELECT id, pattern, match_mode, institution_filter, category_id, priority, is_active \
             FROM rules WHERE id = ?1",
            [id],
            rule_from_row,
        )
        .optional()?
        .ok_or_else(|| LedgerError::NotFound(format!("rule {id}")))?;

    let institution_filter = match &patch.institution_filter {
        Some(v) => v.map(str::to_string),
        None => existing.institution_filter.clone(),
    };
    conn.execute(
        "UPDATE rules SET pattern = ?1, match_mode = ?2, institution_filter = ?3, \
         category_id = ?4, priority = ?5, is_active = ?6 WHERE id = ?7",
        rusqlite::params![
            patch.pattern.unwrap_or(&existing.pattern),
            patch.match_mode.unwrap_or(existing.match_mode).as_str(),
            institution_filter,
            patch.category_id.unwrap_or(existing.category_id),
            patch.priority.unwrap_or(existing.priority),
            patch.is_active.unwrap_or(existing.is_active),
            id,
        ],
    )?;
    Ok(())
}

/// Active rules in evaluation order: priority ascending, then id ascending.
pub fn list_active_rules_ordered(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, pattern, match_mode, institution_filter, category_id, priority, is_active \
         FROM rules WHERE is_active = 1 ORDER BY priority ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, pattern, match_mode, institution_filter, category_id, priority, is_active \
         FROM rules ORDER BY priority ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

pub struct SummaryCounts {
    pub accounts: i64,
    pub live_transactions: i64,
    pub deleted_transactions: i64,
    pub uncategorized: i64,
    pub active_rules: i64,
}

pub fn summary_counts(conn: &Connection) -> Result<SummaryCounts> {
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    Ok(SummaryCounts {
        accounts: count("SELECT count(*) FROM accounts")?,
        live_transactions: count("SELECT count(*) FROM transactions WHERE is_deleted = 0")?,
        deleted_transactions: count("SELECT count(*) FROM transactions WHERE is_deleted = 1")?,
        uncategorized: count(
            "SELECT count(*) FROM transactions WHERE is_deleted = 0 AND category_id IS NULL",
        )?,
        active_rules: count("SELECT count(*) FROM rules WHERE is_active = 1")?,
    })
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

pub fn upsert_budget(conn: &Connection, category_id: i64, month: &str, amount: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets (category_id, month, amount) VALUES (?1, ?2, ?3) \
         ON CONFLICT (category_id, month) DO UPDATE SET amount = excluded.amount",
        rusqlite::params![category_id, month, amount],
    )?;
    Ok(())
}

pub fn budgets_for_month(conn: &Connection, month: &str) -> Result<Vec<(i64, i64)>> {
    let mut stmt =
        conn.prepare("SELECT category_id, amount FROM budgets WHERE month = ?1 ORDER BY category_id")?;
    let rows = stmt
        .query_map([month], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Spend per category for a month: sum of debit amounts (negative, returned
/// positive) over non-deleted transactions. NULL category groups as None.
pub fn month_debit_actuals(conn: &Connection, month: &str) -> Result<Vec<(Option<i64>, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT category_id, sum(-amount) FROM transactions \
         WHERE is_deleted = 0 AND amount < 0 AND substr(posted_date, 1, 7) = ?1 \
         GROUP BY category_id",
    )?;
    let rows = stmt
        .query_map([month], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
