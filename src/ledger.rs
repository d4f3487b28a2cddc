//! Ledger manager: import orchestration (canonicalize, resolve account,
//! dedupe, rule-match, insert), inline edits, soft-delete/restore, bulk
//! re-categorization, manual entry.

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::canonical::{canonicalize, normalize_whitespace, ColumnMapping, RawRow};
use crate::dedup::{self, FingerprintState};
use crate::error::{LedgerError, Result};
use crate::models::AccountKind;
use crate::resolver::AccountResolver;
use crate::rules::RuleSet;
use crate::store::{self, NewTransaction};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub auto_create_accounts: bool,
    pub restore_deleted_duplicates: bool,
    /// All-or-nothing: the first row failure aborts and rolls the batch back.
    pub atomic: bool,
    pub dedup: bool,
    pub categorize: bool,
    /// Kind for accounts resolved during this batch.
    pub kind: AccountKind,
    /// Institution label for rows whose mapping carries no institution column.
    pub fallback_institution: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            auto_create_accounts: true,
            restore_deleted_duplicates: false,
            atomic: false,
            dedup: true,
            categorize: true,
            kind: AccountKind::Card,
            fallback_institution: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub inserted: usize,
    pub duplicates_skipped: usize,
    /// Rows matching a soft-deleted transaction, left skipped (not restored).
    pub deleted_skipped: usize,
    pub restored: usize,
    pub errors: Vec<(usize, LedgerError)>,
}

/// Import raw rows under a column mapping. Row failures are recorded in the
/// report and the batch continues, unless `options.atomic`.
pub fn import_rows(
    conn: &Connection,
    rows: &[RawRow],
    mapping: &ColumnMapping,
    options: &ImportOptions,
) -> Result<BatchReport> {
    if options.atomic {
        let tx = conn.unchecked_transaction()?;
        let report = run_batch(&tx, rows, mapping, options, true)?;
        tx.commit()?;
        Ok(report)
    } else {
        run_batch(conn, rows, mapping, options, false)
    }
}

fn run_batch(
    conn: &Connection,
    rows: &[RawRow],
    mapping: &ColumnMapping,
    options: &ImportOptions,
    fail_fast: bool,
) -> Result<BatchReport> {
    // Rules are loaded and compiled once per batch, accounts memoized per batch.
    let rule_set = if options.categorize { Some(RuleSet::load(conn)?) } else { None };
    let mut resolver = AccountResolver::new(options.auto_create_accounts);
    let mut report = BatchReport::default();

    for (index, row) in rows.iter().enumerate() {
        match import_row(conn, row, mapping, options, rule_set.as_ref(), &mut resolver, &mut report) {
            Ok(()) => {}
            Err(err) if fail_fast => return Err(err),
            Err(err) => report.errors.push((index, err)),
        }
    }
    Ok(report)
}

fn import_row(
    conn: &Connection,
    row: &RawRow,
    mapping: &ColumnMapping,
    options: &ImportOptions,
    rule_set: Option<&RuleSet>,
    resolver: &mut AccountResolver,
    report: &mut BatchReport,
) -> Result<()> {
    let canonical = canonicalize(row, mapping)?;
    let label = if canonical.institution_label.is_empty() {
        options.fallback_institution.as_deref().unwrap_or("")
    } else {
        canonical.institution_label.as_str()
    };
    let account_id = resolver.resolve(conn, label, options.kind)?;

    let fingerprint =
        dedup::fingerprint(account_id, canonical.posted_date, canonical.amount, &canonical.description);
    if options.dedup {
        match dedup::probe(conn, &fingerprint)? {
            FingerprintState::Live(_) => {
                report.duplicates_skipped += 1;
                return Ok(());
            }
            FingerprintState::Deleted(id) => {
                if options.restore_deleted_duplicates {
                    store::mark_restored(conn, id)?;
                    report.restored += 1;
                } else {
                    report.deleted_skipped += 1;
                }
                return Ok(());
            }
            FingerprintState::Absent => {}
        }
    }

    let category_id =
        rule_set.and_then(|rules| rules.evaluate(&canonical.description, label, options.kind));

    match store::insert_transaction(conn, &NewTransaction {
        account_id,
        posted_date: canonical.posted_date,
        amount: canonical.amount,
        description: &canonical.description,
        category_id,
        import_fingerprint: &fingerprint,
    }) {
        Ok(_) => {
            report.inserted += 1;
            Ok(())
        }
        // Constraint backstop (e.g. dedup disabled): a duplicate signal, not an error.
        Err(err) if store::is_unique_violation(&err) => {
            report.duplicates_skipped += 1;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Mutable fields of a live transaction. `Some(None)` clears a field.
#[derive(Debug, Default, Clone)]
pub struct TxnPatch {
    pub category_id: Option<Option<i64>>,
    pub description_override: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

pub fn edit_transaction(conn: &Connection, id: i64, patch: &TxnPatch) -> Result<()> {
    let txn = store::get_transaction(conn, id)?
        .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
    if txn.is_deleted {
        return Err(LedgerError::NotFound(format!("transaction {id} (deleted)")));
    }
    if let Some(category_id) = patch.category_id {
        store::set_category(conn, id, category_id)?;
    }
    if let Some(text) = &patch.description_override {
        store::set_description_override(conn, id, text.as_deref())?;
    }
    if let Some(notes) = &patch.notes {
        store::set_notes(conn, id, notes.as_deref())?;
    }
    Ok(())
}

/// Idempotent: deleting an already-deleted transaction reports `false`.
pub fn soft_delete(conn: &Connection, id: i64) -> Result<bool> {
    let txn = store::get_transaction(conn, id)?
        .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
    if txn.is_deleted {
        return Ok(false);
    }
    store::mark_deleted(conn, id)?;
    Ok(true)
}

/// Restore a soft-deleted transaction. Fails when a live transaction now
/// occupies the same fingerprint; restoring a live transaction is a no-op.
pub fn restore(conn: &Connection, id: i64) -> Result<bool> {
    let txn = store::get_transaction(conn, id)?
        .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
    if !txn.is_deleted {
        return Ok(false);
    }
    if let FingerprintState::Live(other) = dedup::probe(conn, &txn.import_fingerprint)? {
        return Err(LedgerError::Conflict(format!(
            "fingerprint of transaction {id} is now held by live transaction {other}"
        )));
    }
    store::mark_restored(conn, id)?;
    Ok(true)
}

pub enum ReapplyScope {
    /// Every non-deleted transaction.
    All,
    Ids(Vec<i64>),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReapplyReport {
    pub examined: usize,
    pub changed: usize,
}

/// Recompute category assignments with the current active rules, overwriting
/// prior assignments. The only mutation path for category_id post-insert
/// besides an explicit edit; idempotent under an unchanged rule set. Rows are
/// loaded one at a time so arbitrarily large scopes stay out of memory.
pub fn reapply_rules(conn: &Connection, scope: ReapplyScope) -> Result<ReapplyReport> {
    let rules = RuleSet::load(conn)?;
    let ids = match scope {
        ReapplyScope::All => store::live_transaction_ids(conn)?,
        ReapplyScope::Ids(ids) => ids,
    };

    let mut report = ReapplyReport::default();
    for id in ids {
        let Some((txn, account)) = store::txn_with_account(conn, id)? else {
            continue;
        };
        if txn.is_deleted {
            continue;
        }
        report.examined += 1;
        let category_id =
            rules.evaluate(&txn.description, &account.institution_label, account.kind);
        if category_id != txn.category_id {
            store::set_category(conn, txn.id, category_id)?;
            report.changed += 1;
        }
    }
    Ok(report)
}

/// Manual entry (quick-add). Runs the same fingerprint derivation as imports;
/// a collision with a live transaction is a conflict, not a silent skip.
/// Without an explicit category the active rules decide.
pub fn add_manual(
    conn: &Connection,
    account_id: i64,
    posted_date: NaiveDate,
    amount: i64,
    description: &str,
    category_id: Option<i64>,
) -> Result<i64> {
    let account = store::get_account(conn, account_id)?
        .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;
    let description = normalize_whitespace(description);
    if description.is_empty() {
        return Err(LedgerError::Validation("description".to_string()));
    }

    let fingerprint = dedup::fingerprint(account_id, posted_date, amount, &description);
    if let FingerprintState::Live(other) = dedup::probe(conn, &fingerprint)? {
        return Err(LedgerError::Conflict(format!("duplicate of live transaction {other}")));
    }

    let category_id = match category_id {
        Some(id) => Some(id),
        None => RuleSet::load(conn)?.evaluate(&description, &account.institution_label, account.kind),
    };

    store::insert_transaction(conn, &NewTransaction {
        account_id,
        posted_date,
        amount,
        description: &description,
        category_id,
        import_fingerprint: &fingerprint,
    })
    .map_err(|err| {
        if store::is_unique_violation(&err) {
            LedgerError::Conflict("duplicate of live transaction".to_string())
        } else {
            err.into()
        }
    })
}
