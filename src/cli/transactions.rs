use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::canonical::{normalize_whitespace, parse_amount_minor, parse_posted_date};
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::ledger::{self, TxnPatch};
use crate::models::AccountKind;
use crate::settings::load_settings;
use crate::store;

pub fn list(include_deleted: bool, limit: usize) -> Result<()> {
    let conn = super::open_db()?;
    let locale = load_settings().locale;
    let accounts: HashMap<i64, String> = store::list_accounts(&conn)?
        .into_iter()
        .map(|a| (a.id, a.display_name))
        .collect();
    let categories: HashMap<i64, String> = store::list_categories(&conn)?
        .into_iter()
        .map(|c| (c.id, c.label(&locale)))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Account", "Amount", "Category", "Description", "Notes", ""]);
    for txn in store::list_transactions(&conn, include_deleted, limit)? {
        let category = txn
            .category_id
            .and_then(|id| categories.get(&id).cloned())
            .unwrap_or_else(|| "Uncategorized".to_string());
        let state = match &txn.deleted_at {
            Some(at) if txn.is_deleted => format!("deleted {at}"),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(txn.id),
            Cell::new(txn.posted_date.format("%Y-%m-%d")),
            Cell::new(accounts.get(&txn.account_id).map(String::as_str).unwrap_or("?")),
            Cell::new(money(txn.amount)),
            Cell::new(category),
            Cell::new(txn.display_description()),
            Cell::new(txn.notes.as_deref().unwrap_or_default()),
            Cell::new(state),
        ]);
    }
    println!("Transactions\n{table}");
    Ok(())
}

pub fn add(
    account: &str,
    kind: &str,
    date: &str,
    amount: &str,
    description: &str,
    category: Option<&str>,
) -> Result<()> {
    let conn = super::open_db()?;
    let kind = AccountKind::parse(kind)?;
    let label = normalize_whitespace(account);
    let account_id = store::find_account(&conn, &label, kind)?
        .ok_or_else(|| LedgerError::UnknownAccount(format!("{label} ({})", kind.as_str())))?;
    let category_id = match category {
        Some(name) => super::category_arg(&conn, name)?,
        None => None,
    };
    let id = ledger::add_manual(
        &conn,
        account_id,
        parse_posted_date(date)?,
        parse_amount_minor(amount)?,
        description,
        category_id,
    )?;
    println!("Added transaction {id}");
    Ok(())
}

pub fn edit(
    id: i64,
    category: Option<&str>,
    describe: Option<&str>,
    note: Option<&str>,
) -> Result<()> {
    let conn = super::open_db()?;
    let patch = TxnPatch {
        category_id: match category {
            Some(name) => Some(super::category_arg(&conn, name)?),
            None => None,
        },
        description_override: describe
            .map(|v| if v == "-" { None } else { Some(v.to_string()) }),
        notes: note.map(|v| if v == "-" { None } else { Some(v.to_string()) }),
    };
    ledger::edit_transaction(&conn, id, &patch)?;
    println!("Updated transaction {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = super::open_db()?;
    if ledger::soft_delete(&conn, id)? {
        println!("Deleted transaction {id} (restorable with `jangbu tx restore {id}`)");
    } else {
        println!("Transaction {id} is already deleted");
    }
    Ok(())
}

pub fn restore(id: i64) -> Result<()> {
    let conn = super::open_db()?;
    if ledger::restore(&conn, id)? {
        println!("Restored transaction {id}");
    } else {
        println!("Transaction {id} is not deleted");
    }
    Ok(())
}
