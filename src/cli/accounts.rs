use comfy_table::{Cell, Table};

use crate::canonical::normalize_whitespace;
use crate::error::{LedgerError, Result};
use crate::models::AccountKind;
use crate::store;

pub fn add(label: &str, kind: &str, display_name: Option<&str>) -> Result<()> {
    let conn = super::open_db()?;
    let kind = AccountKind::parse(kind)?;
    let label = normalize_whitespace(label);
    if label.is_empty() {
        return Err(LedgerError::Validation("institution label".to_string()));
    }
    if store::find_account(&conn, &label, kind)?.is_some() {
        return Err(LedgerError::Conflict(format!(
            "account already exists: {label} ({})",
            kind.as_str()
        )));
    }
    store::insert_account(&conn, &label, kind, display_name.unwrap_or(&label))?;
    println!("Added account: {label} ({})", kind.as_str());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = super::open_db()?;
    let accounts = store::list_accounts(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Institution", "Kind", "Display Name"]);
    for account in accounts {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.institution_label),
            Cell::new(account.kind.as_str()),
            Cell::new(&account.display_name),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
