use std::collections::HashMap;

use comfy_table::{Cell, Table};

use crate::error::{LedgerError, Result};
use crate::models::MatchMode;
use crate::store::{self, NewRule, RulePatch};

pub fn add(
    pattern: &str,
    category: &str,
    match_mode: &str,
    institution: Option<&str>,
    priority: i64,
) -> Result<()> {
    let conn = super::open_db()?;
    let category = store::find_category_by_name(&conn, category)?
        .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))?;
    store::insert_rule(&conn, &NewRule {
        pattern,
        match_mode: MatchMode::parse(match_mode)?,
        institution_filter: institution,
        category_id: category.id,
        priority,
    })?;
    println!("Added rule: '{pattern}' \u{2192} {}", category.name);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = super::open_db()?;
    let categories: HashMap<i64, String> = store::list_categories(&conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Pattern", "Mode", "Institution", "Category", "Priority", "Active"]);
    for rule in store::list_rules(&conn)? {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(&rule.pattern),
            Cell::new(rule.match_mode.as_str()),
            Cell::new(rule.institution_filter.as_deref().unwrap_or_default()),
            Cell::new(categories.get(&rule.category_id).map(String::as_str).unwrap_or("?")),
            Cell::new(rule.priority),
            Cell::new(if rule.is_active { "yes" } else { "no" }),
        ]);
    }
    println!("Rules (evaluated by priority, then id)\n{table}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    id: i64,
    pattern: Option<&str>,
    category: Option<&str>,
    match_mode: Option<&str>,
    institution: Option<&str>,
    priority: Option<i64>,
    active: Option<bool>,
) -> Result<()> {
    let conn = super::open_db()?;
    let category_id = match category {
        Some(name) => Some(
            store::find_category_by_name(&conn, name)?
                .ok_or_else(|| LedgerError::UnknownCategory(name.to_string()))?
                .id,
        ),
        None => None,
    };
    let institution_filter = institution.map(|v| if v == "-" { None } else { Some(v) });
    let match_mode = match match_mode {
        Some(raw) => Some(MatchMode::parse(raw)?),
        None => None,
    };
    store::update_rule(&conn, id, &RulePatch {
        pattern,
        match_mode,
        institution_filter,
        category_id,
        priority,
        is_active: active,
    })?;
    println!("Updated rule {id}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = super::open_db()?;
    store::update_rule(&conn, id, &RulePatch {
        is_active: Some(false),
        ..Default::default()
    })?;
    println!("Deactivated rule {id}");
    Ok(())
}
