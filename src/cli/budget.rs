use std::collections::HashMap;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::canonical::parse_amount_minor;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::settings::load_settings;
use crate::store;

fn validate_month(month: &str) -> Result<()> {
    let parts: Vec<&str> = month.split('-').collect();
    let valid = parts.len() == 2
        && parts[0].len() == 4
        && parts[0].parse::<i32>().is_ok()
        && matches!(parts[1].parse::<u32>(), Ok(1..=12))
        && parts[1].len() == 2;
    if valid {
        Ok(())
    } else {
        Err(LedgerError::Parse(format!("month must be YYYY-MM: {month}")))
    }
}

pub fn set(category: &str, month: &str, amount: &str) -> Result<()> {
    let conn = super::open_db()?;
    validate_month(month)?;
    let category = store::find_category_by_name(&conn, category)?
        .ok_or_else(|| LedgerError::UnknownCategory(category.to_string()))?;
    let amount = parse_amount_minor(amount)?.abs();
    store::upsert_budget(&conn, category.id, month, amount)?;
    println!("Budget for {} in {month}: {}", category.name, money(amount));
    Ok(())
}

pub fn status(month: Option<&str>) -> Result<()> {
    let conn = super::open_db()?;
    let month = match month {
        Some(m) => m.to_string(),
        None => chrono::Local::now().format("%Y-%m").to_string(),
    };
    validate_month(&month)?;

    let locale = load_settings().locale;
    let labels: HashMap<i64, String> = store::list_categories(&conn)?
        .into_iter()
        .map(|c| (c.id, c.label(&locale)))
        .collect();
    let budgets: HashMap<i64, i64> = store::budgets_for_month(&conn, &month)?.into_iter().collect();
    let actuals: HashMap<Option<i64>, i64> =
        store::month_debit_actuals(&conn, &month)?.into_iter().collect();

    let mut table = Table::new();
    table.set_header(vec!["Category", "Budget", "Actual", ""]);
    let mut total_budget = 0i64;
    let mut total_actual = 0i64;

    let mut category_ids: Vec<i64> = budgets
        .keys()
        .copied()
        .chain(actuals.keys().copied().flatten())
        .collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    for id in category_ids {
        let budget = budgets.get(&id).copied().unwrap_or(0);
        let actual = actuals.get(&Some(id)).copied().unwrap_or(0);
        total_budget += budget;
        total_actual += actual;
        table.add_row(vec![
            Cell::new(labels.get(&id).map(String::as_str).unwrap_or("?")),
            Cell::new(if budget > 0 { money(budget) } else { "\u{2014}".to_string() }),
            Cell::new(money(actual)),
            Cell::new(badge(budget, actual)),
        ]);
    }
    if let Some(&uncategorized) = actuals.get(&None) {
        total_actual += uncategorized;
        table.add_row(vec![
            Cell::new("Uncategorized"),
            Cell::new("\u{2014}"),
            Cell::new(money(uncategorized)),
            Cell::new("\u{2014}"),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        Cell::new(money(total_budget)),
        Cell::new(money(total_actual)),
        Cell::new(badge(total_budget, total_actual)),
    ]);

    println!("Budget vs actual \u{2014} {month}\n{table}");
    Ok(())
}

fn badge(budget: i64, actual: i64) -> String {
    if budget <= 0 {
        return "\u{2014}".to_string();
    }
    let pct = actual * 100 / budget;
    if pct >= 100 {
        format!("{} {pct}%", "over".red())
    } else if pct >= 80 {
        format!("{} {pct}%", "close".yellow())
    } else {
        format!("{} {pct}%", "ok".green())
    }
}
