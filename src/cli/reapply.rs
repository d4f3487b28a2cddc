use crate::error::Result;
use crate::ledger::{reapply_rules, ReapplyScope};

pub fn run(ids: Vec<i64>) -> Result<()> {
    let conn = super::open_db()?;
    let scope = if ids.is_empty() {
        ReapplyScope::All
    } else {
        ReapplyScope::Ids(ids)
    };
    let report = reapply_rules(&conn, scope)?;
    println!("{} examined, {} changed", report.examined, report.changed);
    Ok(())
}
