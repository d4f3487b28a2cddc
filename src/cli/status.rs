use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{self, load_settings};
use crate::store;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = settings::get_data_dir();
    let db_path = settings::db_path();

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Locale:     {}", settings.locale);

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `jangbu init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let conn = super::open_db()?;
    let counts = store::summary_counts(&conn)?;

    println!();
    println!("Accounts:       {}", counts.accounts);
    println!("Transactions:   {}", counts.live_transactions);
    println!("Deleted:        {}", counts.deleted_transactions);
    println!("Uncategorized:  {}", counts.uncategorized);
    println!("Active rules:   {}", counts.active_rules);

    Ok(())
}
