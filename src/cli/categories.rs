use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::load_settings;
use crate::store;

pub fn list() -> Result<()> {
    let conn = super::open_db()?;
    let locale = load_settings().locale;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Label"]);
    for category in store::list_categories(&conn)? {
        table.add_row(vec![
            Cell::new(category.id),
            Cell::new(&category.name),
            Cell::new(category.label(&locale)),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}
