use crate::error::{LedgerError, Result};
use crate::settings::{self, load_settings, save_settings};
use crate::store;

pub fn run(data_dir: Option<String>, locale: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = settings::shellexpand_path(&dir);
    }
    if let Some(locale) = locale {
        if locale != "en" && locale != "ko" {
            return Err(LedgerError::Settings(format!("unsupported locale: {locale}")));
        }
        settings.locale = locale;
    }
    save_settings(&settings)?;

    let conn = super::open_db()?;
    let categories = store::list_categories(&conn)?;
    println!("Initialized database at {}", settings::db_path().display());
    println!("{} categories available.", categories.len());
    Ok(())
}
