use std::path::PathBuf;

use rusqlite::backup::Backup;

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::get_data_dir;

pub fn run(output: Option<String>, keep_last: Option<usize>) -> Result<()> {
    let conn = super::open_db()?;
    let backups_dir = get_data_dir().join("backups");

    let dest_path = match output {
        Some(p) => PathBuf::from(p),
        None => {
            std::fs::create_dir_all(&backups_dir)?;
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            backups_dir.join(format!("jangbu-{stamp}.db"))
        }
    };

    let mut dest_conn = rusqlite::Connection::open(&dest_path)?;
    {
        let backup = Backup::new(&conn, &mut dest_conn)?;
        backup.run_to_completion(100, std::time::Duration::from_millis(10), None)?;
    }

    let size = std::fs::metadata(&dest_path)?.len();
    println!("Backup saved to {}", dest_path.display());
    println!("Size: {}", format_bytes(size));

    if let Some(keep) = keep_last {
        let pruned = prune_backups(&backups_dir, keep)?;
        if pruned > 0 {
            println!("Pruned {pruned} old snapshot(s)");
        }
    }
    Ok(())
}

/// Delete timestamped snapshots beyond the newest `keep`.
fn prune_backups(backups_dir: &std::path::Path, keep: usize) -> Result<usize> {
    if !backups_dir.exists() {
        return Ok(0);
    }
    let mut snapshots: Vec<PathBuf> = std::fs::read_dir(backups_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("jangbu-") && n.ends_with(".db"))
                .unwrap_or(false)
        })
        .collect();
    // timestamped names sort chronologically
    snapshots.sort();
    snapshots.reverse();

    let mut pruned = 0;
    for old in snapshots.iter().skip(keep) {
        std::fs::remove_file(old)?;
        pruned += 1;
    }
    Ok(pruned)
}
