use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn jangbu(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jangbu").unwrap();
    cmd.env("JANGBU_DATA_DIR", data_dir);
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("jangbu")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("reapply"))
        .stdout(predicate::str::contains("budget"));
}

#[test]
fn import_dedupe_and_list_flow() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("statement.csv");
    std::fs::write(
        &csv,
        "Date,Description,Amount\n\
         2025-10-01,STARBUCKS #4021,-4500\n\
         2025-10-02,EMART YONGSAN,-32000\n",
    )
    .unwrap();

    jangbu(dir.path())
        .args(["rules", "add", "STARBUCKS", "--category", "Coffee"])
        .assert()
        .success();

    jangbu(dir.path())
        .args(["import", csv.to_str().unwrap(), "--account", "KB Card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));

    // re-importing the unchanged file inserts nothing
    jangbu(dir.path())
        .args(["import", csv.to_str().unwrap(), "--account", "KB Card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 imported"))
        .stdout(predicate::str::contains("2 duplicates skipped"));

    jangbu(dir.path())
        .args(["tx", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STARBUCKS #4021"))
        .stdout(predicate::str::contains("Coffee"));
}

#[test]
fn delete_restore_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("statement.csv");
    std::fs::write(&csv, "Date,Description,Amount\n2025-10-01,GS25 YEOKSAM,-1800\n").unwrap();

    jangbu(dir.path())
        .args(["import", csv.to_str().unwrap(), "--account", "Toss Bank", "--kind", "bank"])
        .assert()
        .success();

    jangbu(dir.path())
        .args(["tx", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted transaction 1"));

    jangbu(dir.path())
        .args(["tx", "restore", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored transaction 1"));

    jangbu(dir.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions:   1"))
        .stdout(predicate::str::contains("Deleted:        0"));
}

#[test]
fn bad_rows_are_reported_but_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("statement.csv");
    std::fs::write(
        &csv,
        "Date,Description,Amount\n\
         2025-10-01,GOOD ROW,-1000\n\
         2025-10-02,BAD ROW,\n",
    )
    .unwrap();

    jangbu(dir.path())
        .args(["import", csv.to_str().unwrap(), "--account", "KB Card"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 imported"))
        .stdout(predicate::str::contains("rows failed"))
        .stdout(predicate::str::contains("validation"));
}

#[test]
fn unknown_category_is_a_clean_error() {
    let dir = tempfile::tempdir().unwrap();
    jangbu(dir.path())
        .args(["rules", "add", "X", "--category", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category"));
}
