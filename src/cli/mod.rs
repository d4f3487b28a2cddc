pub mod accounts;
pub mod backup;
pub mod budget;
pub mod categories;
pub mod import;
pub mod init;
pub mod reapply;
pub mod rules;
pub mod status;
pub mod transactions;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{LedgerError, Result};
use crate::settings;

/// Open (and if needed bootstrap) the ledger database in the data directory.
pub(crate) fn open_db() -> Result<Connection> {
    let data_dir = settings::get_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let conn = get_connection(&settings::db_path())?;
    init_db(&conn)?;
    Ok(conn)
}

/// Resolve a category argument to an id; the literal `-` clears it.
pub(crate) fn category_arg(conn: &Connection, name: &str) -> Result<Option<i64>> {
    if name == "-" {
        return Ok(None);
    }
    crate::store::find_category_by_name(conn, name)?
        .map(|c| Some(c.id))
        .ok_or_else(|| LedgerError::UnknownCategory(name.to_string()))
}

#[derive(Parser)]
#[command(name = "jangbu", about = "Personal-finance ledger: CSV import, dedupe, rule-based categorization.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up jangbu: choose a data directory and initialize the database.
    Init {
        /// Path for jangbu data (default: ~/Documents/jangbu)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Category label locale: en, ko
        #[arg(long)]
        locale: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Import a CSV export and auto-categorize new transactions.
    Import {
        /// Path to the CSV file to import
        file: String,
        /// Path to a column-mapping profile (JSON); default expects Date/Amount/Description columns
        #[arg(long)]
        mapping: Option<String>,
        /// Institution label for rows without a mapped institution column
        #[arg(long)]
        account: Option<String>,
        /// Account kind for accounts resolved in this batch: bank, card, cash, brokerage, other
        #[arg(long, default_value = "card")]
        kind: String,
        /// Fail rows for unknown accounts instead of creating them
        #[arg(long = "no-auto-create")]
        no_auto_create: bool,
        /// Restore soft-deleted transactions that re-appear in this file
        #[arg(long = "restore-deleted")]
        restore_deleted: bool,
        /// All-or-nothing: abort and roll back the batch on the first bad row
        #[arg(long)]
        atomic: bool,
        /// Skip duplicate detection
        #[arg(long = "no-dedup")]
        no_dedup: bool,
        /// Skip rule-based categorization
        #[arg(long = "no-categorize")]
        no_categorize: bool,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Re-run categorization rules over existing transactions.
    Reapply {
        /// Transaction ids to recategorize (default: all non-deleted)
        ids: Vec<i64>,
    },
    /// Browse and edit the transaction ledger.
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// List categories.
    Categories,
    /// Monthly budgets.
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/jangbu-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
        /// Prune old snapshots in the backups directory, keeping the newest N
        #[arg(long = "keep-last")]
        keep_last: Option<usize>,
    },
    /// Show current database and summary statistics.
    Status,
    /// Generate shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Institution label as it appears in exports, e.g. 'KB Card'
        label: String,
        /// Account kind: bank, card, cash, brokerage, other
        #[arg(long, default_value = "bank")]
        kind: String,
        /// Display name (default: the label)
        #[arg(long = "display-name")]
        display_name: Option<String>,
    },
    /// List all accounts.
    List,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a categorization rule.
    Add {
        /// Pattern to match against transaction descriptions
        pattern: String,
        /// Category name to assign
        #[arg(long)]
        category: String,
        /// Match mode: contains, regex
        #[arg(long = "match-mode", default_value = "contains")]
        match_mode: String,
        /// Only match accounts with this institution label or kind
        #[arg(long)]
        institution: Option<String>,
        /// Rule priority (lower = evaluated first)
        #[arg(long, default_value = "100")]
        priority: i64,
    },
    /// List all categorization rules.
    List,
    /// Update an existing rule.
    Update {
        /// Rule ID (shown in `jangbu rules list`)
        id: i64,
        /// New pattern
        #[arg(long)]
        pattern: Option<String>,
        /// New category name
        #[arg(long)]
        category: Option<String>,
        /// New match mode: contains, regex
        #[arg(long = "match-mode")]
        match_mode: Option<String>,
        /// New institution filter; pass '-' to clear
        #[arg(long)]
        institution: Option<String>,
        /// New priority
        #[arg(long)]
        priority: Option<i64>,
        /// Activate or deactivate: true, false
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a rule by ID.
    Delete {
        /// Rule ID (shown in `jangbu rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// List transactions, newest first.
    List {
        /// Include soft-deleted transactions
        #[arg(long)]
        all: bool,
        /// Maximum rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Add a transaction manually.
    Add {
        /// Institution label of an existing account
        #[arg(long)]
        account: String,
        /// Account kind: bank, card, cash, brokerage, other
        #[arg(long, default_value = "bank")]
        kind: String,
        /// Posted date, e.g. 2025-10-01
        #[arg(long)]
        date: String,
        /// Signed amount, e.g. -4500 or 12.50
        #[arg(long)]
        amount: String,
        /// Description
        #[arg(long)]
        description: String,
        /// Category name (default: decided by rules)
        #[arg(long)]
        category: Option<String>,
    },
    /// Edit a transaction's category, display description or notes.
    Edit {
        /// Transaction ID
        id: i64,
        /// Category name; pass '-' to clear
        #[arg(long)]
        category: Option<String>,
        /// Display description override; pass '-' to clear
        #[arg(long)]
        describe: Option<String>,
        /// Notes; pass '-' to clear
        #[arg(long)]
        note: Option<String>,
    },
    /// Soft-delete a transaction (restorable).
    Delete {
        /// Transaction ID
        id: i64,
    },
    /// Restore a soft-deleted transaction.
    Restore {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set a category's budget for a month.
    Set {
        /// Category name
        category: String,
        /// Month: YYYY-MM
        #[arg(long)]
        month: String,
        /// Budget amount, e.g. 300000 or 450.00
        #[arg(long)]
        amount: String,
    },
    /// Budget vs actual for a month.
    Status {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
}
