mod canonical;
mod cli;
mod db;
mod dedup;
mod error;
mod fmt;
mod ledger;
mod models;
mod resolver;
mod rules;
mod settings;
mod store;

use clap::{CommandFactory, Parser};

use cli::{AccountsCommands, BudgetCommands, Cli, Commands, RulesCommands, TxCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, locale } => cli::init::run(data_dir, locale),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add { label, kind, display_name } => {
                cli::accounts::add(&label, &kind, display_name.as_deref())
            }
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Import {
            file,
            mapping,
            account,
            kind,
            no_auto_create,
            restore_deleted,
            atomic,
            no_dedup,
            no_categorize,
        } => cli::import::run(&cli::import::ImportArgs {
            file: &file,
            mapping: mapping.as_deref(),
            account: account.as_deref(),
            kind: &kind,
            no_auto_create,
            restore_deleted,
            atomic,
            no_dedup,
            no_categorize,
        }),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                pattern,
                category,
                match_mode,
                institution,
                priority,
            } => cli::rules::add(&pattern, &category, &match_mode, institution.as_deref(), priority),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Update {
                id,
                pattern,
                category,
                match_mode,
                institution,
                priority,
                active,
            } => cli::rules::update(
                id,
                pattern.as_deref(),
                category.as_deref(),
                match_mode.as_deref(),
                institution.as_deref(),
                priority,
                active,
            ),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Reapply { ids } => cli::reapply::run(ids),
        Commands::Tx { command } => match command {
            TxCommands::List { all, limit } => cli::transactions::list(all, limit),
            TxCommands::Add {
                account,
                kind,
                date,
                amount,
                description,
                category,
            } => cli::transactions::add(
                &account,
                &kind,
                &date,
                &amount,
                &description,
                category.as_deref(),
            ),
            TxCommands::Edit { id, category, describe, note } => {
                cli::transactions::edit(id, category.as_deref(), describe.as_deref(), note.as_deref())
            }
            TxCommands::Delete { id } => cli::transactions::delete(id),
            TxCommands::Restore { id } => cli::transactions::restore(id),
        },
        Commands::Categories => cli::categories::list(),
        Commands::Budget { command } => match command {
            BudgetCommands::Set { category, month, amount } => {
                cli::budget::set(&category, &month, &amount)
            }
            BudgetCommands::Status { month } => cli::budget::status(month.as_deref()),
        },
        Commands::Backup { output, keep_last } => cli::backup::run(output, keep_last),
        Commands::Status => cli::status::run(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "jangbu", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
