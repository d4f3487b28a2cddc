use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    Validation(String),

    #[error("Both debit and credit populated; no sign convention configured")]
    AmbiguousAmount,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl LedgerError {
    /// Stable label used when rendering batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Db(_) => "db",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
            Self::AmbiguousAmount => "ambiguous_amount",
            Self::UnknownAccount(_) => "unknown_account",
            Self::UnknownCategory(_) => "unknown_category",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Settings(_) => "settings",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
