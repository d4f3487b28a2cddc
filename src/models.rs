use chrono::NaiveDate;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Bank,
    Card,
    Cash,
    Brokerage,
    Other,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Brokerage => "brokerage",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "bank" => Ok(Self::Bank),
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            "brokerage" => Ok(Self::Brokerage),
            "other" => Ok(Self::Other),
            _ => Err(LedgerError::Parse(format!("invalid account kind: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    Regex,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "contains" => Ok(Self::Contains),
            "regex" => Ok(Self::Regex),
            _ => Err(LedgerError::Parse(format!("invalid match mode: {s}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub institution_label: String,
    pub kind: AccountKind,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub label_en: String,
    pub label_ko: String,
    pub emoji: Option<String>,
}

impl Category {
    /// Display label for a locale, prefixed with the emoji when present.
    pub fn label(&self, locale: &str) -> String {
        let text = if locale == "ko" { &self.label_ko } else { &self.label_en };
        match &self.emoji {
            Some(e) => format!("{e} {text}"),
            None => text.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: i64,
    pub pattern: String,
    pub match_mode: MatchMode,
    pub institution_filter: Option<String>,
    pub category_id: i64,
    pub priority: i64,
    pub is_active: bool,
}

/// Amounts are signed minor currency units (hundredths), never floats.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub posted_date: NaiveDate,
    pub amount: i64,
    pub description: String,
    pub description_override: Option<String>,
    pub notes: Option<String>,
    pub category_id: Option<i64>,
    pub import_fingerprint: String,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
}

impl Transaction {
    /// The override when set, otherwise the raw imported description.
    pub fn display_description(&self) -> &str {
        self.description_override.as_deref().unwrap_or(&self.description)
    }
}

/// Normalized, store-ready shape derived from one raw import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRow {
    pub posted_date: NaiveDate,
    pub amount: i64,
    pub description: String,
    pub institution_label: String,
}
