//! Canonicalizer: maps a raw imported row (arbitrary column layout) into a
//! [`CanonicalRow`] under an explicit column-mapping configuration. Pure
//! transforms only; all failures are typed and row-local.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::models::CanonicalRow;

/// One parsed CSV record: source column name to raw cell value.
pub type RawRow = HashMap<String, String>;

/// How to resolve a row where both the debit and the credit column carry a
/// value. `strict` refuses such rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignConvention {
    #[default]
    Strict,
    DebitWins,
    CreditWins,
}

/// Which source columns supply each canonical field. Either `amount` (one
/// signed column) or the `debit`/`credit` pair must be mapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub description: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub debit: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub sign_convention: SignConvention,
}

impl ColumnMapping {
    /// Mapping for exports that already use canonical column names.
    pub fn generic() -> Self {
        Self {
            date: "Date".to_string(),
            description: "Description".to_string(),
            amount: Some("Amount".to_string()),
            debit: None,
            credit: None,
            institution: None,
            sign_convention: SignConvention::Strict,
        }
    }
}

pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_posted_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    Err(LedgerError::Parse(format!("unparsable date: {raw}")))
}

/// Parse a raw amount string to signed minor currency units (hundredths).
///
/// Accepts currency symbols, quotes, parenthesized negatives and thousands
/// grouping. When `.` and `,` both appear, the later one is the decimal
/// separator. A lone `,` is grouping when every group after the first has
/// three digits, a decimal separator when a single comma is followed by one
/// or two digits, and ambiguous otherwise.
pub fn parse_amount_minor(raw: &str) -> Result<i64> {
    let mut s: String = raw
        .chars()
        .filter(|&c| !c.is_whitespace() && !matches!(c, '"' | '$' | '\u{20a9}' | '\u{20ac}' | '\u{a3}' | '\u{a5}'))
        .collect();

    let mut negative = false;
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].to_string();
    }
    if s.starts_with('-') {
        negative = !negative;
        s.remove(0);
    } else if s.starts_with('+') {
        s.remove(0);
    }
    if s.is_empty() {
        return Err(LedgerError::Parse(format!("non-numeric amount: {raw}")));
    }

    let (int_part, frac_part) = split_amount(&s, raw)?;
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(LedgerError::Parse(format!("non-numeric amount: {raw}")));
    }
    if frac_part.len() > 2 {
        return Err(LedgerError::Parse(format!("more than two decimal digits: {raw}")));
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| LedgerError::Parse(format!("amount out of range: {raw}")))?
    };
    let mut cents: i64 = if frac_part.is_empty() { 0 } else { frac_part.parse().unwrap_or(0) };
    if frac_part.len() == 1 {
        cents *= 10;
    }

    let minor = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(|| LedgerError::Parse(format!("amount out of range: {raw}")))?;
    Ok(if negative { -minor } else { minor })
}

/// Split a sign-stripped amount into integer and fractional digit strings,
/// resolving `.`/`,` roles per the rules above.
fn split_amount(s: &str, raw: &str) -> Result<(String, String)> {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    match (last_dot, last_comma) {
        (None, None) => Ok((s.to_string(), String::new())),
        (Some(d), None) => {
            if s[..d].contains('.') {
                return Err(LedgerError::Parse(format!("multiple decimal points: {raw}")));
            }
            Ok((s[..d].to_string(), s[d + 1..].to_string()))
        }
        (None, Some(_)) => {
            let groups: Vec<&str> = s.split(',').collect();
            if !groups[0].is_empty() && groups[1..].iter().all(|g| g.len() == 3) {
                return Ok((s.replace(',', ""), String::new()));
            }
            if groups.len() == 2 && (1..=2).contains(&groups[1].len()) {
                return Ok((groups[0].to_string(), groups[1].to_string()));
            }
            Err(LedgerError::Parse(format!("ambiguous separators: {raw}")))
        }
        (Some(d), Some(c)) => {
            if d > c {
                Ok((s[..d].replace(',', ""), s[d + 1..].to_string()))
            } else {
                Ok((s[..c].replace('.', ""), s[c + 1..].to_string()))
            }
        }
    }
}

fn cell<'a>(row: &'a RawRow, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("").trim()
}

/// Canonicalize one raw row under a mapping. Pure; no store access.
pub fn canonicalize(row: &RawRow, mapping: &ColumnMapping) -> Result<CanonicalRow> {
    let date_raw = cell(row, &mapping.date);
    if date_raw.is_empty() {
        return Err(LedgerError::Validation(format!("date ({})", mapping.date)));
    }
    let posted_date = parse_posted_date(date_raw)?;

    let amount = resolve_amount(row, mapping)?;

    let description = normalize_whitespace(cell(row, &mapping.description));
    let institution_label = mapping
        .institution
        .as_deref()
        .map(|col| normalize_whitespace(cell(row, col)))
        .unwrap_or_default();

    Ok(CanonicalRow {
        posted_date,
        amount,
        description,
        institution_label,
    })
}

fn resolve_amount(row: &RawRow, mapping: &ColumnMapping) -> Result<i64> {
    if let Some(col) = &mapping.amount {
        let raw = cell(row, col);
        if raw.is_empty() {
            return Err(LedgerError::Validation(format!("amount ({col})")));
        }
        return parse_amount_minor(raw);
    }

    let debit_raw = mapping.debit.as_deref().map(|col| cell(row, col)).unwrap_or("");
    let credit_raw = mapping.credit.as_deref().map(|col| cell(row, col)).unwrap_or("");
    match (debit_raw.is_empty(), credit_raw.is_empty()) {
        (true, true) => Err(LedgerError::Validation("amount (debit/credit)".to_string())),
        (false, true) => Ok(-parse_amount_minor(debit_raw)?.abs()),
        (true, false) => Ok(parse_amount_minor(credit_raw)?.abs()),
        (false, false) => match mapping.sign_convention {
            SignConvention::Strict => Err(LedgerError::AmbiguousAmount),
            SignConvention::DebitWins => Ok(-parse_amount_minor(debit_raw)?.abs()),
            SignConvention::CreditWins => Ok(parse_amount_minor(credit_raw)?.abs()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping::generic()
    }

    #[test]
    fn test_parse_amount_minor() {
        assert_eq!(parse_amount_minor("1,234.56").unwrap(), 123_456);
        assert_eq!(parse_amount_minor("\"500.00\"").unwrap(), 50_000);
        assert_eq!(parse_amount_minor("  -42.50  ").unwrap(), -4_250);
        assert_eq!(parse_amount_minor("0").unwrap(), 0);
        assert_eq!(parse_amount_minor("120.5").unwrap(), 12_050);
        assert!(parse_amount_minor("not_a_number").is_err());
    }

    #[test]
    fn test_parse_amount_parenthesized_negatives() {
        assert_eq!(parse_amount_minor("(500.00)").unwrap(), -50_000);
        assert_eq!(parse_amount_minor("(1,234.56)").unwrap(), -123_456);
    }

    #[test]
    fn test_parse_amount_currency_symbols() {
        assert_eq!(parse_amount_minor("$1,234.56").unwrap(), 123_456);
        assert_eq!(parse_amount_minor("-$50.00").unwrap(), -5_000);
        assert_eq!(parse_amount_minor("\u{20a9}4,500").unwrap(), 450_000);
    }

    #[test]
    fn test_parse_amount_comma_roles() {
        // grouping: every group after the first has three digits
        assert_eq!(parse_amount_minor("1,234").unwrap(), 123_400);
        assert_eq!(parse_amount_minor("12,345,678").unwrap(), 1_234_567_800);
        // decimal comma: single comma, one or two trailing digits
        assert_eq!(parse_amount_minor("1234,56").unwrap(), 123_456);
        assert_eq!(parse_amount_minor("1.234,56").unwrap(), 123_456);
        // inconsistent grouping is ambiguous, not a guess
        assert!(parse_amount_minor("12,34,56").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_excess_precision() {
        assert!(parse_amount_minor("1.234").is_err());
        assert!(parse_amount_minor("0.999").is_err());
    }

    #[test]
    fn test_parse_posted_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        for raw in ["2025-01-15", "2025/01/15", "2025.01.15", "01/15/2025"] {
            assert_eq!(parse_posted_date(raw).unwrap(), expected, "format: {raw}");
        }
        assert!(parse_posted_date("15th Jan 2025").is_err());
        assert!(parse_posted_date("02/30/2025").is_err());
    }

    #[test]
    fn test_canonicalize_trims_and_collapses_description() {
        let r = row(&[
            ("Date", "2025-10-01"),
            ("Amount", "-4500"),
            ("Description", "  STARBUCKS   #4021  "),
        ]);
        let canonical = canonicalize(&r, &mapping()).unwrap();
        assert_eq!(canonical.description, "STARBUCKS #4021");
        assert_eq!(canonical.amount, -450_000);
    }

    #[test]
    fn test_canonicalize_blank_amount_is_validation_error() {
        let r = row(&[("Date", "2025-10-01"), ("Amount", ""), ("Description", "X")]);
        let err = canonicalize(&r, &mapping()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_canonicalize_bad_date_is_parse_error() {
        let r = row(&[("Date", "soon"), ("Amount", "1"), ("Description", "X")]);
        assert!(matches!(canonicalize(&r, &mapping()).unwrap_err(), LedgerError::Parse(_)));
    }

    #[test]
    fn test_debit_credit_columns() {
        let m = ColumnMapping {
            date: "Date".into(),
            description: "Desc".into(),
            amount: None,
            debit: Some("Out".into()),
            credit: Some("In".into()),
            institution: None,
            sign_convention: SignConvention::Strict,
        };
        let spent = row(&[("Date", "2025-10-01"), ("Desc", "LUNCH"), ("Out", "8,000"), ("In", "")]);
        assert_eq!(canonicalize(&spent, &m).unwrap().amount, -800_000);

        let earned = row(&[("Date", "2025-10-01"), ("Desc", "PAY"), ("Out", ""), ("In", "100.00")]);
        assert_eq!(canonicalize(&earned, &m).unwrap().amount, 10_000);
    }

    #[test]
    fn test_both_columns_populated_follows_sign_convention() {
        let mut m = ColumnMapping {
            date: "Date".into(),
            description: "Desc".into(),
            amount: None,
            debit: Some("Out".into()),
            credit: Some("In".into()),
            institution: None,
            sign_convention: SignConvention::Strict,
        };
        let r = row(&[("Date", "2025-10-01"), ("Desc", "X"), ("Out", "10.00"), ("In", "2.00")]);
        assert!(matches!(canonicalize(&r, &m).unwrap_err(), LedgerError::AmbiguousAmount));

        m.sign_convention = SignConvention::DebitWins;
        assert_eq!(canonicalize(&r, &m).unwrap().amount, -1_000);

        m.sign_convention = SignConvention::CreditWins;
        assert_eq!(canonicalize(&r, &m).unwrap().amount, 200);
    }

    #[test]
    fn test_institution_column_is_normalized() {
        let m = ColumnMapping {
            institution: Some("Bank".into()),
            ..ColumnMapping::generic()
        };
        let r = row(&[
            ("Date", "2025-10-01"),
            ("Amount", "1"),
            ("Description", "X"),
            ("Bank", "  KB   Card "),
        ]);
        assert_eq!(canonicalize(&r, &m).unwrap().institution_label, "KB Card");
    }

    #[test]
    fn test_mapping_profile_roundtrips_as_json() {
        let json = r#"{"date":"d","description":"p","debit":"out","credit":"in","sign_convention":"debit-wins"}"#;
        let m: ColumnMapping = serde_json::from_str(json).unwrap();
        assert_eq!(m.sign_convention, SignConvention::DebitWins);
        assert!(m.amount.is_none());
        let back = serde_json::to_string(&m).unwrap();
        let again: ColumnMapping = serde_json::from_str(&back).unwrap();
        assert_eq!(again.debit.as_deref(), Some("out"));
    }
}
